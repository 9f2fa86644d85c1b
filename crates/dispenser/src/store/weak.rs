//! Retention that lasts as long as some caller still holds the value.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::{DispenserKey, Publication, RetentionStore};

/// Dead entries are swept once the table grows past this many slots.
const MIN_PURGE_THRESHOLD: usize = 64;

struct Table<K, V> {
	map: FxHashMap<K, Weak<V>>,
	purge_at: usize,
}

/// Store holding only weak references to published values.
///
/// Once every strong reference to a value is gone, [`RetentionStore::try_get`] reports a miss
/// and the next publication for that key is accepted as a fresh canonical value.
pub struct WeakValueStore<K, V> {
	table: RwLock<Table<K, V>>,
}

impl<K, V> WeakValueStore<K, V>
where
	K: DispenserKey,
{
	pub fn new() -> Self {
		Self {
			table: RwLock::new(Table {
				map: FxHashMap::default(),
				purge_at: MIN_PURGE_THRESHOLD,
			}),
		}
	}

	/// Number of slots, live or dead, currently held by the table.
	pub fn slots(&self) -> usize {
		self.table.read().map.len()
	}

	/// Drops slots whose values have been released.
	pub fn purge(&self) -> usize {
		let mut table = self.table.write();
		Self::purge_locked(&mut table)
	}

	fn purge_locked(table: &mut Table<K, V>) -> usize {
		let before = table.map.len();
		table.map.retain(|_, slot| slot.strong_count() > 0);
		table.purge_at = (table.map.len() * 2).max(MIN_PURGE_THRESHOLD);
		before - table.map.len()
	}
}

impl<K, V> Default for WeakValueStore<K, V>
where
	K: DispenserKey,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V> RetentionStore<K, V> for WeakValueStore<K, V>
where
	K: DispenserKey,
	V: Send + Sync,
{
	fn try_get(&self, key: &K) -> Option<Arc<V>> {
		self.table.read().map.get(key).and_then(Weak::upgrade)
	}

	fn try_publish(&self, key: K, value: Arc<V>) -> Publication<V> {
		let mut table = self.table.write();
		if let Some(live) = table.map.get(&key).and_then(Weak::upgrade) {
			return Publication::Unified(live);
		}

		table.map.insert(key, Arc::downgrade(&value));
		if table.map.len() > table.purge_at {
			let purged = Self::purge_locked(&mut table);
			tracing::trace!(purged, live = table.map.len(), "swept released weak entries");
		}
		Publication::Accepted(value)
	}

	fn len(&self) -> usize {
		self.table
			.read()
			.map
			.values()
			.filter(|slot| slot.strong_count() > 0)
			.count()
	}
}

impl<K, V> std::fmt::Debug for WeakValueStore<K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("WeakValueStore")
			.field("slots", &self.table.read().map.len())
			.finish()
	}
}
