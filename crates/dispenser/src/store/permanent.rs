//! Strong, never-evicting retention.
//!
//! Each shard is an immutable map published through [`ArcSwap`]. Readers load the current map
//! without locking; writers clone the shard, insert, and install the copy with
//! compare-and-swap, retrying when another writer got there first.

use std::hash::BuildHasher;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::{FxBuildHasher, FxHashMap};

use super::{DispenserKey, Publication, RetentionStore};

/// Shard count used by [`PermanentStore::new`].
pub const DEFAULT_SHARDS: usize = 64;

type Shard<K, V> = ArcSwap<FxHashMap<K, Arc<V>>>;

/// Store that keeps every published entry for its whole lifetime.
///
/// Only appropriate when the key space is bounded (one entry per metadata entity of a closed
/// program) or when unbounded growth is an accepted cost.
///
/// Every publication copies its shard's map, so filling `n` keys costs roughly
/// `n² / shard_count` entry copies. Stores expected to hold many thousands of entries should
/// be built with [`Self::with_shards`] and a larger count.
pub struct PermanentStore<K, V> {
	shards: Box<[Shard<K, V>]>,
	mask: usize,
}

impl<K, V> PermanentStore<K, V>
where
	K: DispenserKey,
{
	/// Creates an empty store with [`DEFAULT_SHARDS`] shards.
	pub fn new() -> Self {
		Self::with_shards(DEFAULT_SHARDS)
	}

	/// Creates a store with `shards` independent publication points.
	///
	/// The count is rounded up to a power of two. Writers only contend with writers that hash
	/// to the same shard.
	pub fn with_shards(shards: usize) -> Self {
		let count = shards.max(1).next_power_of_two();
		let shards = (0..count)
			.map(|_| ArcSwap::from_pointee(FxHashMap::default()))
			.collect();
		Self {
			shards,
			mask: count - 1,
		}
	}

	pub fn shard_count(&self) -> usize {
		self.shards.len()
	}

	#[inline]
	fn shard(&self, key: &K) -> &Shard<K, V> {
		// Bucket selection inside the shard map uses the low bits of the same hash.
		let hash = FxBuildHasher.hash_one(key);
		&self.shards[(hash >> 32) as usize & self.mask]
	}
}

impl<K, V> Default for PermanentStore<K, V>
where
	K: DispenserKey,
{
	fn default() -> Self {
		Self::new()
	}
}

impl<K, V> RetentionStore<K, V> for PermanentStore<K, V>
where
	K: DispenserKey,
	V: Send + Sync,
{
	#[inline]
	fn try_get(&self, key: &K) -> Option<Arc<V>> {
		self.shard(key).load().get(key).cloned()
	}

	fn try_publish(&self, key: K, value: Arc<V>) -> Publication<V> {
		let shard = self.shard(&key);
		loop {
			let cur = shard.load_full();
			if let Some(existing) = cur.get(&key) {
				return Publication::Unified(Arc::clone(existing));
			}

			let mut next = (*cur).clone();
			next.insert(key.clone(), Arc::clone(&value));

			let prev = shard.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				return Publication::Accepted(value);
			}
			// CAS failed, re-check against the newer map
		}
	}

	fn len(&self) -> usize {
		self.shards.iter().map(|shard| shard.load().len()).sum()
	}
}

impl<K, V> std::fmt::Debug for PermanentStore<K, V> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PermanentStore")
			.field("shards", &self.shards.len())
			.field(
				"entries",
				&self.shards.iter().map(|s| s.load().len()).sum::<usize>(),
			)
			.finish()
	}
}
