use std::sync::Arc;

use super::{DispenserKey, PermanentStore, Publication, RetentionStore, WeakValueStore};
use crate::policy::Retention;

/// Store variant chosen at runtime, typically from a [`crate::DispenserPolicy`].
#[derive(Debug)]
pub enum AnyStore<K, V> {
	Permanent(PermanentStore<K, V>),
	WeakValue(WeakValueStore<K, V>),
}

impl<K, V> AnyStore<K, V>
where
	K: DispenserKey,
{
	/// Builds an empty store for `retention`, using `shards` for permanent stores.
	pub fn for_retention(retention: Retention, shards: usize) -> Self {
		match retention {
			Retention::Permanent => Self::Permanent(PermanentStore::with_shards(shards)),
			Retention::WeakValue => Self::WeakValue(WeakValueStore::new()),
		}
	}

	pub fn retention(&self) -> Retention {
		match self {
			Self::Permanent(_) => Retention::Permanent,
			Self::WeakValue(_) => Retention::WeakValue,
		}
	}
}

impl<K, V> RetentionStore<K, V> for AnyStore<K, V>
where
	K: DispenserKey,
	V: Send + Sync,
{
	#[inline]
	fn try_get(&self, key: &K) -> Option<Arc<V>> {
		match self {
			Self::Permanent(s) => s.try_get(key),
			Self::WeakValue(s) => s.try_get(key),
		}
	}

	#[inline]
	fn try_publish(&self, key: K, value: Arc<V>) -> Publication<V> {
		match self {
			Self::Permanent(s) => s.try_publish(key, value),
			Self::WeakValue(s) => s.try_publish(key, value),
		}
	}

	fn len(&self) -> usize {
		match self {
			Self::Permanent(s) => s.len(),
			Self::WeakValue(s) => s.len(),
		}
	}
}
