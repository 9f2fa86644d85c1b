//! Retention stores backing the unification engine.
//!
//! # Role
//!
//! A store is the only shared mutable state behind a dispenser. It answers lookups and accepts
//! new entries through a single atomic insert-if-absent operation. Stores differ only in what
//! [`RetentionStore::try_get`] may report after time has passed, never in the atomicity of
//! [`RetentionStore::try_publish`].
//!
//! # Key Types
//!
//! | Type | Retention |
//! |------|-----------|
//! | [`PermanentStore`] | Strong, never evicts. Wait-free reads, CAS publication. |
//! | [`WeakValueStore`] | Entry lives as long as some caller still holds the value. |
//! | [`AnyStore`] | Runtime-selected variant, built from a [`crate::Retention`]. |
//!
//! # Invariants
//!
//! - A store never holds two live entries for equal keys.
//! - `try_publish` reports the canonical value for the key whether or not the offered
//!   candidate was retained.

use std::hash::Hash;
use std::sync::Arc;

mod any;
mod permanent;
mod weak;

pub use any::AnyStore;
pub use permanent::{DEFAULT_SHARDS, PermanentStore};
pub use weak::WeakValueStore;


/// Bounds every dispenser key must satisfy.
///
/// Equality and hashing must stay stable for as long as the key is stored. Keys are cloned
/// into the store, so anything with interior mutability that affects `Eq` breaks uniqueness.
pub trait DispenserKey: Eq + Hash + Clone + Send + Sync + 'static {}
impl<T> DispenserKey for T where T: Eq + Hash + Clone + Send + Sync + 'static {}

/// Outcome of offering a candidate value to a store.
#[derive(Debug)]
pub enum Publication<V> {
	/// The candidate was the first value for its key and is now canonical.
	Accepted(Arc<V>),
	/// Another value already occupied the key; the candidate was dropped.
	Unified(Arc<V>),
}

impl<V> Publication<V> {
	/// Returns true if the offered candidate became the canonical value.
	#[inline]
	pub fn accepted(&self) -> bool {
		matches!(self, Self::Accepted(_))
	}

	/// Returns the canonical value for the key.
	#[inline]
	pub fn winner(&self) -> &Arc<V> {
		match self {
			Self::Accepted(v) | Self::Unified(v) => v,
		}
	}

	#[inline]
	pub fn into_winner(self) -> Arc<V> {
		match self {
			Self::Accepted(v) | Self::Unified(v) => v,
		}
	}
}

/// Key to value table with atomic insert-if-absent.
pub trait RetentionStore<K, V>: Send + Sync {
	/// Looks up the canonical value for `key`, if one is currently retained.
	fn try_get(&self, key: &K) -> Option<Arc<V>>;

	/// Offers `value` as the canonical value for `key`.
	///
	/// Exactly one of any number of racing offers for the same key is accepted; every other
	/// offer observes the accepted value through [`Publication::Unified`].
	fn try_publish(&self, key: K, value: Arc<V>) -> Publication<V>;

	/// Returns the number of entries currently retained.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
