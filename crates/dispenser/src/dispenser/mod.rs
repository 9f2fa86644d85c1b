//! Named identity caches.
//!
//! A [`Dispenser`] is the canonical source of "the" object for a key: it binds one factory and
//! one retention store to a [`Unifier`] and hands out shared `Arc`s. Two calls for equal keys
//! return pointer-identical values for as long as the store retains the entry.
//!
//! ```
//! use std::sync::Arc;
//!
//! use aperture_dispenser::Dispenser;
//!
//! let names = Dispenser::new("names", |id: &u32| format!("entity#{id}"));
//! let a = names.get_or_add(7);
//! let b = names.get_or_add(7);
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use crate::policy::DispenserPolicy;
use crate::store::{AnyStore, DispenserKey, PermanentStore, RetentionStore};
use crate::unifier::{DispenserStats, Unifier};


/// Identity cache bound to one factory and one key type.
///
/// `E` is the factory's error type and `S` the retention store; both default to the common case
/// of an infallible factory with permanent retention.
pub struct Dispenser<K, V, E = Infallible, S = PermanentStore<K, V>> {
	unifier: Unifier<K, V, E, S>,
}

impl<K, V> Dispenser<K, V>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
{
	/// Creates a permanently-retaining dispenser over an infallible factory.
	pub fn new<F>(label: &'static str, factory: F) -> Self
	where
		F: Fn(&K) -> V + Send + Sync + 'static,
	{
		Self::with_store(label, PermanentStore::new(), move |key: &K| {
			Ok::<V, Infallible>(factory(key))
		})
	}
}

impl<K, V, E> Dispenser<K, V, E>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	E: Display,
{
	/// Creates a permanently-retaining dispenser over a fallible factory.
	///
	/// Failures are returned to the caller and never cached.
	pub fn fallible<F>(label: &'static str, factory: F) -> Self
	where
		F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	{
		Self::with_store(label, PermanentStore::new(), factory)
	}
}

impl<K, V, E> Dispenser<K, V, E, AnyStore<K, V>>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	E: Display,
{
	/// Creates a dispenser whose retention is looked up under `scenario` in `policy`.
	pub fn for_scenario<F>(policy: &DispenserPolicy, scenario: &'static str, factory: F) -> Self
	where
		F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	{
		Self::with_store(scenario, policy.store_for(scenario), factory)
	}
}

impl<K, V, E, S> Dispenser<K, V, E, S>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	E: Display,
	S: RetentionStore<K, V>,
{
	/// Creates a dispenser over an explicit retention store.
	pub fn with_store<F>(label: &'static str, store: S, factory: F) -> Self
	where
		F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	{
		Self {
			unifier: Unifier::new(label, store, factory),
		}
	}

	/// Returns the canonical value for `key`, or the factory's error.
	///
	/// The factory must not request `key` from this dispenser while constructing it.
	#[inline]
	pub fn try_get_or_add(&self, key: K) -> Result<Arc<V>, E> {
		self.unifier.get_or_add(key)
	}

	/// Returns the retained value for `key` without constructing one.
	#[inline]
	pub fn peek(&self, key: &K) -> Option<Arc<V>> {
		self.unifier.peek(key)
	}

	pub fn contains(&self, key: &K) -> bool {
		self.peek(key).is_some()
	}

	pub fn label(&self) -> &'static str {
		self.unifier.label()
	}

	/// Number of entries the store currently retains.
	pub fn len(&self) -> usize {
		self.unifier.store().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn store(&self) -> &S {
		self.unifier.store()
	}

	pub fn stats(&self) -> DispenserStats {
		self.unifier.stats()
	}
}

impl<K, V, S> Dispenser<K, V, Infallible, S>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	S: RetentionStore<K, V>,
{
	/// Returns the canonical value for `key`.
	///
	/// The factory must not request `key` from this dispenser while constructing it.
	#[inline]
	pub fn get_or_add(&self, key: K) -> Arc<V> {
		match self.unifier.get_or_add(key) {
			Ok(value) => value,
			Err(never) => match never {},
		}
	}
}

impl<K, V, E, S> std::fmt::Debug for Dispenser<K, V, E, S>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	E: Display,
	S: RetentionStore<K, V>,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Dispenser")
			.field("label", &self.label())
			.field("len", &self.len())
			.field("stats", &self.stats())
			.finish()
	}
}
