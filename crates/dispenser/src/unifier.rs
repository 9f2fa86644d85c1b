//! Optimistic get-or-construct engine.
//!
//! # Role
//!
//! The [`Unifier`] is the algorithm shared by every dispenser: probe the store, construct on a
//! miss without holding any lock, then publish and adopt whichever value won.
//!
//! # Concurrency
//!
//! - **Hits:** whatever the store's lookup costs; no factory call.
//! - **Misses:** the factory runs outside any lock. Threads racing on the same unseen key may
//!   each run it; exactly one candidate is published and the others are dropped unobserved.
//! - **Failures:** nothing is published, so the next call for the key runs the factory again.
//!
//! # Invariants
//!
//! - Once a value is published for a key, every later call returns that same `Arc` for as long
//!   as the store retains it.
//! - A factory must not request its own key from the same unifier. With this engine that only
//!   wastes work, but the contract does not promise termination for such factories.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::{DispenserKey, Publication, RetentionStore};

type Factory<K, V, E> = Box<dyn Fn(&K) -> Result<V, E> + Send + Sync>;

/// Point-in-time copy of a unifier's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispenserStats {
	/// Calls answered straight from the store.
	pub hits: u64,
	/// Candidates that became the canonical value for their key.
	pub published: u64,
	/// Candidates dropped because another value was published first.
	pub unified: u64,
	/// Factory calls that returned an error.
	pub failed: u64,
}

impl DispenserStats {
	/// Total number of factory invocations.
	pub fn factory_calls(&self) -> u64 {
		self.published + self.unified + self.failed
	}
}

#[derive(Default)]
struct Counters {
	hits: AtomicU64,
	published: AtomicU64,
	unified: AtomicU64,
	failed: AtomicU64,
}

impl Counters {
	#[inline]
	fn bump(counter: &AtomicU64) {
		counter.fetch_add(1, Ordering::Relaxed);
	}

	fn snapshot(&self) -> DispenserStats {
		DispenserStats {
			hits: self.hits.load(Ordering::Relaxed),
			published: self.published.load(Ordering::Relaxed),
			unified: self.unified.load(Ordering::Relaxed),
			failed: self.failed.load(Ordering::Relaxed),
		}
	}
}

/// Get-or-construct engine over a retention store and an injected factory.
pub struct Unifier<K, V, E, S> {
	label: &'static str,
	store: S,
	factory: Factory<K, V, E>,
	counters: Counters,
}

impl<K, V, E, S> Unifier<K, V, E, S>
where
	K: DispenserKey,
	V: Send + Sync + 'static,
	E: Display,
	S: RetentionStore<K, V>,
{
	/// Binds `factory` to `store`. `label` names the unifier in log events and diagnostics.
	pub fn new<F>(label: &'static str, store: S, factory: F) -> Self
	where
		F: Fn(&K) -> Result<V, E> + Send + Sync + 'static,
	{
		Self {
			label,
			store,
			factory: Box::new(factory),
			counters: Counters::default(),
		}
	}

	/// Returns the canonical value for `key`, constructing and publishing one on a miss.
	pub fn get_or_add(&self, key: K) -> Result<Arc<V>, E> {
		if let Some(existing) = self.store.try_get(&key) {
			Counters::bump(&self.counters.hits);
			tracing::trace!(dispenser = self.label, "hit");
			return Ok(existing);
		}

		let candidate = match (self.factory)(&key) {
			Ok(value) => Arc::new(value),
			Err(e) => {
				Counters::bump(&self.counters.failed);
				tracing::debug!(dispenser = self.label, error = %e, "factory failed; nothing published");
				return Err(e);
			}
		};

		match self.store.try_publish(key, candidate) {
			Publication::Accepted(value) => {
				Counters::bump(&self.counters.published);
				tracing::debug!(dispenser = self.label, "published new entry");
				Ok(value)
			}
			Publication::Unified(winner) => {
				Counters::bump(&self.counters.unified);
				tracing::debug!(
					dispenser = self.label,
					"candidate lost publication race; adopting winner"
				);
				Ok(winner)
			}
		}
	}

	/// Returns the retained value for `key` without constructing one.
	#[inline]
	pub fn peek(&self, key: &K) -> Option<Arc<V>> {
		self.store.try_get(key)
	}

	pub fn label(&self) -> &'static str {
		self.label
	}

	pub fn store(&self) -> &S {
		&self.store
	}

	pub fn stats(&self) -> DispenserStats {
		self.counters.snapshot()
	}
}
