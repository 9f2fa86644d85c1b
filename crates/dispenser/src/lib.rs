//! Identity-unifying caches for metadata-backed objects.
//!
//! A runtime that hands out reflection objects (members, parameters, methods) must return the
//! *same* object every time a caller asks for the same logical entity, even when many threads
//! ask at once and construction is expensive. This crate provides that guarantee and the two
//! smaller idioms wrapper objects build on.
//!
//! # Mental Model
//!
//! 1. **Store:** a [`RetentionStore`] holds canonical values and accepts new ones through an
//!    atomic insert-if-absent ([`RetentionStore::try_publish`]).
//! 2. **Unify:** the [`Unifier`] probes the store, runs the factory on a miss without holding
//!    any lock, then publishes. A thread that loses the publication race drops its candidate
//!    and returns the winner.
//! 3. **Dispense:** a [`Dispenser`] is a named handle binding one factory to one unifier.
//! 4. **Per-instance state:** wrapper objects memoize derived properties in a [`LazyMemo`] and
//!    expose two-source collections as a [`ComposedSequence`].
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Dispenser`] | Public identity cache for one key type and one factory. |
//! | [`Unifier`] | Optimistic get-or-construct engine. |
//! | [`PermanentStore`] | Never-evicting sharded store with lock-free reads. |
//! | [`WeakValueStore`] | Store retaining entries only while their value is alive. |
//! | [`DispenserPolicy`] | Scenario to [`Retention`] configuration, loadable from TOML. |
//! | [`LazyMemo`] | Per-instance first-publish-wins cell. |
//! | [`ComposedSequence`] | Restartable lazy concatenation of two sources. |
//!
//! # Concurrency
//!
//! - Hits never run the factory.
//! - Misses may run the factory more than once per key under contention; exactly one result
//!   is ever observed.
//! - Factory errors are returned to the caller and never cached.

mod dispenser;
mod lazy;
mod policy;
mod sequence;
pub mod store;
mod unifier;

pub use dispenser::Dispenser;
pub use lazy::LazyMemo;
pub use policy::{DispenserPolicy, PolicyError, Retention};
pub use sequence::{Composed, ComposedSequence};
pub use store::{
	AnyStore, DispenserKey, PermanentStore, Publication, RetentionStore, WeakValueStore,
};
pub use unifier::{DispenserStats, Unifier};
