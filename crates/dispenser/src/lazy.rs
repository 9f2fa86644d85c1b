//! Per-instance memoized fields.
//!
//! [`LazyMemo`] is the small sibling of a dispenser: one cell owned by one wrapper object,
//! holding a value derived from that object's own state. There is no cross-instance identity
//! requirement, only that the value never changes once observed.
//!
//! Publication is a single compare-and-set from empty: concurrent first readers may each run
//! the derivation, the first to publish wins, and every reader returns the published value.
//! Readers never block on each other. Derivations must be pure; a derivation with side effects
//! may have those effects more than once.

use std::convert::Infallible;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Cell computed on first access and stable afterwards.
pub struct LazyMemo<T> {
	cell: ArcSwapOption<T>,
}

impl<T> LazyMemo<T> {
	pub fn new() -> Self {
		Self {
			cell: ArcSwapOption::from(None),
		}
	}

	/// Creates an already-populated cell.
	pub fn with_value(value: T) -> Self {
		Self {
			cell: ArcSwapOption::from_pointee(value),
		}
	}

	/// Returns the memoized value, if any reader has published one.
	#[inline]
	pub fn get(&self) -> Option<Arc<T>> {
		self.cell.load_full()
	}

	#[inline]
	pub fn is_populated(&self) -> bool {
		self.cell.load().is_some()
	}

	/// Returns the memoized value, deriving and publishing it on first access.
	pub fn get_or_compute<F>(&self, derive: F) -> Arc<T>
	where
		F: FnOnce() -> T,
	{
		match self.try_get_or_compute(|| Ok::<T, Infallible>(derive())) {
			Ok(value) => value,
			Err(never) => match never {},
		}
	}

	/// Fallible form of [`Self::get_or_compute`].
	///
	/// Errors are returned as-is and leave the cell empty, so a later access derives again.
	pub fn try_get_or_compute<F, E>(&self, derive: F) -> Result<Arc<T>, E>
	where
		F: FnOnce() -> Result<T, E>,
	{
		if let Some(value) = self.cell.load_full() {
			return Ok(value);
		}

		let candidate = Arc::new(derive()?);
		let prev = self
			.cell
			.compare_and_swap(&None::<Arc<T>>, Some(Arc::clone(&candidate)));
		Ok(match &*prev {
			None => candidate,
			Some(winner) => Arc::clone(winner),
		})
	}
}

impl<T> Default for LazyMemo<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: std::fmt::Debug> std::fmt::Debug for LazyMemo<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.get() {
			Some(value) => f.debug_tuple("LazyMemo").field(&value).finish(),
			None => f.write_str("LazyMemo(<empty>)"),
		}
	}
}
