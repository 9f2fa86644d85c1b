//! Pull-based concatenation of two restartable sources.
//!
//! Used for properties that union two independently produced collections, such as attributes
//! declared in metadata followed by attributes synthesized by the execution environment.
//!
//! Each source is a closure returning a fresh iterator, so every call to
//! [`ComposedSequence::iter`] starts an independent traversal from the beginning of both
//! sources. The second source is not invoked until the first is exhausted, and nothing is
//! buffered. Sources yielding `Result` items propagate errors at the point reached; whatever
//! was yielded before the error has already been delivered.

use std::iter::FusedIterator;

/// Restartable view over `first` followed by `second`.
#[derive(Clone, Copy)]
pub struct ComposedSequence<F, S> {
	first: F,
	second: S,
}

impl<F, S, A, B> ComposedSequence<F, S>
where
	F: Fn() -> A,
	S: Fn() -> B,
	A: IntoIterator,
	B: IntoIterator<Item = A::Item>,
{
	pub fn of(first: F, second: S) -> Self {
		Self { first, second }
	}

	/// Starts a new traversal.
	pub fn iter(&self) -> Composed<'_, A::IntoIter, S, B> {
		Composed {
			stage: Stage::First((self.first)().into_iter()),
			second: &self.second,
		}
	}
}

impl<'a, F, S, A, B> IntoIterator for &'a ComposedSequence<F, S>
where
	F: Fn() -> A,
	S: Fn() -> B,
	A: IntoIterator,
	B: IntoIterator<Item = A::Item>,
{
	type Item = A::Item;
	type IntoIter = Composed<'a, A::IntoIter, S, B>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<F, S> std::fmt::Debug for ComposedSequence<F, S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ComposedSequence").finish_non_exhaustive()
	}
}

enum Stage<I, J> {
	First(I),
	Second(J),
	Done,
}

/// One traversal of a [`ComposedSequence`].
pub struct Composed<'a, I, S, B>
where
	B: IntoIterator,
{
	stage: Stage<I, B::IntoIter>,
	second: &'a S,
}

impl<I, S, B> Iterator for Composed<'_, I, S, B>
where
	I: Iterator,
	S: Fn() -> B,
	B: IntoIterator<Item = I::Item>,
{
	type Item = I::Item;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			match &mut self.stage {
				Stage::First(iter) => match iter.next() {
					Some(item) => return Some(item),
					None => self.stage = Stage::Second((self.second)().into_iter()),
				},
				Stage::Second(iter) => match iter.next() {
					Some(item) => return Some(item),
					None => {
						self.stage = Stage::Done;
						return None;
					}
				},
				Stage::Done => return None,
			}
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		match &self.stage {
			Stage::First(iter) => (iter.size_hint().0, None),
			Stage::Second(iter) => iter.size_hint(),
			Stage::Done => (0, Some(0)),
		}
	}
}

impl<I, S, B> FusedIterator for Composed<'_, I, S, B>
where
	I: Iterator,
	S: Fn() -> B,
	B: IntoIterator<Item = I::Item>,
{
}
