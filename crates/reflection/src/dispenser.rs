//! Identity cache for parameter wrappers.

use std::sync::Arc;

use aperture_dispenser::{AnyStore, Dispenser, DispenserPolicy, DispenserStats, Retention};

use crate::environment::ReflectionDomain;
use crate::error::ReflectionError;
use crate::metadata::{MetadataReader, MethodHandle, ParameterHandle, TypeHandle};
use crate::parameter::MethodParameterInfo;

/// Identity of a parameter wrapper.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParameterKey {
	pub method: MethodHandle,
	pub position: u16,
	pub parameter: ParameterHandle,
	pub parameter_type: TypeHandle,
}

type ParameterStore = AnyStore<ParameterKey, MethodParameterInfo>;

/// Hands out one [`MethodParameterInfo`] per [`ParameterKey`].
#[derive(Debug)]
pub struct ParameterInfoDispenser {
	inner: Dispenser<ParameterKey, MethodParameterInfo, ReflectionError, ParameterStore>,
}

impl ParameterInfoDispenser {
	/// Policy scenario controlling this dispenser's retention.
	pub const SCENARIO: &'static str = "parameter_infos";

	pub fn new(reader: Arc<dyn MetadataReader>, domain: ReflectionDomain) -> Self {
		Self::with_policy(&DispenserPolicy::default(), reader, domain)
	}

	pub fn with_policy(
		policy: &DispenserPolicy,
		reader: Arc<dyn MetadataReader>,
		domain: ReflectionDomain,
	) -> Self {
		let inner = Dispenser::for_scenario(policy, Self::SCENARIO, move |key: &ParameterKey| {
			MethodParameterInfo::new(
				Arc::clone(&reader),
				domain.clone(),
				key.method,
				key.position,
				key.parameter,
				key.parameter_type,
			)
		});
		Self { inner }
	}

	/// Returns the canonical wrapper for the parameter at `position` of `method`.
	pub fn get(
		&self,
		method: MethodHandle,
		position: u16,
		parameter: ParameterHandle,
		parameter_type: TypeHandle,
	) -> Result<Arc<MethodParameterInfo>, ReflectionError> {
		self.get_by_key(ParameterKey {
			method,
			position,
			parameter,
			parameter_type,
		})
	}

	pub fn get_by_key(
		&self,
		key: ParameterKey,
	) -> Result<Arc<MethodParameterInfo>, ReflectionError> {
		self.inner.try_get_or_add(key)
	}

	pub fn stats(&self) -> DispenserStats {
		self.inner.stats()
	}

	pub fn len(&self) -> usize {
		self.inner.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn retention(&self) -> Retention {
		self.inner.store().retention()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Barrier};
	use std::thread;

	use aperture_dispenser::{DispenserPolicy, Retention};

	use super::{ParameterInfoDispenser, ParameterKey};
	use crate::error::ReflectionError;
	use crate::test_fixtures::*;

	fn dispenser(fixture: &Fixture) -> ParameterInfoDispenser {
		ParameterInfoDispenser::new(fixture.reader(), fixture.execution())
	}

	#[test]
	fn same_parameter_yields_same_wrapper() {
		let fixture = Fixture::new();
		let parameters = dispenser(&fixture);

		let a = parameters.get(METHOD, 1, IN_OUT, INT32).expect("known parameter");
		let b = parameters.get(METHOD, 1, IN_OUT, INT32).expect("known parameter");

		assert!(Arc::ptr_eq(&a, &b));
		assert_eq!(fixture.reader.parameter_reads(), 1);
		assert_eq!(parameters.len(), 1);
		assert_eq!(parameters.retention(), Retention::Permanent);
	}

	#[test]
	fn distinct_positions_yield_distinct_wrappers() {
		let fixture = Fixture::new();
		let parameters = dispenser(&fixture);

		let first = parameters.get(METHOD, 0, REQUIRED, INT32).expect("known parameter");
		let second = parameters.get(METHOD, 1, REQUIRED, INT32).expect("known parameter");

		assert!(!Arc::ptr_eq(&first, &second));
		assert_eq!((first.position(), second.position()), (0, 1));
		assert_eq!(parameters.len(), 2);
	}

	#[test]
	fn memoized_state_is_shared_through_the_dispenser() {
		let fixture = Fixture::new();
		let parameters = dispenser(&fixture);
		let key = ParameterKey {
			method: METHOD,
			position: 0,
			parameter: WITH_CONSTANT,
			parameter_type: INT32,
		};

		let first = parameters.get_by_key(key).expect("known parameter");
		assert_eq!(first.has_default_value(), Ok(true));
		let again = parameters.get_by_key(key).expect("known parameter");
		assert_eq!(again.has_default_value(), Ok(true));

		assert_eq!(fixture.env.default_calls(), 1);
	}

	#[test]
	fn construction_failures_are_not_cached() {
		let fixture = Fixture::new();
		let parameters = dispenser(&fixture);

		for _ in 0..2 {
			assert!(matches!(
				parameters.get(METHOD, 0, DANGLING, INT32),
				Err(ReflectionError::Metadata(_))
			));
		}
		assert!(parameters.is_empty());
		assert_eq!(fixture.reader.parameter_reads(), 2);
		assert_eq!(parameters.stats().failed, 2);
	}

	#[test]
	fn weak_value_policy_releases_unreferenced_wrappers() {
		let fixture = Fixture::new();
		let policy = DispenserPolicy::default()
			.with_scenario(ParameterInfoDispenser::SCENARIO, Retention::WeakValue);
		let parameters =
			ParameterInfoDispenser::with_policy(&policy, fixture.reader(), fixture.execution());
		assert_eq!(parameters.retention(), Retention::WeakValue);

		let held = parameters.get(METHOD, 2, OPTIONAL, INT32).expect("known parameter");
		assert!(Arc::ptr_eq(
			&held,
			&parameters.get(METHOD, 2, OPTIONAL, INT32).expect("known parameter")
		));
		drop(held);

		assert!(parameters.is_empty());
		parameters.get(METHOD, 2, OPTIONAL, INT32).expect("known parameter");
		assert_eq!(fixture.reader.parameter_reads(), 2);
	}

	#[test]
	fn racing_lookups_converge() {
		const CALLERS: usize = 16;
		let fixture = Fixture::new();
		let parameters = dispenser(&fixture);
		let barrier = Barrier::new(CALLERS);

		let observed: Vec<_> = thread::scope(|s| {
			let handles: Vec<_> = (0..CALLERS)
				.map(|_| {
					let (parameters, barrier) = (&parameters, &barrier);
					s.spawn(move || {
						barrier.wait();
						parameters.get(METHOD, 3, ATTRIBUTE_DEFAULT, INT32)
					})
				})
				.collect();
			handles
				.into_iter()
				.map(|h| h.join().expect("caller panicked").expect("known parameter"))
				.collect()
		});

		for info in &observed {
			assert!(Arc::ptr_eq(info, &observed[0]));
		}
		assert_eq!(parameters.stats().published, 1);
	}
}
