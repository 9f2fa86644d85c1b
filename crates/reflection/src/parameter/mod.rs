//! Parameters backed by a parameter metadata row.
//!
//! # Role
//!
//! [`MethodParameterInfo`] describes one parameter of one method. Instances are handed out by
//! [`ParameterInfoDispenser`](crate::ParameterInfoDispenser) so that every query for the same
//! parameter yields the same object.
//!
//! # Invariants
//!
//! - Flags, name and declared attribute handles are read once at construction and never change.
//! - The default value is resolved at most once per observed result: concurrent first readers
//!   may both resolve it, but all of them return the same [`Arc`]. Failures are not memoized.
//! - [`MethodParameterInfo::custom_attributes`] restarts from the first declared attribute on
//!   every traversal and consults the execution environment only after the declared attributes
//!   are exhausted.

use std::sync::Arc;

use aperture_dispenser::{ComposedSequence, LazyMemo};
use tracing::trace;

use crate::environment::{AttributeIter, ReflectionDomain};
use crate::error::ReflectionError;
use crate::metadata::{
	ConstantValue, MetadataReader, MethodHandle, ParameterAttributes, ParameterHandle,
	ParameterRecord, TypeHandle,
};


/// Resolved default of a parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum DefaultValue {
	/// Constant taken from metadata or a default-value attribute.
	Constant(ConstantValue),
	/// Optional parameter without an explicit default.
	Missing,
	/// Required parameter; there is no default.
	DbNull,
}

#[derive(Debug)]
struct DefaultValueInfo {
	has_default: bool,
	value: DefaultValue,
}

/// Parameter of a method, with its metadata row.
pub struct MethodParameterInfo {
	member: MethodHandle,
	position: u16,
	handle: ParameterHandle,
	parameter_type: TypeHandle,
	record: ParameterRecord,
	domain: ReflectionDomain,
	reader: Arc<dyn MetadataReader>,
	default_value: LazyMemo<DefaultValueInfo>,
}

impl MethodParameterInfo {
	/// Reads the parameter row for `handle` and builds the wrapper.
	pub fn new(
		reader: Arc<dyn MetadataReader>,
		domain: ReflectionDomain,
		member: MethodHandle,
		position: u16,
		handle: ParameterHandle,
		parameter_type: TypeHandle,
	) -> Result<Self, ReflectionError> {
		let record = reader.parameter(handle)?;
		Ok(Self {
			member,
			position,
			handle,
			parameter_type,
			record,
			domain,
			reader,
			default_value: LazyMemo::new(),
		})
	}

	pub fn attributes(&self) -> ParameterAttributes {
		self.record.flags
	}

	pub fn name(&self) -> Option<&str> {
		self.record.name.as_deref()
	}

	/// Zero-based position in the owning method's signature.
	pub fn position(&self) -> u16 {
		self.position
	}

	pub fn member(&self) -> MethodHandle {
		self.member
	}

	pub fn handle(&self) -> ParameterHandle {
		self.handle
	}

	pub fn parameter_type(&self) -> TypeHandle {
		self.parameter_type
	}

	pub fn domain(&self) -> &ReflectionDomain {
		&self.domain
	}

	pub fn is_optional(&self) -> bool {
		self.record.flags.contains(ParameterAttributes::OPTIONAL)
	}

	pub fn is_in(&self) -> bool {
		self.record.flags.contains(ParameterAttributes::IN)
	}

	pub fn is_out(&self) -> bool {
		self.record.flags.contains(ParameterAttributes::OUT)
	}

	/// Declared attributes followed by the environment's pseudo attributes.
	///
	/// Each call to `iter()` on the result starts a fresh traversal. In a metadata-only domain
	/// only the declared attributes are produced.
	pub fn custom_attributes<'a>(
		&'a self,
	) -> ComposedSequence<impl Fn() -> AttributeIter<'a> + 'a, impl Fn() -> AttributeIter<'a> + 'a>
	{
		ComposedSequence::of(move || self.declared_attributes(), move || self.pseudo_attributes())
	}

	pub fn has_default_value(&self) -> Result<bool, ReflectionError> {
		Ok(self.default_value_info()?.has_default)
	}

	pub fn default_value(&self) -> Result<DefaultValue, ReflectionError> {
		Ok(self.default_value_info()?.value.clone())
	}

	fn declared_attributes(&self) -> AttributeIter<'_> {
		Box::new(
			self.record
				.custom_attributes
				.iter()
				.map(move |&handle| self.reader.custom_attribute(handle)),
		)
	}

	fn pseudo_attributes(&self) -> AttributeIter<'_> {
		match &self.domain {
			ReflectionDomain::Execution(env) => {
				trace!(
					method = ?self.member,
					parameter = ?self.handle,
					"synthesizing pseudo custom attributes"
				);
				env.pseudo_custom_attributes(&*self.reader, self.handle, self.member)
			}
			ReflectionDomain::MetadataOnly => Box::new(std::iter::empty()),
		}
	}

	fn default_value_info(&self) -> Result<Arc<DefaultValueInfo>, ReflectionError> {
		self.default_value.try_get_or_compute(|| {
			let Some(env) = self.domain.execution_environment() else {
				return Err(ReflectionError::NotSupported {
					operation: "parameter default value",
				});
			};

			// Environments may resolve defaults from pseudo attributes such as `Optional`.
			let attributes = self.custom_attributes().iter().collect::<Result<Vec<_>, _>>()?;
			let resolved = env.default_value_if_any(
				&*self.reader,
				self.handle,
				self.parameter_type,
				&attributes,
			)?;

			let info = match resolved {
				Some(constant) => DefaultValueInfo {
					has_default: true,
					value: DefaultValue::Constant(constant),
				},
				None if self.is_optional() => DefaultValueInfo {
					has_default: false,
					value: DefaultValue::Missing,
				},
				None => DefaultValueInfo {
					has_default: false,
					value: DefaultValue::DbNull,
				},
			};
			trace!(
				parameter = ?self.handle,
				has_default = info.has_default,
				"resolved parameter default value"
			);
			Ok(info)
		})
	}
}

impl std::fmt::Debug for MethodParameterInfo {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MethodParameterInfo")
			.field("member", &self.member)
			.field("position", &self.position)
			.field("name", &self.name())
			.field("attributes", &self.record.flags)
			.field("domain", &self.domain)
			.finish_non_exhaustive()
	}
}
