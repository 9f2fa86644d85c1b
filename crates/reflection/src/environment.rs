//! Execution-time services and the domain a wrapper belongs to.

use std::sync::Arc;

use crate::metadata::{
	ConstantValue, CustomAttributeData, MetadataError, MetadataReader, MethodHandle,
	ParameterHandle, TypeHandle,
};

/// Lazily decoded attributes.
pub type AttributeIter<'a> =
	Box<dyn Iterator<Item = Result<CustomAttributeData, MetadataError>> + 'a>;

/// Services only available when types are loaded for execution.
pub trait ExecutionEnvironment: Send + Sync {
	/// Attributes synthesized from metadata flags rather than declared as attribute rows
	/// (e.g. `In`, `Out`, `Optional`, marshalling).
	fn pseudo_custom_attributes<'a>(
		&'a self,
		reader: &'a dyn MetadataReader,
		parameter: ParameterHandle,
		method: MethodHandle,
	) -> AttributeIter<'a>;

	/// Resolves the parameter's default value from its constant row or from declared
	/// attributes. `Ok(None)` means the parameter has no default.
	fn default_value_if_any(
		&self,
		reader: &dyn MetadataReader,
		parameter: ParameterHandle,
		parameter_type: TypeHandle,
		attributes: &[CustomAttributeData],
	) -> Result<Option<ConstantValue>, MetadataError>;
}

/// Domain a reflection object was created in.
#[derive(Clone)]
pub enum ReflectionDomain {
	/// Types are loaded for execution; execution-time queries are answered by `env`.
	Execution(Arc<dyn ExecutionEnvironment>),
	/// Inspection only; execution-time queries fail with `NotSupported`.
	MetadataOnly,
}

impl ReflectionDomain {
	pub fn execution(env: impl ExecutionEnvironment + 'static) -> Self {
		Self::Execution(Arc::new(env))
	}

	pub fn execution_environment(&self) -> Option<&dyn ExecutionEnvironment> {
		match self {
			Self::Execution(env) => Some(&**env),
			Self::MetadataOnly => None,
		}
	}
}

impl std::fmt::Debug for ReflectionDomain {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Execution(_) => f.write_str("Execution"),
			Self::MetadataOnly => f.write_str("MetadataOnly"),
		}
	}
}
