//! Reflection wrappers built on identity-unifying dispensers.
//!
//! Wrappers read their immutable description from a [`MetadataReader`] once, derive expensive
//! properties lazily through [`LazyMemo`](aperture_dispenser::LazyMemo), and are handed out by
//! a dispenser so that equal queries return the same object.
//!
//! Execution-time queries (default values, pseudo custom attributes) go through the
//! [`ExecutionEnvironment`] of a [`ReflectionDomain::Execution`] domain. In a
//! [`ReflectionDomain::MetadataOnly`] domain they fail with [`ReflectionError::NotSupported`]
//! or produce nothing.

mod dispenser;
mod environment;
mod error;
mod metadata;
mod parameter;

#[cfg(test)]
mod test_fixtures;

pub use dispenser::{ParameterInfoDispenser, ParameterKey};
pub use environment::{AttributeIter, ExecutionEnvironment, ReflectionDomain};
pub use error::ReflectionError;
pub use metadata::{
	ConstantValue, CustomAttributeData, CustomAttributeHandle, MetadataError, MetadataReader,
	MethodHandle, ParameterAttributes, ParameterHandle, ParameterRecord, TypeHandle,
};
pub use parameter::{DefaultValue, MethodParameterInfo};
