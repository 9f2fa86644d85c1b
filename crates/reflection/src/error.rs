use crate::metadata::MetadataError;

/// Failures surfaced by reflection wrappers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectionError {
	/// The query needs execution-time services the wrapper's domain does not provide.
	#[error("{operation} is not supported in a metadata-only domain")]
	NotSupported { operation: &'static str },

	#[error(transparent)]
	Metadata(#[from] MetadataError),
}
