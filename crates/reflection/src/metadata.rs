//! Read-only view of the metadata collaborator.
//!
//! The binary reader itself lives elsewhere; this crate only needs handles, a few decoded
//! records, and the [`MetadataReader`] accessors that produce them.

use bitflags::bitflags;

/// Handle of a method definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodHandle(pub u32);

/// Handle of a parameter definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterHandle(pub u32);

/// Handle of a type (definition, reference, or signature).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHandle(pub u32);

/// Handle of a custom attribute row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CustomAttributeHandle(pub u32);

bitflags! {
	/// Parameter flags as stored in metadata.
	#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
	pub struct ParameterAttributes: u16 {
		const IN = 0x0001;
		const OUT = 0x0002;
		const LCID = 0x0004;
		const RETVAL = 0x0008;
		const OPTIONAL = 0x0010;
		const HAS_DEFAULT = 0x1000;
		const HAS_FIELD_MARSHAL = 0x2000;
	}
}

/// Decoded constant, as found in default values and attribute arguments.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstantValue {
	Bool(bool),
	Char(char),
	Int(i64),
	UInt(u64),
	Float(f64),
	String(Box<str>),
	Null,
}

/// Decoded custom attribute instance.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomAttributeData {
	/// Fully qualified attribute type name.
	pub attribute_type: Box<str>,
	pub arguments: Vec<ConstantValue>,
}

impl CustomAttributeData {
	pub fn new(attribute_type: impl Into<Box<str>>, arguments: Vec<ConstantValue>) -> Self {
		Self {
			attribute_type: attribute_type.into(),
			arguments,
		}
	}

	pub fn attribute_type(&self) -> &str {
		&self.attribute_type
	}
}

/// Decoded parameter row.
#[derive(Clone, Debug, PartialEq)]
pub struct ParameterRecord {
	pub flags: ParameterAttributes,
	/// 1-based sequence in the owning method's signature; 0 is the return value.
	pub sequence: u16,
	pub name: Option<Box<str>>,
	pub custom_attributes: Vec<CustomAttributeHandle>,
}

/// Failures reported by the metadata reader.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
	#[error("invalid {kind} handle {raw:#010x}")]
	InvalidHandle { kind: &'static str, raw: u32 },

	#[error("malformed custom attribute blob at {handle:?}: {reason}")]
	MalformedAttribute {
		handle: CustomAttributeHandle,
		reason: Box<str>,
	},
}

/// Accessors the reflection layer needs from a metadata reader.
pub trait MetadataReader: Send + Sync {
	fn parameter(&self, handle: ParameterHandle) -> Result<ParameterRecord, MetadataError>;

	fn custom_attribute(
		&self,
		handle: CustomAttributeHandle,
	) -> Result<CustomAttributeData, MetadataError>;
}
