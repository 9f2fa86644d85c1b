//! In-memory metadata and execution environment for unit tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::environment::{AttributeIter, ExecutionEnvironment, ReflectionDomain};
use crate::metadata::{
	ConstantValue, CustomAttributeData, CustomAttributeHandle, MetadataError, MetadataReader,
	MethodHandle, ParameterAttributes, ParameterHandle, ParameterRecord, TypeHandle,
};
use crate::parameter::MethodParameterInfo;

pub(crate) const METHOD: MethodHandle = MethodHandle(0x0600_0001);
pub(crate) const INT32: TypeHandle = TypeHandle(0x0100_0008);

/// Optional, with a constant default of 42.
pub(crate) const WITH_CONSTANT: ParameterHandle = ParameterHandle(0x0800_0001);
/// `in`/`out`, two declared attributes.
pub(crate) const IN_OUT: ParameterHandle = ParameterHandle(0x0800_0002);
/// Required, no default.
pub(crate) const REQUIRED: ParameterHandle = ParameterHandle(0x0800_0003);
/// Optional, no default.
pub(crate) const OPTIONAL: ParameterHandle = ParameterHandle(0x0800_0004);
/// Optional, default supplied through a `DefaultValueAttribute`.
pub(crate) const ATTRIBUTE_DEFAULT: ParameterHandle = ParameterHandle(0x0800_0005);
/// Second declared attribute has a malformed blob.
pub(crate) const MALFORMED: ParameterHandle = ParameterHandle(0x0800_0006);
/// Not present in the tables.
pub(crate) const DANGLING: ParameterHandle = ParameterHandle(0x0800_dead);

pub(crate) const OBSOLETE: CustomAttributeHandle = CustomAttributeHandle(0x0c00_0001);
pub(crate) const DESCRIPTION: CustomAttributeHandle = CustomAttributeHandle(0x0c00_0002);
pub(crate) const DEFAULT_AUTO: CustomAttributeHandle = CustomAttributeHandle(0x0c00_0003);
pub(crate) const BROKEN: CustomAttributeHandle = CustomAttributeHandle(0x0c00_0004);

pub(crate) const DEFAULT_VALUE_ATTRIBUTE: &str = "System.ComponentModel.DefaultValueAttribute";
pub(crate) const IN_ATTRIBUTE: &str = "System.Runtime.InteropServices.InAttribute";
pub(crate) const OUT_ATTRIBUTE: &str = "System.Runtime.InteropServices.OutAttribute";
pub(crate) const OPTIONAL_ATTRIBUTE: &str = "System.Runtime.InteropServices.OptionalAttribute";

#[derive(Default)]
pub(crate) struct FakeReader {
	parameters: HashMap<ParameterHandle, ParameterRecord>,
	attributes: HashMap<CustomAttributeHandle, Result<CustomAttributeData, MetadataError>>,
	parameter_reads: AtomicUsize,
}

impl FakeReader {
	pub(crate) fn sample() -> Self {
		use ParameterAttributes as Flags;

		let mut reader = Self::default();
		reader.add_parameter(WITH_CONSTANT, Flags::OPTIONAL | Flags::HAS_DEFAULT, 1, "count", &[]);
		reader.add_parameter(IN_OUT, Flags::IN | Flags::OUT, 2, "buffer", &[OBSOLETE, DESCRIPTION]);
		reader.add_parameter(REQUIRED, Flags::empty(), 3, "path", &[]);
		reader.add_parameter(OPTIONAL, Flags::OPTIONAL, 4, "options", &[]);
		reader.add_parameter(ATTRIBUTE_DEFAULT, Flags::OPTIONAL, 5, "mode", &[DEFAULT_AUTO]);
		reader.add_parameter(MALFORMED, Flags::empty(), 6, "flags", &[OBSOLETE, BROKEN]);

		reader.add_attribute(
			OBSOLETE,
			CustomAttributeData::new("System.ObsoleteAttribute", Vec::new()),
		);
		reader.add_attribute(
			DESCRIPTION,
			CustomAttributeData::new(
				"System.ComponentModel.DescriptionAttribute",
				vec![ConstantValue::String("scratch space".into())],
			),
		);
		reader.add_attribute(
			DEFAULT_AUTO,
			CustomAttributeData::new(
				DEFAULT_VALUE_ATTRIBUTE,
				vec![ConstantValue::String("auto".into())],
			),
		);
		reader.attributes.insert(
			BROKEN,
			Err(MetadataError::MalformedAttribute {
				handle: BROKEN,
				reason: "truncated fixed argument".into(),
			}),
		);
		reader
	}

	fn add_parameter(
		&mut self,
		handle: ParameterHandle,
		flags: ParameterAttributes,
		sequence: u16,
		name: &str,
		custom_attributes: &[CustomAttributeHandle],
	) {
		self.parameters.insert(
			handle,
			ParameterRecord {
				flags,
				sequence,
				name: Some(name.into()),
				custom_attributes: custom_attributes.to_vec(),
			},
		);
	}

	fn add_attribute(&mut self, handle: CustomAttributeHandle, data: CustomAttributeData) {
		self.attributes.insert(handle, Ok(data));
	}

	pub(crate) fn parameter_reads(&self) -> usize {
		self.parameter_reads.load(Ordering::SeqCst)
	}
}

impl MetadataReader for FakeReader {
	fn parameter(&self, handle: ParameterHandle) -> Result<ParameterRecord, MetadataError> {
		self.parameter_reads.fetch_add(1, Ordering::SeqCst);
		self.parameters
			.get(&handle)
			.cloned()
			.ok_or(MetadataError::InvalidHandle {
				kind: "parameter",
				raw: handle.0,
			})
	}

	fn custom_attribute(
		&self,
		handle: CustomAttributeHandle,
	) -> Result<CustomAttributeData, MetadataError> {
		self.attributes
			.get(&handle)
			.cloned()
			.unwrap_or(Err(MetadataError::InvalidHandle {
				kind: "custom attribute",
				raw: handle.0,
			}))
	}
}

/// Synthesizes interop pseudo attributes from parameter flags and resolves defaults from a
/// constant table or a `DefaultValueAttribute`.
#[derive(Default)]
pub(crate) struct FakeEnvironment {
	constants: HashMap<ParameterHandle, ConstantValue>,
	pseudo_calls: AtomicUsize,
	default_calls: AtomicUsize,
	/// Attribute types passed to the most recent default-value resolution.
	seen_attributes: Mutex<Vec<String>>,
}

impl FakeEnvironment {
	pub(crate) fn sample() -> Self {
		let mut env = Self::default();
		env.constants.insert(WITH_CONSTANT, ConstantValue::Int(42));
		env
	}

	pub(crate) fn pseudo_calls(&self) -> usize {
		self.pseudo_calls.load(Ordering::SeqCst)
	}

	pub(crate) fn default_calls(&self) -> usize {
		self.default_calls.load(Ordering::SeqCst)
	}

	pub(crate) fn seen_attributes(&self) -> Vec<String> {
		self.seen_attributes.lock().clone()
	}
}

impl ExecutionEnvironment for FakeEnvironment {
	fn pseudo_custom_attributes<'a>(
		&'a self,
		reader: &'a dyn MetadataReader,
		parameter: ParameterHandle,
		_method: MethodHandle,
	) -> AttributeIter<'a> {
		self.pseudo_calls.fetch_add(1, Ordering::SeqCst);
		let flags = match reader.parameter(parameter) {
			Ok(record) => record.flags,
			Err(e) => return Box::new(std::iter::once(Err(e))),
		};
		let synthesized = [
			(ParameterAttributes::IN, IN_ATTRIBUTE),
			(ParameterAttributes::OUT, OUT_ATTRIBUTE),
			(ParameterAttributes::OPTIONAL, OPTIONAL_ATTRIBUTE),
		];
		Box::new(
			synthesized
				.into_iter()
				.filter(move |(flag, _)| flags.contains(*flag))
				.map(|(_, name)| {
					Ok::<_, MetadataError>(CustomAttributeData::new(name, Vec::new()))
				}),
		)
	}

	fn default_value_if_any(
		&self,
		_reader: &dyn MetadataReader,
		parameter: ParameterHandle,
		_parameter_type: TypeHandle,
		attributes: &[CustomAttributeData],
	) -> Result<Option<ConstantValue>, MetadataError> {
		self.default_calls.fetch_add(1, Ordering::SeqCst);
		*self.seen_attributes.lock() = attributes
			.iter()
			.map(|attr| attr.attribute_type().to_owned())
			.collect();
		if let Some(constant) = self.constants.get(&parameter) {
			return Ok(Some(constant.clone()));
		}
		Ok(attributes
			.iter()
			.find(|attr| attr.attribute_type() == DEFAULT_VALUE_ATTRIBUTE)
			.and_then(|attr| attr.arguments.first().cloned()))
	}
}

/// Shared reader and environment, kept concrete so tests can read the counters.
pub(crate) struct Fixture {
	pub(crate) reader: Arc<FakeReader>,
	pub(crate) env: Arc<FakeEnvironment>,
}

impl Fixture {
	pub(crate) fn new() -> Self {
		Self {
			reader: Arc::new(FakeReader::sample()),
			env: Arc::new(FakeEnvironment::sample()),
		}
	}

	pub(crate) fn reader(&self) -> Arc<dyn MetadataReader> {
		self.reader.clone()
	}

	pub(crate) fn execution(&self) -> ReflectionDomain {
		ReflectionDomain::Execution(self.env.clone())
	}

	pub(crate) fn parameter(&self, handle: ParameterHandle) -> MethodParameterInfo {
		self.parameter_in(self.execution(), handle)
	}

	pub(crate) fn parameter_in(
		&self,
		domain: ReflectionDomain,
		handle: ParameterHandle,
	) -> MethodParameterInfo {
		MethodParameterInfo::new(self.reader(), domain, METHOD, 0, handle, INT32)
			.expect("fixture parameter exists")
	}
}
