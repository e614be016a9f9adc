use std::fmt::{self, Write as _};
use std::sync::{Arc, Weak};

use opsmith_primitives::{Bindings, Hints, OpError, OpShape, Signature, Value};
use opsmith_registry::{Behavior, Descriptor, Invocable};

use crate::provenance::ProvenanceLog;

/// A callable operation: the selected descriptor, its resolved dependencies,
/// and the behavior built from them.
///
/// Instances are immutable and shared through the match cache.
pub struct ResolvedInstance {
	descriptor: Descriptor,
	signature: Signature,
	hints: Hints,
	bindings: Bindings,
	dependencies: Vec<(Arc<str>, Arc<ResolvedInstance>)>,
	behavior: Behavior,
	history: Option<Weak<ProvenanceLog>>,
	self_ref: Weak<ResolvedInstance>,
}

pub(crate) struct InstanceParts {
	pub descriptor: Descriptor,
	pub signature: Signature,
	pub hints: Hints,
	pub bindings: Bindings,
	pub dependencies: Vec<(Arc<str>, Arc<ResolvedInstance>)>,
	pub behavior: Behavior,
	pub history: Option<Weak<ProvenanceLog>>,
}

impl ResolvedInstance {
	pub(crate) fn new(parts: InstanceParts) -> Arc<Self> {
		Arc::new_cyclic(|self_ref| Self {
			descriptor: parts.descriptor,
			signature: parts.signature,
			hints: parts.hints,
			bindings: parts.bindings,
			dependencies: parts.dependencies,
			behavior: parts.behavior,
			history: parts.history,
			self_ref: self_ref.clone(),
		})
	}

	pub fn descriptor(&self) -> &Descriptor {
		&self.descriptor
	}

	/// The request this instance was resolved for.
	pub fn signature(&self) -> &Signature {
		&self.signature
	}

	pub fn hints(&self) -> &Hints {
		&self.hints
	}

	/// Type-variable bindings the descriptor was instantiated with.
	pub fn bindings(&self) -> &Bindings {
		&self.bindings
	}

	pub fn dependencies(&self) -> &[(Arc<str>, Arc<ResolvedInstance>)] {
		&self.dependencies
	}

	pub fn dependency(&self, key: &str) -> Option<&Arc<ResolvedInstance>> {
		self.dependencies.iter().find(|(k, _)| &**k == key).map(|(_, d)| d)
	}

	pub fn shape(&self) -> OpShape {
		self.behavior.shape()
	}

	pub fn records_history(&self) -> bool {
		self.history.is_some()
	}

	/// Invokes a function instance.
	pub fn call(&self, args: &[Value]) -> Result<Value, OpError> {
		let out = self.behavior.call(args)?;
		self.record(&out);
		Ok(out)
	}

	/// Invokes a computer instance, writing into `out`.
	pub fn compute(&self, args: &[Value], out: &Value) -> Result<(), OpError> {
		self.behavior.compute(args, out)?;
		self.record(out);
		Ok(())
	}

	fn record(&self, value: &Value) {
		if let Some(log) = self.history.as_ref().and_then(Weak::upgrade)
			&& let Some(me) = self.self_ref.upgrade()
		{
			log.record(value, me);
		}
	}

	/// Renders the dependency tree, one instance per line.
	pub fn chain(&self) -> String {
		let mut out = String::new();
		self.render(None, 0, &mut out);
		out
	}

	fn render(&self, key: Option<&str>, depth: usize, out: &mut String) {
		for _ in 0..depth {
			out.push('\t');
		}
		if let Some(key) = key {
			let _ = write!(out, "{key}: ");
		}
		let _ = writeln!(out, "{} <{}>", self.signature, self.descriptor.id());
		for (key, dep) in &self.dependencies {
			dep.render(Some(key), depth + 1, out);
		}
	}
}

impl Invocable for ResolvedInstance {
	fn shape(&self) -> OpShape {
		ResolvedInstance::shape(self)
	}

	fn call(&self, args: &[Value]) -> Result<Value, OpError> {
		ResolvedInstance::call(self, args)
	}

	fn compute(&self, args: &[Value], out: &Value) -> Result<(), OpError> {
		ResolvedInstance::compute(self, args, out)
	}
}

impl fmt::Debug for ResolvedInstance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ResolvedInstance")
			.field("signature", &self.signature.to_string())
			.field("descriptor", self.descriptor.id())
			.field("hints", &self.hints)
			.field("dependencies", &self.dependencies.len())
			.finish()
	}
}
