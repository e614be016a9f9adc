//! Declared and synthetic operation descriptors.
//!
//! # Role
//!
//! [`OpDescriptor`] is what plugins and callers declare. [`Descriptor`] is the
//! cheap handle the registry and engine pass around; it is either a declared
//! descriptor or a [`SyntheticDescriptor`] wrapping another descriptor with a
//! changed signature.
//!
//! # Invariants
//!
//! - A synthetic descriptor delegates names, priority, source, and description
//!   to the descriptor it wraps; only its signature, parameters, hints, extra
//!   dependencies, and behavior wrapper are its own.
//!   - Enforced in: [`Descriptor::names`], [`Descriptor::priority`].
//!   - Tested by: `descriptor::tests::test_synthetic_delegates_identity`.
//! - A synthetic descriptor refuses further transforms of its own category.
//!   - Enforced in: [`SyntheticDescriptor::new`].
//!   - Tested by: `descriptor::tests::test_synthetic_forbids_own_category`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use opsmith_primitives::{Bindings, HintCategory, Hints, OpError, OpShape, Signature};

use crate::behavior::{Behavior, Dependencies, Factory, Wrapper};

/// Suffix source for descriptors built without an explicit id.
static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(0);

/// Where a descriptor was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OpSource {
	/// Shipped with the engine.
	Builtin,
	/// Contributed by a library crate.
	Crate(&'static str),
	/// Registered at runtime.
	Runtime,
}

impl OpSource {
	/// Precedence rank (higher is higher precedence).
	pub const fn rank(self) -> u8 {
		match self {
			Self::Builtin => 0,
			Self::Crate(_) => 1,
			Self::Runtime => 2,
		}
	}
}

impl fmt::Display for OpSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Builtin => write!(f, "builtin"),
			Self::Crate(name) => write!(f, "crate:{name}"),
			Self::Runtime => write!(f, "runtime"),
		}
	}
}

/// A declared input parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
	pub name: Arc<str>,
	pub optional: bool,
}

impl Param {
	pub fn required(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			optional: false,
		}
	}

	pub fn optional(name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			optional: true,
		}
	}
}

/// A nested operation request declared by a descriptor.
///
/// The template may mention the owner's type variables; they are substituted
/// with the owner's bindings before the request is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencySpec {
	pub key: Arc<str>,
	pub template: Signature,
	pub required: bool,
	pub adaptable: bool,
}

impl DependencySpec {
	/// A required, adaptable dependency.
	pub fn new(key: impl Into<Arc<str>>, template: Signature) -> Self {
		Self {
			key: key.into(),
			template,
			required: true,
			adaptable: true,
		}
	}

	pub fn optional(mut self) -> Self {
		self.required = false;
		self
	}

	pub fn non_adaptable(mut self) -> Self {
		self.adaptable = false;
		self
	}

	/// Operation name requested.
	pub fn name(&self) -> &str {
		&self.template.name
	}
}

/// An operation as declared by a plugin or caller.
#[derive(Clone)]
pub struct OpDescriptor {
	pub id: Arc<str>,
	pub names: Arc<[Arc<str>]>,
	pub description: Arc<str>,
	pub priority: i16,
	pub source: OpSource,
	pub signature: Signature,
	pub params: Arc<[Param]>,
	pub declared_hints: Hints,
	pub dependencies: Arc<[DependencySpec]>,
	pub factory: Factory,
}

impl OpDescriptor {
	/// Starts a descriptor whose primary name is the signature's name.
	pub fn builder(signature: Signature) -> OpDescriptorBuilder {
		OpDescriptorBuilder {
			id: None,
			names: vec![signature.name.clone()],
			description: Arc::from(""),
			priority: 0,
			source: OpSource::Builtin,
			params: None,
			declared_hints: Hints::empty(),
			dependencies: Vec::new(),
			factory: None,
			signature,
		}
	}

	/// Primary name.
	pub fn name(&self) -> &str {
		self.names.first().map_or("", |n| &**n)
	}
}

impl fmt::Debug for OpDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OpDescriptor")
			.field("id", &self.id)
			.field("names", &self.names)
			.field("priority", &self.priority)
			.field("source", &self.source)
			.field("signature", &self.signature.to_string())
			.field("declared_hints", &self.declared_hints)
			.field("dependencies", &self.dependencies.len())
			.finish()
	}
}

/// Builder for [`OpDescriptor`].
pub struct OpDescriptorBuilder {
	id: Option<Arc<str>>,
	names: Vec<Arc<str>>,
	description: Arc<str>,
	priority: i16,
	source: OpSource,
	signature: Signature,
	params: Option<Vec<Param>>,
	declared_hints: Hints,
	dependencies: Vec<DependencySpec>,
	factory: Option<Factory>,
}

impl OpDescriptorBuilder {
	/// Sets the identity string.
	///
	/// Without one, the id is the rendered signature plus a process-unique
	/// suffix, so anonymous implementations never collide. Explicit ids that
	/// repeat are duplicates and settled by the registry's policy.
	pub fn id(mut self, id: impl Into<Arc<str>>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Adds an alternative name.
	pub fn alias(mut self, name: impl Into<Arc<str>>) -> Self {
		let name = name.into();
		if !self.names.contains(&name) {
			self.names.push(name);
		}
		self
	}

	pub fn description(mut self, description: impl Into<Arc<str>>) -> Self {
		self.description = description.into();
		self
	}

	pub fn priority(mut self, priority: i16) -> Self {
		self.priority = priority;
		self
	}

	pub fn source(mut self, source: OpSource) -> Self {
		self.source = source;
		self
	}

	/// Declares parameters (defaults to one required `inN` per input).
	pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
		self.params = Some(params.into_iter().collect());
		self
	}

	/// Declares a hint the descriptor refuses, e.g. `adaptation.FORBIDDEN`.
	pub fn hint(mut self, token: &str) -> Self {
		self.declared_hints = self.declared_hints.plus(token);
		self
	}

	pub fn dependency(mut self, spec: DependencySpec) -> Self {
		self.dependencies.push(spec);
		self
	}

	pub fn factory(
		mut self,
		factory: impl Fn(&Dependencies) -> Result<Behavior, OpError> + Send + Sync + 'static,
	) -> Self {
		self.factory = Some(Arc::new(factory));
		self
	}

	/// Uses a fixed behavior that ignores dependencies.
	pub fn behavior(self, behavior: Behavior) -> Self {
		self.factory(move |_| Ok(behavior.clone()))
	}

	pub fn build(self) -> OpDescriptor {
		let params = self.params.unwrap_or_else(|| {
			(0..self.signature.arity())
				.map(|i| Param::required(format!("in{i}")))
				.collect()
		});
		let id = self.id.unwrap_or_else(|| {
			let n = NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed);
			Arc::from(format!("{}#{n}", self.signature))
		});
		let factory = self.factory.unwrap_or_else(|| {
			let id = id.clone();
			Arc::new(move |_: &Dependencies| -> Result<Behavior, OpError> {
				Err(OpError::failed(format!("descriptor `{id}` has no behavior")))
			})
		});
		OpDescriptor {
			id,
			names: self.names.into(),
			description: self.description,
			priority: self.priority,
			source: self.source,
			signature: self.signature,
			params: params.into(),
			declared_hints: self.declared_hints,
			dependencies: self.dependencies.into(),
			factory,
		}
	}
}

/// Metadata recorded by a signature transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformTag {
	/// Reshaped between function and computer.
	Adaptation { from: OpShape, to: OpShape },
	/// Conversions inserted at the boundary with the given total loss.
	Simplification { loss: u32 },
	/// Trailing optional inputs dropped.
	Reduction { dropped: usize },
}

impl TransformTag {
	pub const fn category(self) -> HintCategory {
		match self {
			Self::Adaptation { .. } => HintCategory::Adaptation,
			Self::Simplification { .. } => HintCategory::Simplification,
			Self::Reduction { .. } => HintCategory::Reduction,
		}
	}
}

impl fmt::Display for TransformTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Adaptation { from, to } => write!(f, "Adaptation:{from}->{to}"),
			Self::Simplification { loss } => write!(f, "Simplification:{loss}"),
			Self::Reduction { dropped } => write!(f, "Reduction:{dropped}"),
		}
	}
}

/// A descriptor derived from another by a signature transform.
pub struct SyntheticDescriptor {
	id: Arc<str>,
	inner: Descriptor,
	tag: TransformTag,
	signature: Signature,
	params: Arc<[Param]>,
	declared_hints: Hints,
	extra_dependencies: Arc<[DependencySpec]>,
	bindings: Bindings,
	wrap: Wrapper,
}

impl SyntheticDescriptor {
	/// Wraps `inner`.
	///
	/// `bindings` fixes type variables of the inner descriptor that the new
	/// signature no longer mentions; `wrap` turns the inner behavior into the
	/// behavior matching `signature`.
	pub fn new(
		inner: Descriptor,
		tag: TransformTag,
		signature: Signature,
		params: impl IntoIterator<Item = Param>,
		extra_dependencies: impl IntoIterator<Item = DependencySpec>,
		bindings: Bindings,
		wrap: Wrapper,
	) -> Self {
		let id: Arc<str> = match &inner {
			Descriptor::Declared(d) => Arc::from(format!("|{tag}|Original:{}", d.id)),
			Descriptor::Synthetic(s) => Arc::from(format!("|{tag}{}", s.id)),
		};
		let mut declared_hints = inner.declared_hints().clone();
		if let Some(token) = tag.category().forbidden() {
			declared_hints = declared_hints.plus(token);
		}
		Self {
			id,
			inner,
			tag,
			signature,
			params: params.into_iter().collect(),
			declared_hints,
			extra_dependencies: extra_dependencies.into_iter().collect(),
			bindings,
			wrap,
		}
	}

	pub fn inner(&self) -> &Descriptor {
		&self.inner
	}

	pub fn tag(&self) -> TransformTag {
		self.tag
	}
}

/// Shared handle to a declared or synthetic descriptor.
#[derive(Clone)]
pub enum Descriptor {
	Declared(Arc<OpDescriptor>),
	Synthetic(Arc<SyntheticDescriptor>),
}

impl From<OpDescriptor> for Descriptor {
	fn from(d: OpDescriptor) -> Self {
		Self::Declared(Arc::new(d))
	}
}

impl From<SyntheticDescriptor> for Descriptor {
	fn from(d: SyntheticDescriptor) -> Self {
		Self::Synthetic(Arc::new(d))
	}
}

impl Descriptor {
	pub fn id(&self) -> &Arc<str> {
		match self {
			Self::Declared(d) => &d.id,
			Self::Synthetic(s) => &s.id,
		}
	}

	pub fn names(&self) -> &[Arc<str>] {
		&self.origin().names
	}

	/// Primary name.
	pub fn name(&self) -> &str {
		self.origin().name()
	}

	pub fn description(&self) -> &str {
		&self.origin().description
	}

	pub fn priority(&self) -> i16 {
		self.origin().priority
	}

	pub fn source(&self) -> OpSource {
		self.origin().source
	}

	pub fn signature(&self) -> &Signature {
		match self {
			Self::Declared(d) => &d.signature,
			Self::Synthetic(s) => &s.signature,
		}
	}

	pub fn params(&self) -> &[Param] {
		match self {
			Self::Declared(d) => &d.params,
			Self::Synthetic(s) => &s.params,
		}
	}

	pub fn declared_hints(&self) -> &Hints {
		match self {
			Self::Declared(d) => &d.declared_hints,
			Self::Synthetic(s) => &s.declared_hints,
		}
	}

	/// Dependencies of the whole chain, innermost first.
	pub fn dependencies(&self) -> Vec<DependencySpec> {
		match self {
			Self::Declared(d) => d.dependencies.to_vec(),
			Self::Synthetic(s) => {
				let mut deps = s.inner.dependencies();
				deps.extend(s.extra_dependencies.iter().cloned());
				deps
			}
		}
	}

	/// Dependencies paired with the transform that introduced them, innermost
	/// first. Declared dependencies carry `None`.
	pub fn layered_dependencies(&self) -> Vec<(Option<TransformTag>, DependencySpec)> {
		match self {
			Self::Declared(d) => d.dependencies.iter().map(|s| (None, s.clone())).collect(),
			Self::Synthetic(s) => {
				let mut deps = s.inner.layered_dependencies();
				deps.extend(s.extra_dependencies.iter().map(|spec| (Some(s.tag), spec.clone())));
				deps
			}
		}
	}

	/// Type-variable bindings fixed by every transform in the chain.
	pub fn fixed_bindings(&self) -> Bindings {
		let mut out = Bindings::new();
		let mut cur = self;
		while let Self::Synthetic(s) = cur {
			out.absorb(&s.bindings);
			cur = &s.inner;
		}
		out
	}

	/// Transform tags, outermost first. Empty for declared descriptors.
	pub fn transform_chain(&self) -> Vec<TransformTag> {
		let mut out = Vec::new();
		let mut cur = self;
		while let Self::Synthetic(s) = cur {
			out.push(s.tag);
			cur = &s.inner;
		}
		out
	}

	/// True if the chain already contains a transform of `category`.
	pub fn has_transform(&self, category: HintCategory) -> bool {
		self.transform_chain().iter().any(|t| t.category() == category)
	}

	pub fn is_synthetic(&self) -> bool {
		matches!(self, Self::Synthetic(_))
	}

	/// The declared descriptor at the bottom of the chain.
	pub fn origin(&self) -> &Arc<OpDescriptor> {
		let mut cur = self;
		loop {
			match cur {
				Self::Declared(d) => return d,
				Self::Synthetic(s) => cur = &s.inner,
			}
		}
	}

	/// Builds the behavior from resolved dependencies.
	pub fn instantiate(&self, deps: &Dependencies) -> Result<Behavior, OpError> {
		match self {
			Self::Declared(d) => (d.factory)(deps),
			Self::Synthetic(s) => {
				let inner = s.inner.instantiate(deps)?;
				(s.wrap)(inner, deps)
			}
		}
	}

	/// Handle identity.
	pub fn ptr_eq(&self, other: &Descriptor) -> bool {
		match (self, other) {
			(Self::Declared(a), Self::Declared(b)) => Arc::ptr_eq(a, b),
			(Self::Synthetic(a), Self::Synthetic(b)) => Arc::ptr_eq(a, b),
			_ => false,
		}
	}

	/// One-line human-readable summary.
	pub fn describe(&self) -> String {
		let mut out = self.signature().to_string();
		if self.priority() != 0 {
			out.push_str(&format!(" [priority {}]", self.priority()));
		}
		let description = self.description();
		if !description.is_empty() {
			out.push_str("\n\t");
			out.push_str(description);
		}
		out
	}
}

impl fmt::Debug for Descriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Descriptor")
			.field("id", self.id())
			.field("signature", &self.signature().to_string())
			.field("priority", &self.priority())
			.finish()
	}
}

impl fmt::Display for Descriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.id())
	}
}

#[cfg(test)]
mod tests;
