//! Invocable behaviors and the dependency handles passed to factories.

use std::fmt;
use std::sync::Arc;

use opsmith_primitives::{OpError, OpShape, Value};
use rustc_hash::FxHashMap;

/// Body of a function behavior.
pub type FunctionFn = dyn Fn(&[Value]) -> Result<Value, OpError> + Send + Sync;

/// Body of a computer behavior; the second argument is the output container.
pub type ComputerFn = dyn Fn(&[Value], &Value) -> Result<(), OpError> + Send + Sync;

/// Produces a behavior from resolved dependencies.
pub type Factory = Arc<dyn Fn(&Dependencies) -> Result<Behavior, OpError> + Send + Sync>;

/// Wraps an inner behavior into the behavior of a synthetic descriptor.
pub type Wrapper = Arc<dyn Fn(Behavior, &Dependencies) -> Result<Behavior, OpError> + Send + Sync>;

/// A callable operation body, shaped like its signature.
#[derive(Clone)]
pub enum Behavior {
	Function(Arc<FunctionFn>),
	Computer(Arc<ComputerFn>),
}

impl Behavior {
	pub fn function(f: impl Fn(&[Value]) -> Result<Value, OpError> + Send + Sync + 'static) -> Self {
		Self::Function(Arc::new(f))
	}

	pub fn computer(
		f: impl Fn(&[Value], &Value) -> Result<(), OpError> + Send + Sync + 'static,
	) -> Self {
		Self::Computer(Arc::new(f))
	}

	pub fn shape(&self) -> OpShape {
		match self {
			Self::Function(_) => OpShape::Function,
			Self::Computer(_) => OpShape::Computer,
		}
	}

	/// Invokes a function behavior.
	pub fn call(&self, args: &[Value]) -> Result<Value, OpError> {
		match self {
			Self::Function(f) => f(args),
			Self::Computer(_) => Err(OpError::ShapeMismatch {
				actual: "computer",
				requested: "function",
			}),
		}
	}

	/// Invokes a computer behavior, writing into `out`.
	pub fn compute(&self, args: &[Value], out: &Value) -> Result<(), OpError> {
		match self {
			Self::Computer(c) => c(args, out),
			Self::Function(_) => Err(OpError::ShapeMismatch {
				actual: "function",
				requested: "computer",
			}),
		}
	}
}

impl fmt::Debug for Behavior {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Behavior::{}", self.shape())
	}
}

/// Anything a factory can call through a dependency slot.
pub trait Invocable: Send + Sync {
	fn shape(&self) -> OpShape;

	fn call(&self, args: &[Value]) -> Result<Value, OpError>;

	fn compute(&self, args: &[Value], out: &Value) -> Result<(), OpError>;
}

impl Invocable for Behavior {
	fn shape(&self) -> OpShape {
		Behavior::shape(self)
	}

	fn call(&self, args: &[Value]) -> Result<Value, OpError> {
		Behavior::call(self, args)
	}

	fn compute(&self, args: &[Value], out: &Value) -> Result<(), OpError> {
		Behavior::compute(self, args, out)
	}
}

/// Resolved sub-instances keyed by dependency key.
///
/// Optional dependencies that failed to resolve are simply absent.
#[derive(Clone, Default)]
pub struct Dependencies {
	slots: FxHashMap<Arc<str>, Arc<dyn Invocable>>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, key: impl Into<Arc<str>>, dep: Arc<dyn Invocable>) {
		self.slots.insert(key.into(), dep);
	}

	pub fn get(&self, key: &str) -> Option<&Arc<dyn Invocable>> {
		self.slots.get(key)
	}

	/// Returns the dependency under `key` or [`OpError::MissingDependency`].
	pub fn require(&self, key: &str) -> Result<&Arc<dyn Invocable>, OpError> {
		self.slots
			.get(key)
			.ok_or_else(|| OpError::MissingDependency(Arc::from(key)))
	}

	pub fn contains(&self, key: &str) -> bool {
		self.slots.contains_key(key)
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.slots.keys().map(|k| k.as_ref())
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}
}

impl fmt::Debug for Dependencies {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut keys: Vec<&str> = self.keys().collect();
		keys.sort_unstable();
		f.debug_set().entries(keys).finish()
	}
}
