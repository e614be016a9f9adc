//! Shared fixtures for engine integration tests.

use opsmith_engine::OpEnvironment;
use opsmith_primitives::{Signature, Ty, Value};
use opsmith_registry::{Behavior, ManualSource, OpDescriptor};
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

pub fn ty(s: &str) -> Ty {
	Ty::parse(s).unwrap()
}

pub fn func(name: &str, inputs: &[&str], output: &str) -> Signature {
	Signature::function(name, inputs.iter().map(|s| ty(s)), ty(output))
}

pub fn computer(name: &str, inputs: &[&str], output: &str) -> Signature {
	Signature::computer(name, inputs.iter().map(|s| ty(s)), ty(output))
}

/// An environment over exactly `descriptors`.
pub fn env_with(descriptors: impl IntoIterator<Item = OpDescriptor>) -> OpEnvironment {
	init_tracing();
	OpEnvironment::builder()
		.source(ManualSource::with("test", descriptors))
		.build()
}

/// An environment over the standard operations.
pub fn std_env() -> OpEnvironment {
	env_with(opsmith_stdops::descriptors())
}

/// A function descriptor that ignores its inputs and returns `value`.
pub fn constant(id: &str, sig: Signature, value: f64) -> OpDescriptor {
	OpDescriptor::builder(sig)
		.id(id)
		.behavior(Behavior::function(move |_| Ok(Value::new(value))))
		.build()
}

/// `Iterable<Integer>` holding `xs`.
pub fn integers(xs: impl IntoIterator<Item = i32>) -> Value {
	Value::new(xs.into_iter().map(Value::new).collect::<Vec<_>>())
}

pub fn as_f64(v: &Value) -> f64 {
	*v.downcast_ref::<f64>().unwrap()
}
