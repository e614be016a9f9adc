use std::sync::Arc;

use opsmith_primitives::{Hints, OpShape, Signature, Ty, Value, tokens};
use pretty_assertions::assert_eq;

use super::*;

fn ty(s: &str) -> Ty {
	Ty::parse(s).unwrap()
}

fn add() -> OpDescriptor {
	OpDescriptor::builder(Signature::function(
		"math.add",
		[ty("Double"), ty("Double")],
		ty("Double"),
	))
	.id("math.add/double")
	.alias("add")
	.priority(1)
	.description("Sums two doubles")
	.behavior(Behavior::function(|args| {
		Ok(Value::new(args[0].number()? + args[1].number()?))
	}))
	.build()
}

fn passthrough() -> Wrapper {
	Arc::new(|inner: Behavior, _: &Dependencies| -> Result<Behavior, OpError> { Ok(inner) })
}

/// Names start with the signature name; parameters default to required `inN`.
#[test]
fn test_builder_defaults() {
	let d = add();
	assert_eq!(d.name(), "math.add");
	assert_eq!(d.names.len(), 2);
	assert_eq!(
		d.params.iter().map(|p| &*p.name).collect::<Vec<_>>(),
		vec!["in0", "in1"]
	);
	assert!(d.params.iter().all(|p| !p.optional));
}

/// Descriptors built without an id get distinct ids derived from the signature.
#[test]
fn test_anonymous_ids_are_unique() {
	let sig = Signature::function("math.add", [ty("Double"), ty("Double")], ty("Double"));
	let a = OpDescriptor::builder(sig.clone()).build();
	let b = OpDescriptor::builder(sig).build();
	assert!(a.id.starts_with("math.add(Double, Double) -> Double#"));
	assert!(b.id.starts_with("math.add(Double, Double) -> Double#"));
	assert_ne!(a.id, b.id);
}

/// A descriptor without a behavior fails at instantiation, not at declaration.
#[test]
fn test_missing_behavior_fails_on_instantiate() {
	let d: Descriptor = OpDescriptor::builder(Signature::function("noop", [], ty("Unit")))
		.build()
		.into();
	assert!(d.instantiate(&Dependencies::new()).is_err());
}

#[test]
fn test_synthetic_delegates_identity() {
	let inner: Descriptor = add().into();
	let narrowed = Signature::function("math.add", [ty("Integer"), ty("Integer")], ty("Double"));
	let synth: Descriptor = SyntheticDescriptor::new(
		inner.clone(),
		TransformTag::Simplification { loss: 2 },
		narrowed.clone(),
		inner.params().to_vec(),
		[],
		Bindings::new(),
		passthrough(),
	)
	.into();

	assert_eq!(synth.names(), inner.names());
	assert_eq!(synth.priority(), 1);
	assert_eq!(synth.description(), "Sums two doubles");
	assert_eq!(synth.signature(), &narrowed);
	assert!(Arc::ptr_eq(synth.origin(), inner.origin()));
	assert_eq!(
		&**synth.id(),
		"|Simplification:2|Original:math.add/double"
	);
}

#[test]
fn test_synthetic_forbids_own_category() {
	let inner: Descriptor = add().into();
	let synth: Descriptor = SyntheticDescriptor::new(
		inner.clone(),
		TransformTag::Reduction { dropped: 1 },
		inner.signature().with_inputs([ty("Double")]),
		[Param::required("in0")],
		[],
		Bindings::new(),
		passthrough(),
	)
	.into();
	assert!(synth.declared_hints().contains(tokens::REDUCTION_FORBIDDEN));
	assert!(!inner.declared_hints().contains(tokens::REDUCTION_FORBIDDEN));
}

/// Chains render outermost first and accumulate extra dependencies.
#[test]
fn test_transform_chain_and_dependencies() {
	let inner: Descriptor = add().into();
	let computer = inner.signature().with_shape(OpShape::Computer);
	let copy = DependencySpec::new(
		"adapt.copy",
		Signature::computer("copy", [ty("Double")], ty("Double")),
	);
	let adapted: Descriptor = SyntheticDescriptor::new(
		inner.clone(),
		TransformTag::Adaptation {
			from: OpShape::Function,
			to: OpShape::Computer,
		},
		computer.clone(),
		inner.params().to_vec(),
		[copy.clone()],
		Bindings::new(),
		passthrough(),
	)
	.into();
	let reduced: Descriptor = SyntheticDescriptor::new(
		adapted.clone(),
		TransformTag::Reduction { dropped: 1 },
		computer.with_inputs([ty("Double")]),
		[Param::required("in0")],
		[],
		Bindings::new(),
		passthrough(),
	)
	.into();

	assert_eq!(
		reduced.transform_chain(),
		vec![
			TransformTag::Reduction { dropped: 1 },
			TransformTag::Adaptation {
				from: OpShape::Function,
				to: OpShape::Computer
			},
		]
	);
	assert_eq!(
		&**reduced.id(),
		"|Reduction:1|Adaptation:function->computer|Original:math.add/double"
	);
	assert_eq!(reduced.dependencies(), vec![copy]);
	assert!(reduced.has_transform(HintCategory::Adaptation));
	assert!(!reduced.has_transform(HintCategory::Simplification));
	assert_eq!(reduced.declared_hints(), &Hints::new([
		tokens::ADAPTATION_FORBIDDEN,
		tokens::REDUCTION_FORBIDDEN
	]));
}

#[test]
fn test_instantiate_runs_inner_factory() {
	let d: Descriptor = add().into();
	let b = d.instantiate(&Dependencies::new()).unwrap();
	let out = b.call(&[Value::new(2.0_f64), Value::new(3.0_f64)]).unwrap();
	assert_eq!(out.as_f64(), Some(5.0));
	assert!(b.compute(&[], &Value::slot(0.0_f64)).is_err());
}
