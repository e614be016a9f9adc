use opsmith_engine::{EngineConfig, OpEnvironment, ResolutionError};
use opsmith_primitives::{Hints, Value, tokens};
use opsmith_registry::{ManualSource, TransformTag};
use pretty_assertions::assert_eq;

use crate::common::{as_f64, computer, func, init_tracing, integers, std_env};

/// `math.log` called without its base falls back to the natural log.
#[test]
fn test_reduction_omits_base() {
	let env = std_env();
	let log = env
		.resolve("math.log", &func("math.log", &["Double"], "Double"), &Hints::empty())
		.unwrap();
	assert_eq!(&**log.descriptor().id(), "|Reduction:1|Original:math.log/double");
	assert_eq!(log.descriptor().transform_chain(), vec![TransformTag::Reduction { dropped: 1 }]);
	assert_eq!(as_f64(&log.call(&[Value::new(1.0f64)]).unwrap()), 0.0);
}

/// Reduction and simplification stack on one candidate.
#[test]
fn test_reduction_then_simplification() {
	let env = std_env();
	let log = env
		.resolve("math.log", &func("math.log", &["Integer"], "Double"), &Hints::empty())
		.unwrap();
	assert_eq!(
		&**log.descriptor().id(),
		"|Simplification:1|Reduction:1|Original:math.log/double"
	);
	assert_eq!(as_f64(&log.call(&[Value::new(1i32)]).unwrap()), 0.0);
}

/// The computer `math.pow` serves a function request through `create`.
#[test]
fn test_pow_as_function() {
	let env = std_env();
	let pow = env
		.resolve(
			"math.pow",
			&func("math.pow", &["Buffer<Double>", "Double"], "Buffer<Double>"),
			&Hints::empty(),
		)
		.unwrap();
	let create = pow.dependency("adapt.create").unwrap();
	assert_eq!(&**create.descriptor().id(), "create/buffer");
	assert!(create.hints().contains(tokens::ADAPTATION_IN_PROGRESS));

	let input = Value::slot(vec![1.0f64, 2.0, 3.0]);
	let out = pow.call(&[input.clone(), Value::new(3.0f64)]).unwrap();
	assert!(!out.ptr_eq(&input));
	assert_eq!(out.slot_get::<Vec<f64>>().unwrap(), vec![1.0, 8.0, 27.0]);
	assert_eq!(input.slot_get::<Vec<f64>>().unwrap(), vec![1.0, 2.0, 3.0]);
}

/// The function `math.scale` serves a computer request through `copy`.
#[test]
fn test_scale_as_computer() {
	let env = std_env();
	let scale = env
		.resolve(
			"math.scale",
			&computer("math.scale", &["Buffer<Double>", "Double"], "Buffer<Double>"),
			&Hints::empty(),
		)
		.unwrap();
	assert_eq!(&**scale.dependency("adapt.copy").unwrap().descriptor().id(), "copy/buffer");

	let out = Value::slot(Vec::<f64>::new());
	scale
		.compute(&[Value::slot(vec![1.0f64, -2.0]), Value::new(0.5f64)], &out)
		.unwrap();
	assert_eq!(out.slot_get::<Vec<f64>>().unwrap(), vec![0.5, -1.0]);
}

/// Integer inputs reach `math.add` through widening.
#[test]
fn test_add_integers() {
	let env = std_env();
	let add = env
		.resolve("math.add", &func("math.add", &["Integer", "Integer"], "Double"), &Hints::empty())
		.unwrap();
	assert_eq!(&**add.descriptor().id(), "|Simplification:2|Original:math.add/double");
	assert_eq!(as_f64(&add.call(&[Value::new(2i32), Value::new(3i32)]).unwrap()), 5.0);

	let err = env
		.resolve(
			"math.add",
			&func("math.add", &["Integer", "Integer"], "Double"),
			&Hints::new([tokens::SIMPLIFICATION_FORBIDDEN]),
		)
		.unwrap_err();
	assert!(matches!(err, ResolutionError::NoStructuralMatch { .. }));
}

/// `stats.size` reports a Long; a Double request converts the result.
#[test]
fn test_size_output_widened() {
	let env = std_env();
	let size = env
		.resolve("stats.size", &func("stats.size", &["List<Integer>"], "Double"), &Hints::empty())
		.unwrap();
	assert_eq!(as_f64(&size.call(&[integers([4, 5, 6])]).unwrap()), 3.0);
}

/// Disabled categories are never tried, whatever the hints say.
#[test]
fn test_config_disables_categories() {
	init_tracing();
	let config = EngineConfig::from_toml_str(
		r#"
		[transforms]
		reduction = false
		"#,
	)
	.unwrap();
	let env = OpEnvironment::builder()
		.source(ManualSource::with("std", opsmith_stdops::descriptors()))
		.config(config)
		.build();

	let err = env
		.resolve("math.log", &func("math.log", &["Double"], "Double"), &Hints::empty())
		.unwrap_err();
	assert!(matches!(err, ResolutionError::NoStructuralMatch { .. }));
	assert!(
		env.resolve("math.add", &func("math.add", &["Integer", "Integer"], "Double"), &Hints::empty())
			.is_ok()
	);
}

/// Forbidding adaptation by hint leaves a shape mismatch unresolvable.
#[test]
fn test_adaptation_forbidden_by_hint() {
	let env = std_env();
	let err = env
		.resolve(
			"math.pow",
			&func("math.pow", &["Buffer<Double>", "Double"], "Buffer<Double>"),
			&Hints::new([tokens::ADAPTATION_FORBIDDEN]),
		)
		.unwrap_err();
	assert!(matches!(err, ResolutionError::NoStructuralMatch { candidates: 1, .. }));
}
