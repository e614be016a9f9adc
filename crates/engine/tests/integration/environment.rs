use std::sync::Arc;

use opsmith_engine::{EngineConfig, OpEnvironment, ResolutionError, TieBreak};
use opsmith_primitives::{Hints, Value, tokens};
use opsmith_registry::{DescriptorSource, DuplicatePolicy, ManualSource, RegistryError};
use pretty_assertions::assert_eq;

use crate::common::{as_f64, constant, env_with, func, init_tracing, std_env};

#[test]
fn test_names_include_aliases() {
	let env = std_env();
	let names = env.names();
	for name in ["math.add", "math.div", "math.divide", "stats.mean", "create", "copy"] {
		assert!(names.iter().any(|n| n == name), "missing {name}");
	}
	let mut sorted = names.clone();
	sorted.sort();
	assert_eq!(names, sorted);
}

#[test]
fn test_infos_and_descriptions() {
	let env = std_env();
	let infos = env.infos("copy");
	let ids: Vec<&str> = infos.iter().map(|d| &**d.id()).collect();
	assert_eq!(ids.len(), 2);
	assert!(ids.contains(&"copy/buffer") && ids.contains(&"copy/double"));

	let descriptions = env.descriptions("math.add");
	assert_eq!(descriptions.len(), 1);
	assert!(descriptions[0].starts_with("math.add(Double, Double) -> Double [priority 1]"));

	assert!(env.infos("nothing").is_empty());
}

/// Descriptors refusing a category in progress are filtered out.
#[test]
fn test_infos_filtered_by_hints() {
	let env = std_env();
	assert_eq!(env.infos_filtered("math.add", &Hints::empty()).len(), 1);
	let refusing = opsmith_registry::OpDescriptor::builder(func("math.add", &["Double", "Double"], "Double"))
		.id("math.add/strict")
		.hint(tokens::ADAPTATION_FORBIDDEN)
		.build();
	env.register(refusing).unwrap();
	assert_eq!(env.infos("math.add").len(), 2);
	let hints = Hints::new([tokens::ADAPTATION_IN_PROGRESS]);
	let ids: Vec<String> = env
		.infos_filtered("math.add", &hints)
		.iter()
		.map(|d| d.id().to_string())
		.collect();
	assert_eq!(ids, vec!["math.add/double".to_string()]);
}

/// Resolving by id skips matching and the cache.
#[test]
fn test_resolve_by_id() {
	let env = std_env();
	let a = env.resolve_by_id("math.div/double", &Hints::empty()).unwrap();
	let b = env.resolve_by_id("math.div/double", &Hints::empty()).unwrap();
	assert!(!Arc::ptr_eq(&a, &b));
	assert!(env.cache().is_empty());
	assert_eq!(&*a.signature().name, "math.div");
	assert_eq!(as_f64(&a.call(&[Value::new(1.0f64), Value::new(4.0f64)]).unwrap()), 0.25);

	let err = env.resolve_by_id("no/such", &Hints::empty()).unwrap_err();
	assert!(matches!(err, ResolutionError::UnknownId(id) if &*id == "no/such"));
}

#[test]
fn test_default_hints_apply_to_resolve_default() {
	let env = std_env();
	let request = func("math.add", &["Integer", "Integer"], "Double");
	assert!(env.resolve_default("math.add", &request).is_ok());

	env.set_default_hints(Hints::new([tokens::SIMPLIFICATION_FORBIDDEN]));
	assert!(env.default_hints().contains(tokens::SIMPLIFICATION_FORBIDDEN));
	assert!(matches!(
		env.resolve_default("math.add", &request),
		Err(ResolutionError::NoStructuralMatch { .. })
	));
	assert!(env.resolve("math.add", &request, &Hints::empty()).is_ok());
}

/// Runtime registration is visible at once and clears the cache.
#[test]
fn test_register_at_runtime() {
	let env = std_env();
	let add = func("math.add", &["Double", "Double"], "Double");
	env.resolve("math.add", &add, &Hints::empty()).unwrap();
	assert_eq!(env.cache().len(), 1);

	let twice = func("twice", &["Double"], "Double");
	let err = env.resolve("twice", &twice, &Hints::empty()).unwrap_err();
	assert!(matches!(err, ResolutionError::NoCandidate { .. }));

	env.register(constant("twice/const", twice.clone(), 2.0)).unwrap();
	assert!(env.cache().is_empty());
	let op = env.resolve("twice", &twice, &Hints::empty()).unwrap();
	assert_eq!(as_f64(&op.call(&[Value::new(0.0f64)]).unwrap()), 2.0);
}

/// Re-registering a known id is rejected under the default policy.
#[test]
fn test_register_duplicate_is_rejected() {
	let env = std_env();
	let err = env.register(opsmith_stdops::add()).unwrap_err();
	assert!(matches!(
		err,
		ResolutionError::Registry(RegistryError::Rejected {
			policy: DuplicatePolicy::FirstWins,
			..
		})
	));
}

/// Sources edited behind the environment's back show up after invalidation.
#[test]
fn test_invalidate_rereads_sources() {
	init_tracing();
	let source = Arc::new(ManualSource::new("late"));
	let env = OpEnvironment::builder()
		.shared_source(Arc::clone(&source) as Arc<dyn DescriptorSource>)
		.build();
	let request = func("late", &["Double"], "Double");
	assert!(env.resolve("late", &request, &Hints::empty()).is_err());

	source.register(constant("late/const", request.clone(), 7.0));
	assert!(env.resolve("late", &request, &Hints::empty()).is_err());

	env.invalidate();
	let late = env.resolve("late", &request, &Hints::empty()).unwrap();
	assert_eq!(as_f64(&late.call(&[Value::new(0.0f64)]).unwrap()), 7.0);
}

/// The duplicate policy decides which of two same-id descriptors survives.
#[test]
fn test_duplicate_policy_across_sources() {
	init_tracing();
	let request = func("dup", &["Double"], "Double");
	let build = |policy: Option<DuplicatePolicy>| {
		let mut builder = OpEnvironment::builder()
			.source(ManualSource::with("first", [constant("dup", request.clone(), 1.0)]))
			.source(ManualSource::with("second", [constant("dup", request.clone(), 2.0)]));
		if let Some(policy) = policy {
			builder = builder.duplicate_policy(policy);
		}
		builder.build()
	};

	for (policy, expected) in [(None, 1.0), (Some(DuplicatePolicy::LastWins), 2.0)] {
		let env = build(policy);
		assert_eq!(env.infos("dup").len(), 1);
		let op = env.resolve("dup", &request, &Hints::empty()).unwrap();
		assert_eq!(as_f64(&op.call(&[Value::new(0.0f64)]).unwrap()), expected);
	}
}

/// Tie-breaking by registration order comes from configuration.
#[test]
fn test_config_first_registered_tie_break() {
	init_tracing();
	let config = EngineConfig::from_toml_str("tie_break = \"first_registered\"").unwrap();
	assert_eq!(config.tie_break, TieBreak::FirstRegistered);

	let request = func("pick", &["Double"], "Double");
	let env = OpEnvironment::builder()
		.source(ManualSource::with(
			"test",
			[
				constant("pick.a", request.clone(), 1.0),
				constant("pick.b", request.clone(), 2.0),
			],
		))
		.config(config)
		.build();
	let pick = env.resolve("pick", &request, &Hints::empty()).unwrap();
	assert_eq!(&**pick.descriptor().id(), "pick.a");
}

/// The global environment sees every linked plugin.
#[test]
fn test_global_collects_plugins() {
	assert!(!opsmith_stdops::descriptors().is_empty());
	let env = opsmith_engine::global();
	assert!(std::ptr::eq(env, opsmith_engine::global()));
	let add = env
		.resolve("math.add", &func("math.add", &["Double", "Double"], "Double"), &Hints::empty())
		.unwrap();
	assert_eq!(as_f64(&add.call(&[Value::new(1.0f64), Value::new(1.5f64)]).unwrap()), 2.5);
}

#[test]
fn test_empty_environment() {
	let env = env_with([]);
	assert!(env.names().is_empty());
	assert!(matches!(
		env.resolve("x", &func("x", &[], "Double"), &Hints::empty()),
		Err(ResolutionError::NoCandidate { .. })
	));
}
