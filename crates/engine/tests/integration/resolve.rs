use std::sync::Arc;

use opsmith_engine::{MatchingConditions, ResolutionError};
use opsmith_primitives::{Hints, Value, tokens};
use opsmith_registry::{Behavior, DependencySpec, OpDescriptor};
use pretty_assertions::assert_eq;

use crate::common::{as_f64, constant, env_with, func, integers, std_env};

/// A request shaped exactly like a descriptor is built from that descriptor.
#[test]
fn test_direct_match_identity() {
	let env = std_env();
	let request = func("math.add", &["Double", "Double"], "Double");
	let add = env.resolve("math.add", &request, &Hints::empty()).unwrap();

	assert_eq!(&**add.descriptor().id(), "math.add/double");
	assert!(!add.descriptor().is_synthetic());
	assert_eq!(add.signature(), &request);
	let out = add.call(&[Value::new(2.0f64), Value::new(3.0f64)]).unwrap();
	assert_eq!(as_f64(&out), 5.0);
}

/// Every standard operation resolves by its own names and signature to itself.
#[test]
fn test_every_descriptor_resolves_by_own_signature() {
	let env = std_env();
	for descriptor in opsmith_stdops::descriptors() {
		for name in descriptor.names.iter() {
			let op = env
				.resolve(name, &descriptor.signature, &Hints::empty())
				.unwrap_or_else(|e| panic!("{} under {name}: {e}", descriptor.id));
			assert_eq!(op.descriptor().id(), &descriptor.id);
			assert!(!op.descriptor().is_synthetic());
		}
	}
}

/// A generic composite resolved by its own signature still runs once given data.
#[test]
fn test_generic_mean_by_own_signature() {
	let env = std_env();
	let mean = opsmith_stdops::mean();
	let op = env.resolve("stats.mean", &mean.signature, &Hints::empty()).unwrap();
	let divide = op.dependency("divide").unwrap();
	assert_eq!(&**divide.descriptor().id(), "math.div/double");
	assert_eq!(divide.signature().to_string(), "math.div(O, O) -> O");
	assert_eq!(as_f64(&op.call(&[integers([1, 2, 3, 6])]).unwrap()), 3.0);
}

/// The name argument wins over the signature's own name.
#[test]
fn test_resolve_renames_request() {
	let env = std_env();
	let request = func("ignored", &["Double", "Double"], "Double");
	let div = env.resolve("math.divide", &request, &Hints::empty()).unwrap();
	assert_eq!(&**div.descriptor().id(), "math.div/double");
	assert_eq!(&*div.signature().name, "math.divide");
}

#[test]
fn test_unknown_name_has_no_candidate() {
	let env = std_env();
	let err = env
		.resolve("math.nope", &func("math.nope", &["Double"], "Double"), &Hints::empty())
		.unwrap_err();
	assert!(matches!(err, ResolutionError::NoCandidate { name } if &*name == "math.nope"));
}

/// Identical requests return the same instance.
#[test]
fn test_identical_requests_share_instance() {
	let env = std_env();
	let request = func("math.add", &["Double", "Double"], "Double");
	let a = env.resolve("math.add", &request, &Hints::empty()).unwrap();
	let b = env.resolve("math.add", &request, &Hints::empty()).unwrap();
	assert!(Arc::ptr_eq(&a, &b));
	assert_eq!(env.cache().len(), 1);
}

/// Racing resolutions of one request all receive the first published instance.
#[test]
fn test_concurrent_resolution_shares_instance() {
	let env = std_env();
	let request = func("stats.mean", &["Iterable<Integer>"], "Double");
	let (env, request) = (&env, &request);
	let instances: Vec<_> = std::thread::scope(|s| {
		let handles: Vec<_> = (0..8)
			.map(|_| s.spawn(move || env.resolve("stats.mean", request, &Hints::empty()).unwrap()))
			.collect();
		handles.into_iter().map(|h| h.join().unwrap()).collect()
	});
	for instance in &instances[1..] {
		assert!(Arc::ptr_eq(&instances[0], instance));
	}
	let again = env.resolve("stats.mean", request, &Hints::empty()).unwrap();
	assert!(Arc::ptr_eq(&instances[0], &again));
}

/// Hints are part of the cache key.
#[test]
fn test_hints_partition_the_cache() {
	let env = std_env();
	let request = func("math.add", &["Double", "Double"], "Double");
	let plain = env.resolve("math.add", &request, &Hints::empty()).unwrap();
	let hinted = env
		.resolve("math.add", &request, &Hints::new([tokens::HISTORY_SKIP_RECORDING]))
		.unwrap();
	assert!(!Arc::ptr_eq(&plain, &hinted));
	assert!(plain.descriptor().ptr_eq(hinted.descriptor()));
}

/// Equal fit and equal priority is ambiguous; a higher priority settles it.
#[test]
fn test_ambiguity_and_priority() {
	let request = func("pick", &["Double"], "Double");
	let env = env_with([
		constant("pick.a", request.clone(), 1.0),
		constant("pick.b", request.clone(), 2.0),
	]);
	let err = env.resolve("pick", &request, &Hints::empty()).unwrap_err();
	match err {
		ResolutionError::AmbiguousMatch { candidates, .. } => assert_eq!(candidates.len(), 2),
		other => panic!("expected ambiguity, got {other}"),
	}

	let mut preferred = constant("pick.b", request.clone(), 2.0);
	preferred.priority = 10;
	let env = env_with([constant("pick.a", request.clone(), 1.0), preferred]);
	let pick = env.resolve("pick", &request, &Hints::empty()).unwrap();
	assert_eq!(&**pick.descriptor().id(), "pick.b");
	assert_eq!(as_f64(&pick.call(&[Value::new(0.0f64)]).unwrap()), 2.0);
}

/// Implementations declared without an id never shadow each other.
#[test]
fn test_anonymous_implementations_are_ambiguous() {
	let request = func("pick", &["Double"], "Double");
	let anonymous = |value: f64| {
		OpDescriptor::builder(request.clone())
			.behavior(Behavior::function(move |_| Ok(Value::new(value))))
			.build()
	};
	let env = env_with([anonymous(1.0), anonymous(2.0)]);
	assert_eq!(env.infos("pick").len(), 2);
	let err = env.resolve("pick", &request, &Hints::empty()).unwrap_err();
	assert!(matches!(err, ResolutionError::AmbiguousMatch { candidates, .. } if candidates.len() == 2));

	env.register(anonymous(3.0)).unwrap();
	assert_eq!(env.infos("pick").len(), 3);
}

/// Mutually dependent descriptors fail with a cycle instead of recursing.
#[test]
fn test_dependency_cycle_fails_fast() {
	let a = OpDescriptor::builder(func("a", &["Double"], "Double"))
		.dependency(DependencySpec::new("b", func("b", &["Double"], "Double")))
		.behavior(Behavior::function(|args| Ok(args[0].clone())))
		.build();
	let b = OpDescriptor::builder(func("b", &["Double"], "Double"))
		.dependency(DependencySpec::new("a", func("a", &["Double"], "Double")))
		.behavior(Behavior::function(|args| Ok(args[0].clone())))
		.build();
	let env = env_with([a, b]);

	let err = env
		.resolve("a", &func("a", &["Double"], "Double"), &Hints::empty())
		.unwrap_err();
	match err {
		ResolutionError::CyclicDependency { path } => {
			assert_eq!(
				path,
				vec!["a(Double) -> Double", "b(Double) -> Double", "a(Double) -> Double"]
			);
		}
		other => panic!("expected a cycle, got {other}"),
	}
	assert!(env.cache().is_empty());
}

/// The composite mean resolves `sum`, `size` (through Long -> Double), and `divide`.
#[test]
fn test_mean_of_one_to_ten() {
	let env = std_env();
	let mean = env
		.resolve(
			"stats.mean",
			&func("stats.mean", &["Iterable<Integer>"], "Double"),
			&Hints::empty(),
		)
		.unwrap();
	let out = mean.call(&[integers(1..=10)]).unwrap();
	assert_eq!(as_f64(&out), 5.5);

	let keys: Vec<&str> = mean.dependencies().iter().map(|(k, _)| &**k).collect();
	assert_eq!(keys, vec!["sum", "size", "divide"]);
	let size = mean.dependency("size").unwrap();
	assert_eq!(&**size.descriptor().id(), "|Simplification:2|Original:stats.size/iterable");
	assert!(size.hints().contains(tokens::DEPENDENCY_MATCHING_IN_PROGRESS));
}

/// Without `math.div` the mean fails, naming the `divide` dependency.
#[test]
fn test_mean_without_divide() {
	let env = env_with(
		opsmith_stdops::descriptors()
			.into_iter()
			.filter(|d| &*d.id != "math.div/double"),
	);
	let err = env
		.resolve(
			"stats.mean",
			&func("stats.mean", &["Iterable<Integer>"], "Double"),
			&Hints::empty(),
		)
		.unwrap_err();
	match &err {
		ResolutionError::DependencyResolutionFailed {
			owner,
			dependency,
			request,
			..
		} => {
			assert_eq!(&**owner, "stats.mean/iterable");
			assert_eq!(&**dependency, "divide");
			assert_eq!(request.to_string(), "math.div(Double, Double) -> Double");
		}
		other => panic!("expected a dependency failure, got {other}"),
	}
	assert!(matches!(err.root_cause(), ResolutionError::NoCandidate { .. }));
	assert_eq!(err.dependency_path(), vec!["divide"]);
}

/// A failed request leaves no cache entry; registering the missing op fixes it.
#[test]
fn test_failed_dependency_is_not_cached() {
	let env = env_with(
		opsmith_stdops::descriptors()
			.into_iter()
			.filter(|d| &*d.id != "math.div/double"),
	);
	let request = func("stats.mean", &["Iterable<Integer>"], "Double");
	assert!(env.resolve("stats.mean", &request, &Hints::empty()).is_err());
	let key = MatchingConditions::new(request.clone(), Hints::empty());
	assert!(env.cache().get(&key).is_none());

	env.register(opsmith_stdops::div()).unwrap();
	let mean = env.resolve("stats.mean", &request, &Hints::empty()).unwrap();
	assert_eq!(as_f64(&mean.call(&[integers([2, 4])]).unwrap()), 3.0);
	assert!(env.cache().get(&key).is_some());
}

/// Optional dependencies that cannot be resolved leave their slot empty.
#[test]
fn test_optional_dependency_may_be_missing() {
	let op = OpDescriptor::builder(func("f", &["Double"], "Double"))
		.dependency(DependencySpec::new("helper", func("missing", &["Double"], "Double")).optional())
		.factory(|deps| {
			let fallback = !deps.contains("helper");
			Ok(Behavior::function(move |_| Ok(Value::new(fallback))))
		})
		.build();
	let env = env_with([op]);
	let f = env
		.resolve("f", &func("f", &["Double"], "Double"), &Hints::empty())
		.unwrap();
	assert!(f.dependencies().is_empty());
	let out = f.call(&[Value::new(1.0f64)]).unwrap();
	assert_eq!(out.downcast_ref::<bool>(), Some(&true));
}

/// A non-adaptable dependency is resolved with adaptation forbidden.
#[test]
fn test_non_adaptable_dependency() {
	let user = |adaptable: bool| {
		let mut spec = DependencySpec::new(
			"pow",
			func("math.pow", &["Buffer<Double>", "Double"], "Buffer<Double>"),
		);
		if !adaptable {
			spec = spec.non_adaptable();
		}
		OpDescriptor::builder(func("user", &["Double"], "Double"))
			.id(if adaptable { "user.adaptable" } else { "user.strict" })
			.dependency(spec)
			.behavior(Behavior::function(|args| Ok(args[0].clone())))
			.build()
	};

	let env = env_with(opsmith_stdops::descriptors().into_iter().chain([user(true)]));
	assert!(
		env.resolve("user", &func("user", &["Double"], "Double"), &Hints::empty())
			.is_ok()
	);

	let env = env_with(opsmith_stdops::descriptors().into_iter().chain([user(false)]));
	let err = env
		.resolve("user", &func("user", &["Double"], "Double"), &Hints::empty())
		.unwrap_err();
	assert!(matches!(
		err.root_cause(),
		ResolutionError::NoStructuralMatch { .. }
	));
}

/// Lookups follow the configured depth limit.
#[test]
fn test_depth_limit_reports_cycle() {
	let chain: Vec<OpDescriptor> = (0..4)
		.map(|i| {
			let mut b = OpDescriptor::builder(func(&format!("step{i}"), &["Double"], "Double"))
				.behavior(Behavior::function(|args| Ok(args[0].clone())));
			if i < 3 {
				let next = format!("step{}", i + 1);
				b = b.dependency(DependencySpec::new("next", func(&next, &["Double"], "Double")));
			}
			b.build()
		})
		.collect();

	let env = env_with(chain.clone());
	assert!(
		env.resolve("step0", &func("step0", &["Double"], "Double"), &Hints::empty())
			.is_ok()
	);

	let env = opsmith_engine::OpEnvironment::builder()
		.source(opsmith_registry::ManualSource::with("test", chain))
		.config(opsmith_engine::EngineConfig {
			max_depth: 2,
			..Default::default()
		})
		.build();
	let err = env
		.resolve("step0", &func("step0", &["Double"], "Double"), &Hints::empty())
		.unwrap_err();
	assert!(matches!(err, ResolutionError::CyclicDependency { .. }));
}
