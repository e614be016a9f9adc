use std::sync::Arc;

use opsmith_engine::{EngineConfig, OpEnvironment};
use opsmith_primitives::{Hints, Value, tokens};
use opsmith_registry::ManualSource;
use pretty_assertions::assert_eq;

use crate::common::{computer, func, init_tracing, integers, std_env};

/// Only the top-level instance is recorded, not the dependencies it calls.
#[test]
fn test_result_traces_to_top_level_instance() {
	let env = std_env();
	let mean = env
		.resolve(
			"stats.mean",
			&func("stats.mean", &["Iterable<Integer>"], "Double"),
			&Hints::empty(),
		)
		.unwrap();
	assert!(mean.records_history());
	assert!(mean.dependencies().iter().all(|(_, d)| !d.records_history()));

	let out = mean.call(&[integers(1..=4)]).unwrap();
	let producers = env.executions_on(&out);
	assert_eq!(producers.len(), 1);
	assert!(Arc::ptr_eq(&producers[0], &mean));
	assert_eq!(env.history().len(), 1);
}

/// Each write into a container is recorded against that container.
#[test]
fn test_computer_writes_are_recorded() {
	let env = std_env();
	let copy = env
		.resolve("copy", &computer("copy", &["Double"], "Double"), &Hints::empty())
		.unwrap();
	let out = Value::slot(0.0f64);
	copy.compute(&[Value::new(1.0f64)], &out).unwrap();
	copy.compute(&[Value::new(2.0f64)], &out).unwrap();

	let producers = env.executions_on(&out);
	assert_eq!(producers.len(), 2);
	assert!(producers.iter().all(|p| Arc::ptr_eq(p, &copy)));
	assert!(env.executions_on(&Value::slot(0.0f64)).is_empty());
}

#[test]
fn test_skip_recording_hint() {
	let env = std_env();
	let add = env
		.resolve(
			"math.add",
			&func("math.add", &["Double", "Double"], "Double"),
			&Hints::new([tokens::HISTORY_SKIP_RECORDING]),
		)
		.unwrap();
	assert!(!add.records_history());
	let out = add.call(&[Value::new(1.0f64), Value::new(2.0f64)]).unwrap();
	assert!(env.executions_on(&out).is_empty());
	assert!(env.history().is_empty());
}

#[test]
fn test_history_disabled_by_config() {
	init_tracing();
	let env = OpEnvironment::builder()
		.source(ManualSource::with("std", opsmith_stdops::descriptors()))
		.config(EngineConfig {
			record_history: false,
			..Default::default()
		})
		.build();
	let add = env
		.resolve("math.add", &func("math.add", &["Double", "Double"], "Double"), &Hints::empty())
		.unwrap();
	let out = add.call(&[Value::new(1.0f64), Value::new(2.0f64)]).unwrap();
	assert!(env.executions_on(&out).is_empty());
}

/// Dropped values are never reported and disappear on the next sweep.
#[test]
fn test_dead_values_are_swept() {
	let env = std_env();
	let add = env
		.resolve("math.add", &func("math.add", &["Double", "Double"], "Double"), &Hints::empty())
		.unwrap();
	let first = add.call(&[Value::new(1.0f64), Value::new(2.0f64)]).unwrap();
	let weak = first.downgrade();
	drop(first);
	let second = add.call(&[Value::new(3.0f64), Value::new(4.0f64)]).unwrap();
	assert!(!weak.is_alive());
	assert_eq!(env.history().len(), 2);

	env.history().sweep();
	assert_eq!(env.history().len(), 1);
	assert_eq!(env.executions_on(&second).len(), 1);
}

/// Recording many short-lived values keeps the log bounded without explicit sweeps.
#[test]
fn test_log_stays_bounded() {
	let env = std_env();
	let add = env
		.resolve("math.add", &func("math.add", &["Double", "Double"], "Double"), &Hints::empty())
		.unwrap();
	for i in 0..1000 {
		let out = add.call(&[Value::new(f64::from(i)), Value::new(1.0f64)]).unwrap();
		assert_eq!(env.executions_on(&out).len(), 1);
	}
	assert!(env.history().len() <= 128, "history grew to {}", env.history().len());
}

/// The dependency tree renders one instance per line, indented by depth.
#[test]
fn test_chain_rendering() {
	let env = std_env();
	let mean = env
		.resolve(
			"stats.mean",
			&func("stats.mean", &["Iterable<Integer>"], "Double"),
			&Hints::empty(),
		)
		.unwrap();
	let chain = mean.chain();
	let lines: Vec<&str> = chain.lines().collect();
	assert_eq!(lines.len(), 4);
	assert_eq!(lines[0], "stats.mean(Iterable<Integer>) -> Double <stats.mean/iterable>");
	assert!(lines[1].starts_with("\tsum: stats.sum(Iterable<Integer>) -> Double"));
	assert!(lines[2].starts_with("\tsize: "));
	assert_eq!(lines[3], "\tdivide: math.div(Double, Double) -> Double <math.div/double>");
}
