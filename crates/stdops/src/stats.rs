use opsmith_primitives::{OpError, Signature, Ty, Value};
use opsmith_registry::{Behavior, DependencySpec, OpDescriptor, Param};

use crate::{SOURCE, items};

fn iterable(arg: Ty) -> Ty {
	Ty::generic("Iterable", [arg])
}

pub fn sum() -> OpDescriptor {
	OpDescriptor::builder(Signature::function(
		"stats.sum",
		[iterable(Ty::var("N"))],
		Ty::named("Double"),
	))
	.id("stats.sum/iterable")
	.description("Sum of the elements.")
	.source(SOURCE)
	.params([Param::required("items")])
	.behavior(Behavior::function(|args| {
		OpError::check_arity(1, args.len())?;
		let total = items(&args[0])?
			.iter()
			.map(Value::number)
			.sum::<Result<f64, OpError>>()?;
		Ok(Value::new(total))
	}))
	.build()
}

pub fn size() -> OpDescriptor {
	OpDescriptor::builder(Signature::function(
		"stats.size",
		[iterable(Ty::Any)],
		Ty::named("Long"),
	))
	.id("stats.size/iterable")
	.description("Number of elements.")
	.source(SOURCE)
	.params([Param::required("items")])
	.behavior(Behavior::function(|args| {
		OpError::check_arity(1, args.len())?;
		let len = items(&args[0])?.len();
		let len = i64::try_from(len).map_err(OpError::failed)?;
		Ok(Value::new(len))
	}))
	.build()
}

/// Arithmetic mean, composed from `sum`, `size`, and `divide`.
pub fn mean() -> OpDescriptor {
	let n = || iterable(Ty::var("N"));
	let o = || Ty::var("O");
	OpDescriptor::builder(Signature::function("stats.mean", [n()], o()))
		.id("stats.mean/iterable")
		.description("Arithmetic mean of the elements.")
		.source(SOURCE)
		.params([Param::required("items")])
		.dependency(DependencySpec::new("sum", Signature::function("stats.sum", [n()], o())))
		.dependency(DependencySpec::new("size", Signature::function("stats.size", [n()], o())))
		.dependency(DependencySpec::new("divide", Signature::function("math.div", [o(), o()], o())))
		.factory(|deps| {
			let sum = deps.require("sum")?.clone();
			let size = deps.require("size")?.clone();
			let divide = deps.require("divide")?.clone();
			Ok(Behavior::function(move |args| {
				OpError::check_arity(1, args.len())?;
				let total = sum.call(args)?;
				let count = size.call(args)?;
				divide.call(&[total, count])
			}))
		})
		.build()
}
