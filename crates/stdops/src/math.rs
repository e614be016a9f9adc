use opsmith_primitives::{OpError, Signature, Ty, Value};
use opsmith_registry::{Behavior, OpDescriptor, Param};

use crate::SOURCE;

fn double() -> Ty {
	Ty::named("Double")
}

fn buffer() -> Ty {
	Ty::generic("Buffer", [double()])
}

fn binary(args: &[Value]) -> Result<(f64, f64), OpError> {
	OpError::check_arity(2, args.len())?;
	Ok((args[0].number()?, args[1].number()?))
}

pub fn add() -> OpDescriptor {
	OpDescriptor::builder(Signature::function("math.add", [double(), double()], double()))
		.id("math.add/double")
		.description("Sum of two doubles.")
		.priority(1)
		.source(SOURCE)
		.params([Param::required("a"), Param::required("b")])
		.behavior(Behavior::function(|args| {
			let (a, b) = binary(args)?;
			Ok(Value::new(a + b))
		}))
		.build()
}

pub fn div() -> OpDescriptor {
	OpDescriptor::builder(Signature::function("math.div", [double(), double()], double()))
		.id("math.div/double")
		.alias("math.divide")
		.description("Quotient of two doubles.")
		.source(SOURCE)
		.params([Param::required("dividend"), Param::required("divisor")])
		.behavior(Behavior::function(|args| {
			let (a, b) = binary(args)?;
			Ok(Value::new(a / b))
		}))
		.build()
}

pub fn log() -> OpDescriptor {
	OpDescriptor::builder(Signature::function("math.log", [double(), double()], double()))
		.id("math.log/double")
		.description("Logarithm; natural when the base is omitted.")
		.source(SOURCE)
		.params([Param::required("value"), Param::optional("base")])
		.behavior(Behavior::function(|args| {
			OpError::check_arity(2, args.len())?;
			let x = args[0].number()?;
			if args[1].is_absent() {
				return Ok(Value::new(x.ln()));
			}
			Ok(Value::new(x.log(args[1].number()?)))
		}))
		.build()
}

/// Raises every element of the input buffer into the output buffer.
pub fn pow() -> OpDescriptor {
	OpDescriptor::builder(Signature::computer("math.pow", [buffer(), double()], buffer()))
		.id("math.pow/buffer")
		.description("Element-wise power, written into the output buffer.")
		.source(SOURCE)
		.params([Param::required("input"), Param::required("exponent")])
		.behavior(Behavior::computer(|args, out| {
			OpError::check_arity(2, args.len())?;
			let src: Vec<f64> = args[0].slot_get()?;
			let exp = args[1].number()?;
			out.with_slot(|dst: &mut Vec<f64>| {
				dst.clear();
				dst.extend(src.iter().map(|x| x.powf(exp)));
			})
		}))
		.build()
}

pub fn scale() -> OpDescriptor {
	OpDescriptor::builder(Signature::function("math.scale", [buffer(), double()], buffer()))
		.id("math.scale/buffer")
		.description("Element-wise product with a factor, as a new buffer.")
		.source(SOURCE)
		.params([Param::required("input"), Param::required("factor")])
		.behavior(Behavior::function(|args| {
			OpError::check_arity(2, args.len())?;
			let factor = args[1].number()?;
			let scaled = args[0].with_slot(|src: &mut Vec<f64>| src.iter().map(|x| x * factor).collect::<Vec<_>>())?;
			Ok(Value::slot(scaled))
		}))
		.build()
}
