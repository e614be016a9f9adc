use opsmith_primitives::{OpError, Signature, Ty, Value};
use opsmith_registry::{Behavior, OpDescriptor, Param};

use crate::SOURCE;

fn buffer() -> Ty {
	Ty::generic("Buffer", [Ty::var("N")])
}

/// Allocates a zeroed buffer the size of its argument.
pub fn create_buffer() -> OpDescriptor {
	OpDescriptor::builder(Signature::function("create", [buffer()], buffer()))
		.id("create/buffer")
		.description("Zeroed buffer shaped like the input.")
		.source(SOURCE)
		.params([Param::required("like")])
		.behavior(Behavior::function(|args| {
			OpError::check_arity(1, args.len())?;
			let len = args[0].with_slot(|v: &mut Vec<f64>| v.len())?;
			Ok(Value::slot(vec![0.0f64; len]))
		}))
		.build()
}

pub fn copy_buffer() -> OpDescriptor {
	OpDescriptor::builder(Signature::computer("copy", [buffer()], buffer()))
		.id("copy/buffer")
		.description("Copies a buffer into the output buffer.")
		.source(SOURCE)
		.params([Param::required("source")])
		.behavior(Behavior::computer(|args, out| {
			OpError::check_arity(1, args.len())?;
			if args[0].ptr_eq(out) {
				return Ok(());
			}
			let src: Vec<f64> = args[0].slot_get()?;
			out.with_slot(|dst: &mut Vec<f64>| {
				dst.clear();
				dst.extend_from_slice(&src);
			})
		}))
		.build()
}

pub fn copy_double() -> OpDescriptor {
	let double = || Ty::named("Double");
	OpDescriptor::builder(Signature::computer("copy", [double()], double()))
		.id("copy/double")
		.description("Writes a double into a double slot.")
		.source(SOURCE)
		.params([Param::required("source")])
		.behavior(Behavior::computer(|args, out| {
			OpError::check_arity(1, args.len())?;
			let v = args[0].number()?;
			out.with_slot(|dst: &mut f64| *dst = v)
		}))
		.build()
}
