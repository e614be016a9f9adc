//! Standard leaf and composite operations.
//!
//! Linking this crate registers every operation below with
//! [`opsmith_registry::InventorySource`]. Runtime values follow the engine's
//! conventions: `Double` is `f64`, `Long` is `i64`, `Iterable<T>` is a
//! `Vec<Value>` or `Box<[Value]>`, and `Buffer<Double>` is a
//! [`Slot<Vec<f64>>`](opsmith_primitives::Slot).
//!
//! | name | signature |
//! |------|-----------|
//! | `math.add` | `(Double, Double) -> Double`, priority 1 |
//! | `math.div` | `(Double, Double) -> Double` |
//! | `math.log` | `(Double, Double?) -> Double`, base defaults to e |
//! | `math.pow` | computer `(Buffer<Double>, Double) -> Buffer<Double>` |
//! | `math.scale` | `(Buffer<Double>, Double) -> Buffer<Double>` |
//! | `stats.sum` | `(Iterable<N>) -> Double` |
//! | `stats.size` | `(Iterable<?>) -> Long` |
//! | `stats.mean` | `(Iterable<N>) -> O`, via `sum`, `size`, `divide` |
//! | `create` | `(Buffer<N>) -> Buffer<N>` |
//! | `copy` | computers `(Buffer<N>) -> Buffer<N>` and `(Double) -> Double` |

mod buffer;
mod math;
mod stats;

use opsmith_primitives::{OpError, Value};
use opsmith_registry::{OpDescriptor, OpPlugin, OpSource};

pub use self::buffer::{copy_buffer, copy_double, create_buffer};
pub use self::math::{add, div, log, pow, scale};
pub use self::stats::{mean, size, sum};

pub(crate) const SOURCE: OpSource = OpSource::Crate(env!("CARGO_PKG_NAME"));

/// Every operation this crate provides.
pub fn descriptors() -> Vec<OpDescriptor> {
	vec![
		add(),
		div(),
		log(),
		pow(),
		scale(),
		sum(),
		size(),
		mean(),
		create_buffer(),
		copy_buffer(),
		copy_double(),
	]
}

fn register(out: &mut Vec<OpDescriptor>) {
	out.extend(descriptors());
}

opsmith_registry::inventory::submit! {
	OpPlugin::new(env!("CARGO_PKG_NAME"), register)
}

/// Elements of an `Iterable` argument.
pub(crate) fn items(value: &Value) -> Result<&[Value], OpError> {
	if let Some(list) = value.downcast_ref::<Vec<Value>>() {
		return Ok(list);
	}
	value
		.downcast_ref::<Box<[Value]>>()
		.map(|b| &**b)
		.ok_or(OpError::TypeMismatch {
			expected: "Vec<Value> or Box<[Value]>",
		})
}
