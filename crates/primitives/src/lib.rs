//! Core vocabulary for operation resolution: type descriptors, signatures,
//! hints, and dynamically typed values.

/// Operation-level errors raised by behaviors.
pub mod error;
/// Immutable preference sets steering resolution.
pub mod hints;
/// Request and descriptor call shapes.
pub mod signature;
/// Type descriptors.
pub mod ty;
/// The type service abstraction and its standard implementation.
pub mod types;
/// Type-erased values passed to and returned from behaviors.
pub mod value;

pub use error::OpError;
pub use hints::{HintCategory, Hints, tokens};
pub use signature::{OpShape, Signature};
pub use ty::{Ty, TyParseError};
pub use types::{Bindings, OBJECT, StandardTypes, TypeService, WILDCARD_COST, substitute_vars};
pub use value::{Absent, Slot, Value, WeakValue};
