use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::OpError;

/// Type-erased, shared value passed to and returned from behaviors.
///
/// Identity is the address of the shared allocation, so clones of one `Value`
/// are the same value for provenance purposes.
#[derive(Clone)]
pub struct Value(Arc<dyn Any + Send + Sync>);

/// Marker stored by [`Value::absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Absent;

/// Mutable output container written by computers.
#[derive(Debug, Default)]
pub struct Slot<T>(Mutex<T>);

impl Value {
	pub fn new<T: Any + Send + Sync>(value: T) -> Self {
		Self(Arc::new(value))
	}

	/// Placeholder passed for an omitted optional parameter.
	pub fn absent() -> Self {
		Self::new(Absent)
	}

	pub fn is_absent(&self) -> bool {
		self.0.is::<Absent>()
	}

	/// Wraps `init` in a [`Slot`] so a computer can write into it.
	pub fn slot<T: Any + Send + Sync>(init: T) -> Self {
		Self::new(Slot(Mutex::new(init)))
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref::<T>()
	}

	pub fn is<T: Any>(&self) -> bool {
		self.0.is::<T>()
	}

	/// Borrows the payload as `T` or reports a type mismatch.
	pub fn expect_ref<T: Any>(&self) -> Result<&T, OpError> {
		self.downcast_ref::<T>().ok_or(OpError::TypeMismatch {
			expected: type_name::<T>(),
		})
	}

	/// Runs `f` against the contents of a [`Slot<T>`].
	pub fn with_slot<T: Any + Send + Sync, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, OpError> {
		let slot = self.expect_ref::<Slot<T>>()?;
		Ok(f(&mut slot.0.lock()))
	}

	/// Copies the contents out of a [`Slot<T>`].
	pub fn slot_get<T: Any + Send + Sync + Clone>(&self) -> Result<T, OpError> {
		self.with_slot(|v: &mut T| v.clone())
	}

	/// Reads any primitive numeric payload as `f64`.
	pub fn as_f64(&self) -> Option<f64> {
		let v = &*self.0;
		if let Some(x) = v.downcast_ref::<f64>() {
			Some(*x)
		} else if let Some(x) = v.downcast_ref::<f32>() {
			Some(f64::from(*x))
		} else if let Some(x) = v.downcast_ref::<i64>() {
			Some(*x as f64)
		} else if let Some(x) = v.downcast_ref::<i32>() {
			Some(f64::from(*x))
		} else if let Some(x) = v.downcast_ref::<i16>() {
			Some(f64::from(*x))
		} else if let Some(x) = v.downcast_ref::<i8>() {
			Some(f64::from(*x))
		} else {
			v.downcast_ref::<usize>().map(|x| *x as f64)
		}
	}

	/// Like [`Value::as_f64`] but reports a type mismatch.
	pub fn number(&self) -> Result<f64, OpError> {
		self.as_f64().ok_or(OpError::TypeMismatch { expected: "number" })
	}

	pub fn ptr_eq(&self, other: &Value) -> bool {
		self.identity() == other.identity()
	}

	/// Address of the shared allocation.
	pub fn identity(&self) -> usize {
		Arc::as_ptr(&self.0) as *const () as usize
	}

	pub fn downgrade(&self) -> WeakValue {
		WeakValue(Arc::downgrade(&self.0))
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.is_absent() {
			return f.write_str("Value(absent)");
		}
		match self.as_f64() {
			Some(n) => write!(f, "Value({n})"),
			None => write!(f, "Value(@{:#x})", self.identity()),
		}
	}
}

/// Non-owning handle to a [`Value`].
#[derive(Clone)]
pub struct WeakValue(Weak<dyn Any + Send + Sync>);

impl WeakValue {
	pub fn upgrade(&self) -> Option<Value> {
		self.0.upgrade().map(Value)
	}

	pub fn is_alive(&self) -> bool {
		self.0.strong_count() > 0
	}
}

impl fmt::Debug for WeakValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "WeakValue(alive: {})", self.is_alive())
	}
}
