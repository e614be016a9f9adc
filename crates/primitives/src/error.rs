use std::sync::Arc;

/// Errors raised while invoking an operation's behavior.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OpError {
	/// The behavior received the wrong number of arguments.
	#[error("expected {expected} arguments, got {got}")]
	Arity { expected: usize, got: usize },

	/// An argument did not hold the expected runtime type.
	#[error("argument type mismatch: expected {expected}")]
	TypeMismatch { expected: &'static str },

	/// A required dependency slot was not filled at instantiation.
	#[error("missing dependency `{0}`")]
	MissingDependency(Arc<str>),

	/// A function was invoked as a computer or vice versa.
	#[error("cannot invoke a {actual} as a {requested}")]
	ShapeMismatch {
		actual: &'static str,
		requested: &'static str,
	},

	/// The behavior itself failed.
	#[error("{0}")]
	Failed(String),
}

impl OpError {
	/// Builds a [`OpError::Failed`] from any displayable message.
	pub fn failed(msg: impl std::fmt::Display) -> Self {
		Self::Failed(msg.to_string())
	}

	/// Returns an error unless `got` equals `expected`.
	pub fn check_arity(expected: usize, got: usize) -> Result<(), Self> {
		if expected == got {
			Ok(())
		} else {
			Err(Self::Arity { expected, got })
		}
	}
}
