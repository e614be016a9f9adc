use std::fmt;
use std::sync::Arc;

use crate::ty::Ty;
use crate::types::TypeService;

/// How an operation delivers its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OpShape {
	/// Returns a freshly produced output.
	Function,
	/// Writes into a caller-supplied output container.
	Computer,
}

impl OpShape {
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Function => "function",
			Self::Computer => "computer",
		}
	}
}

impl fmt::Display for OpShape {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Canonical generic call shape: a name, ordered inputs, and one output.
///
/// For a computer the output is the container type; it is not counted among
/// the inputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
	pub name: Arc<str>,
	pub shape: OpShape,
	pub inputs: Arc<[Ty]>,
	pub output: Ty,
}

impl Signature {
	pub fn function(name: impl Into<Arc<str>>, inputs: impl IntoIterator<Item = Ty>, output: Ty) -> Self {
		Self {
			name: name.into(),
			shape: OpShape::Function,
			inputs: inputs.into_iter().collect(),
			output,
		}
	}

	pub fn computer(name: impl Into<Arc<str>>, inputs: impl IntoIterator<Item = Ty>, output: Ty) -> Self {
		Self {
			name: name.into(),
			shape: OpShape::Computer,
			inputs: inputs.into_iter().collect(),
			output,
		}
	}

	pub fn arity(&self) -> usize {
		self.inputs.len()
	}

	/// Non-blank name, well-formed types, and a computer output that is not a bare wildcard.
	pub fn is_well_formed(&self) -> bool {
		!self.name.trim().is_empty()
			&& self.inputs.iter().all(Ty::is_well_formed)
			&& self.output.is_well_formed()
			&& !(self.shape == OpShape::Computer && self.output == Ty::Any)
	}

	/// Equality of name, shape, arity, and every type position under `types`.
	pub fn structurally_eq(&self, other: &Signature, types: &dyn TypeService) -> bool {
		self.name == other.name
			&& self.shape == other.shape
			&& self.inputs.len() == other.inputs.len()
			&& self
				.inputs
				.iter()
				.zip(other.inputs.iter())
				.all(|(a, b)| types.equal(a, b))
			&& types.equal(&self.output, &other.output)
	}

	/// Total wildcard positions across inputs and output.
	pub fn wildcards(&self) -> usize {
		self.inputs.iter().map(Ty::wildcards).sum::<usize>() + self.output.wildcards()
	}

	pub fn with_name(&self, name: impl Into<Arc<str>>) -> Self {
		Self {
			name: name.into(),
			..self.clone()
		}
	}

	pub fn with_inputs(&self, inputs: impl IntoIterator<Item = Ty>) -> Self {
		Self {
			inputs: inputs.into_iter().collect(),
			..self.clone()
		}
	}

	pub fn with_output(&self, output: Ty) -> Self {
		Self {
			output,
			..self.clone()
		}
	}

	pub fn with_shape(&self, shape: OpShape) -> Self {
		Self {
			shape,
			..self.clone()
		}
	}
}

impl fmt::Display for Signature {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.shape == OpShape::Computer {
			f.write_str("computer ")?;
		}
		write!(f, "{}(", self.name)?;
		for (i, input) in self.inputs.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{input}")?;
		}
		write!(f, ") -> {}", self.output)
	}
}
