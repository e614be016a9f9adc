//! Type descriptors.
//!
//! A [`Ty`] is an immutable, value-comparable handle. The resolution engine never
//! inspects one directly; every compatibility question goes through a
//! [`crate::TypeService`].
//!
//! # Syntax
//!
//! [`Ty::parse`] accepts the notation used in descriptor declarations and tests:
//!
//! | Text | Meaning |
//! |------|---------|
//! | `Double` | nominal type |
//! | `Iterable<N>` | generic type with one argument |
//! | `N` | a single upper-case letter is a type variable |
//! | `?` | wildcard |

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

/// An immutable type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Ty {
	/// Wildcard accepting anything.
	Any,
	/// Generic type variable, bound during matching.
	Var(Arc<str>),
	/// Nominal type with optional generic arguments.
	Named { name: Arc<str>, args: Arc<[Ty]> },
}

/// Error returned by [`Ty::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TyParseError {
	#[error("unexpected end of type expression `{0}`")]
	UnexpectedEnd(String),
	#[error("unexpected character `{found}` at offset {offset} in `{input}`")]
	Unexpected {
		input: String,
		found: char,
		offset: usize,
	},
}

impl Ty {
	/// Nominal type without arguments.
	pub fn named(name: impl Into<Arc<str>>) -> Self {
		Self::Named {
			name: name.into(),
			args: Arc::from([]),
		}
	}

	/// Nominal type with generic arguments.
	pub fn generic(name: impl Into<Arc<str>>, args: impl IntoIterator<Item = Ty>) -> Self {
		Self::Named {
			name: name.into(),
			args: args.into_iter().collect(),
		}
	}

	/// Type variable.
	pub fn var(name: impl Into<Arc<str>>) -> Self {
		Self::Var(name.into())
	}

	/// Returns the nominal name, if any.
	pub fn name(&self) -> Option<&str> {
		match self {
			Self::Named { name, .. } => Some(name),
			_ => None,
		}
	}

	/// Returns the generic arguments of a nominal type (empty otherwise).
	pub fn args(&self) -> &[Ty] {
		match self {
			Self::Named { args, .. } => args,
			_ => &[],
		}
	}

	/// True for [`Ty::Any`] and [`Ty::Var`].
	pub fn is_wildcard(&self) -> bool {
		matches!(self, Self::Any | Self::Var(_))
	}

	/// Counts wildcard positions, including nested generic arguments.
	pub fn wildcards(&self) -> usize {
		match self {
			Self::Any | Self::Var(_) => 1,
			Self::Named { args, .. } => args.iter().map(Ty::wildcards).sum(),
		}
	}

	/// True if no wildcard appears anywhere in this type.
	pub fn is_concrete(&self) -> bool {
		self.wildcards() == 0
	}

	/// Collects the distinct type variables mentioned by this type, in order of appearance.
	pub fn collect_vars(&self, out: &mut Vec<Arc<str>>) {
		match self {
			Self::Any => {}
			Self::Var(v) => {
				if !out.contains(v) {
					out.push(v.clone());
				}
			}
			Self::Named { args, .. } => {
				for arg in args.iter() {
					arg.collect_vars(out);
				}
			}
		}
	}

	/// True if the type is structurally valid (no blank names anywhere).
	pub fn is_well_formed(&self) -> bool {
		match self {
			Self::Any => true,
			Self::Var(v) => !v.trim().is_empty(),
			Self::Named { name, args } => {
				!name.trim().is_empty() && args.iter().all(Ty::is_well_formed)
			}
		}
	}

	/// Parses the textual notation described in the module docs.
	pub fn parse(input: &str) -> Result<Self, TyParseError> {
		let mut parser = Parser {
			input,
			chars: input.char_indices().peekable(),
		};
		let ty = parser.ty()?;
		parser.skip_ws();
		match parser.chars.next() {
			None => Ok(ty),
			Some((offset, found)) => Err(TyParseError::Unexpected {
				input: input.to_string(),
				found,
				offset,
			}),
		}
	}
}

struct Parser<'a> {
	input: &'a str,
	chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
	fn skip_ws(&mut self) {
		while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
	}

	fn end(&self) -> TyParseError {
		TyParseError::UnexpectedEnd(self.input.to_string())
	}

	fn unexpected(&self, offset: usize, found: char) -> TyParseError {
		TyParseError::Unexpected {
			input: self.input.to_string(),
			found,
			offset,
		}
	}

	fn ty(&mut self) -> Result<Ty, TyParseError> {
		self.skip_ws();
		let (start, first) = match self.chars.peek() {
			Some(&(start, first)) => (start, first),
			None => return Err(self.end()),
		};
		if first == '?' {
			self.chars.next();
			return Ok(Ty::Any);
		}
		if !(first.is_alphabetic() || first == '_') {
			return Err(self.unexpected(start, first));
		}

		let mut end = start;
		while let Some((offset, c)) = self
			.chars
			.next_if(|(_, c)| c.is_alphanumeric() || *c == '_' || *c == '.')
		{
			end = offset + c.len_utf8();
		}
		let ident = &self.input[start..end];

		self.skip_ws();
		if self.chars.next_if(|(_, c)| *c == '<').is_none() {
			let mut it = ident.chars();
			let is_var = matches!((it.next(), it.next()), (Some(c), None) if c.is_ascii_uppercase());
			return Ok(if is_var {
				Ty::var(ident)
			} else {
				Ty::named(ident)
			});
		}

		let mut args: SmallVec<[Ty; 2]> = SmallVec::new();
		loop {
			args.push(self.ty()?);
			self.skip_ws();
			match self.chars.next() {
				Some((_, ',')) => continue,
				Some((_, '>')) => break,
				Some((offset, c)) => return Err(self.unexpected(offset, c)),
				None => return Err(self.end()),
			}
		}
		Ok(Ty::generic(ident, args))
	}
}

impl fmt::Display for Ty {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Any => f.write_str("?"),
			Self::Var(v) => f.write_str(v),
			Self::Named { name, args } => {
				f.write_str(name)?;
				if !args.is_empty() {
					f.write_str("<")?;
					for (i, arg) in args.iter().enumerate() {
						if i > 0 {
							f.write_str(", ")?;
						}
						write!(f, "{arg}")?;
					}
					f.write_str(">")?;
				}
				Ok(())
			}
		}
	}
}

impl std::str::FromStr for Ty {
	type Err = TyParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ty::parse(s)
	}
}
