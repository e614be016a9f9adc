//! The type service abstraction.
//!
//! The engine asks exactly four questions about types: is `A` assignable to
//! `B`, are they equal, how far apart are they, and can a generic template be
//! parameterized to match a concrete type. [`TypeService`] captures those
//! questions; [`StandardTypes`] answers them for a small nominal hierarchy with
//! invariant generic arguments.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ty::Ty;

/// Distance charged for every wildcard or type variable a template leaves open.
///
/// Chosen to dominate any realistic number of hierarchy steps, so a fully
/// concrete candidate always reads as more specific than a generic one.
pub const WILDCARD_COST: u32 = 16;

/// Root of the nominal hierarchy in [`StandardTypes`].
pub const OBJECT: &str = "Object";

const MAX_HIERARCHY_DEPTH: u32 = 64;

const DEFAULT_HIERARCHY: &[(&str, &str)] = &[
	("Byte", "Number"),
	("Short", "Number"),
	("Integer", "Number"),
	("Long", "Number"),
	("Float", "Number"),
	("Double", "Number"),
	("Number", OBJECT),
	("List", "Iterable"),
	("Iterable", OBJECT),
];

/// Type-variable assignments discovered while matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings(FxHashMap<Arc<str>, Ty>);

impl Bindings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, var: &str) -> Option<&Ty> {
		self.0.get(var)
	}

	/// Binds `var`, returning the previous binding.
	pub fn insert(&mut self, var: impl Into<Arc<str>>, ty: Ty) -> Option<Ty> {
		self.0.insert(var.into(), ty)
	}

	/// Copies entries from `other` that are not bound here yet.
	pub fn absorb(&mut self, other: &Bindings) {
		for (k, v) in &other.0 {
			self.0.entry(k.clone()).or_insert_with(|| v.clone());
		}
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &Ty)> {
		self.0.iter().map(|(k, v)| (k.as_ref(), v))
	}
}

/// Type compatibility primitives consumed by the resolution engine.
pub trait TypeService: Send + Sync {
	/// True if a value of type `from` may be passed where `to` is expected.
	fn assignable(&self, from: &Ty, to: &Ty) -> bool;

	/// Type equality.
	fn equal(&self, a: &Ty, b: &Ty) -> bool {
		a == b
	}

	/// Generic distance between a declared `template` and a `concrete` type.
	///
	/// Lower is more specific. `None` when the two are unrelated.
	fn specificity(&self, template: &Ty, concrete: &Ty) -> Option<u32>;

	/// Tries to parameterize `template` so it matches `concrete`, recording
	/// variable assignments in `bindings`. Existing bindings are kept.
	fn bind(&self, template: &Ty, concrete: &Ty, bindings: &mut Bindings) -> bool;

	/// Replaces bound type variables in `ty`.
	fn substitute(&self, ty: &Ty, bindings: &Bindings) -> Ty {
		substitute_vars(ty, bindings)
	}
}

/// Structural variable substitution shared by type service implementations.
pub fn substitute_vars(ty: &Ty, bindings: &Bindings) -> Ty {
	match ty {
		Ty::Any => Ty::Any,
		Ty::Var(v) => bindings.get(v).cloned().unwrap_or_else(|| ty.clone()),
		Ty::Named { name, args } => {
			if args.is_empty() {
				return ty.clone();
			}
			Ty::Named {
				name: name.clone(),
				args: args.iter().map(|a| substitute_vars(a, bindings)).collect(),
			}
		}
	}
}

/// Nominal type service with a configurable single-inheritance hierarchy.
///
/// Every named type without an explicit parent extends [`OBJECT`]. Generic
/// arguments are positional and carried unchanged from a subtype to its parent
/// (`List<T>` views as `Iterable<T>`).
#[derive(Debug, Clone)]
pub struct StandardTypes {
	supertypes: FxHashMap<Arc<str>, Arc<str>>,
}

impl Default for StandardTypes {
	fn default() -> Self {
		Self::new()
	}
}

impl StandardTypes {
	/// Hierarchy with the numeric and collection types preloaded.
	pub fn new() -> Self {
		let mut types = Self::empty();
		for (child, parent) in DEFAULT_HIERARCHY {
			types.supertypes.insert(Arc::from(*child), Arc::from(*parent));
		}
		types
	}

	/// Hierarchy where everything directly extends [`OBJECT`].
	pub fn empty() -> Self {
		Self {
			supertypes: FxHashMap::default(),
		}
	}

	/// Declares `parent` as the direct supertype of `child`.
	pub fn with_supertype(mut self, child: impl Into<Arc<str>>, parent: impl Into<Arc<str>>) -> Self {
		self.supertypes.insert(child.into(), parent.into());
		self
	}

	/// Number of hierarchy steps from `from` up to `to`.
	fn steps_up(&self, from: &str, to: &str) -> Option<u32> {
		if from == to {
			return Some(0);
		}
		let mut cur = from;
		let mut steps = 0;
		while steps < MAX_HIERARCHY_DEPTH {
			let parent = match self.supertypes.get(cur) {
				Some(p) => p.as_ref(),
				None if cur != OBJECT => OBJECT,
				None => return None,
			};
			steps += 1;
			if parent == to {
				return Some(steps);
			}
			cur = parent;
		}
		None
	}

	fn related(&self, a: &str, b: &str) -> Option<u32> {
		self.steps_up(a, b).or_else(|| self.steps_up(b, a))
	}

	fn arg_compatible(&self, from: &Ty, to: &Ty) -> bool {
		match (from, to) {
			(_, Ty::Any | Ty::Var(_)) => true,
			(
				Ty::Named { name: fname, args: fargs },
				Ty::Named { name: tname, args: targs },
			) if fname == tname && fargs.len() == targs.len() => fargs
				.iter()
				.zip(targs.iter())
				.all(|(f, t)| self.arg_compatible(f, t)),
			_ => self.equal(from, to),
		}
	}
}

impl TypeService for StandardTypes {
	fn assignable(&self, from: &Ty, to: &Ty) -> bool {
		match (from, to) {
			(_, Ty::Any | Ty::Var(_)) => true,
			(Ty::Any | Ty::Var(_), Ty::Named { .. }) => false,
			(
				Ty::Named { name: fname, args: fargs },
				Ty::Named { name: tname, args: targs },
			) => {
				if self.steps_up(fname, tname).is_none() {
					return false;
				}
				if targs.is_empty() {
					return true;
				}
				fargs.len() == targs.len()
					&& fargs
						.iter()
						.zip(targs.iter())
						.all(|(f, t)| self.arg_compatible(f, t))
			}
		}
	}

	fn specificity(&self, template: &Ty, concrete: &Ty) -> Option<u32> {
		match (template, concrete) {
			(Ty::Any | Ty::Var(_), _) | (Ty::Named { .. }, Ty::Any | Ty::Var(_)) => {
				Some(WILDCARD_COST)
			}
			(
				Ty::Named { name: tname, args: targs },
				Ty::Named { name: cname, args: cargs },
			) => {
				let steps = self.related(tname, cname)?;
				if cargs.len() != targs.len() {
					// Raw on one side: charge the open arguments as wildcards.
					let open = targs.len().max(cargs.len()) as u32;
					return Some(steps + open * WILDCARD_COST);
				}
				let args = targs
					.iter()
					.zip(cargs.iter())
					.map(|(t, c)| self.specificity(t, c))
					.sum::<Option<u32>>()?;
				Some(steps + args)
			}
		}
	}

	fn bind(&self, template: &Ty, concrete: &Ty, bindings: &mut Bindings) -> bool {
		match template {
			Ty::Any => true,
			Ty::Var(v) => {
				if !concrete.is_wildcard() && bindings.get(v).is_none() {
					bindings.insert(v.clone(), concrete.clone());
				}
				true
			}
			Ty::Named { name, args } => {
				let Ty::Named {
					name: cname,
					args: cargs,
				} = concrete
				else {
					return true;
				};
				if self.related(cname, name).is_none() {
					return false;
				}
				if args.is_empty() || cargs.is_empty() {
					return true;
				}
				args.len() == cargs.len()
					&& args
						.iter()
						.zip(cargs.iter())
						.all(|(t, c)| self.bind(t, c, bindings))
			}
		}
	}
}
