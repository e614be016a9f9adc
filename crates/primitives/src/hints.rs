//! Immutable preference sets steering resolution.
//!
//! A [`Hints`] value is a sorted, deduplicated set of `category.OPTION` tokens.
//! Every mutation returns a new set; cloning is a refcount bump. Because the
//! backing slice is kept sorted, equality and hashing are independent of the
//! order tokens were added in, which makes `Hints` usable as part of a cache key.
//!
//! # Invariants
//!
//! - Tokens are unique and sorted.
//!   - Enforced in: [`Hints::from_iter`], [`Hints::plus`], [`Hints::minus`].
//!   - Tested by: `hints::tests::prop_order_independent`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Well-known hint tokens.
pub mod tokens {
	pub const ADAPTATION_IN_PROGRESS: &str = "adaptation.IN_PROGRESS";
	pub const ADAPTATION_FORBIDDEN: &str = "adaptation.FORBIDDEN";
	pub const SIMPLIFICATION_IN_PROGRESS: &str = "simplification.IN_PROGRESS";
	pub const SIMPLIFICATION_FORBIDDEN: &str = "simplification.FORBIDDEN";
	pub const REDUCTION_IN_PROGRESS: &str = "reduction.IN_PROGRESS";
	pub const REDUCTION_FORBIDDEN: &str = "reduction.FORBIDDEN";
	pub const DEPENDENCY_MATCHING_IN_PROGRESS: &str = "dependency_matching.IN_PROGRESS";
	pub const HISTORY_SKIP_RECORDING: &str = "history.SKIP_RECORDING";
}

/// Hint categories known to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HintCategory {
	Adaptation,
	Simplification,
	Reduction,
	DependencyMatching,
	History,
}

impl HintCategory {
	/// Token prefix, e.g. `adaptation`.
	pub const fn prefix(self) -> &'static str {
		match self {
			Self::Adaptation => "adaptation",
			Self::Simplification => "simplification",
			Self::Reduction => "reduction",
			Self::DependencyMatching => "dependency_matching",
			Self::History => "history",
		}
	}

	/// The `IN_PROGRESS` token of this category, if it has one.
	pub const fn in_progress(self) -> Option<&'static str> {
		match self {
			Self::Adaptation => Some(tokens::ADAPTATION_IN_PROGRESS),
			Self::Simplification => Some(tokens::SIMPLIFICATION_IN_PROGRESS),
			Self::Reduction => Some(tokens::REDUCTION_IN_PROGRESS),
			Self::DependencyMatching => Some(tokens::DEPENDENCY_MATCHING_IN_PROGRESS),
			Self::History => None,
		}
	}

	/// The `FORBIDDEN` token of this category, if it has one.
	pub const fn forbidden(self) -> Option<&'static str> {
		match self {
			Self::Adaptation => Some(tokens::ADAPTATION_FORBIDDEN),
			Self::Simplification => Some(tokens::SIMPLIFICATION_FORBIDDEN),
			Self::Reduction => Some(tokens::REDUCTION_FORBIDDEN),
			Self::DependencyMatching | Self::History => None,
		}
	}

	/// Categories that describe signature transforms.
	pub const TRANSFORMS: [HintCategory; 3] = [Self::Reduction, Self::Adaptation, Self::Simplification];
}

impl fmt::Display for HintCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.prefix())
	}
}

/// Immutable set of `category.OPTION` tokens.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Hints(Arc<[Arc<str>]>);

impl Default for Hints {
	fn default() -> Self {
		Self(Arc::from([]))
	}
}

impl Hints {
	/// Creates a hint set from tokens.
	pub fn new<I, S>(tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		tokens.into_iter().collect()
	}

	/// The empty hint set.
	pub fn empty() -> Self {
		Self::default()
	}

	/// Returns a set with `token` added.
	pub fn plus(&self, token: &str) -> Self {
		if self.contains(token) {
			return self.clone();
		}
		let mut v = self.0.to_vec();
		let pos = v.partition_point(|t| t.as_ref() < token);
		v.insert(pos, Arc::from(token));
		Self(v.into())
	}

	/// Returns a set with every token of `tokens` added.
	pub fn plus_all<I, S>(&self, tokens: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		self.iter().map(str::to_owned).chain(tokens.into_iter().map(|t| t.as_ref().to_owned())).collect()
	}

	/// Returns a set with `token` removed.
	pub fn minus(&self, token: &str) -> Self {
		if !self.contains(token) {
			return self.clone();
		}
		Self(self.0.iter().filter(|t| t.as_ref() != token).cloned().collect())
	}

	pub fn contains(&self, token: &str) -> bool {
		self.0.binary_search_by(|t| t.as_ref().cmp(token)).is_ok()
	}

	/// True if at least one of `tokens` is present.
	pub fn contains_any<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> bool {
		tokens.into_iter().any(|t| self.contains(t))
	}

	/// True if every one of `tokens` is present.
	pub fn contains_all<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> bool {
		tokens.into_iter().all(|t| self.contains(t))
	}

	/// True if none of `tokens` is present.
	pub fn contains_none<'a>(&self, tokens: impl IntoIterator<Item = &'a str>) -> bool {
		!self.contains_any(tokens)
	}

	/// True if `category.IN_PROGRESS` is present.
	pub fn in_progress(&self, category: HintCategory) -> bool {
		category.in_progress().is_some_and(|t| self.contains(t))
	}

	/// True if `category.FORBIDDEN` is present.
	pub fn forbids(&self, category: HintCategory) -> bool {
		category.forbidden().is_some_and(|t| self.contains(t))
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|t| t.as_ref())
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<S: AsRef<str>> FromIterator<S> for Hints {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		let mut v: Vec<Arc<str>> = iter.into_iter().map(|t| Arc::from(t.as_ref())).collect();
		v.sort_unstable();
		v.dedup();
		Self(v.into())
	}
}

impl From<Vec<String>> for Hints {
	fn from(v: Vec<String>) -> Self {
		v.into_iter().collect()
	}
}

impl From<Hints> for Vec<String> {
	fn from(h: Hints) -> Self {
		h.iter().map(str::to_owned).collect()
	}
}

impl fmt::Debug for Hints {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

impl fmt::Display for Hints {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("{")?;
		for (i, t) in self.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			f.write_str(t)?;
		}
		f.write_str("}")
	}
}
