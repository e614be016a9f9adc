//! Duplicate-id policy and precedence rules.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::descriptor::OpSource;

/// How two descriptors sharing an id are reconciled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
	/// Keep the first descriptor seen for an id.
	#[default]
	FirstWins,
	/// Replace with the last descriptor seen.
	LastWins,
	/// Higher priority wins, then source rank, then the later ingest.
	ByPriority,
}

impl DuplicatePolicy {
	/// True if `incoming` should replace `existing`.
	pub(crate) fn incoming_wins(self, existing: &Party, incoming: &Party) -> bool {
		match self {
			Self::FirstWins => false,
			Self::LastWins => true,
			Self::ByPriority => cmp_party(incoming, existing) == Ordering::Greater,
		}
	}
}

/// One side of a duplicate-id conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
	pub id: Arc<str>,
	pub source: OpSource,
	pub priority: i16,
	/// Stable ingest ordinal.
	pub ordinal: u32,
}

/// Compares two parties of an id conflict.
///
/// 1. Priority (higher wins)
/// 2. Source (Runtime > Crate > Builtin)
/// 3. Ingest ordinal (later wins)
pub(crate) fn cmp_party(a: &Party, b: &Party) -> Ordering {
	a.priority
		.cmp(&b.priority)
		.then_with(|| a.source.rank().cmp(&b.source.rank()))
		.then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// A recorded duplicate-id conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
	pub id: Arc<str>,
	pub winner: Party,
	pub loser: Party,
	pub policy: DuplicatePolicy,
}
