//! Resolved-instance cache.
//!
//! Reads load the current map without locking. Inserts copy the map and
//! publish it with a compare-and-swap, retrying on contention; the first
//! instance published for a key wins and every racer receives it.

use std::sync::Arc;

use arc_swap::ArcSwap;
use opsmith_primitives::{Hints, Signature};
use rustc_hash::FxHashMap;

use crate::instance::ResolvedInstance;

/// Cache key: the full request plus the hints it was resolved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchingConditions {
	pub signature: Signature,
	pub hints: Hints,
}

impl MatchingConditions {
	pub fn new(signature: Signature, hints: Hints) -> Self {
		Self { signature, hints }
	}
}

type Map = FxHashMap<MatchingConditions, Arc<ResolvedInstance>>;

/// Copy-on-write map from [`MatchingConditions`] to resolved instances.
#[derive(Default)]
pub struct MatchCache {
	map: ArcSwap<Map>,
}

impl MatchCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &MatchingConditions) -> Option<Arc<ResolvedInstance>> {
		self.map.load().get(key).cloned()
	}

	/// Inserts `instance` unless the key is already present.
	///
	/// Returns whichever instance the cache holds for `key` afterwards.
	pub fn put_if_absent(&self, key: MatchingConditions, instance: Arc<ResolvedInstance>) -> Arc<ResolvedInstance> {
		let mut current = self.map.load_full();
		loop {
			if let Some(existing) = current.get(&key) {
				return existing.clone();
			}
			let mut next = Map::clone(&current);
			next.insert(key.clone(), instance.clone());
			let prev = self.map.compare_and_swap(&current, Arc::new(next));
			if Arc::ptr_eq(&*prev, &current) {
				return instance;
			}
			current = Arc::clone(&*prev);
		}
	}

	pub fn clear(&self) {
		self.map.store(Arc::default());
	}

	pub fn len(&self) -> usize {
		self.map.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.map.load().is_empty()
	}
}

impl std::fmt::Debug for MatchCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MatchCache").field("len", &self.len()).finish()
	}
}
