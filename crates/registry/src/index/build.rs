use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::collision::{Collision, DuplicatePolicy};
use super::{Entry, RegistryIndex};
use crate::descriptor::OpDescriptor;
use crate::error::InvalidDescriptor;
use crate::validate::validate;

/// Builder for constructing a [`RegistryIndex`].
pub struct RegistryBuilder {
	label: String,
	entries: Vec<Entry>,
	by_id: FxHashMap<Arc<str>, usize>,
	invalid: Vec<InvalidDescriptor>,
	collisions: Vec<Collision>,
	policy: DuplicatePolicy,
	next_ordinal: u32,
}

impl RegistryBuilder {
	/// Creates a new builder with the given label for diagnostics.
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			entries: Vec::new(),
			by_id: FxHashMap::default(),
			invalid: Vec::new(),
			collisions: Vec::new(),
			policy: DuplicatePolicy::default(),
			next_ordinal: 0,
		}
	}

	/// Sets the duplicate id handling policy.
	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.policy = policy;
		self
	}

	/// Number of descriptors accepted so far.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Ingests one descriptor.
	///
	/// Invalid descriptors are logged and recorded, never indexed. Duplicate
	/// ids are settled by the builder's [`DuplicatePolicy`].
	pub fn push(&mut self, descriptor: OpDescriptor) {
		let ordinal = self.next_ordinal;
		self.next_ordinal += 1;

		if let Err(e) = validate(&descriptor) {
			tracing::error!(registry = %self.label, id = %descriptor.id, "discarding operation: {}", e);
			self.invalid.push(e);
			return;
		}

		let entry = Entry {
			descriptor: descriptor.into(),
			ordinal,
		};
		let id = entry.descriptor.id().clone();
		match self.by_id.get(&id).copied() {
			None => {
				self.by_id.insert(id, self.entries.len());
				self.entries.push(entry);
			}
			Some(idx) => {
				let existing = self.entries[idx].party();
				let incoming = entry.party();
				let (winner, loser) = if self.policy.incoming_wins(&existing, &incoming) {
					self.entries[idx] = entry;
					(incoming, existing)
				} else {
					(existing, incoming)
				};
				tracing::warn!(
					registry = %self.label,
					id = %id,
					winner_ordinal = winner.ordinal,
					loser_ordinal = loser.ordinal,
					policy = ?self.policy,
					"duplicate operation id"
				);
				self.collisions.push(Collision {
					id,
					winner,
					loser,
					policy: self.policy,
				});
			}
		}
	}

	/// Ingests several descriptors in order.
	pub fn extend(&mut self, descriptors: impl IntoIterator<Item = OpDescriptor>) {
		for d in descriptors {
			self.push(d);
		}
	}

	/// Builds the immutable index.
	pub fn build(self) -> RegistryIndex {
		tracing::debug!(
			registry = %self.label,
			operations = self.entries.len(),
			invalid = self.invalid.len(),
			collisions = self.collisions.len(),
			"built operation index"
		);
		RegistryIndex::from_entries(self.entries, self.invalid, self.collisions, self.next_ordinal)
	}
}
