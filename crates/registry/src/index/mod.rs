//! Immutable descriptor index.
//!
//! # Role
//!
//! [`RegistryBuilder`] ingests declared descriptors, validates them, resolves
//! duplicate ids, and produces a [`RegistryIndex`]. The index is never mutated;
//! [`RegistryIndex::with_descriptor`] derives an extended copy for runtime
//! registration.
//!
//! # Invariants
//!
//! - Lookups by name are ordered by priority descending, then source rank
//!   descending, then ingest ordinal ascending.
//!   - Enforced in: [`precedence`].
//!   - Tested by: `index::tests::prop_lookup_order_is_total`.
//! - Each id has exactly one effective descriptor.
//!   - Enforced in: [`RegistryBuilder::push`], [`RegistryIndex::with_descriptor`].
//!   - Tested by: `index::tests::test_duplicate_policies`.
//! - Invalid descriptors are recorded and never indexed.
//!   - Enforced in: [`RegistryBuilder::push`].
//!   - Tested by: `index::tests::test_invalid_descriptors_are_skipped`.

use std::cmp::Ordering;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::descriptor::{Descriptor, OpDescriptor};
use crate::error::{InvalidDescriptor, RegistryError};
use crate::validate::validate;

mod build;
mod collision;

pub use build::RegistryBuilder;
pub use collision::{Collision, DuplicatePolicy, Party};

/// An indexed descriptor with its ingest ordinal.
#[derive(Clone)]
pub(crate) struct Entry {
	pub(crate) descriptor: Descriptor,
	pub(crate) ordinal: u32,
}

impl Entry {
	fn party(&self) -> Party {
		Party {
			id: self.descriptor.id().clone(),
			source: self.descriptor.source(),
			priority: self.descriptor.priority(),
			ordinal: self.ordinal,
		}
	}
}

/// Lookup order: priority descending, source rank descending, ordinal ascending.
pub(crate) fn precedence(a: &Entry, b: &Entry) -> Ordering {
	b.descriptor
		.priority()
		.cmp(&a.descriptor.priority())
		.then_with(|| b.descriptor.source().rank().cmp(&a.descriptor.source().rank()))
		.then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// Immutable, indexed set of descriptors.
#[derive(Clone)]
pub struct RegistryIndex {
	entries: Arc<[Entry]>,
	all: Arc<[Descriptor]>,
	by_name: Arc<FxHashMap<Arc<str>, Arc<[Descriptor]>>>,
	by_id: Arc<FxHashMap<Arc<str>, Descriptor>>,
	invalid: Arc<[InvalidDescriptor]>,
	collisions: Arc<[Collision]>,
	next_ordinal: u32,
}

impl RegistryIndex {
	pub(crate) fn from_entries(
		mut entries: Vec<Entry>,
		invalid: Vec<InvalidDescriptor>,
		collisions: Vec<Collision>,
		next_ordinal: u32,
	) -> Self {
		entries.sort_by_key(|e| e.ordinal);

		let mut by_id: FxHashMap<Arc<str>, Descriptor> =
			FxHashMap::with_capacity_and_hasher(entries.len(), Default::default());
		let mut by_name: FxHashMap<Arc<str>, Vec<Entry>> = FxHashMap::default();
		for entry in &entries {
			by_id.insert(entry.descriptor.id().clone(), entry.descriptor.clone());
			for name in entry.descriptor.names() {
				by_name.entry(name.clone()).or_default().push(entry.clone());
			}
		}
		let by_name = by_name
			.into_iter()
			.map(|(name, mut group)| {
				group.sort_by(precedence);
				let group: Arc<[Descriptor]> = group.into_iter().map(|e| e.descriptor).collect();
				(name, group)
			})
			.collect();

		Self {
			all: entries.iter().map(|e| e.descriptor.clone()).collect(),
			entries: entries.into(),
			by_name: Arc::new(by_name),
			by_id: Arc::new(by_id),
			invalid: invalid.into(),
			collisions: collisions.into(),
			next_ordinal,
		}
	}

	/// An index with no descriptors.
	pub fn empty() -> Self {
		Self::from_entries(Vec::new(), Vec::new(), Vec::new(), 0)
	}

	/// Descriptors registered under `name`, in precedence order.
	pub fn lookup(&self, name: &str) -> &[Descriptor] {
		self.by_name.get(name).map(|group| &group[..]).unwrap_or_default()
	}

	pub fn get_by_id(&self, id: &str) -> Option<&Descriptor> {
		self.by_id.get(id)
	}

	/// Every effective descriptor once, in ingest order.
	pub fn all(&self) -> &[Descriptor] {
		&self.all
	}

	/// Every registered name, sorted.
	pub fn names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self.by_name.keys().map(|n| n.as_ref()).collect();
		names.sort_unstable();
		names
	}

	/// Descriptors rejected at registration.
	pub fn invalid(&self) -> &[InvalidDescriptor] {
		&self.invalid
	}

	/// Duplicate-id conflicts recorded while building.
	pub fn collisions(&self) -> &[Collision] {
		&self.collisions
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Derives an index with `descriptor` added.
	///
	/// The newcomer gets the next ingest ordinal. An id conflict is settled by
	/// `policy`; when the existing descriptor is kept the registration is
	/// rejected.
	pub fn with_descriptor(
		&self,
		descriptor: OpDescriptor,
		policy: DuplicatePolicy,
	) -> Result<Self, RegistryError> {
		validate(&descriptor)?;
		let incoming = Entry {
			descriptor: descriptor.into(),
			ordinal: self.next_ordinal,
		};
		let mut entries = self.entries.to_vec();
		let mut collisions = self.collisions.to_vec();

		if let Some(pos) = entries
			.iter()
			.position(|e| e.descriptor.id() == incoming.descriptor.id())
		{
			let existing = entries[pos].party();
			let challenger = incoming.party();
			if !policy.incoming_wins(&existing, &challenger) {
				return Err(RegistryError::Rejected {
					incoming: challenger.id,
					existing: existing.id,
					policy,
				});
			}
			tracing::warn!(
				id = %challenger.id,
				?policy,
				"runtime registration replaces existing operation"
			);
			collisions.push(Collision {
				id: challenger.id.clone(),
				winner: challenger,
				loser: existing,
				policy,
			});
			entries.remove(pos);
		}
		entries.push(incoming);

		Ok(Self::from_entries(
			entries,
			self.invalid.to_vec(),
			collisions,
			self.next_ordinal + 1,
		))
	}
}

impl std::fmt::Debug for RegistryIndex {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RegistryIndex")
			.field("len", &self.len())
			.field("names", &self.by_name.len())
			.field("invalid", &self.invalid.len())
			.field("collisions", &self.collisions.len())
			.finish()
	}
}
