//! Lazily built, snapshot-published operation registry.
//!
//! # Role
//!
//! [`OpRegistry`] pulls descriptors from its [`DescriptorSource`]s the first
//! time anything reads it and publishes the resulting [`RegistryIndex`] as an
//! atomic snapshot.
//!
//! # Concurrency
//!
//! - **Initialization:** exactly once per build. Concurrent first readers block
//!   on the init lock until the snapshot is published.
//! - **Reads:** wait-free after initialization (atomic load of the snapshot).
//! - **Writes:** [`OpRegistry::register`] extends the published snapshot with a
//!   CAS retry loop, so concurrent registrations are never lost.
//!
//! # Invariants
//!
//! - Sources are queried once per build.
//!   - Enforced in: [`OpRegistry::snapshot`].
//!   - Tested by: `registry::tests::test_sources_queried_once_under_contention`.
//! - A runtime registration survives [`OpRegistry::invalidate`].
//!   - Enforced in: [`OpRegistry::register`] (also recorded in the manual source).
//!   - Tested by: `registry::tests::test_register_survives_invalidate`.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use opsmith_primitives::{HintCategory, Hints};
use parking_lot::Mutex;

use crate::descriptor::{Descriptor, OpDescriptor};
use crate::error::RegistryError;
use crate::index::{DuplicatePolicy, RegistryBuilder, RegistryIndex};
use crate::source::{DescriptorSource, ManualSource};
use crate::validate::validate;

/// Process-wide descriptor directory.
pub struct OpRegistry {
	sources: Vec<Arc<dyn DescriptorSource>>,
	manual: Arc<ManualSource>,
	policy: DuplicatePolicy,
	snap: ArcSwapOption<RegistryIndex>,
	init: Mutex<()>,
}

impl OpRegistry {
	/// Creates an unbuilt registry over `sources`.
	pub fn new(sources: Vec<Arc<dyn DescriptorSource>>) -> Self {
		Self::with_policy(sources, DuplicatePolicy::default())
	}

	pub fn with_policy(sources: Vec<Arc<dyn DescriptorSource>>, policy: DuplicatePolicy) -> Self {
		Self {
			sources,
			manual: Arc::new(ManualSource::new("runtime")),
			policy,
			snap: ArcSwapOption::empty(),
			init: Mutex::new(()),
		}
	}

	pub fn policy(&self) -> DuplicatePolicy {
		self.policy
	}

	/// True once a snapshot has been published.
	pub fn is_initialized(&self) -> bool {
		self.snap.load().is_some()
	}

	/// Builds the index if it has not been built yet.
	pub fn initialize(&self) {
		let _ = self.snapshot();
	}

	/// Current snapshot, building it on first access.
	pub fn snapshot(&self) -> Arc<RegistryIndex> {
		if let Some(snap) = self.snap.load_full() {
			return snap;
		}
		let _guard = self.init.lock();
		if let Some(snap) = self.snap.load_full() {
			return snap;
		}
		let snap = Arc::new(self.build());
		self.snap.store(Some(snap.clone()));
		snap
	}

	fn build(&self) -> RegistryIndex {
		let mut builder = RegistryBuilder::new("ops").duplicate_policy(self.policy);
		let manual: Arc<dyn DescriptorSource> = self.manual.clone();
		for source in self.sources.iter().chain(std::iter::once(&manual)) {
			let descriptors = source.descriptors();
			tracing::debug!(source = source.label(), count = descriptors.len(), "loading operations");
			builder.extend(descriptors);
		}
		builder.build()
	}

	/// Descriptors registered under `name`, in precedence order.
	pub fn lookup(&self, name: &str) -> Vec<Descriptor> {
		self.snapshot().lookup(name).to_vec()
	}

	/// Like [`OpRegistry::lookup`], minus descriptors that refuse a transform
	/// category currently in progress.
	pub fn lookup_filtered(&self, name: &str, hints: &Hints) -> Vec<Descriptor> {
		self.snapshot()
			.lookup(name)
			.iter()
			.filter(|d| admits(d, hints))
			.cloned()
			.collect()
	}

	pub fn get_by_id(&self, id: &str) -> Option<Descriptor> {
		self.snapshot().get_by_id(id).cloned()
	}

	/// Every effective descriptor once.
	pub fn all(&self) -> Vec<Descriptor> {
		self.snapshot().all().to_vec()
	}

	pub fn names(&self) -> Vec<String> {
		self.snapshot().names().into_iter().map(str::to_owned).collect()
	}

	/// Human-readable summaries of the descriptors under `name`.
	pub fn descriptions(&self, name: &str) -> Vec<String> {
		self.snapshot().lookup(name).iter().map(Descriptor::describe).collect()
	}

	/// Adds a descriptor at runtime.
	///
	/// The descriptor is validated, kept for future rebuilds, and appended to
	/// the published snapshot if there is one.
	pub fn register(&self, descriptor: OpDescriptor) -> Result<Descriptor, RegistryError> {
		validate(&descriptor)?;
		let id = descriptor.id.clone();
		let mut current = Some(self.snapshot());
		loop {
			let Some(old) = current else {
				// Invalidated concurrently; the next build picks it up from the manual source.
				self.manual.register(descriptor.clone());
				return Ok(descriptor.into());
			};
			let next = Arc::new(old.with_descriptor(descriptor.clone(), self.policy)?);
			let prev = self.snap.compare_and_swap(&Some(old.clone()), Some(next.clone()));
			if matches!(&*prev, Some(p) if Arc::ptr_eq(p, &old)) {
				self.manual.register(descriptor.clone());
				tracing::debug!(id = %id, "registered operation at runtime");
				return Ok(next
					.get_by_id(&id)
					.cloned()
					.unwrap_or_else(|| descriptor.into()));
			}
			current = Option::clone(&prev);
		}
	}

	/// Drops the snapshot; the next read rebuilds from the sources.
	pub fn invalidate(&self) {
		let _guard = self.init.lock();
		self.snap.store(None);
	}
}

/// False if `d` refuses a transform category that `hints` marks in progress.
fn admits(d: &Descriptor, hints: &Hints) -> bool {
	HintCategory::TRANSFORMS
		.iter()
		.all(|&c| !(hints.in_progress(c) && d.declared_hints().forbids(c)))
}
