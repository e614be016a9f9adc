//! Provenance log: which resolved instances produced or wrote a value.
//!
//! Entries are keyed by value identity and hold the value weakly. Dead entries
//! are swept once the map has doubled since the last sweep, so recording stays
//! amortized constant time. An entry whose value died is never reported.

use std::sync::Arc;

use opsmith_primitives::{Value, WeakValue};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::instance::ResolvedInstance;

/// Map size below which no sweep is attempted.
const MIN_SWEEP: usize = 64;

struct Entry {
	value: WeakValue,
	instances: Vec<Arc<ResolvedInstance>>,
}

struct Inner {
	entries: FxHashMap<usize, Entry>,
	sweep_at: usize,
}

impl Default for Inner {
	fn default() -> Self {
		Self {
			entries: FxHashMap::default(),
			sweep_at: MIN_SWEEP,
		}
	}
}

impl Inner {
	fn sweep(&mut self) {
		let before = self.entries.len();
		self.entries.retain(|_, e| e.value.is_alive());
		self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP);
		tracing::trace!(before, live = self.entries.len(), "swept provenance log");
	}
}

#[derive(Default)]
pub struct ProvenanceLog {
	inner: Mutex<Inner>,
}

impl ProvenanceLog {
	pub fn new() -> Self {
		Self::default()
	}

	/// Notes that `instance` produced or wrote `value`.
	pub fn record(&self, value: &Value, instance: Arc<ResolvedInstance>) {
		let mut inner = self.inner.lock();
		if inner.entries.len() >= inner.sweep_at {
			inner.sweep();
		}
		inner
			.entries
			.entry(value.identity())
			.or_insert_with(|| Entry {
				value: value.downgrade(),
				instances: Vec::new(),
			})
			.instances
			.push(instance);
	}

	/// Instances that produced or wrote `value`, oldest first.
	pub fn executions_on(&self, value: &Value) -> Vec<Arc<ResolvedInstance>> {
		let inner = self.inner.lock();
		inner
			.entries
			.get(&value.identity())
			.filter(|e| e.value.is_alive())
			.map(|e| e.instances.clone())
			.unwrap_or_default()
	}

	/// Drops every entry whose value is gone.
	pub fn sweep(&self) {
		self.inner.lock().sweep();
	}

	pub fn clear(&self) {
		*self.inner.lock() = Inner::default();
	}

	/// Number of tracked values, including dead ones not yet swept.
	pub fn len(&self) -> usize {
		self.inner.lock().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().entries.is_empty()
	}
}

impl std::fmt::Debug for ProvenanceLog {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ProvenanceLog").field("len", &self.len()).finish()
	}
}
