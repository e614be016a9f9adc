//! Descriptor sources consumed by [`crate::OpRegistry`].

use parking_lot::Mutex;

use crate::descriptor::OpDescriptor;
use crate::plugin::collect_plugins;

/// Supplies descriptors when the registry is built.
///
/// Queried once per build; a rebuild after [`crate::OpRegistry::invalidate`]
/// queries again.
pub trait DescriptorSource: Send + Sync {
	/// Short label for diagnostics.
	fn label(&self) -> &str;

	fn descriptors(&self) -> Vec<OpDescriptor>;
}

/// Descriptors registered by hand.
pub struct ManualSource {
	label: String,
	items: Mutex<Vec<OpDescriptor>>,
}

impl Default for ManualSource {
	fn default() -> Self {
		Self::new("manual")
	}
}

impl ManualSource {
	pub fn new(label: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			items: Mutex::new(Vec::new()),
		}
	}

	/// A source preloaded with `descriptors`.
	pub fn with(label: impl Into<String>, descriptors: impl IntoIterator<Item = OpDescriptor>) -> Self {
		let source = Self::new(label);
		source.items.lock().extend(descriptors);
		source
	}

	pub fn register(&self, descriptor: OpDescriptor) {
		self.items.lock().push(descriptor);
	}

	pub fn len(&self) -> usize {
		self.items.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.lock().is_empty()
	}
}

impl DescriptorSource for ManualSource {
	fn label(&self) -> &str {
		&self.label
	}

	fn descriptors(&self) -> Vec<OpDescriptor> {
		self.items.lock().clone()
	}
}

/// Descriptors contributed by [`crate::OpPlugin`]s collected at link time.
#[derive(Debug, Default, Clone, Copy)]
pub struct InventorySource;

impl DescriptorSource for InventorySource {
	fn label(&self) -> &str {
		"inventory"
	}

	fn descriptors(&self) -> Vec<OpDescriptor> {
		let mut out = Vec::new();
		for plugin in collect_plugins() {
			let before = out.len();
			(plugin.register)(&mut out);
			tracing::debug!(
				plugin = plugin.name,
				count = out.len() - before,
				"collected operation plugin"
			);
		}
		out
	}
}
