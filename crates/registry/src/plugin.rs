use crate::descriptor::OpDescriptor;

/// A link-time bundle of descriptors.
///
/// Crates submit plugins with `inventory::submit!`; [`crate::InventorySource`]
/// visits them in ascending `(priority, name)` order.
pub struct OpPlugin {
	pub name: &'static str,
	pub priority: i16,
	/// Appends this plugin's descriptors.
	pub register: fn(&mut Vec<OpDescriptor>),
}

inventory::collect!(OpPlugin);

impl OpPlugin {
	pub const fn new(name: &'static str, register: fn(&mut Vec<OpDescriptor>)) -> Self {
		Self {
			name,
			priority: 0,
			register,
		}
	}

	pub const fn with_priority(mut self, priority: i16) -> Self {
		self.priority = priority;
		self
	}
}

/// All submitted plugins in deterministic visiting order.
pub(crate) fn collect_plugins() -> Vec<&'static OpPlugin> {
	let mut plugins: Vec<&'static OpPlugin> = inventory::iter::<OpPlugin>.into_iter().collect();
	plugins.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(b.name)));
	plugins
}
