use std::sync::OnceLock;

use opsmith_registry::InventorySource;

use crate::environment::OpEnvironment;

static GLOBAL: OnceLock<OpEnvironment> = OnceLock::new();

/// Process-wide environment over every linked [`opsmith_registry::OpPlugin`].
///
/// Built on first use with the default configuration.
pub fn global() -> &'static OpEnvironment {
	GLOBAL.get_or_init(|| {
		tracing::debug!("initializing global environment");
		OpEnvironment::builder().source(InventorySource).build()
	})
}
