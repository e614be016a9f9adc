//! Engine configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! default_hints = ["history.SKIP_RECORDING"]
//! tie_break = "first_registered"
//! duplicate_policy = "by_priority"
//! max_depth = 16
//!
//! [transforms]
//! simplification = false
//! ```

use std::path::{Path, PathBuf};

use opsmith_primitives::{HintCategory, Hints};
use opsmith_registry::DuplicatePolicy;
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// Error parsing TOML.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		path: PathBuf,
		error: std::io::Error,
	},
}

/// What to do when the two best candidates score identically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
	/// Fail with an ambiguous-match error.
	#[default]
	Error,
	/// Take the candidate that comes first in registry order.
	FirstRegistered,
}

/// Per-category switches for signature transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformToggles {
	pub adaptation: bool,
	pub simplification: bool,
	pub reduction: bool,
}

impl Default for TransformToggles {
	fn default() -> Self {
		Self {
			adaptation: true,
			simplification: true,
			reduction: true,
		}
	}
}

impl TransformToggles {
	pub fn enabled(&self, category: HintCategory) -> bool {
		match category {
			HintCategory::Adaptation => self.adaptation,
			HintCategory::Simplification => self.simplification,
			HintCategory::Reduction => self.reduction,
			HintCategory::DependencyMatching | HintCategory::History => false,
		}
	}
}

/// Resolution engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
	/// Hints applied by [`crate::OpEnvironment::resolve_default`].
	pub default_hints: Hints,
	pub tie_break: TieBreak,
	pub duplicate_policy: DuplicatePolicy,
	/// Longest dependency path before resolution is cut off as cyclic.
	pub max_depth: usize,
	/// Longest conversion chain simplification will insert per position.
	pub max_conversion_steps: usize,
	/// Whether resolved instances record their outputs in the provenance log.
	pub record_history: bool,
	pub transforms: TransformToggles,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			default_hints: Hints::empty(),
			tie_break: TieBreak::default(),
			duplicate_policy: DuplicatePolicy::default(),
			max_depth: 32,
			max_conversion_steps: 4,
			record_history: true,
			transforms: TransformToggles::default(),
		}
	}
}

impl EngineConfig {
	pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(s)?)
	}

	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}
}
