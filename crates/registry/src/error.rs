use std::sync::Arc;

use crate::index::DuplicatePolicy;

/// A descriptor rejected at registration time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDescriptor {
	#[error("descriptor `{id}` declares no name")]
	Unnamed { id: Arc<str> },

	#[error("descriptor `{id}` has a malformed signature `{signature}`")]
	MalformedSignature { id: Arc<str>, signature: String },

	#[error("descriptor `{id}` declares {params} parameters for {inputs} inputs")]
	ParamArity {
		id: Arc<str>,
		params: usize,
		inputs: usize,
	},

	#[error("descriptor `{id}` declares dependency key `{key}` twice")]
	DuplicateDependencyKey { id: Arc<str>, key: Arc<str> },

	#[error("descriptor `{id}` has a malformed dependency `{key}`")]
	MalformedDependency { id: Arc<str>, key: Arc<str> },
}

impl InvalidDescriptor {
	/// Id of the offending descriptor.
	pub fn id(&self) -> &str {
		match self {
			Self::Unnamed { id }
			| Self::MalformedSignature { id, .. }
			| Self::ParamArity { id, .. }
			| Self::DuplicateDependencyKey { id, .. }
			| Self::MalformedDependency { id, .. } => id,
		}
	}
}

/// Registry error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
	#[error(transparent)]
	Invalid(#[from] InvalidDescriptor),

	/// A runtime registration lost a duplicate-id conflict.
	#[error("registration of `{incoming}` rejected: `{existing}` kept under {policy:?}")]
	Rejected {
		incoming: Arc<str>,
		existing: Arc<str>,
		policy: DuplicatePolicy,
	},
}
