use std::sync::Arc;

use opsmith_primitives::{HintCategory, Hints, OpError, Signature};
use opsmith_registry::RegistryError;

/// Why a request could not be resolved.
///
/// Resolution is all-or-nothing: any error means no instance was produced or
/// cached for the request.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
	/// No descriptor is registered under the requested name.
	#[error("no operation named `{name}`")]
	NoCandidate { name: Arc<str> },

	/// Descriptors exist under the name but none fits the request.
	#[error("no operation matches `{request}` with hints {hints} ({candidates} candidates)")]
	NoStructuralMatch {
		request: Signature,
		hints: Hints,
		candidates: usize,
	},

	/// Several candidates fit equally well.
	#[error("ambiguous match for `{request}`: {}", candidates.join(", "))]
	AmbiguousMatch {
		request: Signature,
		candidates: Vec<Arc<str>>,
	},

	/// A transform cannot bridge the candidate to the request.
	#[error("{category} cannot transform `{id}`: {reason}")]
	IllegalTransform {
		category: HintCategory,
		id: Arc<str>,
		reason: String,
	},

	/// A transform was attempted while already in progress, or on a candidate that refuses it.
	#[error("recursive {category} of `{id}`")]
	RecursiveTransform { category: HintCategory, id: Arc<str> },

	/// A request re-entered itself while resolving dependencies.
	#[error("cyclic dependency: {}", path.join(" -> "))]
	CyclicDependency { path: Vec<String> },

	/// A required dependency of `owner` failed to resolve.
	#[error("operation `{owner}` failed to resolve dependency `{dependency}` ({request})")]
	DependencyResolutionFailed {
		owner: Arc<str>,
		dependency: Arc<str>,
		request: Signature,
		#[source]
		source: Box<ResolutionError>,
	},

	/// No descriptor has the requested id.
	#[error("no operation with id `{0}`")]
	UnknownId(Arc<str>),

	/// The descriptor's factory failed.
	#[error("failed to instantiate `{id}`")]
	Instantiation {
		id: Arc<str>,
		#[source]
		source: OpError,
	},

	#[error(transparent)]
	Registry(#[from] RegistryError),
}

impl ResolutionError {
	/// The innermost error of a dependency failure chain.
	pub fn root_cause(&self) -> &ResolutionError {
		let mut cur = self;
		while let Self::DependencyResolutionFailed { source, .. } = cur {
			cur = source;
		}
		cur
	}

	/// Dependency keys from the outermost owner down to the failure.
	pub fn dependency_path(&self) -> Vec<&str> {
		let mut out = Vec::new();
		let mut cur = self;
		while let Self::DependencyResolutionFailed {
			dependency, source, ..
		} = cur
		{
			out.push(&**dependency);
			cur = source;
		}
		out
	}
}
