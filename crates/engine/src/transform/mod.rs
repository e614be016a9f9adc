//! Signature transforms.
//!
//! A strategy wraps a candidate in a [`SyntheticDescriptor`] whose signature
//! is closer to the request. Each synthetic descriptor declares its own
//! category `FORBIDDEN`, so a category appears at most once per chain.
//!
//! [`SyntheticDescriptor`]: opsmith_registry::SyntheticDescriptor

mod adapt;
mod reduce;
mod simplify;

use opsmith_primitives::{HintCategory, Hints, Signature, TypeService};
use opsmith_registry::Descriptor;

pub use self::adapt::{Adaptation, COPY_KEY, CREATE_KEY};
pub use self::reduce::Reduction;
pub use self::simplify::Simplification;
use crate::config::EngineConfig;
use crate::conversion::ConversionTable;
use crate::error::ResolutionError;

/// Shared state a strategy may consult.
#[derive(Clone, Copy)]
pub struct TransformContext<'a> {
	pub types: &'a dyn TypeService,
	pub conversions: &'a ConversionTable,
	pub config: &'a EngineConfig,
}

/// Builds a transformed view of a candidate descriptor.
pub trait TransformStrategy: Send + Sync {
	fn category(&self) -> HintCategory;

	/// Wraps `candidate` so its signature moves toward `request`.
	///
	/// Fails with [`ResolutionError::RecursiveTransform`] when the category is
	/// already in progress or refused by the candidate, and with
	/// [`ResolutionError::IllegalTransform`] when the gap cannot be bridged.
	fn apply(
		&self,
		candidate: &Descriptor,
		request: &Signature,
		hints: &Hints,
		ctx: &TransformContext<'_>,
	) -> Result<Descriptor, ResolutionError>;
}

/// Strategies in expansion order.
pub fn default_strategies() -> Vec<Box<dyn TransformStrategy>> {
	vec![Box::new(Reduction), Box::new(Adaptation), Box::new(Simplification)]
}

fn guard(category: HintCategory, candidate: &Descriptor, hints: &Hints) -> Result<(), ResolutionError> {
	let in_progress = hints.in_progress(category);
	let refused = category
		.forbidden()
		.is_some_and(|token| candidate.declared_hints().contains(token));
	if in_progress || refused {
		return Err(ResolutionError::RecursiveTransform {
			category,
			id: candidate.id().clone(),
		});
	}
	Ok(())
}

fn illegal(category: HintCategory, candidate: &Descriptor, reason: impl Into<String>) -> ResolutionError {
	ResolutionError::IllegalTransform {
		category,
		id: candidate.id().clone(),
		reason: reason.into(),
	}
}
