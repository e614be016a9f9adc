//! Candidate selection.
//!
//! # Role
//!
//! Given the descriptors registered under a name, pick the one that fits a
//! request best. Direct fits are tried first; only when none exists are the
//! candidates expanded through the transform strategies.
//!
//! # Invariants
//!
//! - A transformed candidate never beats a direct fit, whatever its priority.
//!   - Enforced in: [`MatchScore`] ordering (`tier` first), and [`select`]
//!     only expanding when no direct fit exists.
//!   - Tested by: `tests::test_direct_beats_priority`
//! - Two candidates with equal scores at the top are ambiguous unless the
//!   tie-break says otherwise.
//!   - Enforced in: [`select`]
//!   - Tested by: `tests::test_equal_scores_are_ambiguous`

use std::cmp::Ordering;
use std::sync::Arc;

use opsmith_primitives::{Bindings, Hints, OpShape, Signature, Ty, TypeService};
use opsmith_registry::{Descriptor, TransformTag};

use crate::config::TieBreak;
use crate::error::ResolutionError;
use crate::transform::{TransformContext, TransformStrategy};

/// How well a descriptor fits a request. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchScore {
	/// Number of transforms applied; zero for a direct fit.
	pub tier: u32,
	/// Total simplification loss.
	pub loss: u32,
	/// Summed specificity distance over every type position.
	pub distance: u32,
	pub priority: i16,
}

impl Ord for MatchScore {
	fn cmp(&self, other: &Self) -> Ordering {
		self.tier
			.cmp(&other.tier)
			.then(self.loss.cmp(&other.loss))
			.then(self.distance.cmp(&other.distance))
			.then(other.priority.cmp(&self.priority))
	}
}

impl PartialOrd for MatchScore {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

/// Structural fit of one descriptor against a request.
#[derive(Debug, Clone)]
pub struct Fit {
	pub bindings: Bindings,
	pub distance: u32,
}

/// Checks shape, arity, and every type position of `descriptor` against `request`.
///
/// Inputs are contravariant: the request's input must be assignable to the
/// descriptor's. A function's output is covariant; a computer's output
/// container runs the other way, since the caller supplies it.
pub fn fit(descriptor: &Descriptor, request: &Signature, types: &dyn TypeService) -> Option<Fit> {
	let sig = descriptor.signature();
	if sig.shape != request.shape || sig.arity() != request.arity() {
		return None;
	}

	let mut bindings = descriptor.fixed_bindings();
	for (template, concrete) in sig.inputs.iter().zip(request.inputs.iter()) {
		if !types.bind(template, concrete, &mut bindings) {
			return None;
		}
	}
	if !types.bind(&sig.output, &request.output, &mut bindings) {
		return None;
	}

	let mut distance = 0;
	for (template, concrete) in sig.inputs.iter().zip(request.inputs.iter()) {
		let bound = types.substitute(template, &bindings);
		if !open_or_assignable(types, concrete, &bound) {
			return None;
		}
		distance += types.specificity(template, concrete)?;
	}

	let output = types.substitute(&sig.output, &bindings);
	let output_fits = match sig.shape {
		OpShape::Function => types.assignable(&output, &request.output),
		OpShape::Computer => open_or_assignable(types, &request.output, &output),
	};
	if !output_fits {
		return None;
	}
	distance += types.specificity(&sig.output, &request.output)?;

	Some(Fit { bindings, distance })
}

/// A request position left as `?` or an unbound variable constrains nothing.
fn open_or_assignable(types: &dyn TypeService, requested: &Ty, declared: &Ty) -> bool {
	requested.is_wildcard() || types.assignable(requested, declared)
}

/// A scored candidate.
#[derive(Debug, Clone)]
pub struct Selected {
	pub descriptor: Descriptor,
	pub bindings: Bindings,
	pub score: MatchScore,
}

fn score_of(descriptor: &Descriptor, fit: &Fit) -> MatchScore {
	let chain = descriptor.transform_chain();
	let loss = chain
		.iter()
		.map(|tag| match tag {
			TransformTag::Simplification { loss } => *loss,
			_ => 0,
		})
		.sum();
	MatchScore {
		tier: u32::try_from(chain.len()).unwrap_or(u32::MAX),
		loss,
		distance: fit.distance,
		priority: descriptor.priority(),
	}
}

fn scored(descriptor: &Descriptor, request: &Signature, types: &dyn TypeService) -> Option<Selected> {
	let fit = fit(descriptor, request, types)?;
	Some(Selected {
		score: score_of(descriptor, &fit),
		descriptor: descriptor.clone(),
		bindings: fit.bindings,
	})
}

/// Every transformed view of `candidate` the enabled strategies can build.
///
/// Strategies run in order; each one is applied to the candidate and to every
/// variant produced by earlier strategies.
fn expand(
	candidate: &Descriptor,
	request: &Signature,
	hints: &Hints,
	ctx: &TransformContext<'_>,
	strategies: &[Box<dyn TransformStrategy>],
) -> Vec<Descriptor> {
	let mut variants = vec![candidate.clone()];
	for strategy in strategies {
		let category = strategy.category();
		if !ctx.config.transforms.enabled(category) || hints.forbids(category) {
			continue;
		}
		let mut produced = Vec::new();
		for variant in &variants {
			match strategy.apply(variant, request, hints, ctx) {
				Ok(d) => produced.push(d),
				Err(err) => {
					tracing::trace!(candidate = %variant.id(), %category, error = %err, "transform rejected");
				}
			}
		}
		variants.extend(produced);
	}
	variants.remove(0);
	variants
}

/// Picks the best of `candidates` for `request`.
///
/// `candidates` must already be hint-filtered and in registry precedence
/// order; that order decides [`TieBreak::FirstRegistered`].
pub fn select(
	candidates: &[Descriptor],
	request: &Signature,
	hints: &Hints,
	ctx: &TransformContext<'_>,
	strategies: &[Box<dyn TransformStrategy>],
) -> Result<Selected, ResolutionError> {
	let mut ranked: Vec<Selected> = candidates
		.iter()
		.filter_map(|d| {
			let s = scored(d, request, ctx.types);
			if s.is_none() {
				tracing::trace!(candidate = %d.id(), request = %request, "no direct fit");
			}
			s
		})
		.collect();

	if ranked.is_empty() {
		for candidate in candidates {
			let mut best: Option<Selected> = None;
			for variant in expand(candidate, request, hints, ctx, strategies) {
				let Some(s) = scored(&variant, request, ctx.types) else {
					tracing::trace!(candidate = %variant.id(), request = %request, "transformed view does not fit");
					continue;
				};
				if best.as_ref().is_none_or(|b| s.score < b.score) {
					best = Some(s);
				}
			}
			ranked.extend(best);
		}
	}

	ranked.sort_by(|a, b| a.score.cmp(&b.score));
	let mut ranked = ranked.into_iter();
	let Some(winner) = ranked.next() else {
		return Err(ResolutionError::NoStructuralMatch {
			request: request.clone(),
			hints: hints.clone(),
			candidates: candidates.len(),
		});
	};

	let tied: Vec<Arc<str>> = ranked
		.take_while(|s| s.score == winner.score)
		.map(|s| s.descriptor.id().clone())
		.collect();
	if !tied.is_empty() && ctx.config.tie_break == TieBreak::Error {
		let mut ids = vec![winner.descriptor.id().clone()];
		ids.extend(tied);
		return Err(ResolutionError::AmbiguousMatch {
			request: request.clone(),
			candidates: ids,
		});
	}

	tracing::debug!(
		request = %request,
		winner = %winner.descriptor.id(),
		tier = winner.score.tier,
		loss = winner.score.loss,
		"selected operation"
	);
	Ok(winner)
}
