use std::sync::Arc;

use opsmith_primitives::{Bindings, HintCategory, Hints, OpError, OpShape, Signature, Value};
use opsmith_registry::{Behavior, Dependencies, Descriptor, SyntheticDescriptor, TransformTag};

use super::{TransformContext, TransformStrategy, guard, illegal};
use crate::conversion::ConversionChain;
use crate::error::ResolutionError;

/// Inserts conversions at the boundary.
///
/// Each input is converted from the request's type to the candidate's; a
/// function's output is converted from the candidate's type to the request's.
/// Computer outputs are written in place and are never converted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplification;

impl TransformStrategy for Simplification {
	fn category(&self) -> HintCategory {
		HintCategory::Simplification
	}

	fn apply(
		&self,
		candidate: &Descriptor,
		request: &Signature,
		hints: &Hints,
		ctx: &TransformContext<'_>,
	) -> Result<Descriptor, ResolutionError> {
		const CAT: HintCategory = HintCategory::Simplification;
		guard(CAT, candidate, hints)?;
		let sig = candidate.signature();
		if sig.shape != request.shape || sig.arity() != request.arity() {
			return Err(illegal(CAT, candidate, "shape or arity differs from the request"));
		}
		let types = ctx.types;
		let max_steps = ctx.config.max_conversion_steps;

		// Lenient: unrelated positions are what the conversions are for.
		let mut bindings = candidate.fixed_bindings();
		for (template, concrete) in sig.inputs.iter().zip(request.inputs.iter()) {
			types.bind(template, concrete, &mut bindings);
		}
		types.bind(&sig.output, &request.output, &mut bindings);

		let mut inputs = Vec::with_capacity(sig.arity());
		for (template, concrete) in sig.inputs.iter().zip(request.inputs.iter()) {
			let target = types.substitute(template, &bindings);
			let Some(chain) = ctx.conversions.cheapest_chain(concrete, &target, types, max_steps) else {
				return Err(illegal(CAT, candidate, format!("no conversion from {concrete} to {target}")));
			};
			if let Some(reached) = chain.target() {
				types.bind(template, reached, &mut bindings);
			}
			inputs.push(chain);
		}

		let produced = types.substitute(&sig.output, &bindings);
		let output = match sig.shape {
			OpShape::Function => ctx
				.conversions
				.cheapest_chain(&produced, &request.output, types, max_steps)
				.ok_or_else(|| {
					illegal(CAT, candidate, format!("no conversion from {produced} to {}", request.output))
				})?,
			OpShape::Computer => {
				if !types.assignable(&request.output, &produced) {
					return Err(illegal(CAT, candidate, "computer outputs cannot be converted"));
				}
				ConversionChain::identity()
			}
		};

		let loss = inputs.iter().map(ConversionChain::loss).sum::<u32>() + output.loss();
		if loss == 0 {
			return Err(illegal(CAT, candidate, "no conversion needed"));
		}

		let signature = sig
			.with_inputs(request.inputs.iter().cloned())
			.with_output(if output.is_identity() {
				produced
			} else {
				request.output.clone()
			});
		let inputs: Arc<[ConversionChain]> = inputs.into();
		let output = Arc::new(output);
		let wrap = Arc::new(move |inner: Behavior, _: &Dependencies| -> Result<Behavior, OpError> {
			Ok(convert(inner, inputs.clone(), output.clone()))
		});
		Ok(SyntheticDescriptor::new(
			candidate.clone(),
			TransformTag::Simplification { loss },
			signature,
			candidate.params().iter().cloned(),
			[],
			bindings,
			wrap,
		)
		.into())
	}
}

fn converted(chains: &[ConversionChain], args: &[Value]) -> Result<Vec<Value>, OpError> {
	OpError::check_arity(chains.len(), args.len())?;
	chains.iter().zip(args).map(|(chain, arg)| chain.apply(arg)).collect()
}

fn convert(inner: Behavior, inputs: Arc<[ConversionChain]>, output: Arc<ConversionChain>) -> Behavior {
	match inner {
		Behavior::Function(f) => Behavior::function(move |args| {
			let result = f(&converted(&inputs, args)?)?;
			output.apply(&result)
		}),
		Behavior::Computer(c) => Behavior::computer(move |args, out| c(&converted(&inputs, args)?, out)),
	}
}
