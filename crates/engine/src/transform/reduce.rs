use std::sync::Arc;

use opsmith_primitives::{Bindings, HintCategory, Hints, OpError, Signature, Value};
use opsmith_registry::{Behavior, Dependencies, Descriptor, SyntheticDescriptor, TransformTag};

use super::{TransformContext, TransformStrategy, guard, illegal};
use crate::error::ResolutionError;

/// Drops trailing optional inputs; the wrapper passes [`Value::absent`] for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reduction;

impl TransformStrategy for Reduction {
	fn category(&self) -> HintCategory {
		HintCategory::Reduction
	}

	fn apply(
		&self,
		candidate: &Descriptor,
		request: &Signature,
		hints: &Hints,
		_ctx: &TransformContext<'_>,
	) -> Result<Descriptor, ResolutionError> {
		guard(HintCategory::Reduction, candidate, hints)?;
		let sig = candidate.signature();
		let kept = request.arity();
		if kept >= sig.arity() {
			return Err(illegal(
				HintCategory::Reduction,
				candidate,
				format!("request takes {kept} inputs, candidate only {}", sig.arity()),
			));
		}
		let params = candidate.params();
		if let Some(required) = params[kept..].iter().find(|p| !p.optional) {
			return Err(illegal(
				HintCategory::Reduction,
				candidate,
				format!("parameter `{}` is required", required.name),
			));
		}

		let dropped = sig.arity() - kept;
		let signature = sig.with_inputs(sig.inputs[..kept].iter().cloned());
		let wrap = Arc::new(move |inner: Behavior, _: &Dependencies| -> Result<Behavior, OpError> {
			Ok(pad(inner, kept, dropped))
		});
		Ok(SyntheticDescriptor::new(
			candidate.clone(),
			TransformTag::Reduction { dropped },
			signature,
			params[..kept].iter().cloned(),
			[],
			Bindings::new(),
			wrap,
		)
		.into())
	}
}

fn padded(args: &[Value], kept: usize, dropped: usize) -> Result<Vec<Value>, OpError> {
	OpError::check_arity(kept, args.len())?;
	let mut full = Vec::with_capacity(kept + dropped);
	full.extend_from_slice(args);
	full.extend(std::iter::repeat_with(Value::absent).take(dropped));
	Ok(full)
}

fn pad(inner: Behavior, kept: usize, dropped: usize) -> Behavior {
	match inner {
		Behavior::Function(f) => Behavior::function(move |args| f(&padded(args, kept, dropped)?)),
		Behavior::Computer(c) => Behavior::computer(move |args, out| c(&padded(args, kept, dropped)?, out)),
	}
}
