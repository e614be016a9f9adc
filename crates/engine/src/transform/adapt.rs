use std::sync::Arc;

use opsmith_primitives::{Bindings, HintCategory, Hints, OpError, OpShape, Signature};
use opsmith_registry::{Behavior, DependencySpec, Dependencies, Descriptor, SyntheticDescriptor, TransformTag, Wrapper};

use super::{TransformContext, TransformStrategy, guard, illegal};
use crate::error::ResolutionError;

/// Dependency slot holding the output allocator of a computer-to-function adaptation.
pub const CREATE_KEY: &str = "adapt.create";
/// Dependency slot holding the copier of a function-to-computer adaptation.
pub const COPY_KEY: &str = "adapt.copy";

/// Reshapes between functions and computers.
///
/// | from | to | extra dependency |
/// |------|----|------------------|
/// | computer | function | `create(first input) -> output` allocates the container |
/// | function | computer | computer `copy(output) -> output` fills the caller's container |
#[derive(Debug, Clone, Copy, Default)]
pub struct Adaptation;

impl TransformStrategy for Adaptation {
	fn category(&self) -> HintCategory {
		HintCategory::Adaptation
	}

	fn apply(
		&self,
		candidate: &Descriptor,
		request: &Signature,
		hints: &Hints,
		_ctx: &TransformContext<'_>,
	) -> Result<Descriptor, ResolutionError> {
		guard(HintCategory::Adaptation, candidate, hints)?;
		let sig = candidate.signature();
		let (dependency, wrap) = match (sig.shape, request.shape) {
			(OpShape::Computer, OpShape::Function) => {
				let Some(first) = sig.inputs.first() else {
					return Err(illegal(
						HintCategory::Adaptation,
						candidate,
						"a computer without inputs has nothing to allocate from",
					));
				};
				let create = Signature::function("create", [first.clone()], sig.output.clone());
				let wrap: Wrapper = Arc::new(|inner: Behavior, deps: &Dependencies| -> Result<Behavior, OpError> {
					let create = deps.require(CREATE_KEY)?.clone();
					Ok(Behavior::function(move |args| {
						let first = args.first().ok_or(OpError::Arity {
							expected: 1,
							got: 0,
						})?;
						let out = create.call(std::slice::from_ref(first))?;
						inner.compute(args, &out)?;
						Ok(out)
					}))
				});
				(DependencySpec::new(CREATE_KEY, create), wrap)
			}
			(OpShape::Function, OpShape::Computer) => {
				let copy = Signature::computer("copy", [sig.output.clone()], sig.output.clone());
				let wrap: Wrapper = Arc::new(|inner: Behavior, deps: &Dependencies| -> Result<Behavior, OpError> {
					let copy = deps.require(COPY_KEY)?.clone();
					Ok(Behavior::computer(move |args, out| {
						let result = inner.call(args)?;
						copy.compute(std::slice::from_ref(&result), out)
					}))
				});
				(DependencySpec::new(COPY_KEY, copy), wrap)
			}
			(from, _) => {
				return Err(illegal(
					HintCategory::Adaptation,
					candidate,
					format!("candidate is already a {from}"),
				));
			}
		};

		Ok(SyntheticDescriptor::new(
			candidate.clone(),
			TransformTag::Adaptation {
				from: sig.shape,
				to: request.shape,
			},
			sig.with_shape(request.shape),
			candidate.params().iter().cloned(),
			[dependency],
			Bindings::new(),
			wrap,
		)
		.into())
	}
}
