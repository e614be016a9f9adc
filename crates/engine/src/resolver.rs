//! Recursive resolution of a request and its dependencies.
//!
//! # Role
//!
//! Select a descriptor for a request, resolve every dependency it declares
//! (including those added by transforms), and build the instance. Results are
//! published to the match cache; a racing resolution of the same request
//! receives whichever instance was published first.
//!
//! # Invariants
//!
//! - A request that re-enters itself on the active path fails with
//!   [`ResolutionError::CyclicDependency`] instead of recursing.
//!   - Enforced in: [`Resolver::enter`]
//!   - Tested by: `resolve::test_dependency_cycle_fails_fast`
//! - Nothing is cached for a request that failed.
//!   - Enforced in: [`Resolver::resolve`]
//!   - Tested by: `resolve::test_failed_dependency_is_not_cached`

use std::sync::Arc;

use opsmith_primitives::{Bindings, Hints, OpError, Signature, TypeService, tokens};
use opsmith_registry::{Dependencies, Descriptor, Invocable};
use smallvec::SmallVec;

use crate::cache::MatchingConditions;
use crate::environment::OpEnvironment;
use crate::error::ResolutionError;
use crate::instance::{InstanceParts, ResolvedInstance};
use crate::matcher;

/// One resolution call and the requests active on its path.
pub(crate) struct Resolver<'env> {
	env: &'env OpEnvironment,
	path: SmallVec<[Signature; 8]>,
}

impl<'env> Resolver<'env> {
	pub(crate) fn new(env: &'env OpEnvironment) -> Self {
		Self {
			env,
			path: SmallVec::new(),
		}
	}

	pub(crate) fn resolve(&mut self, request: &Signature, hints: &Hints) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let key = MatchingConditions::new(request.clone(), hints.clone());
		if let Some(hit) = self.env.cache.get(&key) {
			tracing::debug!(request = %request, "cache hit");
			return Ok(hit);
		}
		tracing::debug!(request = %request, hints = %hints, "cache miss");

		self.enter(request)?;
		let built = self.select_and_build(request, hints);
		self.path.pop();
		Ok(self.env.cache.put_if_absent(key, built?))
	}

	/// Builds `descriptor` directly, still resolving its dependencies.
	pub(crate) fn resolve_descriptor(
		&mut self,
		descriptor: &Descriptor,
		hints: &Hints,
	) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let request = descriptor.signature().clone();
		self.enter(&request)?;
		let built = self.instantiate(descriptor, &request, hints, descriptor.fixed_bindings());
		self.path.pop();
		built
	}

	fn enter(&mut self, request: &Signature) -> Result<(), ResolutionError> {
		if self.path.contains(request) || self.path.len() >= self.env.config.max_depth {
			let mut path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
			path.push(request.to_string());
			return Err(ResolutionError::CyclicDependency { path });
		}
		self.path.push(request.clone());
		Ok(())
	}

	fn select_and_build(&mut self, request: &Signature, hints: &Hints) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let env = self.env;
		let registry = &env.registry;
		if registry.lookup(&request.name).is_empty() {
			return Err(ResolutionError::NoCandidate {
				name: request.name.clone(),
			});
		}
		let candidates = registry.lookup_filtered(&request.name, hints);
		let selected = matcher::select(
			&candidates,
			request,
			hints,
			&env.transform_context(),
			&env.strategies,
		)?;
		self.instantiate(&selected.descriptor, request, hints, selected.bindings)
	}

	fn instantiate(
		&mut self,
		descriptor: &Descriptor,
		request: &Signature,
		hints: &Hints,
		mut bindings: Bindings,
	) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		bindings.absorb(&descriptor.fixed_bindings());
		let env = self.env;
		let types = &*env.types;

		let mut slots = Dependencies::new();
		let mut resolved = Vec::new();
		for (layer, spec) in descriptor.layered_dependencies() {
			let sub_request = substitute(&spec.template, &bindings, types);
			let mut sub_hints = hints.plus_all([tokens::DEPENDENCY_MATCHING_IN_PROGRESS, tokens::HISTORY_SKIP_RECORDING]);
			if !spec.adaptable {
				sub_hints = sub_hints.plus(tokens::ADAPTATION_FORBIDDEN);
			}
			if let Some(token) = layer.and_then(|tag| tag.category().in_progress()) {
				sub_hints = sub_hints.plus(token);
			}

			match self.resolve(&sub_request, &sub_hints) {
				Ok(instance) => {
					slots.insert(spec.key.clone(), instance.clone() as Arc<dyn Invocable>);
					resolved.push((spec.key.clone(), instance));
				}
				Err(err @ ResolutionError::CyclicDependency { .. }) => return Err(err),
				Err(err) if !spec.required => {
					tracing::warn!(
						owner = %descriptor.id(),
						dependency = %spec.key,
						error = %err,
						"optional dependency unresolved"
					);
				}
				Err(err) => {
					return Err(ResolutionError::DependencyResolutionFailed {
						owner: descriptor.id().clone(),
						dependency: spec.key.clone(),
						request: sub_request,
						source: Box::new(err),
					});
				}
			}
		}

		let behavior = descriptor
			.instantiate(&slots)
			.map_err(|source| ResolutionError::Instantiation {
				id: descriptor.id().clone(),
				source,
			})?;
		let expected = descriptor.signature().shape;
		if behavior.shape() != expected {
			return Err(ResolutionError::Instantiation {
				id: descriptor.id().clone(),
				source: OpError::ShapeMismatch {
					actual: behavior.shape().as_str(),
					requested: expected.as_str(),
				},
			});
		}

		let history = (env.config.record_history && !hints.contains(tokens::HISTORY_SKIP_RECORDING))
			.then(|| Arc::downgrade(&env.history));
		Ok(ResolvedInstance::new(InstanceParts {
			descriptor: descriptor.clone(),
			signature: request.clone(),
			hints: hints.clone(),
			bindings,
			dependencies: resolved,
			behavior,
			history,
		}))
	}
}

fn substitute(template: &Signature, bindings: &Bindings, types: &dyn TypeService) -> Signature {
	template
		.with_inputs(template.inputs.iter().map(|ty| types.substitute(ty, bindings)))
		.with_output(types.substitute(&template.output, bindings))
}
