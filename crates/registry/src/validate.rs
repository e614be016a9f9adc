use rustc_hash::FxHashSet;

use crate::descriptor::OpDescriptor;
use crate::error::InvalidDescriptor;

/// Checks that a descriptor can be indexed and matched.
///
/// Requires at least one non-blank name, a well-formed signature, one param
/// per input, and unique, well-formed dependency declarations.
pub fn validate(d: &OpDescriptor) -> Result<(), InvalidDescriptor> {
	if d.names.is_empty() || d.names.iter().any(|n| n.trim().is_empty()) {
		return Err(InvalidDescriptor::Unnamed { id: d.id.clone() });
	}
	if !d.signature.is_well_formed() {
		return Err(InvalidDescriptor::MalformedSignature {
			id: d.id.clone(),
			signature: d.signature.to_string(),
		});
	}
	if d.params.len() != d.signature.arity() {
		return Err(InvalidDescriptor::ParamArity {
			id: d.id.clone(),
			params: d.params.len(),
			inputs: d.signature.arity(),
		});
	}
	let mut keys = FxHashSet::default();
	for dep in d.dependencies.iter() {
		if !keys.insert(dep.key.clone()) {
			return Err(InvalidDescriptor::DuplicateDependencyKey {
				id: d.id.clone(),
				key: dep.key.clone(),
			});
		}
		if dep.key.trim().is_empty() || !dep.template.is_well_formed() {
			return Err(InvalidDescriptor::MalformedDependency {
				id: d.id.clone(),
				key: dep.key.clone(),
			});
		}
	}
	Ok(())
}
