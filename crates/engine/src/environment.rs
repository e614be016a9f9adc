//! The resolution API.

use std::sync::Arc;

use arc_swap::ArcSwap;
use opsmith_primitives::{Hints, Signature, StandardTypes, Ty, TypeService, Value};
use opsmith_registry::{Descriptor, DescriptorSource, DuplicatePolicy, OpDescriptor, OpRegistry};

use crate::cache::MatchCache;
use crate::config::EngineConfig;
use crate::conversion::{ConversionTable, ConvertFn, Loss};
use crate::error::ResolutionError;
use crate::instance::ResolvedInstance;
use crate::provenance::ProvenanceLog;
use crate::resolver::Resolver;
use crate::transform::{TransformContext, TransformStrategy, default_strategies};

/// A registry plus everything needed to resolve requests against it.
///
/// Safe to share between threads; resolution only takes short-lived locks
/// in the cache and provenance log.
pub struct OpEnvironment {
	pub(crate) registry: OpRegistry,
	pub(crate) types: Arc<dyn TypeService>,
	pub(crate) conversions: ConversionTable,
	pub(crate) config: EngineConfig,
	pub(crate) strategies: Vec<Box<dyn TransformStrategy>>,
	pub(crate) cache: MatchCache,
	pub(crate) history: Arc<ProvenanceLog>,
	default_hints: ArcSwap<Hints>,
}

/// Builder for [`OpEnvironment`].
pub struct EngineBuilder {
	sources: Vec<Arc<dyn DescriptorSource>>,
	types: Option<Arc<dyn TypeService>>,
	conversions: ConversionTable,
	config: EngineConfig,
	duplicate_policy: Option<DuplicatePolicy>,
}

impl Default for EngineBuilder {
	fn default() -> Self {
		Self {
			sources: Vec::new(),
			types: None,
			conversions: ConversionTable::standard(),
			config: EngineConfig::default(),
			duplicate_policy: None,
		}
	}
}

impl EngineBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn source(mut self, source: impl DescriptorSource + 'static) -> Self {
		self.sources.push(Arc::new(source));
		self
	}

	pub fn shared_source(mut self, source: Arc<dyn DescriptorSource>) -> Self {
		self.sources.push(source);
		self
	}

	/// Replaces [`StandardTypes`].
	pub fn type_service(mut self, types: impl TypeService + 'static) -> Self {
		self.types = Some(Arc::new(types));
		self
	}

	pub fn config(mut self, config: EngineConfig) -> Self {
		self.config = config;
		self
	}

	/// Adds or replaces an edge of the conversion table.
	pub fn conversion(mut self, from: Ty, to: Ty, loss: Loss, convert: ConvertFn) -> Self {
		self.conversions.add(from, to, loss, convert);
		self
	}

	/// Replaces the whole conversion table.
	pub fn conversions(mut self, table: ConversionTable) -> Self {
		self.conversions = table;
		self
	}

	/// Overrides [`EngineConfig::duplicate_policy`].
	pub fn duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
		self.duplicate_policy = Some(policy);
		self
	}

	pub fn build(self) -> OpEnvironment {
		let mut config = self.config;
		if let Some(policy) = self.duplicate_policy {
			config.duplicate_policy = policy;
		}
		let types = self.types.unwrap_or_else(|| Arc::new(StandardTypes::new()));
		OpEnvironment {
			registry: OpRegistry::with_policy(self.sources, config.duplicate_policy),
			types,
			conversions: self.conversions,
			default_hints: ArcSwap::from_pointee(config.default_hints.clone()),
			config,
			strategies: default_strategies(),
			cache: MatchCache::new(),
			history: Arc::new(ProvenanceLog::new()),
		}
	}
}

impl OpEnvironment {
	pub fn builder() -> EngineBuilder {
		EngineBuilder::new()
	}

	/// Default configuration over `sources`.
	pub fn new(sources: Vec<Arc<dyn DescriptorSource>>) -> Self {
		sources
			.into_iter()
			.fold(EngineBuilder::new(), EngineBuilder::shared_source)
			.build()
	}

	/// Resolves `signature` under `name`.
	///
	/// The signature's own name is replaced by `name` when they differ.
	/// Identical requests return the same cached instance.
	pub fn resolve(
		&self,
		name: &str,
		signature: &Signature,
		hints: &Hints,
	) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let request = if &*signature.name == name {
			signature.clone()
		} else {
			signature.with_name(name)
		};
		Resolver::new(self).resolve(&request, hints)
	}

	/// [`OpEnvironment::resolve`] under the environment's default hints.
	pub fn resolve_default(&self, name: &str, signature: &Signature) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let hints = self.default_hints();
		self.resolve(name, signature, &hints)
	}

	/// Instantiates `descriptor` without matching. The result is not cached.
	pub fn resolve_descriptor(
		&self,
		descriptor: &Descriptor,
		hints: &Hints,
	) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		Resolver::new(self).resolve_descriptor(descriptor, hints)
	}

	/// Instantiates the descriptor registered under `id`.
	pub fn resolve_by_id(&self, id: &str, hints: &Hints) -> Result<Arc<ResolvedInstance>, ResolutionError> {
		let descriptor = self
			.registry
			.get_by_id(id)
			.ok_or_else(|| ResolutionError::UnknownId(Arc::from(id)))?;
		self.resolve_descriptor(&descriptor, hints)
	}

	/// Descriptors registered under `name`, in precedence order.
	pub fn infos(&self, name: &str) -> Vec<Descriptor> {
		self.registry.lookup(name)
	}

	/// Like [`OpEnvironment::infos`], minus descriptors `hints` exclude.
	pub fn infos_filtered(&self, name: &str, hints: &Hints) -> Vec<Descriptor> {
		self.registry.lookup_filtered(name, hints)
	}

	pub fn descriptions(&self, name: &str) -> Vec<String> {
		self.registry.descriptions(name)
	}

	pub fn names(&self) -> Vec<String> {
		self.registry.names()
	}

	/// Adds a descriptor at runtime and drops every cached instance.
	pub fn register(&self, descriptor: OpDescriptor) -> Result<Descriptor, ResolutionError> {
		let registered = self.registry.register(descriptor)?;
		self.cache.clear();
		Ok(registered)
	}

	pub fn default_hints(&self) -> Hints {
		Hints::clone(&self.default_hints.load())
	}

	pub fn set_default_hints(&self, hints: Hints) {
		self.default_hints.store(Arc::new(hints));
	}

	/// Forgets the registry snapshot and every cached instance.
	///
	/// The next resolution re-queries the descriptor sources.
	pub fn invalidate(&self) {
		self.registry.invalidate();
		self.cache.clear();
		tracing::debug!("environment invalidated");
	}

	pub fn history(&self) -> &Arc<ProvenanceLog> {
		&self.history
	}

	/// Instances that produced or wrote `value`.
	pub fn executions_on(&self, value: &Value) -> Vec<Arc<ResolvedInstance>> {
		self.history.executions_on(value)
	}

	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	pub fn types(&self) -> &dyn TypeService {
		&*self.types
	}

	pub fn registry(&self) -> &OpRegistry {
		&self.registry
	}

	pub fn cache(&self) -> &MatchCache {
		&self.cache
	}

	pub(crate) fn transform_context(&self) -> TransformContext<'_> {
		TransformContext {
			types: &*self.types,
			conversions: &self.conversions,
			config: &self.config,
		}
	}
}

impl std::fmt::Debug for OpEnvironment {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("OpEnvironment")
			.field("config", &self.config)
			.field("cache", &self.cache)
			.field("history", &self.history)
			.finish_non_exhaustive()
	}
}
