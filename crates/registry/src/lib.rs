//! Operation descriptors and the registry that indexes them.
//!
//! # Mental Model
//!
//! 1. **Declaration:** An [`OpDescriptor`] names an operation, declares its
//!    [`Signature`](opsmith_primitives::Signature), the hints it refuses, the
//!    sub-operations it depends on, and a factory producing a [`Behavior`].
//! 2. **Discovery:** [`DescriptorSource`]s hand descriptors to the registry.
//!    [`InventorySource`] collects link-time [`OpPlugin`]s; [`ManualSource`]
//!    accepts runtime registrations.
//! 3. **Indexing:** [`RegistryBuilder`] validates descriptors, resolves duplicate
//!    ids under a [`DuplicatePolicy`], and produces an immutable [`RegistryIndex`].
//! 4. **Publication:** [`OpRegistry`] builds its index lazily, exactly once, and
//!    publishes it as an atomic snapshot. Runtime registrations extend the
//!    snapshot through a compare-and-swap loop.
//!
//! Synthetic descriptors produced by signature transforms are also
//! [`Descriptor`]s, so the engine ranks and instantiates them through the same
//! handle type it uses for declared ones.

mod behavior;
mod descriptor;
mod error;
mod index;
mod plugin;
mod registry;
mod source;
mod validate;

pub use behavior::{Behavior, ComputerFn, Dependencies, Factory, FunctionFn, Invocable, Wrapper};
pub use descriptor::{
	DependencySpec, Descriptor, OpDescriptor, OpDescriptorBuilder, OpSource, Param,
	SyntheticDescriptor, TransformTag,
};
pub use error::{InvalidDescriptor, RegistryError};
pub use index::{Collision, DuplicatePolicy, Party, RegistryBuilder, RegistryIndex};
pub use plugin::OpPlugin;
pub use registry::OpRegistry;
pub use source::{DescriptorSource, InventorySource, ManualSource};
pub use validate::validate;

/// Re-exported so plugin crates can submit [`OpPlugin`]s without a direct dependency.
pub use inventory;
