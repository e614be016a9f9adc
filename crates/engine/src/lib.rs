//! Type-directed operation resolution.
//!
//! A request names an operation and describes its call shape as a
//! [`Signature`](opsmith_primitives::Signature). The [`OpEnvironment`] looks
//! up every descriptor registered under the name, picks the best structural
//! fit (bridging gaps with signature transforms when nothing fits directly),
//! resolves the winner's dependencies recursively, and returns a cached
//! [`ResolvedInstance`] that can be called like the request describes.
//!
//! ```text
//! resolve(name, signature, hints)
//!   -> cache hit?                      (MatchCache)
//!   -> candidates by name              (OpRegistry)
//!   -> direct fit, else transforms     (matcher, transform)
//!   -> dependencies, recursively       (resolver)
//!   -> ResolvedInstance, published to the cache
//! ```

mod cache;
mod config;
mod conversion;
mod environment;
mod error;
mod global;
mod instance;
mod matcher;
mod provenance;
mod resolver;
pub mod transform;

pub use self::cache::{MatchCache, MatchingConditions};
pub use self::config::{ConfigError, EngineConfig, TieBreak, TransformToggles};
pub use self::conversion::{Conversion, ConversionChain, ConversionTable, ConvertFn, Loss};
pub use self::environment::{EngineBuilder, OpEnvironment};
pub use self::error::ResolutionError;
pub use self::global::global;
pub use self::instance::ResolvedInstance;
pub use self::matcher::{Fit, MatchScore, Selected, fit, select};
pub use self::provenance::ProvenanceLog;
