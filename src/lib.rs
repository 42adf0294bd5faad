//! Funnel extrapolation engine.
//!
//! Scales analytics results computed over a sampled funnel so they
//! approximate the full, unsampled event population.
//!
//! # Module structure
//!
//! - [`model`]: requests, responses, filters, funnels
//! - [`policy`]: which statistics may be rescaled
//! - [`align`]: positional bucket alignment
//! - [`base_query`]: synthetic base-event queries
//! - [`factor`]: scalar and bucketed extrapolation factors
//! - [`tree`]: recursive group-by scaling
//! - [`transform`]: the per-variant dispatcher
//! - [`backend`]: executor and funnel store seams
//! - [`replay`]: canned executor for offline runs
//! - [`funnel_id`]: funnel resolution from request filters
//! - [`config`]: TOML + env configuration
//! - [`error`]: error taxonomy
//! - [`logging`]: subscriber setup for the binary

pub mod align;
pub mod backend;
pub mod base_query;
pub mod config;
pub mod error;
pub mod factor;
pub mod funnel_id;
pub mod logging;
pub mod model;
pub mod policy;
pub mod replay;
pub mod transform;
pub mod tree;

pub use backend::{ExecutorError, FunnelStore, InMemoryFunnelStore, QueryExecutor, StoreError};
pub use config::{ConfigError, ExtrapolationConfig, MissingFunnelPolicy};
pub use error::{ExtrapolationError, ExtrapolationResult};
pub use factor::{ExtrapolationFactor, FactorCalculator};
pub use replay::{ReplayExecutor, ReplayFixture};
pub use transform::{ResponseTransformer, extrapolate};
