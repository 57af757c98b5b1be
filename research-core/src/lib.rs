//! Research Agent Core - item model, normalization and prompt composition
//!
//! This crate provides the pure parts of the pipeline:
//! - The normalized [`CollectedItem`] model shared by every stage
//! - Data-driven extraction tables for provider responses
//! - Bounded analysis prompt composition
//! - Analysis result types

pub mod item;
pub mod analysis;
pub mod normalize;
pub mod prompt;

pub use item::*;
pub use analysis::*;
pub use normalize::*;
pub use prompt::*;

/// Default number of items requested per source
pub const DEFAULT_MAX_ITEMS: usize = 20;

/// Upper bound accepted for items per source
pub const MAX_ITEMS_LIMIT: usize = 100;
