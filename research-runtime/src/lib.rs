//! Research Agent runtime
//!
//! Report rendering and the sequential pipeline that ties collectors,
//! analysis and rendering together.

pub mod report;
pub mod pipeline;

pub use report::*;
pub use pipeline::*;
