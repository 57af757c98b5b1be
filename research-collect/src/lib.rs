//! Research Agent Collectors
//!
//! Provides data collection through the scraping provider:
//! - Shared HTTP client with bearer auth
//! - Exponential back-off for transient failures
//! - Social (X profile) and web (Google search) collectors

pub mod error;
pub mod retry;
pub mod client;
pub mod collector;
pub mod social;
pub mod web;

pub use error::*;
pub use retry::*;
pub use client::*;
pub use collector::*;
pub use social::*;
pub use web::*;
