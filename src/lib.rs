//! SignalSift - Hypothesis-Driven Signal Relevance Filtering
//!
//! Normalizes user posts from heterogeneous sources (Reddit, app stores,
//! review sites), scores them against a product hypothesis with embeddings,
//! and filters them through binary, two-stage, or tiered strategies while
//! tracking every paid provider call.

pub mod config;
pub mod cost;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod normalize;
pub mod verify;

pub use error::{Result, SignalSiftError};
