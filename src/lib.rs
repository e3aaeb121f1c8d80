//! Mood-to-music recommendation service.
//!
//! The algorithmic core is the catalog search/ranking engine: an immutable
//! in-memory snapshot of a track dataset plus a weighted multi-criteria
//! similarity search over it. Mood parsing, LLM re-ranking, and metadata
//! enrichment are external collaborators that drive this API.

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;
