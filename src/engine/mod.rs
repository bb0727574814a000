//! Core engine: per-ticker snapshot fetch and the screen orchestrator.

pub mod fetcher;
pub mod orchestrator;
