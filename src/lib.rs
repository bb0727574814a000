//! Industry screener
//!
//! Resolves an industry keyword to a ticker pool, snapshots per-ticker
//! fundamentals from a market data provider, and filters the snapshot
//! through a named threshold screen.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod industry;
pub mod data;
pub mod screen;
pub mod engine;

#[cfg(test)]
mod testing;
