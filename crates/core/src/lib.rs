//! census-core
//!
//! Core library for the inline-assembly usage catalog.
//!
//! This crate defines the data model (instructions, sequences, categories,
//! projects, occurrences), the instruction normalizer, the SQLite-backed
//! catalog with its integrity checks, and the read-side statistics engine.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, batch ingestion scripts, etc.). The
//! collaborators that *gather* facts (cloning repositories, querying hosting
//! APIs, running line counters) and the formatters that *render* query output
//! live outside this crate; they only exchange plain records with it.

pub mod db;
pub mod normalize;
pub mod stats;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
