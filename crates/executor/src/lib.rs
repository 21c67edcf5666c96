//! # Vexil Executor
//!
//! The structured command surface of the vexil vector engine.
//!
//! Every engine operation that takes plain data is a [`Command`] variant;
//! executing it yields exactly one [`Output`] variant or an [`Error`]. Both
//! serialize to JSON, so SDKs and wire front ends speak this crate only.
//!
//! ## Quick Start
//!
//! ```text
//! use vexil_executor::{Command, Executor, Output};
//!
//! let executor = Executor::from(VectorEngine::default());
//!
//! executor.execute(serde_json::from_str(
//!     r#"{"op": "create_index", "name": "docs", "dimension": 3}"#,
//! )?)?;
//!
//! let hits = executor.execute(Command::Search {
//!     index: "docs".into(),
//!     vector: vec![0.1, 0.2, 0.3],
//!     top_k: 5,
//!     ..
//! })?;
//! ```
//!
//! ## Batches
//!
//! [`Executor::batch_operations`] runs a heterogeneous command list either
//! sequentially or on the rayon pool, with optional fail-fast, and reports a
//! [`BatchStatus`] per position.

#![warn(missing_docs)]

mod batch;
mod command;
mod error;
mod executor;
mod output;

// Handler modules
mod handlers;

// Test modules
#[cfg(test)]
mod tests;

// =============================================================================
// Public API - Everything callers need is re-exported here
// =============================================================================

pub use batch::{BatchItem, BatchReport, BatchStatus};
pub use command::Command;
pub use error::Error;
pub use executor::Executor;
pub use output::Output;

// Re-export the engine so callers can build one without a direct dependency
pub use vexil_engine;
pub use vexil_engine::{EngineConfig, VectorEngine};

/// Result type for executor operations
pub type Result<T> = std::result::Result<T, Error>;
