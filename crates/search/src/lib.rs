//! Text-side search infrastructure for vexil
//!
//! This crate provides:
//! - Basic tokenizer shared by queries and metadata
//! - Scorer trait with the token-overlap keyword scorer
//! - Fuser trait with the weighted hybrid fuser
//!
//! It holds no index state. The engine feeds it candidates from a locked
//! index snapshot and ranks the output.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod fuser;
pub mod scorer;
pub mod tokenizer;

pub use fuser::{compare_ranked, rank, FusedHit, FusedResult, Fuser, ScoredId, WeightedFuser};
pub use scorer::{KeywordQuery, OverlapScorer, Scorer, SearchDoc};
pub use tokenizer::{metadata_terms, tokenize, tokenize_unique};
