//! Keyword scoring
//!
//! This module provides:
//! - `SearchDoc`: ephemeral term view of one vector's metadata
//! - `Scorer` trait for pluggable keyword scoring
//! - `OverlapScorer`: token-overlap ratio (default)

use crate::tokenizer::{metadata_terms, tokenize_unique};
use std::collections::HashSet;
use vexil_core::value::Metadata;

// ============================================================================
// SearchDoc
// ============================================================================

/// Term view of a document, built during search and not stored
#[derive(Debug, Clone, Default)]
pub struct SearchDoc {
    /// Distinct terms of the document
    pub terms: HashSet<String>,
}

impl SearchDoc {
    /// Build from raw text
    pub fn from_text(text: &str) -> Self {
        SearchDoc {
            terms: tokenize_unique(text).into_iter().collect(),
        }
    }

    /// Build from the string values of a metadata map
    pub fn from_metadata(metadata: &Metadata) -> Self {
        SearchDoc {
            terms: metadata_terms(metadata),
        }
    }

    /// Check if the document has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ============================================================================
// Query
// ============================================================================

/// Tokenized keyword query
#[derive(Debug, Clone)]
pub struct KeywordQuery {
    terms: Vec<String>,
}

impl KeywordQuery {
    /// Tokenize query text (duplicates removed)
    pub fn parse(text: &str) -> Self {
        KeywordQuery {
            terms: tokenize_unique(text),
        }
    }

    /// Distinct query terms in first-seen order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Check if the query has no searchable terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

// ============================================================================
// Scorer Trait
// ============================================================================

/// Pluggable keyword scoring interface
///
/// Scorers must be Send + Sync so the engine can share one instance across
/// concurrent searches.
pub trait Scorer: Send + Sync {
    /// Score a document against a query (higher = more relevant, 0 = no match)
    fn score(&self, doc: &SearchDoc, query: &KeywordQuery) -> f32;

    /// Name for debugging and logging
    fn name(&self) -> &str;
}

// ============================================================================
// OverlapScorer
// ============================================================================

/// Token-overlap ratio: matched query terms / total query terms
///
/// Range is [0, 1]. An empty query scores 0 against every document.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlapScorer;

impl OverlapScorer {
    /// Create a new OverlapScorer
    pub fn new() -> Self {
        OverlapScorer
    }
}

impl Scorer for OverlapScorer {
    fn score(&self, doc: &SearchDoc, query: &KeywordQuery) -> f32 {
        if query.is_empty() || doc.is_empty() {
            return 0.0;
        }
        let matched = query
            .terms()
            .iter()
            .filter(|t| doc.terms.contains(*t))
            .count();
        matched as f32 / query.terms().len() as f32
    }

    fn name(&self) -> &str {
        "overlap"
    }
}
