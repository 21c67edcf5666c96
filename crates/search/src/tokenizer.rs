//! Basic tokenizer for keyword search
//!
//! Query text and metadata text go through the same tokenizer so that
//! overlap is computed on identical term forms. No stemming or stopwords.

use std::collections::HashSet;
use vexil_core::value::{Metadata, MetadataValue};

/// Tokenize text into searchable terms
///
/// - Lowercase
/// - Split on non-alphanumeric characters
/// - Filter tokens shorter than 2 characters
///
/// # Example
///
/// ```
/// use vexil_search::tokenizer::tokenize;
///
/// let tokens = tokenize("Hello, World!");
/// assert_eq!(tokens, vec!["hello", "world"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() >= 2)
        .map(String::from)
        .collect()
}

/// Tokenize and deduplicate for query processing
///
/// # Example
///
/// ```
/// use vexil_search::tokenizer::tokenize_unique;
///
/// let tokens = tokenize_unique("test test TEST");
/// assert_eq!(tokens, vec!["test"]);
/// ```
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Bag of words for a metadata map
///
/// Every string value contributes its tokens, including strings nested in
/// lists and maps. Keys, numbers and bools are ignored.
pub fn metadata_terms(metadata: &Metadata) -> HashSet<String> {
    let mut terms = HashSet::new();
    for value in metadata.values() {
        collect_terms(value, &mut terms);
    }
    terms
}

fn collect_terms(value: &MetadataValue, terms: &mut HashSet<String>) {
    match value {
        MetadataValue::String(s) => terms.extend(tokenize(s)),
        MetadataValue::List(items) => {
            for item in items {
                collect_terms(item, terms);
            }
        }
        MetadataValue::Map(map) => {
            for item in map.values() {
                collect_terms(item, terms);
            }
        }
        MetadataValue::Null | MetadataValue::Bool(_) | MetadataValue::Number(_) => {}
    }
}
