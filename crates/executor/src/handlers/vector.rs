//! Vector command handlers.

use vexil_core::{MetadataFilter, NewVector, VectorUpdate};
use vexil_engine::{DeleteSelector, ListRequest, VectorEngine};

use crate::{Output, Result};

/// Handle `InsertVectors`.
pub fn insert_vectors(
    engine: &VectorEngine,
    index: String,
    vectors: Vec<NewVector>,
    batch_size: Option<usize>,
    upsert: bool,
) -> Result<Output> {
    Ok(Output::Written(
        engine.insert_vectors(&index, vectors, batch_size, upsert)?,
    ))
}

/// Handle `UpdateVectors`.
pub fn update_vectors(
    engine: &VectorEngine,
    index: String,
    updates: Vec<VectorUpdate>,
    batch_size: Option<usize>,
) -> Result<Output> {
    Ok(Output::Written(
        engine.update_vectors(&index, updates, batch_size)?,
    ))
}

/// Handle `DeleteVectors`; exactly one selection mode must be given.
pub fn delete_vectors(
    engine: &VectorEngine,
    index: String,
    ids: Option<Vec<String>>,
    filter: Option<MetadataFilter>,
    confirm_delete_all: bool,
) -> Result<Output> {
    let selector = DeleteSelector::from_parts(ids, filter, confirm_delete_all)?;
    Ok(Output::Written(engine.delete_vectors(&index, selector)?))
}

/// Handle `GetVector`.
pub fn get_vector(
    engine: &VectorEngine,
    index: String,
    id: String,
    include_vector: bool,
) -> Result<Output> {
    Ok(Output::Vector(engine.get_vector(&index, &id, include_vector)?))
}

/// Handle `VectorExists`.
pub fn vector_exists(engine: &VectorEngine, index: String, id: String) -> Result<Output> {
    Ok(Output::Bool(engine.vector_exists(&index, &id)?))
}

/// Handle `ListVectors`.
pub fn list_vectors(
    engine: &VectorEngine,
    index: String,
    limit: usize,
    offset: usize,
    filter: Option<MetadataFilter>,
    include_vectors: bool,
) -> Result<Output> {
    let mut request = ListRequest::new(limit, offset);
    request.filter = filter;
    request.include_vectors = include_vectors;
    Ok(Output::VectorPage(engine.list_vectors(&index, &request)?))
}

/// Handle `CountVectors`.
pub fn count_vectors(
    engine: &VectorEngine,
    index: String,
    filter: Option<MetadataFilter>,
) -> Result<Output> {
    Ok(Output::Count(engine.count_vectors(&index, filter.as_ref())?))
}
