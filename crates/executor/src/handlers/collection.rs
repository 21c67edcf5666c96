//! Collection command handlers.

use vexil_core::TuningConfig;
use vexil_engine::{CollectionSpec, VectorEngine};

use crate::{Output, Result};

/// Handle `CreateCollection`.
pub fn create_collection(
    engine: &VectorEngine,
    name: String,
    description: String,
    config: TuningConfig,
    indexes: Vec<String>,
) -> Result<Output> {
    let spec = CollectionSpec {
        name,
        description,
        config,
        indexes,
    };
    Ok(Output::Collection(engine.create_collection(spec)?))
}

/// Handle `DeleteCollection`.
pub fn delete_collection(
    engine: &VectorEngine,
    name: String,
    delete_indexes: bool,
    force: bool,
) -> Result<Output> {
    Ok(Output::CollectionDeleted(engine.delete_collection(
        &name,
        delete_indexes,
        force,
    )?))
}

/// Handle `ListCollections`.
pub fn list_collections(engine: &VectorEngine) -> Result<Output> {
    Ok(Output::Collections(engine.list_collections()?))
}

/// Handle `DescribeCollection`.
pub fn describe_collection(engine: &VectorEngine, name: String) -> Result<Output> {
    Ok(Output::Collection(engine.describe_collection(&name)?))
}

/// Handle `AddIndexToCollection`.
pub fn add_index(engine: &VectorEngine, collection: String, index: String) -> Result<Output> {
    Ok(Output::Collection(
        engine.add_index_to_collection(&collection, &index)?,
    ))
}

/// Handle `RemoveIndexFromCollection`.
pub fn remove_index(engine: &VectorEngine, collection: String, index: String) -> Result<Output> {
    Ok(Output::Collection(
        engine.remove_index_from_collection(&collection, &index)?,
    ))
}
