//! Liveness and statistics handlers.

use vexil_engine::VectorEngine;

use crate::{Output, Result};

/// Handle `Ping`.
pub fn ping() -> Result<Output> {
    Ok(Output::Pong {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle `OperationStats`.
pub fn operation_stats(engine: &VectorEngine, operation: Option<String>) -> Result<Output> {
    Ok(Output::OperationStats(
        engine.operation_stats(operation.as_deref()),
    ))
}

/// Handle `RecentOperations`.
pub fn recent_operations(engine: &VectorEngine, limit: usize) -> Result<Output> {
    Ok(Output::Operations(engine.recent_operations(limit)))
}

/// Handle `ClearOperationStats`.
pub fn clear_operation_stats(engine: &VectorEngine) -> Result<Output> {
    engine.clear_operation_stats();
    Ok(Output::Unit)
}

/// Handle `EngineStats`.
pub fn engine_stats(engine: &VectorEngine) -> Result<Output> {
    Ok(Output::EngineStats(engine.engine_stats()))
}
