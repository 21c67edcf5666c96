//! Backup command handlers.

use vexil_engine::{BackupOptions, Compression, RestoreOptions, VectorEngine};

use crate::{Output, Result};

/// Handle `BackupIndex`.
pub fn backup_index(
    engine: &VectorEngine,
    index: String,
    name: Option<String>,
    include_vectors: bool,
    compression: Compression,
) -> Result<Output> {
    let options = BackupOptions {
        name,
        include_vectors,
        compression,
    };
    Ok(Output::Backup(engine.backup_index(&index, &options)?))
}

/// Handle `RestoreIndex`.
pub fn restore_index(
    engine: &VectorEngine,
    backup: String,
    target: Option<String>,
    overwrite_existing: bool,
) -> Result<Output> {
    let options = RestoreOptions {
        target,
        overwrite_existing,
    };
    Ok(Output::Restored(engine.restore_index(&backup, &options)?))
}

/// Handle `ListBackups`.
pub fn list_backups(engine: &VectorEngine) -> Result<Output> {
    Ok(Output::Backups(engine.list_backups()?))
}

/// Handle `DescribeBackup`.
pub fn describe_backup(engine: &VectorEngine, name: String) -> Result<Output> {
    Ok(Output::Backup(engine.describe_backup(&name)?))
}

/// Handle `DeleteBackup`.
pub fn delete_backup(engine: &VectorEngine, name: String) -> Result<Output> {
    Ok(Output::Backup(engine.delete_backup(&name)?))
}
