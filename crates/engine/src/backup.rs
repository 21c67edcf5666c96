//! Backup/Restore Manager
//!
//! A backup is an immutable, self-describing blob held in an in-process
//! catalog. Blobs can be exported to and imported from files.
//!
//! ## Blob Layout
//!
//! ```text
//! +------------------+
//! | Magic (4)        |  "VXBK"
//! +------------------+
//! | Version (2)      |  Format version (1), LE
//! +------------------+
//! | Flags (1)        |  bit 0: zstd, bit 1: has vectors
//! +------------------+
//! | Reserved (1)     |
//! +------------------+
//! | Length (4)       |  Payload length, LE
//! +------------------+
//! | Checksum (8)     |  xxh3-64 of the payload, LE
//! +------------------+
//! | Payload          |  MessagePack, optionally zstd-compressed
//! +------------------+
//! ```

use std::fs::{self, File};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use vexil_core::{
    validate_backup_name, validate_dimension, validate_index_name, BackendKind, DistanceMetric,
    EntityKind, IndexStatus, IndexType, Timestamp, TuningConfig, VectorEntry, VectorError,
    VectorResult,
};
use xxhash_rust::xxh3::xxh3_64;

use crate::engine::{IndexMeta, VectorEngine};
use crate::index_ops::validate_tuning;

/// Blob magic bytes
pub const BACKUP_MAGIC: &[u8; 4] = b"VXBK";

/// Current blob format version
pub const BACKUP_FORMAT_VERSION: u16 = 1;

/// Magic(4) + Version(2) + Flags(1) + Reserved(1) + Length(4) + Checksum(8)
pub const BACKUP_HEADER_SIZE: usize = 20;

const FLAG_COMPRESSED: u8 = 0b01;
const FLAG_HAS_VECTORS: u8 = 0b10;

/// Payload compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compression {
    /// Stored as-is
    #[default]
    None,
    /// zstd at the configured level
    Zstd,
}

impl Compression {
    /// Parse a compression name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" => Some(Compression::None),
            "zstd" => Some(Compression::Zstd),
            _ => None,
        }
    }

    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Zstd => "zstd",
        }
    }
}

/// Backup descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Catalog name
    pub name: String,
    /// Unique id
    pub id: Uuid,
    /// Source index name
    pub index: String,
    /// Source index dimension
    pub dimension: usize,
    /// Source index metric
    pub metric: DistanceMetric,
    /// Source index type
    pub index_type: IndexType,
    /// Source index backend
    pub backend: BackendKind,
    /// Vectors captured (0 when `include_vectors` was false)
    pub vector_count: usize,
    /// Whether vectors were captured
    pub include_vectors: bool,
    /// Payload compression
    pub compression: Compression,
    /// Blob size in bytes
    pub size_bytes: usize,
    /// Snapshot time
    pub created_at: Timestamp,
}

/// Catalog entry; the blob is never mutated after creation
#[derive(Debug)]
pub(crate) struct BackupRecord {
    pub info: BackupInfo,
    pub blob: Vec<u8>,
}

/// Index configuration captured in a backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexSnapshot {
    name: String,
    dimension: usize,
    metric: DistanceMetric,
    index_type: IndexType,
    backend: BackendKind,
    config: TuningConfig,
}

impl IndexSnapshot {
    /// The checks `create_index` applies to a new index
    fn validate(&self, max_dimension: usize) -> VectorResult<()> {
        validate_index_name(&self.name)?;
        validate_dimension(self.dimension, max_dimension)?;
        validate_tuning(&self.config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BackupPayload {
    name: String,
    id: Uuid,
    created_at: Timestamp,
    index: IndexSnapshot,
    entries: Vec<VectorEntry>,
}

impl BackupPayload {
    fn info(
        &self,
        include_vectors: bool,
        compression: Compression,
        size_bytes: usize,
    ) -> BackupInfo {
        BackupInfo {
            name: self.name.clone(),
            id: self.id,
            index: self.index.name.clone(),
            dimension: self.index.dimension,
            metric: self.index.metric,
            index_type: self.index.index_type,
            backend: self.index.backend.clone(),
            vector_count: self.entries.len(),
            include_vectors,
            compression,
            size_bytes,
            created_at: self.created_at,
        }
    }
}

/// Parameters for `backup_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupOptions {
    /// Catalog name; defaults to `{index}-{uuid}`
    #[serde(default)]
    pub name: Option<String>,
    /// Capture vectors as well as configuration
    #[serde(default = "default_true")]
    pub include_vectors: bool,
    /// Payload compression
    #[serde(default)]
    pub compression: Compression,
}

fn default_true() -> bool {
    true
}

impl Default for BackupOptions {
    fn default() -> Self {
        BackupOptions {
            name: None,
            include_vectors: true,
            compression: Compression::None,
        }
    }
}

impl BackupOptions {
    /// Builder: catalog name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder: configuration only
    pub fn without_vectors(mut self) -> Self {
        self.include_vectors = false;
        self
    }

    /// Builder: compression
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Parameters for `restore_index`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreOptions {
    /// Target index; defaults to the backed-up index name
    #[serde(default)]
    pub target: Option<String>,
    /// Replace an existing target index
    #[serde(default)]
    pub overwrite_existing: bool,
}

impl RestoreOptions {
    /// Builder: target index name
    pub fn into_index(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Builder: allow replacing an existing index
    pub fn overwrite(mut self) -> Self {
        self.overwrite_existing = true;
        self
    }
}

/// Result of `restore_index`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Restored index name
    pub index: String,
    /// Vectors loaded into it
    pub restored_vector_count: usize,
    /// True if the index was created, false if overwritten
    pub created: bool,
}

// ============================================================================
// Blob codec
// ============================================================================

fn encode_blob(
    payload: &BackupPayload,
    compression: Compression,
    level: i32,
    include_vectors: bool,
) -> VectorResult<Vec<u8>> {
    let raw = rmp_serde::to_vec_named(payload)
        .map_err(|e| VectorError::Serialization(e.to_string()))?;
    let body = match compression {
        Compression::None => raw,
        Compression::Zstd => zstd::encode_all(&raw[..], level)?,
    };
    let length = u32::try_from(body.len())
        .map_err(|_| VectorError::invalid("backup payload exceeds 4 GiB"))?;

    let mut flags = 0u8;
    if compression == Compression::Zstd {
        flags |= FLAG_COMPRESSED;
    }
    if include_vectors {
        flags |= FLAG_HAS_VECTORS;
    }

    let mut blob = Vec::with_capacity(BACKUP_HEADER_SIZE + body.len());
    blob.extend_from_slice(BACKUP_MAGIC);
    blob.write_u16::<LittleEndian>(BACKUP_FORMAT_VERSION)?;
    blob.write_u8(flags)?;
    blob.write_u8(0)?;
    blob.write_u32::<LittleEndian>(length)?;
    blob.write_u64::<LittleEndian>(xxh3_64(&body))?;
    blob.extend_from_slice(&body);
    Ok(blob)
}

/// Decoded blob plus the header flags it was written with
struct DecodedBlob {
    payload: BackupPayload,
    compression: Compression,
    include_vectors: bool,
}

fn corrupted(reason: impl Into<String>) -> VectorError {
    VectorError::Corrupted(reason.into())
}

fn decode_blob(blob: &[u8]) -> VectorResult<DecodedBlob> {
    if blob.len() < BACKUP_HEADER_SIZE {
        return Err(corrupted(format!(
            "backup blob too short: {} bytes",
            blob.len()
        )));
    }
    if &blob[..4] != BACKUP_MAGIC {
        return Err(corrupted("bad backup magic"));
    }

    let mut header = Cursor::new(&blob[4..BACKUP_HEADER_SIZE]);
    let version = header.read_u16::<LittleEndian>()?;
    if version != BACKUP_FORMAT_VERSION {
        return Err(corrupted(format!(
            "unsupported backup format version {}",
            version
        )));
    }
    let flags = header.read_u8()?;
    let _reserved = header.read_u8()?;
    let length = header.read_u32::<LittleEndian>()? as usize;
    let checksum = header.read_u64::<LittleEndian>()?;

    let body = &blob[BACKUP_HEADER_SIZE..];
    if body.len() != length {
        return Err(corrupted(format!(
            "backup payload length mismatch: header says {}, found {}",
            length,
            body.len()
        )));
    }
    let actual = xxh3_64(body);
    if actual != checksum {
        return Err(corrupted(format!(
            "backup checksum mismatch: expected {:016x}, got {:016x}",
            checksum, actual
        )));
    }

    let compression = if flags & FLAG_COMPRESSED != 0 {
        Compression::Zstd
    } else {
        Compression::None
    };
    let raw = match compression {
        Compression::None => body.to_vec(),
        Compression::Zstd => zstd::decode_all(body)
            .map_err(|e| corrupted(format!("backup decompression failed: {}", e)))?,
    };
    let payload: BackupPayload = rmp_serde::from_slice(&raw)
        .map_err(|e| corrupted(format!("backup payload unreadable: {}", e)))?;

    Ok(DecodedBlob {
        payload,
        compression,
        include_vectors: flags & FLAG_HAS_VECTORS != 0,
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl VectorEngine {
    /// Snapshot an index into the backup catalog
    ///
    /// Entries are copied under the index read lock; encoding happens after
    /// it is released.
    ///
    /// # Errors
    /// - `NotFound` if the index does not exist
    /// - `AlreadyExists` if the backup name is taken
    /// - `BackendUnavailable` if vectors are requested from an external backend
    pub fn backup_index(&self, index: &str, options: &BackupOptions) -> VectorResult<BackupInfo> {
        self.track("backup_index", || {
            let start = Instant::now();
            let id = Uuid::new_v4();
            let name = options
                .name
                .clone()
                .unwrap_or_else(|| format!("{}-{}", index, id.simple()));
            validate_backup_name(&name)?;
            if self.backups.read().contains_key(&name) {
                return Err(VectorError::already_exists(EntityKind::Backup, &name));
            }

            let (snapshot, entries) = self.read_index(index, |state| {
                let meta = &state.meta;
                let snapshot = IndexSnapshot {
                    name: meta.name.clone(),
                    dimension: meta.dimension,
                    metric: meta.metric,
                    index_type: meta.index_type,
                    backend: meta.backend.clone(),
                    config: meta.config.clone(),
                };
                let mut entries = Vec::new();
                if options.include_vectors {
                    entries.reserve(state.store.len());
                    state.store.scan(0, &mut |entry| {
                        entries.push(entry.to_entry(true));
                        std::ops::ControlFlow::Continue(())
                    })?;
                }
                Ok((snapshot, entries))
            })?;

            let payload = BackupPayload {
                name: name.clone(),
                id,
                created_at: Timestamp::now(),
                index: snapshot,
                entries,
            };
            let blob = encode_blob(
                &payload,
                options.compression,
                self.config.backup_compression_level,
                options.include_vectors,
            )?;
            let info = payload.info(options.include_vectors, options.compression, blob.len());

            let mut backups = self.backups.write();
            if backups.contains_key(&name) {
                return Err(VectorError::already_exists(EntityKind::Backup, &name));
            }
            backups.insert(
                name.clone(),
                Arc::new(BackupRecord {
                    info: info.clone(),
                    blob,
                }),
            );

            info!(
                target: "vexil::backup",
                backup = %name,
                index,
                vector_count = info.vector_count,
                size_bytes = info.size_bytes,
                compression = info.compression.name(),
                duration_us = start.elapsed().as_micros() as u64,
                "Backup created"
            );
            Ok(info)
        })
    }

    /// Restore a backup into a new or existing index
    ///
    /// The replacement partition is built before any index lock is taken,
    /// then swapped in under the writer lock. Overwriting keeps the target's
    /// collection membership.
    ///
    /// # Errors
    /// - `NotFound` if the backup does not exist
    /// - `AlreadyExists` if the target exists and `overwrite_existing` is false
    /// - `InvalidArgument` if the captured index would fail `create_index`
    /// - `DimensionMismatch` if the existing target has a different dimension
    /// - `Corrupted` if the blob fails validation
    pub fn restore_index(
        &self,
        backup_name: &str,
        options: &RestoreOptions,
    ) -> VectorResult<RestoreReport> {
        self.track("restore_index", || {
            let start = Instant::now();
            let record = self
                .backups
                .read()
                .get(backup_name)
                .cloned()
                .ok_or_else(|| VectorError::not_found(EntityKind::Backup, backup_name))?;
            let BackupPayload { index, entries, .. } = decode_blob(&record.blob)?.payload;
            index.validate(self.config.max_dimension)?;

            let target = options.target.clone().unwrap_or_else(|| index.name.clone());
            validate_index_name(&target)?;

            let mut store = self.factory.create(&index.backend, index.dimension);
            let restored_vector_count = entries.len();
            for entry in entries {
                store.load(entry)?;
            }

            let now = Timestamp::now();
            let mut registry = self.registry.write();
            let existing = registry
                .get(&target)
                .and_then(|handle| self.arena.get(handle))
                .map(|entry| Arc::clone(entry.value()));

            let created = match existing {
                Some(slot) => {
                    if !options.overwrite_existing {
                        return Err(VectorError::already_exists(EntityKind::Index, &target));
                    }
                    drop(registry);
                    let mut state = slot.state.write();
                    state.ensure_live()?;
                    if state.meta.dimension != index.dimension {
                        return Err(VectorError::DimensionMismatch {
                            expected: state.meta.dimension,
                            got: index.dimension,
                        });
                    }
                    state.store = store;
                    state.meta.metric = index.metric;
                    state.meta.index_type = index.index_type;
                    state.meta.backend = index.backend;
                    state.meta.config = index.config;
                    state.meta.pending_config.clear();
                    state.meta.updated_at = now;
                    false
                }
                None => {
                    let meta = IndexMeta {
                        name: target.clone(),
                        dimension: index.dimension,
                        metric: index.metric,
                        index_type: index.index_type,
                        backend: index.backend,
                        config: index.config,
                        pending_config: TuningConfig::new(),
                        status: IndexStatus::Active,
                        replication: None,
                        sharding: None,
                        created_at: now,
                        updated_at: now,
                    };
                    self.install(&mut registry, meta, store);
                    true
                }
            };

            info!(
                target: "vexil::backup",
                backup = backup_name,
                index = %target,
                restored_vector_count,
                created,
                duration_us = start.elapsed().as_micros() as u64,
                "Index restored"
            );
            Ok(RestoreReport {
                index: target,
                restored_vector_count,
                created,
            })
        })
    }

    /// All backups in name order
    pub fn list_backups(&self) -> VectorResult<Vec<BackupInfo>> {
        self.track("list_backups", || {
            Ok(self
                .backups
                .read()
                .values()
                .map(|record| record.info.clone())
                .collect())
        })
    }

    /// Describe one backup
    pub fn describe_backup(&self, name: &str) -> VectorResult<BackupInfo> {
        self.track("describe_backup", || {
            self.backups
                .read()
                .get(name)
                .map(|record| record.info.clone())
                .ok_or_else(|| VectorError::not_found(EntityKind::Backup, name))
        })
    }

    /// Drop a backup from the catalog
    pub fn delete_backup(&self, name: &str) -> VectorResult<BackupInfo> {
        self.track("delete_backup", || {
            let record = self
                .backups
                .write()
                .remove(name)
                .ok_or_else(|| VectorError::not_found(EntityKind::Backup, name))?;
            info!(target: "vexil::backup", backup = name, "Backup deleted");
            Ok(record.info.clone())
        })
    }

    /// Write a backup blob to `path` (temp file + rename)
    pub fn export_backup(&self, name: &str, path: &Path) -> VectorResult<BackupInfo> {
        self.track("export_backup", || {
            let record = self
                .backups
                .read()
                .get(name)
                .cloned()
                .ok_or_else(|| VectorError::not_found(EntityKind::Backup, name))?;

            let tmp = temp_path(path);
            {
                let mut file = File::create(&tmp)?;
                file.write_all(&record.blob)?;
                file.sync_all()?;
            }
            if let Err(e) = fs::rename(&tmp, path) {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }

            debug!(
                target: "vexil::backup",
                backup = name,
                path = %path.display(),
                size_bytes = record.blob.len(),
                "Backup exported"
            );
            Ok(record.info.clone())
        })
    }

    /// Validate a blob file and register it in the catalog
    ///
    /// # Errors
    /// - `Corrupted` if the file is not a valid backup blob or describes an
    ///   index `create_index` would reject
    /// - `AlreadyExists` if a backup with the embedded name is registered
    pub fn import_backup(&self, path: &Path) -> VectorResult<BackupInfo> {
        self.track("import_backup", || {
            let mut blob = Vec::new();
            File::open(path)?.read_to_end(&mut blob)?;
            let decoded = decode_blob(&blob)?;
            decoded
                .payload
                .index
                .validate(self.config.max_dimension)
                .map_err(|e| corrupted(format!("backup describes an invalid index: {}", e)))?;
            let info = decoded
                .payload
                .info(decoded.include_vectors, decoded.compression, blob.len());

            let mut backups = self.backups.write();
            if backups.contains_key(&info.name) {
                return Err(VectorError::already_exists(EntityKind::Backup, &info.name));
            }
            backups.insert(
                info.name.clone(),
                Arc::new(BackupRecord {
                    info: info.clone(),
                    blob,
                }),
            );
            info!(
                target: "vexil::backup",
                backup = %info.name,
                path = %path.display(),
                "Backup imported"
            );
            Ok(info)
        })
    }
}
