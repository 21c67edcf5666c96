//! Engine configuration via `vexil.toml`
//!
//! Every field has a default, so an empty file is a valid config. Values
//! are read once when the engine is constructed; to change settings, edit
//! the file and reopen the engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use vexil_core::{BackendKind, VectorError, VectorResult, MAX_DIMENSION};

/// Config file name used by [`crate::VectorEngine::open_with_config_file`] callers.
pub const CONFIG_FILE_NAME: &str = "vexil.toml";

/// Engine configuration loaded from `vexil.toml`.
///
/// # Example
///
/// ```toml
/// default_batch_size = 100
/// max_top_k = 10000
/// hybrid_vector_weight = 0.7
/// hybrid_text_weight = 0.3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Batch size for insert/update/delete when the caller passes none
    pub default_batch_size: usize,
    /// Batch size for bulk import/export when the caller passes none
    pub bulk_batch_size: usize,
    /// Largest `top_k` a search may request
    pub max_top_k: usize,
    /// Largest index dimension (capped at the hard limit)
    pub max_dimension: usize,
    /// Operation statistics retained before the oldest are pruned
    pub stats_capacity: usize,
    /// Backend tag used when a create request names none
    pub default_backend: String,
    /// zstd level for compressed backups
    pub backup_compression_level: i32,
    /// Default hybrid vector weight
    pub hybrid_vector_weight: f32,
    /// Default hybrid keyword weight
    pub hybrid_text_weight: f32,
    /// Lloyd iteration cap for clustering aggregation
    pub clustering_max_iterations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 100,
            bulk_batch_size: 1000,
            max_top_k: 10_000,
            max_dimension: MAX_DIMENSION,
            stats_capacity: 10_000,
            default_backend: "memory".to_string(),
            backup_compression_level: 3,
            hybrid_vector_weight: 0.7,
            hybrid_text_weight: 0.3,
            clustering_max_iterations: 25,
        }
    }
}

impl EngineConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Vexil engine configuration

# Batch size for insert/update/delete when a request specifies none
default_batch_size = 100

# Batch size for bulk import/export
bulk_batch_size = 1000

# Largest top_k a search may request
max_top_k = 10000

# Largest index dimension (hard limit 65536)
max_dimension = 65536

# Operation statistics kept for reporting (oldest pruned first)
stats_capacity = 10000

# Backend for indexes created without an explicit backend
default_backend = "memory"

# zstd level used for compressed backups (1-22)
backup_compression_level = 3

# Default hybrid search weights
hybrid_vector_weight = 0.7
hybrid_text_weight = 0.3

# Iteration cap for k-means clustering aggregation
clustering_max_iterations = 25
"#
    }

    /// Parse config from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> VectorResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| VectorError::invalid(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> VectorResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VectorError::Io(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            VectorError::InvalidArgument { reason } => {
                VectorError::invalid(format!("{} ({})", reason, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> VectorResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                VectorError::Io(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> VectorResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VectorError::Serialization(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            VectorError::Io(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Check value ranges.
    pub fn validate(&self) -> VectorResult<()> {
        if self.default_batch_size == 0 || self.bulk_batch_size == 0 {
            return Err(VectorError::invalid("batch sizes must be greater than 0"));
        }
        if self.max_top_k == 0 {
            return Err(VectorError::invalid("max_top_k must be greater than 0"));
        }
        if self.max_dimension == 0 || self.max_dimension > MAX_DIMENSION {
            return Err(VectorError::invalid(format!(
                "max_dimension must be in 1..={}",
                MAX_DIMENSION
            )));
        }
        if !(1..=22).contains(&self.backup_compression_level) {
            return Err(VectorError::invalid(
                "backup_compression_level must be in 1..=22",
            ));
        }
        validate_weights(self.hybrid_vector_weight, self.hybrid_text_weight)?;
        if self.clustering_max_iterations == 0 {
            return Err(VectorError::invalid(
                "clustering_max_iterations must be greater than 0",
            ));
        }
        if self.default_backend.trim().is_empty() {
            return Err(VectorError::invalid("default_backend cannot be empty"));
        }
        Ok(())
    }

    /// Backend used when a request names none.
    pub fn default_backend_kind(&self) -> BackendKind {
        BackendKind::parse(&self.default_backend)
    }
}

/// Hybrid weights must be finite and non-negative.
pub fn validate_weights(vector_weight: f32, text_weight: f32) -> VectorResult<()> {
    for (name, w) in [("vector_weight", vector_weight), ("text_weight", text_weight)] {
        if !w.is_finite() || w < 0.0 {
            return Err(VectorError::invalid(format!(
                "{} must be a finite non-negative number, got {}",
                name, w
            )));
        }
    }
    Ok(())
}
