//! Collection Manager
//!
//! A collection is a named group of indexes. Each index belongs to at most
//! one collection; the reverse `owners` map keeps that check O(1).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;
use vexil_core::{
    validate_collection_name, CollectionInfo, CollectionStatus, EntityKind, Timestamp,
    TuningConfig, VectorError, VectorResult,
};

use crate::engine::{CollectionRecord, VectorEngine};
use crate::index_ops::ensure_deletable;

/// Parameters for `create_collection`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionSpec {
    /// Collection name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Creation-time configuration
    #[serde(default)]
    pub config: TuningConfig,
    /// Initial member indexes
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl CollectionSpec {
    /// Empty collection with no description
    pub fn new(name: impl Into<String>) -> Self {
        CollectionSpec {
            name: name.into(),
            description: String::new(),
            config: TuningConfig::new(),
            indexes: Vec::new(),
        }
    }

    /// Builder: description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: initial member
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.indexes.push(index.into());
        self
    }
}

/// Result of `delete_collection`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteCollectionReport {
    /// Deleted collection
    pub name: String,
    /// Member indexes deleted with it (`delete_indexes = true`)
    pub deleted_indexes: Vec<String>,
    /// Member indexes detached and kept (`force = true`)
    pub detached_indexes: Vec<String>,
    /// Vectors dropped with the deleted indexes
    pub deleted_vector_count: usize,
}

fn already_owned(index: &str, owner: &str) -> VectorError {
    VectorError::invalid(format!(
        "index '{}' already belongs to collection '{}'",
        index, owner
    ))
}

impl VectorEngine {
    /// Create a collection, optionally with initial members
    ///
    /// # Errors
    /// - `InvalidArgument` for a bad name, or a member that already belongs
    ///   to another collection
    /// - `AlreadyExists` if the name is taken
    /// - `NotFound` if a listed index does not exist
    pub fn create_collection(&self, spec: CollectionSpec) -> VectorResult<CollectionInfo> {
        self.track("create_collection", || {
            validate_collection_name(&spec.name)?;
            let mut collections = self.collections.write();
            let registry = self.registry.read();
            if collections.collections.contains_key(&spec.name) {
                return Err(VectorError::already_exists(
                    EntityKind::Collection,
                    &spec.name,
                ));
            }

            let members: BTreeSet<String> = spec.indexes.into_iter().collect();
            for index in &members {
                if !registry.contains_key(index) {
                    return Err(VectorError::not_found(EntityKind::Index, index));
                }
                if let Some(owner) = collections.owners.get(index) {
                    return Err(already_owned(index, owner));
                }
            }

            for index in &members {
                collections.owners.insert(index.clone(), spec.name.clone());
            }
            let record = CollectionRecord {
                name: spec.name.clone(),
                description: spec.description,
                config: spec.config,
                status: CollectionStatus::Active,
                members,
                created_at: Timestamp::now(),
            };
            let info = record.info();
            collections.collections.insert(spec.name, record);

            info!(
                target: "vexil::collection",
                collection = %info.name,
                members = info.indexes.len(),
                "Collection created"
            );
            Ok(info)
        })
    }

    /// Delete a collection
    ///
    /// A collection with members needs `delete_indexes` (members are deleted,
    /// `force` is passed through to each) or `force` (members are detached
    /// and keep existing). With `delete_indexes`, every member is checked
    /// before any is deleted.
    ///
    /// # Errors
    /// - `NotFound` if the collection does not exist
    /// - `NotEmpty` if it has members and neither flag is set, or a member
    ///   index holds vectors and `force` is false
    pub fn delete_collection(
        &self,
        name: &str,
        delete_indexes: bool,
        force: bool,
    ) -> VectorResult<DeleteCollectionReport> {
        self.track("delete_collection", || {
            let mut collections = self.collections.write();
            let mut registry = self.registry.write();
            let members: Vec<String> = collections
                .collections
                .get(name)
                .ok_or_else(|| VectorError::not_found(EntityKind::Collection, name))?
                .members
                .iter()
                .cloned()
                .collect();

            let mut report = DeleteCollectionReport {
                name: name.to_string(),
                ..DeleteCollectionReport::default()
            };

            if !members.is_empty() {
                if delete_indexes {
                    // Every member stays write-locked from the check to its
                    // removal, so no insert can land in between
                    let slots = members
                        .iter()
                        .map(|index| self.slot_in(&registry, index))
                        .collect::<VectorResult<Vec<_>>>()?;
                    let mut guards: Vec<_> = slots.iter().map(|slot| slot.state.write()).collect();
                    for state in &guards {
                        ensure_deletable(state, force)?;
                    }
                    for (slot, state) in slots.iter().zip(guards.iter_mut()) {
                        let deleted =
                            self.retire_index(&mut collections, &mut registry, slot, state, force);
                        report.deleted_vector_count += deleted.deleted_vector_count;
                        report.deleted_indexes.push(deleted.name);
                    }
                } else if force {
                    for index in &members {
                        collections.owners.remove(index);
                    }
                    report.detached_indexes = members;
                } else {
                    return Err(VectorError::NotEmpty {
                        kind: EntityKind::Collection,
                        name: name.to_string(),
                        remaining: members.len(),
                    });
                }
            }

            collections.collections.remove(name);
            info!(
                target: "vexil::collection",
                collection = name,
                deleted_indexes = report.deleted_indexes.len(),
                detached_indexes = report.detached_indexes.len(),
                "Collection deleted"
            );
            Ok(report)
        })
    }

    /// All collections in name order
    pub fn list_collections(&self) -> VectorResult<Vec<CollectionInfo>> {
        self.track("list_collections", || {
            Ok(self
                .collections
                .read()
                .collections
                .values()
                .map(CollectionRecord::info)
                .collect())
        })
    }

    /// Describe one collection
    pub fn describe_collection(&self, name: &str) -> VectorResult<CollectionInfo> {
        self.track("describe_collection", || {
            self.collections
                .read()
                .collections
                .get(name)
                .map(CollectionRecord::info)
                .ok_or_else(|| VectorError::not_found(EntityKind::Collection, name))
        })
    }

    /// Add an existing index to a collection (no-op if already a member)
    pub fn add_index_to_collection(
        &self,
        collection: &str,
        index: &str,
    ) -> VectorResult<CollectionInfo> {
        self.track("add_index_to_collection", || {
            let mut collections = self.collections.write();
            if !self.registry.read().contains_key(index) {
                return Err(VectorError::not_found(EntityKind::Index, index));
            }
            if !collections.collections.contains_key(collection) {
                return Err(VectorError::not_found(EntityKind::Collection, collection));
            }
            match collections.owners.get(index) {
                Some(owner) if owner == collection => {}
                Some(owner) => return Err(already_owned(index, owner)),
                None => {
                    collections
                        .owners
                        .insert(index.to_string(), collection.to_string());
                }
            }
            let record = collections
                .collections
                .get_mut(collection)
                .ok_or_else(|| VectorError::not_found(EntityKind::Collection, collection))?;
            record.members.insert(index.to_string());
            Ok(record.info())
        })
    }

    /// Detach an index from a collection; the index keeps existing
    pub fn remove_index_from_collection(
        &self,
        collection: &str,
        index: &str,
    ) -> VectorResult<CollectionInfo> {
        self.track("remove_index_from_collection", || {
            let mut collections = self.collections.write();
            let record = collections
                .collections
                .get_mut(collection)
                .ok_or_else(|| VectorError::not_found(EntityKind::Collection, collection))?;
            if !record.members.remove(index) {
                return Err(VectorError::invalid(format!(
                    "index '{}' is not a member of collection '{}'",
                    index, collection
                )));
            }
            let info = record.info();
            collections.owners.remove(index);
            Ok(info)
        })
    }
}
