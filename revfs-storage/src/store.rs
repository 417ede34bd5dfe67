// Copyright 2025 AgentReplay (https://github.com/agentreplay)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Object store
//!
//! Read access to commits, trees and blobs by id, plus the in-memory store
//! behind snapshots and tests. One store is shared by the roots of every
//! revision, so implementations must tolerate concurrent reads.

use dashmap::DashMap;
use revfs_core::{Blob, Commit, GitObject, ObjectId, ObjectType, StoreError, Tree, TreeEntry};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::Path;

/// Bumped whenever the snapshot layout changes
const SNAPSHOT_VERSION: u32 = 1;

/// Typed lookup of commit graph objects
pub trait ObjectStore: Send + Sync {
    /// Kind of a stored object, `None` when absent
    fn object_type(&self, oid: &ObjectId) -> Option<ObjectType>;

    fn get_commit(&self, oid: &ObjectId) -> Result<Option<Commit>, StoreError>;

    fn get_tree(&self, oid: &ObjectId) -> Result<Option<Tree>, StoreError>;

    fn get_blob(&self, oid: &ObjectId) -> Result<Option<Blob>, StoreError>;

    fn lookup_commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        self.get_commit(oid)?.ok_or(StoreError::NotFound(*oid))
    }

    fn lookup_tree(&self, oid: &ObjectId) -> Result<Tree, StoreError> {
        self.get_tree(oid)?.ok_or(StoreError::NotFound(*oid))
    }

    fn lookup_blob(&self, oid: &ObjectId) -> Result<Blob, StoreError> {
        self.get_blob(oid)?.ok_or(StoreError::NotFound(*oid))
    }

    fn blob_size(&self, oid: &ObjectId) -> Result<u64, StoreError> {
        Ok(self.lookup_blob(oid)?.len() as u64)
    }

    fn blob_stream(&self, oid: &ObjectId) -> Result<Box<dyn Read + Send>, StoreError> {
        Ok(Box::new(Cursor::new(self.lookup_blob(oid)?.data)))
    }

    fn commit_tree(&self, commit: &Commit) -> Result<Tree, StoreError> {
        self.lookup_tree(&commit.tree)
    }

    /// Parent `index` of `commit` with its id; `None` past the last parent
    fn commit_parent(
        &self,
        commit: &Commit,
        index: usize,
    ) -> Result<Option<(ObjectId, Commit)>, StoreError> {
        match commit.parent(index) {
            Some(oid) => Ok(Some((*oid, self.lookup_commit(oid)?))),
            None => Ok(None),
        }
    }

    /// Tree behind a directory entry
    fn entry_to_subtree(&self, entry: &TreeEntry) -> Result<Tree, StoreError> {
        match entry.object_type() {
            ObjectType::Tree => self.lookup_tree(&entry.oid),
            actual => Err(StoreError::TypeMismatch {
                oid: entry.oid,
                expected: ObjectType::Tree,
                actual,
            }),
        }
    }
}

/// A decoded object held by [`MemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoredObject {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl StoredObject {
    pub fn object_type(&self) -> ObjectType {
        match self {
            StoredObject::Blob(_) => ObjectType::Blob,
            StoredObject::Tree(_) => ObjectType::Tree,
            StoredObject::Commit(_) => ObjectType::Commit,
        }
    }

    pub fn id(&self) -> Result<ObjectId, StoreError> {
        match self {
            StoredObject::Blob(blob) => blob.id(),
            StoredObject::Tree(tree) => tree.id(),
            StoredObject::Commit(commit) => commit.id(),
        }
    }

    fn as_blob(&self) -> Option<&Blob> {
        match self {
            StoredObject::Blob(blob) => Some(blob),
            _ => None,
        }
    }

    fn as_tree(&self) -> Option<&Tree> {
        match self {
            StoredObject::Tree(tree) => Some(tree),
            _ => None,
        }
    }

    fn as_commit(&self) -> Option<&Commit> {
        match self {
            StoredObject::Commit(commit) => Some(commit),
            _ => None,
        }
    }
}

impl From<Blob> for StoredObject {
    fn from(blob: Blob) -> Self {
        StoredObject::Blob(blob)
    }
}

impl From<Tree> for StoredObject {
    fn from(tree: Tree) -> Self {
        StoredObject::Tree(tree)
    }
}

impl From<Commit> for StoredObject {
    fn from(commit: Commit) -> Self {
        StoredObject::Commit(commit)
    }
}

/// Object counts of a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub total_objects: u64,
    pub blob_count: u64,
    pub tree_count: u64,
    pub commit_count: u64,
    /// Sum of blob lengths
    pub blob_bytes: u64,
}

/// On-disk form of a [`MemoryObjectStore`]
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    objects: Vec<(ObjectId, StoredObject)>,
}

/// In-memory object store
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<ObjectId, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `obj` under its id. Storing the same object twice is a no-op.
    pub fn put<T>(&self, obj: &T) -> Result<ObjectId, StoreError>
    where
        T: GitObject + Clone + Into<StoredObject>,
    {
        let oid = obj.id()?;
        self.objects.entry(oid).or_insert_with(|| obj.clone().into());
        Ok(oid)
    }

    pub fn exists(&self, oid: &ObjectId) -> bool {
        self.objects.contains_key(oid)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();
        for item in self.objects.iter() {
            stats.total_objects += 1;
            match item.value() {
                StoredObject::Blob(blob) => {
                    stats.blob_count += 1;
                    stats.blob_bytes += blob.len() as u64;
                }
                StoredObject::Tree(_) => stats.tree_count += 1,
                StoredObject::Commit(_) => stats.commit_count += 1,
            }
        }
        stats
    }

    /// Clone out the object at `oid` if `pick` accepts its kind
    fn typed<T: Clone>(
        &self,
        oid: &ObjectId,
        expected: ObjectType,
        pick: fn(&StoredObject) -> Option<&T>,
    ) -> Result<Option<T>, StoreError> {
        let Some(stored) = self.objects.get(oid) else {
            return Ok(None);
        };
        match pick(stored.value()) {
            Some(obj) => Ok(Some(obj.clone())),
            None => Err(StoreError::TypeMismatch {
                oid: *oid,
                expected,
                actual: stored.object_type(),
            }),
        }
    }

    // === Persistence ===

    /// Write every object to `path`, ordered by id
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let mut objects: Vec<(ObjectId, StoredObject)> = self
            .objects
            .iter()
            .map(|item| (*item.key(), item.value().clone()))
            .collect();
        objects.sort_by_key(|(oid, _)| *oid);

        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            objects,
        };
        let data = bincode::serialize(&file)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), objects = file.objects.len(), "saved object store");
        Ok(())
    }

    /// Read a store written by [`save_to_file`](Self::save_to_file). Every
    /// object is re-hashed and must match the id it was saved under.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let data = std::fs::read(path)?;
        let file: SnapshotFile = bincode::deserialize(&data)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        if file.version != SNAPSHOT_VERSION {
            return Err(StoreError::SerializationError(format!(
                "unsupported object snapshot version {}",
                file.version
            )));
        }

        let store = Self::new();
        for (oid, stored) in file.objects {
            if stored.id()? != oid {
                return Err(StoreError::CorruptedObject(oid));
            }
            store.objects.insert(oid, stored);
        }
        tracing::debug!(path = %path.display(), objects = store.len(), "loaded object store");
        Ok(store)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn object_type(&self, oid: &ObjectId) -> Option<ObjectType> {
        self.objects.get(oid).map(|stored| stored.object_type())
    }

    fn get_commit(&self, oid: &ObjectId) -> Result<Option<Commit>, StoreError> {
        self.typed(oid, ObjectType::Commit, StoredObject::as_commit)
    }

    fn get_tree(&self, oid: &ObjectId) -> Result<Option<Tree>, StoreError> {
        self.typed(oid, ObjectType::Tree, StoredObject::as_tree)
    }

    fn get_blob(&self, oid: &ObjectId) -> Result<Option<Blob>, StoreError> {
        self.typed(oid, ObjectType::Blob, StoredObject::as_blob)
    }
}
