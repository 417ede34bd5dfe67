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

//! Revision map
//!
//! Index between sequential revisions and commits. Every revision after 0
//! touches exactly one branch root: it either mounts a new commit there
//! (an exact revision), points it at an existing commit (a copy), or
//! removes it.

use crate::store::ObjectStore;
use dashmap::DashMap;
use parking_lot::RwLock;
use revfs_core::path;
use revfs_core::{Checksum, ChecksumKind, ObjectId, Revision, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// What a revision maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionMapping {
    /// Whether the commit was introduced by this very revision
    pub exact: bool,
    pub commit: ObjectId,
    /// Branch root the commit is mounted at (`trunk`, `branches/foo`)
    pub branch_path: String,
}

/// Branches and tags directly below a path prefix (name -> path)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchListing {
    pub tags: BTreeMap<String, String>,
    pub branches: BTreeMap<String, String>,
}

impl BranchListing {
    /// Single listing; a branch shadows a tag of the same name
    pub fn merged(self) -> BTreeMap<String, String> {
        let mut all = self.tags;
        all.extend(self.branches);
        all
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty() && self.branches.is_empty()
    }
}

/// Queryable revision index
pub trait RevisionMap: Send + Sync {
    fn youngest_revision(&self) -> Result<Revision, StoreError>;

    fn fetch_commit_for_revision(
        &self,
        revision: Revision,
    ) -> Result<Option<RevisionMapping>, StoreError>;

    /// Revision that introduced `commit`
    fn fetch_revision_for_commit(&self, commit: &ObjectId)
        -> Result<Option<Revision>, StoreError>;

    /// Branch root owning `path` at `revision`, and the commit mounted there
    fn find_branch(
        &self,
        path: &str,
        revision: Revision,
    ) -> Result<Option<(String, ObjectId)>, StoreError>;

    fn list_branches_and_tags(
        &self,
        prefix: &str,
        revision: Revision,
    ) -> Result<BranchListing, StoreError>;

    /// Checksum of a blob's content
    fn fetch_checksum(
        &self,
        objects: &dyn ObjectStore,
        oid: &ObjectId,
        kind: ChecksumKind,
    ) -> Result<Checksum, StoreError> {
        let blob = objects.lookup_blob(oid)?;
        Ok(Checksum::compute(kind, &blob.data))
    }
}

/// One recorded revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionRecord {
    pub revision: Revision,
    pub branch_path: String,
    /// `None` when the revision removed the branch
    pub commit: Option<ObjectId>,
    pub exact: bool,
}

/// On-disk form of a [`MemoryRevisionMap`]
#[derive(Debug, Serialize, Deserialize)]
struct RevisionMapFile {
    tags_root: String,
    records: Vec<RevisionRecord>,
}

/// In-memory revision map
pub struct MemoryRevisionMap {
    /// records[i] is revision i + 1
    records: RwLock<Vec<RevisionRecord>>,
    /// Commit -> revision that introduced it
    commit_index: DashMap<ObjectId, Revision>,
    checksums: DashMap<(ObjectId, ChecksumKind), Checksum>,
    /// Branch roots below this directory are listed as tags
    tags_root: String,
}

impl MemoryRevisionMap {
    pub fn new() -> Self {
        Self::with_tags_root("tags")
    }

    pub fn with_tags_root(tags_root: impl Into<String>) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            commit_index: DashMap::new(),
            checksums: DashMap::new(),
            tags_root: tags_root.into(),
        }
    }

    /// Directory whose branch roots are listed as tags
    pub fn tags_root(&self) -> &str {
        &self.tags_root
    }

    /// Mount a new commit at `branch_path` in the next revision
    pub fn record_commit(&self, branch_path: &str, commit: ObjectId) -> Revision {
        self.push(branch_path, Some(commit), true)
    }

    /// Point `branch_path` at an existing commit in the next revision
    pub fn record_copy(&self, branch_path: &str, commit: ObjectId) -> Revision {
        self.push(branch_path, Some(commit), false)
    }

    /// Remove `branch_path` in the next revision
    pub fn record_delete(&self, branch_path: &str) -> Revision {
        self.push(branch_path, None, false)
    }

    fn push(&self, branch_path: &str, commit: Option<ObjectId>, exact: bool) -> Revision {
        let mut records = self.records.write();
        let revision = records.len() as Revision + 1;
        let record = RevisionRecord {
            revision,
            branch_path: path::strip_root(branch_path).to_string(),
            commit,
            exact,
        };
        self.index(&record);
        tracing::debug!(
            revision,
            branch = %record.branch_path,
            exact,
            "recorded revision"
        );
        records.push(record);
        revision
    }

    fn index(&self, record: &RevisionRecord) {
        if let (true, Some(commit)) = (record.exact, record.commit) {
            self.commit_index.entry(commit).or_insert(record.revision);
        }
    }

    /// Branch roots alive at `revision` and their commits
    pub fn live_branches(&self, revision: Revision) -> BTreeMap<String, ObjectId> {
        let records = self.records.read();
        let mut live = BTreeMap::new();
        for record in records.iter().take_while(|r| r.revision <= revision) {
            match record.commit {
                Some(commit) => {
                    live.insert(record.branch_path.clone(), commit);
                }
                None => {
                    live.remove(&record.branch_path);
                }
            }
        }
        live
    }

    pub fn records(&self) -> Vec<RevisionRecord> {
        self.records.read().clone()
    }

    // === Persistence ===

    /// Save as JSON
    pub fn save_to_file(&self, path: &Path) -> Result<(), StoreError> {
        let file = RevisionMapFile {
            tags_root: self.tags_root.clone(),
            records: self.records(),
        };
        let data = serde_json::to_vec_pretty(&file)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;
        std::fs::write(path, data)?;
        tracing::debug!(path = %path.display(), revisions = file.records.len(), "saved revision map");
        Ok(())
    }

    /// Load from JSON; records must be numbered 1, 2, 3, ...
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let data = std::fs::read(path)?;
        let file: RevisionMapFile = serde_json::from_slice(&data)
            .map_err(|e| StoreError::SerializationError(e.to_string()))?;

        let map = Self::with_tags_root(file.tags_root);
        for (idx, record) in file.records.iter().enumerate() {
            if record.revision != idx as Revision + 1 {
                return Err(StoreError::RevisionMap(format!(
                    "expected revision {}, found {}",
                    idx + 1,
                    record.revision
                )));
            }
            map.index(record);
        }
        *map.records.write() = file.records;
        tracing::debug!(path = %path.display(), "loaded revision map");
        Ok(map)
    }
}

impl Default for MemoryRevisionMap {
    fn default() -> Self {
        Self::new()
    }
}

impl RevisionMap for MemoryRevisionMap {
    fn youngest_revision(&self) -> Result<Revision, StoreError> {
        Ok(self.records.read().len() as Revision)
    }

    fn fetch_commit_for_revision(
        &self,
        revision: Revision,
    ) -> Result<Option<RevisionMapping>, StoreError> {
        if revision == 0 {
            return Ok(None);
        }
        let records = self.records.read();
        let mapping = records
            .get(revision as usize - 1)
            .and_then(|record| {
                record.commit.map(|commit| RevisionMapping {
                    exact: record.exact,
                    commit,
                    branch_path: record.branch_path.clone(),
                })
            });
        Ok(mapping)
    }

    fn fetch_revision_for_commit(
        &self,
        commit: &ObjectId,
    ) -> Result<Option<Revision>, StoreError> {
        Ok(self.commit_index.get(commit).map(|r| *r))
    }

    fn find_branch(
        &self,
        path: &str,
        revision: Revision,
    ) -> Result<Option<(String, ObjectId)>, StoreError> {
        let path = path::strip_root(path);
        // Longest branch root containing the path
        let found = self
            .live_branches(revision)
            .into_iter()
            .filter(|(branch, _)| path::skip_ancestor(branch, path).is_some())
            .max_by_key(|(branch, _)| branch.len());
        Ok(found)
    }

    fn list_branches_and_tags(
        &self,
        prefix: &str,
        revision: Revision,
    ) -> Result<BranchListing, StoreError> {
        let prefix = path::strip_root(prefix);
        let mut listing = BranchListing::default();
        for branch in self.live_branches(revision).into_keys() {
            let rest = match path::skip_ancestor(prefix, &branch) {
                Some(rest) if !rest.is_empty() => rest,
                _ => continue,
            };
            let (name, _) = path::split_first(rest);
            let item_path = path::join(prefix, name);
            let target = if path::skip_ancestor(&self.tags_root, &branch).is_some() {
                &mut listing.tags
            } else {
                &mut listing.branches
            };
            target.insert(name.to_string(), item_path);
        }
        Ok(listing)
    }

    fn fetch_checksum(
        &self,
        objects: &dyn ObjectStore,
        oid: &ObjectId,
        kind: ChecksumKind,
    ) -> Result<Checksum, StoreError> {
        if let Some(sum) = self.checksums.get(&(*oid, kind)) {
            return Ok(sum.clone());
        }
        let blob = objects.lookup_blob(oid)?;
        let sum = Checksum::compute(kind, &blob.data);
        self.checksums.insert((*oid, kind), sum.clone());
        Ok(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use revfs_core::Blob;

    fn oid(seed: &str) -> ObjectId {
        ObjectId::hash(seed.as_bytes())
    }

    #[test]
    fn test_revision_numbering() {
        let map = MemoryRevisionMap::new();
        assert_eq!(map.youngest_revision().unwrap(), 0);
        assert_eq!(map.record_commit("trunk", oid("c1")), 1);
        assert_eq!(map.record_copy("/branches/foo", oid("c1")), 2);
        assert_eq!(map.youngest_revision().unwrap(), 2);

        let mapping = map.fetch_commit_for_revision(2).unwrap().unwrap();
        assert!(!mapping.exact);
        assert_eq!(mapping.branch_path, "branches/foo");
        assert!(map.fetch_commit_for_revision(0).unwrap().is_none());
        assert!(map.fetch_commit_for_revision(3).unwrap().is_none());
    }

    #[test]
    fn test_revision_for_commit_is_introducing_revision() {
        let map = MemoryRevisionMap::new();
        map.record_commit("trunk", oid("c1"));
        map.record_copy("branches/foo", oid("c1"));
        assert_eq!(map.fetch_revision_for_commit(&oid("c1")).unwrap(), Some(1));
        assert_eq!(map.fetch_revision_for_commit(&oid("c2")).unwrap(), None);
    }

    #[test]
    fn test_find_branch_at_revision() {
        let map = MemoryRevisionMap::new();
        map.record_commit("trunk", oid("c1"));
        map.record_commit("trunk", oid("c2"));
        map.record_copy("branches/foo", oid("c1"));
        map.record_delete("branches/foo");

        assert_eq!(
            map.find_branch("/trunk/a.txt", 1).unwrap(),
            Some(("trunk".to_string(), oid("c1")))
        );
        assert_eq!(
            map.find_branch("trunk", 3).unwrap(),
            Some(("trunk".to_string(), oid("c2")))
        );
        assert!(map.find_branch("trunkfile", 3).unwrap().is_none());
        assert!(map.find_branch("branches/foo/x", 2).unwrap().is_none());
        assert!(map.find_branch("branches/foo/x", 3).unwrap().is_some());
        assert!(map.find_branch("branches/foo/x", 4).unwrap().is_none());
        assert!(map.find_branch("branches", 3).unwrap().is_none());
    }

    #[test]
    fn test_list_branches_and_tags() {
        let map = MemoryRevisionMap::new();
        map.record_commit("trunk", oid("c1"));
        map.record_copy("branches/foo", oid("c1"));
        map.record_copy("branches/team/bar", oid("c1"));
        map.record_copy("tags/v1", oid("c1"));

        let branches = map.list_branches_and_tags("branches", 4).unwrap();
        assert!(branches.tags.is_empty());
        assert_eq!(branches.branches.get("foo").unwrap(), "branches/foo");
        assert_eq!(branches.branches.get("team").unwrap(), "branches/team");

        let tags = map.list_branches_and_tags("/tags", 4).unwrap();
        assert_eq!(tags.merged().get("v1").unwrap(), "tags/v1");
        assert!(map.list_branches_and_tags("tags", 3).unwrap().is_empty());
    }

    #[test]
    fn test_merged_prefers_branches() {
        let mut listing = BranchListing::default();
        listing.tags.insert("x".into(), "tags/x".into());
        listing.branches.insert("x".into(), "branches/x".into());
        assert_eq!(listing.merged().get("x").unwrap(), "branches/x");
    }

    #[test]
    fn test_checksum_cached() {
        let objects = MemoryObjectStore::new();
        let blob_oid = objects.put(&Blob::from("hello")).unwrap();
        let map = MemoryRevisionMap::new();

        let first = map
            .fetch_checksum(&objects, &blob_oid, ChecksumKind::Sha256)
            .unwrap();
        let second = map
            .fetch_checksum(&objects, &blob_oid, ChecksumKind::Sha256)
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(map.checksums.len(), 1);
    }

    #[test]
    fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revisions.json");

        let map = MemoryRevisionMap::with_tags_root("releases");
        map.record_commit("trunk", oid("c1"));
        map.record_copy("releases/1.0", oid("c1"));
        map.save_to_file(&path).unwrap();

        let loaded = MemoryRevisionMap::load_from_file(&path).unwrap();
        assert_eq!(loaded.records(), map.records());
        assert_eq!(loaded.tags_root(), "releases");
        assert_eq!(loaded.fetch_revision_for_commit(&oid("c1")).unwrap(), Some(1));
        let listing = loaded.list_branches_and_tags("releases", 2).unwrap();
        assert!(listing.tags.contains_key("1.0"));
    }

    #[test]
    fn test_load_rejects_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revisions.json");
        std::fs::write(
            &path,
            r#"{"tags_root":"tags","records":[{"revision":2,"branch_path":"trunk","commit":null,"exact":false}]}"#,
        )
        .unwrap();
        assert!(matches!(
            MemoryRevisionMap::load_from_file(&path),
            Err(StoreError::RevisionMap(_))
        ));
    }
}
