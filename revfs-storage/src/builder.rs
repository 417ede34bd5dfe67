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

//! Repository builder
//!
//! Writes trees and commits into a [`MemoryObjectStore`] and records the
//! revisions that mount them in a [`MemoryRevisionMap`]. Used to assemble
//! fixtures and snapshot directories.

use crate::revmap::MemoryRevisionMap;
use crate::store::MemoryObjectStore;
use revfs_core::path;
use revfs_core::{
    Blob, Commit, EntryMode, ObjectId, Revision, Signature, StoreError, Tree, TreeEntry,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Directory being assembled before it is written bottom-up
#[derive(Default)]
struct PendingDir {
    children: BTreeMap<String, PendingNode>,
}

enum PendingNode {
    Dir(PendingDir),
    Leaf(EntryMode, ObjectId),
}

impl PendingDir {
    fn insert(&mut self, relpath: &str, node: PendingNode) -> Result<(), StoreError> {
        let (head, tail) = path::split_first(relpath);
        if head.is_empty() {
            return Err(StoreError::SerializationError(format!(
                "invalid tree path '{}'",
                relpath
            )));
        }
        if tail.is_empty() {
            self.children.insert(head.to_string(), node);
            return Ok(());
        }
        let child = self
            .children
            .entry(head.to_string())
            .or_insert_with(|| PendingNode::Dir(PendingDir::default()));
        match child {
            PendingNode::Dir(dir) => dir.insert(tail, node),
            PendingNode::Leaf(..) => Err(StoreError::SerializationError(format!(
                "'{}' is both a file and a directory",
                head
            ))),
        }
    }

    fn write(self, objects: &MemoryObjectStore) -> Result<ObjectId, StoreError> {
        let mut tree = Tree::default();
        for (name, node) in self.children {
            let entry = match node {
                PendingNode::Dir(dir) => TreeEntry::new(name, dir.write(objects)?, EntryMode::Directory),
                PendingNode::Leaf(mode, oid) => TreeEntry::new(name, oid, mode),
            };
            tree.insert(entry);
        }
        objects.put(&tree)
    }
}

/// Fixture and snapshot builder
pub struct RepositoryBuilder {
    objects: Arc<MemoryObjectStore>,
    revisions: Arc<MemoryRevisionMap>,
    heads: HashMap<String, ObjectId>,
    signature: Signature,
    /// Commit timestamps count up from here so fixtures hash the same every run
    clock: u64,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        Self::with_stores(
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MemoryRevisionMap::new()),
        )
    }

    pub fn with_stores(objects: Arc<MemoryObjectStore>, revisions: Arc<MemoryRevisionMap>) -> Self {
        Self {
            objects,
            revisions,
            heads: HashMap::new(),
            signature: Signature::default(),
            clock: 1_700_000_000_000_000,
        }
    }

    pub fn signed_by(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn objects(&self) -> Arc<MemoryObjectStore> {
        Arc::clone(&self.objects)
    }

    pub fn revisions(&self) -> Arc<MemoryRevisionMap> {
        Arc::clone(&self.revisions)
    }

    /// Current commit of a branch
    pub fn head(&self, branch: &str) -> Option<ObjectId> {
        self.heads.get(path::strip_root(branch)).copied()
    }

    pub fn set_head(&mut self, branch: &str, commit: ObjectId) {
        self.heads.insert(path::strip_root(branch).to_string(), commit);
    }

    pub fn put_blob(&self, data: &[u8]) -> Result<ObjectId, StoreError> {
        self.objects.put(&Blob::new(data))
    }

    /// Write a nested tree from `(path, mode, content)` entries.
    ///
    /// `EntryMode::Directory` entries become empty directories and
    /// `EntryMode::Gitlink` entries become gitlinks to the hash of the
    /// content; neither stores the content itself.
    pub fn write_tree(&self, entries: &[(&str, EntryMode, &[u8])]) -> Result<ObjectId, StoreError> {
        let mut root = PendingDir::default();
        for (relpath, mode, content) in entries {
            let node = match mode {
                EntryMode::Directory => PendingNode::Dir(PendingDir::default()),
                EntryMode::Gitlink => PendingNode::Leaf(*mode, ObjectId::hash(content)),
                _ => PendingNode::Leaf(*mode, self.put_blob(content)?),
            };
            root.insert(path::strip_root(relpath), node)?;
        }
        root.write(&self.objects)
    }

    /// Write a tree of regular text files
    pub fn write_files(&self, files: &[(&str, &str)]) -> Result<ObjectId, StoreError> {
        let entries: Vec<(&str, EntryMode, &[u8])> = files
            .iter()
            .map(|(p, content)| (*p, EntryMode::Regular, content.as_bytes()))
            .collect();
        self.write_tree(&entries)
    }

    /// Store a commit without recording a revision for it
    pub fn commit(
        &mut self,
        parents: Vec<ObjectId>,
        tree: ObjectId,
        message: &str,
    ) -> Result<ObjectId, StoreError> {
        self.clock += 1_000_000;
        let commit = Commit::new(tree, parents)
            .with_message(message)
            .signed(self.signature.clone())
            .at(self.clock);
        self.objects.put(&commit)
    }

    /// Commit `tree` on top of the branch head and mount it in a new revision
    pub fn commit_tree(&mut self, branch: &str, tree: ObjectId) -> Result<Revision, StoreError> {
        let parents: Vec<ObjectId> = self.head(branch).into_iter().collect();
        let message = format!("Update {}", path::strip_root(branch));
        let oid = self.commit(parents, tree, &message)?;
        Ok(self.mount(branch, oid))
    }

    /// Commit a full snapshot of text files on a branch
    pub fn commit_files(&mut self, branch: &str, files: &[(&str, &str)]) -> Result<Revision, StoreError> {
        let tree = self.write_files(files)?;
        self.commit_tree(branch, tree)
    }

    /// Commit a full snapshot of arbitrary entries on a branch
    pub fn commit_entries(
        &mut self,
        branch: &str,
        entries: &[(&str, EntryMode, &[u8])],
    ) -> Result<Revision, StoreError> {
        let tree = self.write_tree(entries)?;
        self.commit_tree(branch, tree)
    }

    /// Mount an already stored commit at `branch` in a new exact revision
    pub fn mount(&mut self, branch: &str, commit: ObjectId) -> Revision {
        self.set_head(branch, commit);
        self.revisions.record_commit(branch, commit)
    }

    /// Create `to` pointing at the head of `from`
    pub fn copy_branch(&mut self, from: &str, to: &str) -> Result<Revision, StoreError> {
        let commit = self.head(from).ok_or_else(|| {
            StoreError::RevisionMap(format!("branch '{}' has no commits", from))
        })?;
        self.set_head(to, commit);
        Ok(self.revisions.record_copy(to, commit))
    }

    pub fn delete_branch(&mut self, branch: &str) -> Revision {
        self.heads.remove(path::strip_root(branch));
        self.revisions.record_delete(branch)
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revmap::RevisionMap;
    use crate::store::ObjectStore;

    #[test]
    fn test_nested_tree() {
        let builder = RepositoryBuilder::new();
        let tree_oid = builder
            .write_files(&[("src/lib.rs", "lib"), ("src/bin/main.rs", "main"), ("README", "hi")])
            .unwrap();

        let objects = builder.objects();
        let root = objects.lookup_tree(&tree_oid).unwrap();
        assert_eq!(root.len(), 2);
        let src = objects.entry_to_subtree(root.get("src").unwrap()).unwrap();
        assert!(src.get("bin").unwrap().is_tree());
        assert!(src.get("lib.rs").unwrap().is_blob());
    }

    #[test]
    fn test_file_directory_conflict() {
        let builder = RepositoryBuilder::new();
        assert!(builder.write_files(&[("a", "file"), ("a/b", "nested")]).is_err());
    }

    #[test]
    fn test_commits_chain_on_branch() {
        let mut builder = RepositoryBuilder::new();
        let rev1 = builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
        let first = builder.head("trunk").unwrap();
        let rev2 = builder.commit_files("trunk", &[("a.txt", "world")]).unwrap();
        assert_eq!((rev1, rev2), (1, 2));

        let second = builder.objects().lookup_commit(&builder.head("trunk").unwrap()).unwrap();
        assert_eq!(second.first_parent(), Some(&first));

        let rev3 = builder.copy_branch("trunk", "branches/foo").unwrap();
        let mapping = builder.revisions().fetch_commit_for_revision(rev3).unwrap().unwrap();
        assert!(!mapping.exact);
        assert_eq!(Some(mapping.commit), builder.head("trunk"));
        assert!(builder.copy_branch("branches/none", "tags/x").is_err());
    }

    #[test]
    fn test_commits_are_reproducible() {
        let build = || {
            let mut builder =
                RepositoryBuilder::new().signed_by(Signature::new("dev", "dev@example.com"));
            builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
            builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
            builder
        };
        let (a, b) = (build(), build());
        assert_eq!(a.head("trunk"), b.head("trunk"));

        // Same tree twice still yields two commits
        let head = a.objects().lookup_commit(&a.head("trunk").unwrap()).unwrap();
        assert_eq!(head.author.name, "dev");
        assert!(head.first_parent().is_some());
    }
}
