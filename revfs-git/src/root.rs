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

//! Revision roots
//!
//! A [`RevisionRoot`] is the filesystem as of one revision. It resolves
//! paths through the branch layout (`trunk`, `branches/*`, `tags/*`) to
//! entries of the commit mounted at each branch root.
//!
//! The root keeps a cache of the branches it has resolved. The cache is a
//! `RefCell`, so a root can be moved to another thread but not shared
//! between threads; open one root per worker instead.

use crate::branch::{resolve_branch, BranchMatch, ResolvedCommit};
use crate::changes;
use crate::fs::GitFs;
use crate::history;
use crate::locate::locate_entry;
use crate::relation;
use revfs_core::path;
use revfs_core::{
    ChangedPaths, Checksum, ChecksumKind, DirEntries, DirEntry, FsError, FsHistory, FsResult,
    FsRoot, LayoutConfig, NodeId, NodeKind, NodeRelation, ObjectType, Revision, TextDelta, Tree,
    TreeEntry,
};
use std::any::Any;
use std::cell::RefCell;
use std::io::Read;

pub struct RevisionRoot {
    fs: GitFs,
    revision: Revision,
    /// Commit introduced by this very revision
    exact_commit: Option<ResolvedCommit>,
    /// Branch root touched by this revision
    rev_path: Option<String>,
    branch_cache: RefCell<Vec<(String, ResolvedCommit)>>,
}

impl RevisionRoot {
    pub(crate) fn open(fs: GitFs, revision: Revision) -> FsResult<Self> {
        let mut exact_commit = None;
        let mut rev_path = None;

        if revision > 0 {
            if let Some(mapping) = fs.revisions().fetch_commit_for_revision(revision)? {
                if mapping.exact {
                    let commit = fs.objects().lookup_commit(&mapping.commit)?;
                    exact_commit = Some(ResolvedCommit::new(mapping.commit, commit));
                }
                rev_path = Some(mapping.branch_path);
            }
        }

        tracing::debug!(
            revision,
            exact = exact_commit.is_some(),
            rev_path = rev_path.as_deref().unwrap_or(""),
            "opened revision root"
        );

        Ok(Self {
            fs,
            revision,
            exact_commit,
            rev_path,
            branch_cache: RefCell::new(Vec::new()),
        })
    }

    pub fn fs(&self) -> &GitFs {
        &self.fs
    }

    pub fn exact_commit(&self) -> Option<&ResolvedCommit> {
        self.exact_commit.as_ref()
    }

    pub fn rev_path(&self) -> Option<&str> {
        self.rev_path.as_deref()
    }

    pub(crate) fn branch_cache(&self) -> &RefCell<Vec<(String, ResolvedCommit)>> {
        &self.branch_cache
    }

    /// Branch roots resolved through the revision map so far
    pub fn cached_branches(&self) -> Vec<String> {
        self.branch_cache
            .borrow()
            .iter()
            .map(|(branch, _)| branch.clone())
            .collect()
    }

    /// Branch owning `path` and the path below its root
    pub fn resolve<'p>(&self, path: &'p str) -> FsResult<Option<BranchMatch<'p>>> {
        resolve_branch(self, path)
    }

    pub(crate) fn layout(&self) -> &LayoutConfig {
        &self.fs.config().layout
    }

    pub(crate) fn commit_tree(&self, commit: &ResolvedCommit) -> FsResult<Tree> {
        Ok(self.fs.objects().commit_tree(&commit.commit)?)
    }

    /// Entry at `relpath` in the tree of `commit`
    pub(crate) fn entry_in(
        &self,
        commit: &ResolvedCommit,
        relpath: &str,
    ) -> FsResult<Option<TreeEntry>> {
        let tree = self.commit_tree(commit)?;
        locate_entry(self.fs.objects(), &tree, relpath)
    }

    /// Entry of the file at `path`
    fn file_entry(&self, path: &str) -> FsResult<TreeEntry> {
        let found = match self.resolve(path)? {
            Some(found) => found,
            None => return Err(FsError::NotFile(path.to_string())),
        };
        let entry = match self.entry_in(&found.commit, found.relpath)? {
            Some(entry) if entry.is_blob() => entry,
            _ => return Err(FsError::NotFile(path.to_string())),
        };
        if entry.mode.is_symlink() {
            // TODO: expose symlinks as special files
            tracing::trace!(path, "symlink read as a regular file");
        }
        Ok(entry)
    }

    fn read_file(root: &dyn FsRoot, path: &str) -> FsResult<Vec<u8>> {
        let mut data = Vec::new();
        root.file_contents(path)?.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl std::fmt::Debug for RevisionRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionRoot")
            .field("revision", &self.revision)
            .field("rev_path", &self.rev_path)
            .field("exact", &self.exact_commit.is_some())
            .finish()
    }
}

impl FsRoot for RevisionRoot {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn revision(&self) -> Revision {
        self.revision
    }

    fn paths_changed(&self) -> FsResult<ChangedPaths<'_>> {
        changes::paths_changed(self)
    }

    fn check_path(&self, path: &str) -> FsResult<NodeKind> {
        let path = path::strip_root(path);
        if path.is_empty() {
            return Ok(NodeKind::Dir);
        }

        let found = match self.resolve(path)? {
            Some(found) => found,
            None if self.layout().is_container(path) => return Ok(NodeKind::Dir),
            None => return Ok(NodeKind::None),
        };
        if found.relpath.is_empty() {
            return Ok(NodeKind::Dir);
        }

        let kind = match self.entry_in(&found.commit, found.relpath)? {
            Some(entry) => match entry.object_type() {
                ObjectType::Tree => NodeKind::Dir,
                ObjectType::Blob => NodeKind::File,
                ObjectType::Commit => NodeKind::None,
            },
            None => NodeKind::None,
        };
        Ok(kind)
    }

    fn node_history(&self, path: &str) -> FsResult<Box<dyn FsHistory + '_>> {
        Ok(Box::new(history::node_history(self, path)?))
    }

    fn node_id(&self, path: &str) -> FsResult<NodeId<'_>> {
        Ok(NodeId::new(self, path))
    }

    fn node_relation(
        &self,
        path_a: &str,
        root_b: &dyn FsRoot,
        path_b: &str,
    ) -> FsResult<NodeRelation> {
        relation::node_relation(self, path_a, root_b, path_b)
    }

    fn node_created_rev(&self, path: &str) -> FsResult<Revision> {
        history::node_created_rev(self, path)
    }

    fn node_origin_rev(&self, _path: &str) -> FsResult<Revision> {
        // No ancestry is tracked across branches
        Ok(self.revision)
    }

    fn node_created_path(&self, path: &str) -> FsResult<String> {
        history::node_created_path(self, path)
    }

    fn dir_entries(&self, path: &str) -> FsResult<DirEntries<'_>> {
        let path = path::strip_root(path);
        let mut entries = DirEntries::new();

        if self.revision == 0 {
            return Ok(entries);
        }

        if path.is_empty() {
            for name in self.layout().top_level() {
                entries.insert(
                    name.to_string(),
                    DirEntry {
                        name: name.to_string(),
                        kind: NodeKind::Dir,
                        id: NodeId::new(self, name),
                    },
                );
            }
            return Ok(entries);
        }

        let found = match self.resolve(path)? {
            Some(found) => found,
            None => {
                let listing = self
                    .fs
                    .revisions()
                    .list_branches_and_tags(path, self.revision)?;
                for (name, item_path) in listing.merged() {
                    let id = NodeId::new(self, &item_path);
                    entries.insert(
                        name.clone(),
                        DirEntry {
                            name,
                            kind: NodeKind::Dir,
                            id,
                        },
                    );
                }
                return Ok(entries);
            }
        };

        let objects = self.fs.objects();
        let mut tree = self.commit_tree(&found.commit)?;
        if !found.relpath.is_empty() {
            tree = match locate_entry(objects, &tree, found.relpath)? {
                Some(entry) if entry.is_tree() => objects.entry_to_subtree(&entry)?,
                _ => return Err(FsError::NotDirectory(path.to_string())),
            };
        }

        for entry in tree.iter() {
            let kind = match entry.object_type() {
                ObjectType::Tree => NodeKind::Dir,
                ObjectType::Blob => NodeKind::File,
                ObjectType::Commit => continue,
            };
            entries.insert(
                entry.name.clone(),
                DirEntry {
                    name: entry.name.clone(),
                    kind,
                    id: NodeId::new(self, &path::join(path, &entry.name)),
                },
            );
        }
        Ok(entries)
    }

    fn file_length(&self, path: &str) -> FsResult<u64> {
        let entry = self.file_entry(path)?;
        Ok(self.fs.objects().blob_size(&entry.oid)?)
    }

    fn file_checksum(&self, kind: ChecksumKind, path: &str) -> FsResult<Checksum> {
        let entry = self.file_entry(path)?;
        Ok(self
            .fs
            .revisions()
            .fetch_checksum(self.fs.objects(), &entry.oid, kind)?)
    }

    fn file_contents(&self, path: &str) -> FsResult<Box<dyn Read + Send>> {
        let entry = self.file_entry(path)?;
        Ok(self.fs.objects().blob_stream(&entry.oid)?)
    }

    fn contents_changed(
        &self,
        path_a: &str,
        root_b: &dyn FsRoot,
        path_b: &str,
        _strict: bool,
    ) -> FsResult<bool> {
        relation::contents_changed(self, path_a, root_b, path_b)
    }

    fn get_file_delta_stream(
        &self,
        source: Option<(&dyn FsRoot, &str)>,
        target_path: &str,
    ) -> FsResult<TextDelta> {
        let source_data = match source {
            Some((source_root, source_path)) => Self::read_file(source_root, source_path)?,
            None => Vec::new(),
        };
        let target_data = Self::read_file(self, target_path)?;
        Ok(TextDelta::compute(&source_data, &target_data))
    }
}
