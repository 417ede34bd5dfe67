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

//! Change sets
//!
//! What a revision changed is the diff between the tree of the commit it
//! introduced and the tree of that commit's first parent. Entries with the
//! same object id and mode are skipped without descending, so unchanged
//! subtrees cost a single comparison.

use crate::root::RevisionRoot;
use revfs_core::path;
use revfs_core::{
    ChangeKind, ChangedPaths, FsError, FsResult, FsRoot, NodeId, NodeKind, ObjectType, PathChange,
    Tree,
};
use revfs_storage::ObjectStore;

/// Paths changed by the revision of `root`
pub(crate) fn paths_changed(root: &RevisionRoot) -> FsResult<ChangedPaths<'_>> {
    let fs_root: &dyn FsRoot = root;
    let objects = root.fs().objects();
    let mut collector = ChangeCollector {
        root: fs_root,
        objects,
        max_depth: root.fs().config().max_tree_depth,
        changes: ChangedPaths::new(),
    };

    let revision = root.revision();
    if revision == 0 {
        return Ok(collector.changes);
    }

    if revision == 1 {
        let layout = root.layout();
        for dir in [&layout.trunk, &layout.branches] {
            collector.record(path::to_fspath(dir), ChangeKind::Add, NodeKind::Dir, false);
        }
    }

    // Copies and deletions of branches contribute no tree diff
    let (commit, rev_path) = match (root.exact_commit(), root.rev_path()) {
        (Some(commit), Some(rev_path)) => (commit, rev_path),
        _ => return Ok(collector.changes),
    };

    let new_tree = objects.commit_tree(&commit.commit)?;
    let old_tree = match objects.commit_parent(&commit.commit, 0)? {
        Some((_, parent)) => Some(objects.commit_tree(&parent)?),
        None => None,
    };

    collector.diff(&new_tree, old_tree.as_ref(), &path::to_fspath(rev_path), 0)?;
    tracing::debug!(
        revision,
        commit = %commit.oid,
        changes = collector.changes.len(),
        "computed changed paths"
    );
    Ok(collector.changes)
}

struct ChangeCollector<'a, 'r> {
    root: &'r dyn FsRoot,
    objects: &'a dyn ObjectStore,
    max_depth: usize,
    changes: ChangedPaths<'r>,
}

impl<'a, 'r> ChangeCollector<'a, 'r> {
    fn record(&mut self, fspath: String, change_kind: ChangeKind, node_kind: NodeKind, text_modified: bool) {
        let node_id = NodeId::new(self.root, &fspath);
        self.changes.insert(
            fspath,
            PathChange {
                node_id,
                change_kind,
                node_kind,
                text_modified,
                props_modified: false,
            },
        );
    }

    /// Diff `new_tree` against `old_tree` (absent for added directories).
    /// `prefix` is the absolute path of both trees.
    fn diff(&mut self, new_tree: &Tree, old_tree: Option<&Tree>, prefix: &str, depth: usize) -> FsResult<()> {
        if depth > self.max_depth {
            return Err(FsError::malformed(
                prefix,
                format!("tree nesting exceeds {} levels", self.max_depth),
            ));
        }

        for entry in new_tree.iter() {
            let old_entry = old_tree.and_then(|tree| tree.get(&entry.name));
            let fspath = join_fspath(prefix, &entry.name);

            match old_entry {
                Some(old) if old.oid == entry.oid && old.mode == entry.mode => {}
                Some(old) if entry.is_tree() && old.is_tree() => {
                    let new_sub = self.objects.entry_to_subtree(entry)?;
                    let old_sub = self.objects.entry_to_subtree(old)?;
                    self.diff(&new_sub, Some(&old_sub), &fspath, depth + 1)?;
                }
                Some(old) if entry.is_blob() && old.is_blob() => {
                    self.record(fspath, ChangeKind::Modify, NodeKind::File, true);
                }
                _ => {
                    let change_kind = if old_entry.is_some() {
                        ChangeKind::Replace
                    } else {
                        ChangeKind::Add
                    };
                    match entry.object_type() {
                        ObjectType::Blob => {
                            self.record(fspath, change_kind, NodeKind::File, false);
                        }
                        ObjectType::Tree => {
                            self.record(fspath.clone(), change_kind, NodeKind::Dir, false);
                            let new_sub = self.objects.entry_to_subtree(entry)?;
                            self.diff(&new_sub, None, &fspath, depth + 1)?;
                        }
                        ObjectType::Commit => {
                            tracing::trace!(path = %fspath, "skipping gitlink");
                        }
                    }
                }
            }
        }

        if let Some(old_tree) = old_tree {
            for old in old_tree.iter() {
                if new_tree.get(&old.name).is_some() {
                    continue;
                }
                let node_kind = match old.object_type() {
                    ObjectType::Tree => NodeKind::Dir,
                    ObjectType::Blob => NodeKind::File,
                    ObjectType::Commit => continue,
                };
                self.record(join_fspath(prefix, &old.name), ChangeKind::Delete, node_kind, false);
            }
        }

        Ok(())
    }
}

fn join_fspath(prefix: &str, name: &str) -> String {
    path::to_fspath(&path::join(path::strip_root(prefix), name))
}

#[cfg(test)]
mod tests {
    use crate::GitFs;
    use revfs_core::{ChangeKind, EntryMode, FsConfig, FsError, FsRoot, NodeKind};
    use revfs_storage::RepositoryBuilder;

    #[test]
    fn test_revision_zero_and_one() {
        let mut builder = RepositoryBuilder::new();
        builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
        let fs = GitFs::new(builder.objects(), builder.revisions());

        assert!(fs.revision_root(0).unwrap().paths_changed().unwrap().is_empty());

        let root = fs.revision_root(1).unwrap();
        let changes = root.paths_changed().unwrap();
        let keys: Vec<_> = changes.keys().cloned().collect();
        assert_eq!(keys, vec!["/branches", "/trunk", "/trunk/a.txt"]);
        assert_eq!(changes["/trunk"].change_kind, ChangeKind::Add);
        assert_eq!(changes["/branches"].node_kind, NodeKind::Dir);
        assert_eq!(changes["/trunk/a.txt"].change_kind, ChangeKind::Add);
        assert!(!changes["/trunk/a.txt"].text_modified);
        assert_eq!(changes["/trunk/a.txt"].node_id.path(), "trunk/a.txt");
    }

    #[test]
    fn test_add_modify_delete_replace() {
        let mut builder = RepositoryBuilder::new();
        builder
            .commit_files(
                "trunk",
                &[("keep.txt", "same"), ("mod.txt", "v1"), ("gone.txt", "x"), ("swap", "file")],
            )
            .unwrap();
        builder
            .commit_files(
                "trunk",
                &[("keep.txt", "same"), ("mod.txt", "v2"), ("new/inner.txt", "n"), ("swap/child", "c")],
            )
            .unwrap();
        let fs = GitFs::new(builder.objects(), builder.revisions());
        let root2 = fs.revision_root(2).unwrap();
        let changes = root2.paths_changed().unwrap();

        assert!(!changes.contains_key("/trunk/keep.txt"));
        assert!(!changes.contains_key("/trunk"));

        let modified = &changes["/trunk/mod.txt"];
        assert_eq!(modified.change_kind, ChangeKind::Modify);
        assert!(modified.text_modified);
        assert!(!modified.props_modified);

        assert_eq!(changes["/trunk/gone.txt"].change_kind, ChangeKind::Delete);
        assert_eq!(changes["/trunk/gone.txt"].node_kind, NodeKind::File);

        assert_eq!(changes["/trunk/new"].change_kind, ChangeKind::Add);
        assert_eq!(changes["/trunk/new"].node_kind, NodeKind::Dir);
        assert_eq!(changes["/trunk/new/inner.txt"].change_kind, ChangeKind::Add);

        // File replaced by a directory: recorded at its root, children added
        assert_eq!(changes["/trunk/swap"].change_kind, ChangeKind::Replace);
        assert_eq!(changes["/trunk/swap"].node_kind, NodeKind::Dir);
        assert_eq!(changes["/trunk/swap/child"].change_kind, ChangeKind::Add);
        assert_eq!(changes.len(), 6);
    }

    #[test]
    fn test_mode_change_is_modification() {
        let mut builder = RepositoryBuilder::new();
        builder
            .commit_entries("trunk", &[("run.sh", EntryMode::Regular, b"echo".as_slice())])
            .unwrap();
        builder
            .commit_entries("trunk", &[("run.sh", EntryMode::Executable, b"echo".as_slice())])
            .unwrap();
        let fs = GitFs::new(builder.objects(), builder.revisions());
        let root2 = fs.revision_root(2).unwrap();
        let changes = root2.paths_changed().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["/trunk/run.sh"].change_kind, ChangeKind::Modify);
    }

    #[test]
    fn test_gitlinks_are_skipped() {
        let mut builder = RepositoryBuilder::new();
        builder
            .commit_entries("trunk", &[("old-link", EntryMode::Gitlink, b"sub1".as_slice())])
            .unwrap();
        builder
            .commit_entries("trunk", &[("new-link", EntryMode::Gitlink, b"sub2".as_slice())])
            .unwrap();
        let fs = GitFs::new(builder.objects(), builder.revisions());
        assert!(fs.revision_root(2).unwrap().paths_changed().unwrap().is_empty());
    }

    #[test]
    fn test_copy_revision_has_no_tree_diff() {
        let mut builder = RepositoryBuilder::new();
        builder.commit_files("trunk", &[("a.txt", "hello")]).unwrap();
        builder.commit_files("trunk", &[("a.txt", "world")]).unwrap();
        builder.copy_branch("trunk", "branches/foo").unwrap();
        let fs = GitFs::new(builder.objects(), builder.revisions());
        assert!(fs.revision_root(3).unwrap().paths_changed().unwrap().is_empty());
    }

    #[test]
    fn test_depth_guard() {
        let mut builder = RepositoryBuilder::new();
        builder
            .commit_files("trunk", &[("a/b/c/d/e.txt", "deep")])
            .unwrap();
        let fs = GitFs::with_config(
            builder.objects(),
            builder.revisions(),
            FsConfig::with_max_tree_depth(2),
        );
        let err = fs.revision_root(1).unwrap().paths_changed().unwrap_err();
        assert!(matches!(err, FsError::MalformedTree { .. }));
        assert!(!err.is_recoverable());
    }
}
