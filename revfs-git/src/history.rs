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

//! Node history
//!
//! A node's created revision is found by following first parents from the
//! commit that holds it, for as long as the same object sits at the same
//! path below the branch root. The oldest such commit is mapped back to
//! the revision that introduced it.

use crate::branch::ResolvedCommit;
use crate::fs::GitFs;
use crate::root::RevisionRoot;
use revfs_core::path;
use revfs_core::{FsError, FsHistory, FsResult, FsRoot, HistoryLocation, NodeKind, ObjectId, Revision};

/// Oldest first-parent ancestor of `start` holding `oid` at `relpath`
fn trace_unchanged(
    root: &RevisionRoot,
    start: &ResolvedCommit,
    relpath: &str,
    oid: ObjectId,
) -> FsResult<ObjectId> {
    let objects = root.fs().objects();
    let mut last_seen = start.oid;
    let mut current = (*start.commit).clone();
    let mut steps = 0usize;

    while let Some((parent_oid, parent)) = objects.commit_parent(&current, 0)? {
        let parent_tree = objects.commit_tree(&parent)?;
        match crate::locate::locate_entry(objects, &parent_tree, relpath)? {
            Some(entry) if entry.oid == oid => {}
            _ => break,
        }
        last_seen = parent_oid;
        current = parent;
        steps += 1;
    }

    tracing::trace!(relpath, steps, commit = %last_seen, "traced unchanged ancestry");
    Ok(last_seen)
}

/// Revision in which the content at `path` was last changed
pub(crate) fn node_created_rev(root: &RevisionRoot, path: &str) -> FsResult<Revision> {
    let path = path::strip_root(path);
    if path.is_empty() {
        return Ok(root.revision());
    }

    let found = match root.resolve(path)? {
        Some(found) => found,
        // Container directories exist from the skeleton revision on
        None if root.layout().is_container(path) => return Ok(root.revision()),
        None => return Err(FsError::not_found(root.revision(), path)),
    };
    if found.relpath.is_empty() {
        return Ok(root.revision());
    }

    let entry = root
        .entry_in(&found.commit, found.relpath)?
        .ok_or_else(|| FsError::not_found(root.revision(), path))?;

    let origin = trace_unchanged(root, &found.commit, found.relpath, entry.oid)?;
    let revision = root
        .fs()
        .revisions()
        .fetch_revision_for_commit(&origin)?
        .unwrap_or_else(|| {
            tracing::warn!(commit = %origin, path, "commit has no revision, using root revision");
            root.revision()
        });
    Ok(revision)
}

/// Absolute path of the node at its created revision
pub(crate) fn node_created_path(root: &RevisionRoot, path: &str) -> FsResult<String> {
    let revision = node_created_rev(root, path)?;
    if revision == root.revision() {
        return Ok(path::to_fspath(path));
    }

    let relpath = match root.resolve(path)? {
        Some(found) => found.relpath,
        None => return Ok(path::to_fspath(path)),
    };
    let created = match root.fs().revisions().fetch_commit_for_revision(revision)? {
        Some(mapping) => path::join(&mapping.branch_path, relpath),
        None => path::strip_root(path).to_string(),
    };
    Ok(path::to_fspath(&created))
}

/// History over the revisions that changed a node, newest first
pub struct GitNodeHistory {
    fs: GitFs,
    /// Next place to look: relative path and revision
    next: Option<(String, Revision)>,
    /// Set for nodes that only ever exist at one location
    single: Option<HistoryLocation>,
    /// Next commit of a branch root's first-parent chain
    next_commit: Option<ObjectId>,
}

pub(crate) fn node_history(root: &RevisionRoot, path: &str) -> FsResult<GitNodeHistory> {
    let path = path::strip_root(path);
    let mut history = GitNodeHistory {
        fs: root.fs().clone(),
        next: None,
        single: None,
        next_commit: None,
    };

    if path.is_empty() {
        history.single = Some(HistoryLocation::new("/", root.revision()));
        return Ok(history);
    }

    let found = match root.resolve(path)? {
        Some(found) => found,
        None if root.revision() > 0 && root.layout().is_container(path) => {
            history.single = Some(HistoryLocation::new(path::to_fspath(path), root.revision()));
            return Ok(history);
        }
        None => return Err(FsError::not_found(root.revision(), path)),
    };

    // A branch root changes exactly when a commit is mounted on it
    if found.relpath.is_empty() {
        history.next_commit = Some(found.commit.oid);
        return Ok(history);
    }

    if root.check_path(path)? == NodeKind::None {
        return Err(FsError::not_found(root.revision(), path));
    }

    history.next = Some((path.to_string(), root.revision()));
    Ok(history)
}

impl GitNodeHistory {
    /// Next mounted commit along the first-parent chain, skipping commits
    /// no revision introduced
    fn prev_commit(&mut self) -> FsResult<Option<HistoryLocation>> {
        let objects = self.fs.objects();
        let revisions = self.fs.revisions();
        while let Some(oid) = self.next_commit.take() {
            let commit = objects.lookup_commit(&oid)?;
            self.next_commit = commit.first_parent().copied();

            let Some(revision) = revisions.fetch_revision_for_commit(&oid)? else {
                tracing::trace!(commit = %oid, "skipping unmapped commit");
                continue;
            };
            if let Some(mapping) = revisions.fetch_commit_for_revision(revision)? {
                return Ok(Some(HistoryLocation::new(
                    path::to_fspath(&mapping.branch_path),
                    revision,
                )));
            }
        }
        Ok(None)
    }
}

impl FsHistory for GitNodeHistory {
    fn prev(&mut self) -> FsResult<Option<HistoryLocation>> {
        if let Some(location) = self.single.take() {
            return Ok(Some(location));
        }
        if self.next_commit.is_some() {
            return self.prev_commit();
        }
        let (path, revision) = match self.next.take() {
            Some(next) => next,
            None => return Ok(None),
        };

        let root = self.fs.revision_root(revision)?;
        // Never step forward, whatever the revision map says
        let created_rev = root.node_created_rev(&path)?.min(revision);
        let created_path = root.node_created_path(&path)?;

        if created_rev > 0 {
            let older = self.fs.revision_root(created_rev - 1)?;
            let older_path = path::strip_root(&created_path);
            if older.check_path(older_path)? != NodeKind::None {
                self.next = Some((older_path.to_string(), created_rev - 1));
            }
        }

        Ok(Some(HistoryLocation::new(created_path, created_rev)))
    }
}

impl Iterator for GitNodeHistory {
    type Item = FsResult<HistoryLocation>;

    fn next(&mut self) -> Option<Self::Item> {
        self.prev().transpose()
    }
}
