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

//! Branch resolution
//!
//! Maps a repository path to the commit mounted at its branch root and the
//! path remaining below that root. Results are cached on the root; a root
//! is bound to one immutable revision, so cached entries never go stale.

use crate::root::RevisionRoot;
use revfs_core::path;
use revfs_core::{Commit, FsResult, FsRoot, ObjectId, StoreError};
use std::sync::Arc;

/// A commit loaded for a branch root
#[derive(Debug, Clone)]
pub struct ResolvedCommit {
    pub oid: ObjectId,
    pub commit: Arc<Commit>,
}

impl ResolvedCommit {
    pub fn new(oid: ObjectId, commit: Commit) -> Self {
        Self {
            oid,
            commit: Arc::new(commit),
        }
    }
}

/// Result of resolving a path
#[derive(Debug, Clone)]
pub struct BranchMatch<'p> {
    pub commit: ResolvedCommit,
    /// Path below the branch root; empty for the root itself
    pub relpath: &'p str,
}

/// Resolve `path` to its branch. `Ok(None)` means no branch owns the path.
pub fn resolve_branch<'p>(root: &RevisionRoot, path: &'p str) -> FsResult<Option<BranchMatch<'p>>> {
    let path = path::strip_root(path);

    if let (Some(commit), Some(rev_path)) = (root.exact_commit(), root.rev_path()) {
        if let Some(relpath) = path::skip_ancestor(rev_path, path) {
            return Ok(Some(BranchMatch {
                commit: commit.clone(),
                relpath,
            }));
        }
    }

    {
        let cache = root.branch_cache().borrow();
        for (branch_path, commit) in cache.iter() {
            if let Some(relpath) = path::skip_ancestor(branch_path, path) {
                tracing::trace!(path, branch = %branch_path, "branch cache hit");
                return Ok(Some(BranchMatch {
                    commit: commit.clone(),
                    relpath,
                }));
            }
        }
    }

    let fs = root.fs();
    let (branch_path, oid) = match fs.revisions().find_branch(path, root.revision())? {
        Some(found) => found,
        None => {
            tracing::trace!(path, revision = root.revision(), "no branch");
            return Ok(None);
        }
    };

    let relpath = path::skip_ancestor(&branch_path, path).ok_or_else(|| {
        StoreError::RevisionMap(format!(
            "branch '{}' returned for unrelated path '{}'",
            branch_path, path
        ))
    })?;

    let commit = ResolvedCommit::new(oid, fs.objects().lookup_commit(&oid)?);
    tracing::debug!(
        path,
        branch = %branch_path,
        commit = %oid,
        revision = root.revision(),
        "branch cache miss"
    );
    root.branch_cache()
        .borrow_mut()
        .push((branch_path, commit.clone()));

    Ok(Some(BranchMatch { commit, relpath }))
}
