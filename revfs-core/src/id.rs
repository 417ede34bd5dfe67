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

//! Synthetic node identity
//!
//! The commit graph has no repository-wide node id. A [`NodeId`] is only a
//! handle on `(root, path)`; whether two handles denote the same node is
//! re-derived from content every time through [`FsRoot::node_relation`].
//! `NodeId` deliberately does not implement `PartialEq`.

use crate::error::FsResult;
use crate::fs_root::FsRoot;
use crate::node::Revision;
use crate::path;

/// Three-way classification of two `(revision, path)` pairs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRelation {
    /// No shared lineage
    Unrelated,
    /// Identical content
    Unchanged,
    /// Same lineage, content diverged
    CommonAncestor,
}

impl NodeRelation {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeRelation::Unrelated => "unrelated",
            NodeRelation::Unchanged => "unchanged",
            NodeRelation::CommonAncestor => "common-ancestor",
        }
    }

    /// Unchanged or sharing an ancestor
    pub fn is_related(self) -> bool {
        self != NodeRelation::Unrelated
    }
}

impl std::fmt::Display for NodeRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle on a node of one root
#[derive(Clone)]
pub struct NodeId<'r> {
    root: &'r dyn FsRoot,
    path: String,
}

impl<'r> NodeId<'r> {
    pub fn new(root: &'r dyn FsRoot, path: &str) -> Self {
        Self {
            root,
            path: path::strip_root(path).to_string(),
        }
    }

    /// Path relative to the repository root
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn root(&self) -> &'r dyn FsRoot {
        self.root
    }

    pub fn revision(&self) -> Revision {
        self.root.revision()
    }

    /// Persistent form of the id; there is none
    pub fn unparse(&self) -> String {
        String::new()
    }

    /// Relation between the two nodes, asked of this id's root
    pub fn check_related(&self, other: &NodeId<'_>) -> FsResult<NodeRelation> {
        self.root
            .node_relation(&self.path, other.root, &other.path)
    }

    /// Like [`check_related`](Self::check_related), but lookup failures
    /// count as unrelated
    pub fn compare(&self, other: &NodeId<'_>) -> NodeRelation {
        match self.check_related(other) {
            Ok(relation) => relation,
            Err(e) => {
                tracing::debug!(
                    path_a = %self.path,
                    path_b = %other.path,
                    error = %e,
                    "node relation failed, treating as unrelated"
                );
                NodeRelation::Unrelated
            }
        }
    }
}

impl std::fmt::Debug for NodeId<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeId")
            .field("revision", &self.root.revision())
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_labels() {
        assert_eq!(NodeRelation::CommonAncestor.to_string(), "common-ancestor");
        assert!(NodeRelation::Unchanged.is_related());
        assert!(!NodeRelation::Unrelated.is_related());
    }
}
