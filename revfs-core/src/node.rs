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

//! Node, change and directory types returned by filesystem roots

use crate::id::NodeId;
use std::collections::BTreeMap;

/// Sequential revision number; 0 is the empty repository
pub type Revision = u64;

/// Kind of node at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Nothing exists at the path
    None,
    File,
    Dir,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::None => "none",
            NodeKind::File => "file",
            NodeKind::Dir => "dir",
        }
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a path changed in a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Add,
    Delete,
    Modify,
    Replace,
}

impl ChangeKind {
    /// Single-letter status code (A/D/M/R)
    pub fn code(self) -> char {
        match self {
            ChangeKind::Add => 'A',
            ChangeKind::Delete => 'D',
            ChangeKind::Modify => 'M',
            ChangeKind::Replace => 'R',
        }
    }
}

/// One changed path in a revision
#[derive(Debug, Clone)]
pub struct PathChange<'r> {
    pub node_id: NodeId<'r>,
    pub change_kind: ChangeKind,
    pub node_kind: NodeKind,
    /// Set only for in-place file modification
    pub text_modified: bool,
    /// Always false; there is no property model
    pub props_modified: bool,
}

/// Changes keyed by absolute path (`/trunk/a.txt`)
pub type ChangedPaths<'r> = BTreeMap<String, PathChange<'r>>;

/// Immediate child of a directory
#[derive(Debug, Clone)]
pub struct DirEntry<'r> {
    pub name: String,
    pub kind: NodeKind,
    pub id: NodeId<'r>,
}

/// Directory listing keyed by entry name
pub type DirEntries<'r> = BTreeMap<String, DirEntry<'r>>;

/// A (path, revision) pair yielded by history traversal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLocation {
    pub path: String,
    pub revision: Revision,
}

impl HistoryLocation {
    pub fn new(path: impl Into<String>, revision: Revision) -> Self {
        Self {
            path: path.into(),
            revision,
        }
    }
}

/// Which mergeinfo to report for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeinfoInheritance {
    #[default]
    Explicit,
    Inherited,
    NearestAncestor,
}

/// Path -> mergeinfo text
pub type MergeinfoCatalog = BTreeMap<String, String>;

/// Property name -> value
pub type PropList = BTreeMap<String, Vec<u8>>;
