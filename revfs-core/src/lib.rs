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

//! Revfs Core
//!
//! Object model and filesystem contract for presenting a content-addressed
//! commit graph as a versioned, path-addressed filesystem.

pub mod checksum;
pub mod config;
pub mod delta;
pub mod error;
pub mod fs_root;
pub mod id;
pub mod node;
pub mod objects;
pub mod path;

pub use checksum::{Checksum, ChecksumKind};
pub use config::{ConfigError, FsConfig, LayoutConfig, DEFAULT_MAX_TREE_DEPTH};
pub use delta::{DeltaOp, TextDelta};
pub use error::{FsError, FsResult, StoreError};
pub use fs_root::{FsHistory, FsRoot, TextDeltaHandler};
pub use id::{NodeId, NodeRelation};
pub use node::{
    ChangeKind, ChangedPaths, DirEntries, DirEntry, HistoryLocation, MergeinfoCatalog,
    MergeinfoInheritance, NodeKind, PathChange, PropList, Revision,
};
pub use objects::{
    Blob, Commit, EntryMode, GitObject, ObjectId, ObjectType, OidParseError, Signature, Tree,
    TreeEntry, UnknownMode,
};
