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

//! Revfs Git
//!
//! Read-only, revision-addressed filesystem over a commit graph.
//!
//! ```text
//! GitFs ──revision_root(rev)──> RevisionRoot ──FsRoot──> callers
//!   │                               │
//!   ├─ ObjectStore (commits, trees, blobs)
//!   └─ RevisionMap (revision <-> commit, branch roots)
//! ```
//!
//! Paths follow the conventional layout: `trunk`, `branches/<name>` and
//! `tags/<name>` are branch roots, each mounting the tree of one commit.

pub mod branch;
mod changes;
pub mod fs;
pub mod history;
pub mod locate;
mod relation;
pub mod root;

pub use branch::{BranchMatch, ResolvedCommit};
pub use fs::GitFs;
pub use history::GitNodeHistory;
pub use locate::locate_entry;
pub use root::RevisionRoot;
