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

//! Revfs Storage
//!
//! Backing stores consumed by the revision filesystem: the commit graph
//! object store and the revision map, with in-memory implementations and
//! a builder for assembling repositories.

pub mod builder;
pub mod revmap;
pub mod store;

pub use builder::RepositoryBuilder;
pub use revmap::{BranchListing, MemoryRevisionMap, RevisionMap, RevisionMapping, RevisionRecord};
pub use store::{MemoryObjectStore, ObjectStore, StoreStats, StoredObject};

/// File name of the object store inside a snapshot directory
pub const OBJECTS_FILE: &str = "objects.bin";

/// File name of the revision map inside a snapshot directory
pub const REVISIONS_FILE: &str = "revisions.json";
