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

//! Filesystem root contract
//!
//! A root is one revision of one filesystem. Every query is keyed by a
//! repository path relative to that root. Backends implement [`FsRoot`];
//! callers only ever hold `&dyn FsRoot`.
//!
//! The mutating half of the contract exists so that callers can drive any
//! backend uniformly. Read-only backends inherit the provided methods,
//! which fail with [`FsError::NotImplemented`].

use crate::checksum::{Checksum, ChecksumKind};
use crate::delta::TextDelta;
use crate::error::{FsError, FsResult};
use crate::id::{NodeId, NodeRelation};
use crate::node::{
    ChangedPaths, DirEntries, DirEntry, HistoryLocation, MergeinfoCatalog, MergeinfoInheritance,
    NodeKind, PropList, Revision,
};
use std::any::Any;
use std::io::{Read, Write};

/// Receiver for text deltas applied to a file
pub type TextDeltaHandler = Box<dyn FnMut(&TextDelta) -> FsResult<()> + Send>;

/// Backward traversal over the revisions that modified a node
pub trait FsHistory {
    /// Next older location, or `None` once history is exhausted
    fn prev(&mut self) -> FsResult<Option<HistoryLocation>>;
}

pub trait FsRoot {
    /// Concrete root, used to detect roots of the same backend
    fn as_any(&self) -> &dyn Any;

    fn revision(&self) -> Revision;

    // === Changes and history ===

    /// Every path changed in this revision
    fn paths_changed(&self) -> FsResult<ChangedPaths<'_>>;

    fn check_path(&self, path: &str) -> FsResult<NodeKind>;

    fn node_history(&self, path: &str) -> FsResult<Box<dyn FsHistory + '_>>;

    fn node_id(&self, path: &str) -> FsResult<NodeId<'_>>;

    fn node_relation(
        &self,
        path_a: &str,
        root_b: &dyn FsRoot,
        path_b: &str,
    ) -> FsResult<NodeRelation>;

    /// Revision in which the node's current content was created
    fn node_created_rev(&self, path: &str) -> FsResult<Revision>;

    /// Revision in which the node's line of history began
    fn node_origin_rev(&self, path: &str) -> FsResult<Revision>;

    /// Path of the node at its created revision
    fn node_created_path(&self, path: &str) -> FsResult<String>;

    // === Copies ===

    fn copied_from(&self, _path: &str) -> FsResult<Option<(Revision, String)>> {
        Ok(None)
    }

    fn closest_copy(&self, _path: &str) -> FsResult<Option<(Revision, String)>> {
        Ok(None)
    }

    // === Properties ===

    fn node_prop(&self, _path: &str, _name: &str) -> FsResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn node_proplist(&self, _path: &str) -> FsResult<PropList> {
        Ok(PropList::new())
    }

    fn node_has_props(&self, _path: &str) -> FsResult<bool> {
        Ok(false)
    }

    fn props_changed(
        &self,
        _path_a: &str,
        _root_b: &dyn FsRoot,
        _path_b: &str,
        _strict: bool,
    ) -> FsResult<bool> {
        Ok(false)
    }

    fn get_mergeinfo(
        &self,
        _paths: &[&str],
        _inherit: MergeinfoInheritance,
        _include_descendants: bool,
        _adjust_inherited: bool,
    ) -> FsResult<MergeinfoCatalog> {
        Err(FsError::UnsupportedFeature("mergeinfo"))
    }

    // === Directories ===

    fn dir_entries(&self, path: &str) -> FsResult<DirEntries<'_>>;

    /// Order in which entries are cheapest to visit
    fn dir_optimal_order<'a, 'r>(&self, entries: &'a DirEntries<'r>) -> Vec<&'a DirEntry<'r>> {
        entries.values().collect()
    }

    // === Files ===

    fn file_length(&self, path: &str) -> FsResult<u64>;

    fn file_checksum(&self, kind: ChecksumKind, path: &str) -> FsResult<Checksum>;

    fn file_contents(&self, path: &str) -> FsResult<Box<dyn Read + Send>>;

    /// Hand the contents to `processor` if they are already in memory.
    /// Returns whether the processor ran.
    fn try_process_file_contents(
        &self,
        _path: &str,
        _processor: &mut dyn FnMut(&[u8]) -> FsResult<()>,
    ) -> FsResult<bool> {
        Ok(false)
    }

    fn contents_changed(
        &self,
        path_a: &str,
        root_b: &dyn FsRoot,
        path_b: &str,
        strict: bool,
    ) -> FsResult<bool>;

    /// Delta from `source` (or from nothing) to `target_path` in this root
    fn get_file_delta_stream(
        &self,
        source: Option<(&dyn FsRoot, &str)>,
        target_path: &str,
    ) -> FsResult<TextDelta>;

    // === Mutation ===

    fn make_dir(&self, _path: &str) -> FsResult<()> {
        Err(FsError::NotImplemented("make_dir"))
    }

    fn make_file(&self, _path: &str) -> FsResult<()> {
        Err(FsError::NotImplemented("make_file"))
    }

    fn delete_node(&self, _path: &str) -> FsResult<()> {
        Err(FsError::NotImplemented("delete_node"))
    }

    fn copy(&self, _to_path: &str, _from_root: &dyn FsRoot, _from_path: &str) -> FsResult<()> {
        Err(FsError::NotImplemented("copy"))
    }

    fn revision_link(&self, _from_root: &dyn FsRoot, _path: &str) -> FsResult<()> {
        Err(FsError::NotImplemented("revision_link"))
    }

    fn change_node_prop(&self, _path: &str, _name: &str, _value: Option<&[u8]>) -> FsResult<()> {
        Err(FsError::NotImplemented("change_node_prop"))
    }

    fn apply_textdelta(
        &self,
        _path: &str,
        _base_checksum: Option<&Checksum>,
        _result_checksum: Option<&Checksum>,
    ) -> FsResult<TextDeltaHandler> {
        Err(FsError::NotImplemented("apply_textdelta"))
    }

    fn apply_text(
        &self,
        _path: &str,
        _result_checksum: Option<&Checksum>,
    ) -> FsResult<Box<dyn Write + Send>> {
        Err(FsError::NotImplemented("apply_text"))
    }

    /// Merge `source` into `target_path` relative to `ancestor`.
    /// Returns the conflicting path, if any.
    fn merge(
        &self,
        _target_path: &str,
        _source_root: &dyn FsRoot,
        _source_path: &str,
        _ancestor_root: &dyn FsRoot,
        _ancestor_path: &str,
    ) -> FsResult<Option<String>> {
        Err(FsError::NotImplemented("merge"))
    }
}
