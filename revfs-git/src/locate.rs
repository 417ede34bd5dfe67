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

//! Tree entry lookup by relative path

use revfs_core::path;
use revfs_core::{FsError, FsResult, ObjectType, Tree, TreeEntry};
use revfs_storage::ObjectStore;

/// Find the entry at `relpath` below `tree`.
///
/// Descending through a file yields `None`; descending through any other
/// kind of object means the tree is malformed.
pub fn locate_entry(
    objects: &dyn ObjectStore,
    tree: &Tree,
    relpath: &str,
) -> FsResult<Option<TreeEntry>> {
    locate_below(objects, tree, relpath, "")
}

fn locate_below(
    objects: &dyn ObjectStore,
    tree: &Tree,
    relpath: &str,
    walked: &str,
) -> FsResult<Option<TreeEntry>> {
    let (head, tail) = path::split_first(relpath);

    let entry = match tree.get(head) {
        Some(entry) => entry,
        None => return Ok(None),
    };
    if tail.is_empty() {
        return Ok(Some(entry.clone()));
    }

    match entry.object_type() {
        ObjectType::Tree => {
            let subtree = objects.entry_to_subtree(entry)?;
            locate_below(objects, &subtree, tail, &path::join(walked, head))
        }
        ObjectType::Blob => Ok(None),
        ObjectType::Commit => Err(FsError::malformed(
            path::join(walked, head),
            "cannot descend into a gitlink",
        )),
    }
}
