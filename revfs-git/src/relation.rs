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

//! Node relations
//!
//! There are no stored node ids, so two nodes are compared by where they
//! sit below their branch roots and by the objects found there.

use crate::root::RevisionRoot;
use revfs_core::path;
use revfs_core::{FsError, FsResult, FsRoot, NodeRelation};

/// Downcast `other` to a root of the same filesystem as `root`
fn same_fs_root<'b>(root: &RevisionRoot, other: &'b dyn FsRoot) -> Option<&'b RevisionRoot> {
    other
        .as_any()
        .downcast_ref::<RevisionRoot>()
        .filter(|other| other.fs().same_fs(root.fs()))
}

pub(crate) fn node_relation(
    root_a: &RevisionRoot,
    path_a: &str,
    root_b: &dyn FsRoot,
    path_b: &str,
) -> FsResult<NodeRelation> {
    let root_b = match same_fs_root(root_a, root_b) {
        Some(root) => root,
        None => return Ok(NodeRelation::Unrelated),
    };
    let path_a = path::strip_root(path_a);
    let path_b = path::strip_root(path_b);
    let same_revision = root_a.revision() == root_b.revision();

    if path_a.is_empty() || path_b.is_empty() {
        return Ok(match (path_a.is_empty() && path_b.is_empty(), same_revision) {
            (true, true) => NodeRelation::Unchanged,
            (true, false) => NodeRelation::CommonAncestor,
            (false, _) => NodeRelation::Unrelated,
        });
    }
    if same_revision && path_a == path_b {
        return Ok(NodeRelation::Unchanged);
    }

    let (found_a, found_b) = match (root_a.resolve(path_a)?, root_b.resolve(path_b)?) {
        (Some(a), Some(b)) => (a, b),
        (None, None) if path_a == path_b => return Ok(NodeRelation::CommonAncestor),
        _ => return Ok(NodeRelation::Unrelated),
    };

    // Branch roots are related to each other and to nothing else
    if found_a.relpath.is_empty() || found_b.relpath.is_empty() {
        return Ok(if found_a.relpath.is_empty() && found_b.relpath.is_empty() {
            NodeRelation::CommonAncestor
        } else {
            NodeRelation::Unrelated
        });
    }
    if found_a.relpath != found_b.relpath {
        return Ok(NodeRelation::Unrelated);
    }

    let entry_a = root_a.entry_in(&found_a.commit, found_a.relpath)?;
    let entry_b = root_b.entry_in(&found_b.commit, found_b.relpath)?;
    let relation = match (entry_a, entry_b) {
        (Some(a), Some(b)) if a.object_type() != b.object_type() => NodeRelation::Unrelated,
        (Some(a), Some(b)) if a.oid == b.oid => NodeRelation::Unchanged,
        (Some(_), Some(_)) => NodeRelation::CommonAncestor,
        _ => NodeRelation::Unrelated,
    };
    Ok(relation)
}

pub(crate) fn contents_changed(
    root_a: &RevisionRoot,
    path_a: &str,
    root_b: &dyn FsRoot,
    path_b: &str,
) -> FsResult<bool> {
    let root_b = same_fs_root(root_a, root_b)
        .ok_or(FsError::UnsupportedFeature("comparing contents across filesystems"))?;

    let found_a = root_a
        .resolve(path_a)?
        .ok_or_else(|| FsError::NotFile(path_a.to_string()))?;
    let found_b = root_b
        .resolve(path_b)?
        .ok_or_else(|| FsError::NotFile(path_b.to_string()))?;

    let entry_a = root_a
        .entry_in(&found_a.commit, found_a.relpath)?
        .ok_or_else(|| FsError::NotFile(path_a.to_string()))?;
    let entry_b = root_b
        .entry_in(&found_b.commit, found_b.relpath)?
        .ok_or_else(|| FsError::NotFile(path_b.to_string()))?;

    Ok(entry_a.oid != entry_b.oid)
}

#[cfg(test)]
mod tests {
    use crate::GitFs;
    use proptest::prelude::*;
    use revfs_core::{FsError, FsRoot, NodeRelation};
    use revfs_storage::{MemoryObjectStore, MemoryRevisionMap, RepositoryBuilder};
    use std::sync::Arc;

    fn fixture() -> GitFs {
        let mut builder = RepositoryBuilder::new();
        builder
            .commit_files("trunk", &[("a.txt", "hello"), ("dir/b.txt", "b")])
            .unwrap(); // r1
        builder
            .commit_files("trunk", &[("a.txt", "world"), ("dir/b.txt", "b")])
            .unwrap(); // r2
        builder.copy_branch("trunk", "branches/foo").unwrap(); // r3
        GitFs::new(builder.objects(), builder.revisions())
    }

    #[test]
    fn test_root_paths() {
        let fs = fixture();
        let r1 = fs.revision_root(1).unwrap();
        let r2 = fs.revision_root(2).unwrap();
        assert_eq!(r1.node_relation("", &r1, "/").unwrap(), NodeRelation::Unchanged);
        assert_eq!(r1.node_relation("", &r2, "").unwrap(), NodeRelation::CommonAncestor);
        assert_eq!(r1.node_relation("", &r2, "trunk").unwrap(), NodeRelation::Unrelated);
    }

    #[test]
    fn test_file_relations() {
        let fs = fixture();
        let r1 = fs.revision_root(1).unwrap();
        let r2 = fs.revision_root(2).unwrap();
        let r3 = fs.revision_root(3).unwrap();

        assert_eq!(
            r1.node_relation("trunk/a.txt", &r2, "trunk/a.txt").unwrap(),
            NodeRelation::CommonAncestor
        );
        assert_eq!(
            r1.node_relation("trunk/dir/b.txt", &r2, "/trunk/dir/b.txt").unwrap(),
            NodeRelation::Unchanged
        );
        // Same relative path on another branch
        assert_eq!(
            r3.node_relation("branches/foo/a.txt", &r2, "trunk/a.txt").unwrap(),
            NodeRelation::Unchanged
        );
        assert_eq!(
            r2.node_relation("trunk/a.txt", &r2, "trunk/dir/b.txt").unwrap(),
            NodeRelation::Unrelated
        );
        assert_eq!(
            r2.node_relation("trunk/dir", &r2, "trunk/dir/b.txt").unwrap(),
            NodeRelation::Unrelated
        );
        assert_eq!(
            r1.node_relation("trunk/missing", &r2, "trunk/missing").unwrap(),
            NodeRelation::Unrelated
        );
    }

    #[test]
    fn test_branch_roots_and_containers() {
        let fs = fixture();
        let r2 = fs.revision_root(2).unwrap();
        let r3 = fs.revision_root(3).unwrap();

        assert_eq!(
            r3.node_relation("branches/foo", &r2, "trunk").unwrap(),
            NodeRelation::CommonAncestor
        );
        assert_eq!(
            r3.node_relation("branches/foo", &r2, "trunk/a.txt").unwrap(),
            NodeRelation::Unrelated
        );
        assert_eq!(
            r3.node_relation("branches", &r2, "branches").unwrap(),
            NodeRelation::CommonAncestor
        );
        assert_eq!(
            r3.node_relation("branches", &r2, "tags").unwrap(),
            NodeRelation::Unrelated
        );
    }

    #[test]
    fn test_node_id_compare() {
        let fs = fixture();
        let r1 = fs.revision_root(1).unwrap();
        let r2 = fs.revision_root(2).unwrap();
        let a1 = r1.node_id("trunk/a.txt").unwrap();
        let a2 = r2.node_id("/trunk/a.txt").unwrap();
        assert_eq!(a1.compare(&a2), NodeRelation::CommonAncestor);
        assert_eq!(a1.compare(&a1.clone()), NodeRelation::Unchanged);
        assert_eq!(a1.unparse(), "");
        assert_eq!(a2.revision(), 2);
    }

    #[test]
    fn test_other_filesystem_is_unrelated() {
        let fs = fixture();
        let other = GitFs::new(
            Arc::new(MemoryObjectStore::new()),
            Arc::new(MemoryRevisionMap::new()),
        );
        let root = fs.revision_root(1).unwrap();
        let foreign = other.revision_root(0).unwrap();
        assert_eq!(
            root.node_relation("", &foreign, "").unwrap(),
            NodeRelation::Unrelated
        );
        assert!(matches!(
            root.contents_changed("trunk/a.txt", &foreign, "trunk/a.txt", false),
            Err(FsError::UnsupportedFeature(_))
        ));
    }

    #[test]
    fn test_contents_changed() {
        let fs = fixture();
        let r1 = fs.revision_root(1).unwrap();
        let r2 = fs.revision_root(2).unwrap();
        assert!(r1.contents_changed("trunk/a.txt", &r2, "trunk/a.txt", true).unwrap());
        assert!(!r1.contents_changed("trunk/dir/b.txt", &r2, "trunk/dir/b.txt", true).unwrap());
        assert!(matches!(
            r1.contents_changed("trunk/nope", &r2, "trunk/a.txt", false),
            Err(FsError::NotFile(_))
        ));
        assert!(matches!(
            r1.contents_changed("elsewhere/a.txt", &r2, "trunk/a.txt", false),
            Err(FsError::NotFile(_))
        ));
    }

    proptest! {
        #[test]
        fn prop_relation_reflexive(path in prop::sample::select(vec![
            "", "trunk", "trunk/a.txt", "trunk/dir", "trunk/dir/b.txt",
            "branches", "branches/foo", "branches/foo/a.txt", "tags", "missing/x",
        ]), revision in 0u64..=3) {
            let fs = fixture();
            let root = fs.revision_root(revision).unwrap();
            prop_assert_eq!(root.node_relation(path, &root, path).unwrap(), NodeRelation::Unchanged);
        }
    }
}
