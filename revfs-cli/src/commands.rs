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

//! Sub-command implementations
//!
//! Every command writes to the given sink so the binary and the tests
//! share one code path.

use anyhow::{Context, Result};
use revfs_core::{ChecksumKind, FsConfig, FsRoot, NodeKind, Revision};
use revfs_git::{GitFs, RevisionRoot};
use revfs_storage::{MemoryObjectStore, MemoryRevisionMap, OBJECTS_FILE, REVISIONS_FILE};
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A snapshot directory opened for reading
pub struct Snapshot {
    objects: Arc<MemoryObjectStore>,
    revisions: Arc<MemoryRevisionMap>,
    fs: GitFs,
}

impl Snapshot {
    pub fn open(dir: &Path, config: FsConfig) -> Result<Self> {
        let objects_path = dir.join(OBJECTS_FILE);
        let objects = MemoryObjectStore::load_from_file(&objects_path)
            .with_context(|| format!("Failed to load objects from {:?}", objects_path))?;
        let revisions_path = dir.join(REVISIONS_FILE);
        let revisions = MemoryRevisionMap::load_from_file(&revisions_path)
            .with_context(|| format!("Failed to load revision map from {:?}", revisions_path))?;

        anyhow::ensure!(
            revisions.tags_root() == config.layout.tags,
            "revision map lists tags under '{}' but the layout names '{}'",
            revisions.tags_root(),
            config.layout.tags
        );

        let objects = Arc::new(objects);
        let revisions = Arc::new(revisions);
        let fs = GitFs::with_config(objects.clone(), revisions.clone(), config);
        debug!(dir = %dir.display(), "opened snapshot");
        Ok(Self {
            objects,
            revisions,
            fs,
        })
    }

    /// Root at `revision`, or at the youngest revision
    fn root(&self, revision: Option<Revision>) -> Result<RevisionRoot> {
        let revision = match revision {
            Some(rev) => rev,
            None => self.fs.youngest_revision()?,
        };
        self.fs
            .revision_root(revision)
            .with_context(|| format!("Failed to open revision {}", revision))
    }
}

pub fn info(snapshot: &Snapshot, json: bool, out: &mut dyn Write) -> Result<()> {
    let youngest = snapshot.fs.youngest_revision()?;
    let stats = snapshot.objects.stats();
    let branches = snapshot.revisions.live_branches(youngest);

    if json {
        let branches: serde_json::Map<String, serde_json::Value> = branches
            .iter()
            .map(|(path, oid)| (path.clone(), json!(oid.to_hex())))
            .collect();
        let value = json!({
            "youngest_revision": youngest,
            "objects": {
                "total": stats.total_objects,
                "commits": stats.commit_count,
                "trees": stats.tree_count,
                "blobs": stats.blob_count,
                "blob_bytes": stats.blob_bytes,
            },
            "branches": branches,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
        return Ok(());
    }

    writeln!(out, "Youngest revision: {}", youngest)?;
    writeln!(
        out,
        "Objects: {} ({} commits, {} trees, {} blobs of {} bytes)",
        stats.total_objects,
        stats.commit_count,
        stats.tree_count,
        stats.blob_count,
        stats.blob_bytes
    )?;
    writeln!(out, "Branches:")?;
    for (path, oid) in &branches {
        writeln!(out, "  /{} @ {}", path, oid)?;
    }
    Ok(())
}

pub fn ls(
    snapshot: &Snapshot,
    revision: Option<Revision>,
    path: &str,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let root = snapshot.root(revision)?;
    let entries = root
        .dir_entries(path)
        .with_context(|| format!("Failed to list {}", path))?;
    let ordered = root.dir_optimal_order(&entries);

    if json {
        let items: Vec<_> = ordered
            .iter()
            .map(|entry| json!({ "name": entry.name, "kind": entry.kind.as_str() }))
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
        return Ok(());
    }

    for entry in ordered {
        match entry.kind {
            NodeKind::Dir => writeln!(out, "{}/", entry.name)?,
            _ => writeln!(out, "{}", entry.name)?,
        }
    }
    Ok(())
}

pub fn cat(
    snapshot: &Snapshot,
    revision: Option<Revision>,
    path: &str,
    checksum: Option<ChecksumKind>,
    out: &mut dyn Write,
) -> Result<()> {
    let root = snapshot.root(revision)?;
    if let Some(kind) = checksum {
        let sum = root
            .file_checksum(kind, path)
            .with_context(|| format!("Failed to checksum {}", path))?;
        let length = root.file_length(path)?;
        writeln!(out, "{}  {} bytes", sum, length)?;
        return Ok(());
    }

    let mut contents = root
        .file_contents(path)
        .with_context(|| format!("Failed to read {}", path))?;
    std::io::copy(&mut contents, out)?;
    Ok(())
}

pub fn changed(
    snapshot: &Snapshot,
    revision: Option<Revision>,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let root = snapshot.root(revision)?;
    let changes = root.paths_changed()?;

    if json {
        let items: Vec<_> = changes
            .iter()
            .map(|(path, change)| {
                json!({
                    "path": path,
                    "change": change.change_kind.code().to_string(),
                    "kind": change.node_kind.as_str(),
                    "text_modified": change.text_modified,
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&items)?)?;
        return Ok(());
    }

    writeln!(out, "r{}: {} changed paths", root.revision(), changes.len())?;
    for (path, change) in &changes {
        let suffix = if change.node_kind == NodeKind::Dir { "/" } else { "" };
        writeln!(out, "   {} {}{}", change.change_kind.code(), path, suffix)?;
    }
    Ok(())
}

pub fn created(
    snapshot: &Snapshot,
    revision: Option<Revision>,
    path: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let root = snapshot.root(revision)?;
    let created_rev = root.node_created_rev(path)?;
    let created_path = root.node_created_path(path)?;
    writeln!(out, "{}@{}", created_path, created_rev)?;
    Ok(())
}

pub fn log(
    snapshot: &Snapshot,
    revision: Option<Revision>,
    path: &str,
    limit: usize,
    out: &mut dyn Write,
) -> Result<()> {
    let root = snapshot.root(revision)?;
    let mut history = root
        .node_history(path)
        .with_context(|| format!("Failed to trace {}", path))?;

    let mut shown = 0;
    while shown < limit {
        let Some(location) = history.prev()? else {
            break;
        };
        writeln!(out, "r{}  {}", location.revision, location.path)?;
        shown += 1;
    }
    Ok(())
}

pub fn relation(
    snapshot: &Snapshot,
    rev_a: Revision,
    path_a: &str,
    rev_b: Revision,
    path_b: &str,
    out: &mut dyn Write,
) -> Result<()> {
    let root_a = snapshot.root(Some(rev_a))?;
    let root_b = snapshot.root(Some(rev_b))?;
    let relation = root_a.node_relation(path_a, &root_b, path_b)?;
    writeln!(out, "{}", relation)?;

    let both_files = root_a.check_path(path_a)? == NodeKind::File
        && root_b.check_path(path_b)? == NodeKind::File;
    if both_files {
        let differs = root_a.contents_changed(path_a, &root_b, path_b, true)?;
        writeln!(out, "contents {}", if differs { "differ" } else { "identical" })?;
    }
    Ok(())
}
