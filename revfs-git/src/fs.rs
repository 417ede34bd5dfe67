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

//! Filesystem handle
//!
//! A [`GitFs`] ties an object store and a revision map together. It is
//! cheap to clone and can be shared between threads; each thread opens its
//! own [`RevisionRoot`] for the revisions it queries.

use crate::root::RevisionRoot;
use revfs_core::{FsConfig, FsError, FsResult, Revision};
use revfs_storage::{ObjectStore, RevisionMap};
use std::sync::Arc;

struct GitFsInner {
    objects: Arc<dyn ObjectStore>,
    revisions: Arc<dyn RevisionMap>,
    config: FsConfig,
}

#[derive(Clone)]
pub struct GitFs {
    inner: Arc<GitFsInner>,
}

impl GitFs {
    pub fn new(objects: Arc<dyn ObjectStore>, revisions: Arc<dyn RevisionMap>) -> Self {
        Self::with_config(objects, revisions, FsConfig::default())
    }

    pub fn with_config(
        objects: Arc<dyn ObjectStore>,
        revisions: Arc<dyn RevisionMap>,
        config: FsConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GitFsInner {
                objects,
                revisions,
                config,
            }),
        }
    }

    pub fn objects(&self) -> &dyn ObjectStore {
        self.inner.objects.as_ref()
    }

    pub fn revisions(&self) -> &dyn RevisionMap {
        self.inner.revisions.as_ref()
    }

    pub fn config(&self) -> &FsConfig {
        &self.inner.config
    }

    pub fn youngest_revision(&self) -> FsResult<Revision> {
        Ok(self.revisions().youngest_revision()?)
    }

    /// Open the root of `revision`
    pub fn revision_root(&self, revision: Revision) -> FsResult<RevisionRoot> {
        let youngest = self.youngest_revision()?;
        if revision > youngest {
            return Err(FsError::NoSuchRevision(revision));
        }
        RevisionRoot::open(self.clone(), revision)
    }

    /// Whether both handles refer to the same stores
    pub fn same_fs(&self, other: &GitFs) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for GitFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitFs")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
