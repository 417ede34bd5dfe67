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

//! Error types for the revision filesystem

use crate::node::Revision;
use crate::objects::{ObjectId, ObjectType};
use thiserror::Error;

/// Object store and revision map errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {0} is missing from the store")]
    NotFound(ObjectId),

    #[error("object {0} does not match its id")]
    CorruptedObject(ObjectId),

    #[error("object {oid} is a {actual}, expected a {expected}")]
    TypeMismatch {
        oid: ObjectId,
        expected: ObjectType,
        actual: ObjectType,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Revision map error: {0}")]
    RevisionMap(String),
}

/// Filesystem errors surfaced by root operations
#[derive(Debug, Error)]
pub enum FsError {
    #[error("File not found: revision {revision}, path '{path}'")]
    NotFound { revision: Revision, path: String },

    #[error("'{0}' is not a file")]
    NotFile(String),

    #[error("'{0}' is not a directory")]
    NotDirectory(String),

    #[error("{0} is not implemented by a read-only filesystem")]
    NotImplemented(&'static str),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("Malformed tree at '{path}': {reason}")]
    MalformedTree { path: String, reason: String },

    #[error("No such revision: {0}")]
    NoSuchRevision(Revision),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FsError {
    pub fn not_found(revision: Revision, path: impl Into<String>) -> Self {
        FsError::NotFound {
            revision,
            path: path.into(),
        }
    }

    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        FsError::MalformedTree {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can reasonably recover (wrong path or kind)
    ///
    /// Malformed trees and store failures indicate data-integrity faults.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            FsError::NotFound { .. }
                | FsError::NotFile(_)
                | FsError::NotDirectory(_)
                | FsError::NoSuchRevision(_)
        )
    }
}

pub type FsResult<T> = Result<T, FsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(FsError::not_found(3, "trunk/a").is_recoverable());
        assert!(FsError::NotFile("trunk".into()).is_recoverable());
        assert!(!FsError::malformed("trunk/sub", "gitlink").is_recoverable());
        assert!(!FsError::NotImplemented("make_dir").is_recoverable());
        assert!(!FsError::from(StoreError::SerializationError("bad".into())).is_recoverable());
    }

    #[test]
    fn test_error_messages() {
        let err = FsError::not_found(2, "trunk/missing.txt");
        assert_eq!(
            err.to_string(),
            "File not found: revision 2, path 'trunk/missing.txt'"
        );
        let err = FsError::NotImplemented("copy");
        assert!(err.to_string().starts_with("copy"));
    }
}
