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

//! Commit graph objects
//!
//! Blobs hold file bytes, trees hold one directory level and commits tie a
//! root tree to its parents. Objects never change once stored: their id is
//! the BLAKE3 hash of the type tag followed by the encoded object.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Hash identifying an object
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId([u8; 32]);

impl ObjectId {
    /// Id of an arbitrary byte string
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// First six bytes in hex, for logs and listings
    pub fn abbrev(&self) -> String {
        hex::encode(&self.0[..6])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ObjectId {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let raw: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| OidParseError::Length(bytes.len()))?;
        Ok(Self(raw))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.abbrev())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.abbrev())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OidParseError {
    #[error("object id is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("object id has {0} bytes, expected 32")]
    Length(usize),
}

/// The three kinds of stored object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Prefix mixed into the object id
    fn tag(self) -> u8 {
        match self {
            ObjectType::Blob => b'b',
            ObjectType::Tree => b't',
            ObjectType::Commit => b'c',
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<&str> for Blob {
    fn from(text: &str) -> Self {
        Self::new(text.as_bytes())
    }
}

const MODE_FORMAT_MASK: u32 = 0o170000;
const MODE_SYMLINK: u32 = 0o120000;

/// Mode of a tree entry, serialized as the raw mode bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum EntryMode {
    /// 100644
    Regular,
    /// 100755
    Executable,
    /// 040000
    Directory,
    /// 120000
    Symlink,
    /// 160000, a commit of another repository
    Gitlink,
}

impl EntryMode {
    pub fn bits(self) -> u32 {
        match self {
            EntryMode::Regular => 0o100644,
            EntryMode::Executable => 0o100755,
            EntryMode::Directory => 0o040000,
            EntryMode::Symlink => 0o120000,
            EntryMode::Gitlink => 0o160000,
        }
    }

    /// Kind of object the entry points at
    pub fn object_type(self) -> ObjectType {
        match self {
            EntryMode::Directory => ObjectType::Tree,
            EntryMode::Gitlink => ObjectType::Commit,
            EntryMode::Regular | EntryMode::Executable | EntryMode::Symlink => ObjectType::Blob,
        }
    }

    pub fn is_symlink(self) -> bool {
        self.bits() & MODE_FORMAT_MASK == MODE_SYMLINK
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown entry mode {0:o}")]
pub struct UnknownMode(pub u32);

impl TryFrom<u32> for EntryMode {
    type Error = UnknownMode;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Ok(match bits {
            // Older trees carry group-writable files
            0o100644 | 0o100664 => EntryMode::Regular,
            0o100755 => EntryMode::Executable,
            0o040000 => EntryMode::Directory,
            0o120000 => EntryMode::Symlink,
            0o160000 => EntryMode::Gitlink,
            other => return Err(UnknownMode(other)),
        })
    }
}

impl From<EntryMode> for u32 {
    fn from(mode: EntryMode) -> u32 {
        mode.bits()
    }
}

/// One named slot of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub name: String,
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl TreeEntry {
    pub fn new(name: impl Into<String>, oid: ObjectId, mode: EntryMode) -> Self {
        Self {
            name: name.into(),
            oid,
            mode,
        }
    }

    pub fn object_type(&self) -> ObjectType {
        self.mode.object_type()
    }

    pub fn is_tree(&self) -> bool {
        self.mode == EntryMode::Directory
    }

    pub fn is_blob(&self) -> bool {
        self.object_type() == ObjectType::Blob
    }
}

/// A directory level; entries stay sorted by name so lookups can bisect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Insert or replace the entry with the same name. Returns the replaced
    /// entry, if any.
    pub fn insert(&mut self, entry: TreeEntry) -> Option<TreeEntry> {
        match self.search(&entry.name) {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx], entry)),
            Err(idx) => {
                self.entries.insert(idx, entry);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        let idx = self.search(name).ok()?;
        self.entries.get(idx)
    }

    /// Entry at `index` in name order
    pub fn entry(&self, index: usize) -> Option<&TreeEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TreeEntry> {
        self.entries.iter()
    }

    fn search(&self, name: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.name.as_str().cmp(name))
    }
}

impl FromIterator<TreeEntry> for Tree {
    fn from_iter<I: IntoIterator<Item = TreeEntry>>(iter: I) -> Self {
        let mut tree = Tree::default();
        for entry in iter {
            tree.insert(entry);
        }
        tree
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = &'a TreeEntry;
    type IntoIter = std::slice::Iter<'a, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Who made a commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::new("revfs", "revfs@localhost")
    }
}

/// A root tree and the commits it descends from. Only the first parent is
/// ever walked by history queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    /// Microseconds since the Unix epoch
    pub timestamp_us: u64,
}

impl Commit {
    pub fn new(tree: ObjectId, parents: Vec<ObjectId>) -> Self {
        Self {
            tree,
            parents,
            message: String::new(),
            author: Signature::default(),
            committer: Signature::default(),
            timestamp_us: now_us(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set both author and committer
    pub fn signed(mut self, signature: Signature) -> Self {
        self.committer = signature.clone();
        self.author = signature;
        self
    }

    pub fn at(mut self, timestamp_us: u64) -> Self {
        self.timestamp_us = timestamp_us;
        self
    }

    pub fn parent(&self, index: usize) -> Option<&ObjectId> {
        self.parents.get(index)
    }

    pub fn first_parent(&self) -> Option<&ObjectId> {
        self.parent(0)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

fn now_us() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or_default()
}

/// Encoding and identity shared by every stored object
pub trait GitObject: Sized + Serialize + for<'de> Deserialize<'de> {
    const KIND: ObjectType;

    fn encode(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        bincode::deserialize(bytes).map_err(|e| StoreError::SerializationError(e.to_string()))
    }

    /// Hash of the type tag and the encoding
    fn id(&self) -> Result<ObjectId, StoreError> {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[Self::KIND.tag()]);
        hasher.update(&self.encode()?);
        Ok(ObjectId(*hasher.finalize().as_bytes()))
    }
}

impl GitObject for Blob {
    const KIND: ObjectType = ObjectType::Blob;
}

impl GitObject for Tree {
    const KIND: ObjectType = ObjectType::Tree;
}

impl GitObject for Commit {
    const KIND: ObjectType = ObjectType::Commit;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob_id(text: &str) -> ObjectId {
        Blob::from(text).id().unwrap()
    }

    #[test]
    fn test_ids_follow_content_and_kind() {
        assert_eq!(blob_id("hello"), blob_id("hello"));
        assert_ne!(blob_id("hello"), blob_id("world"));

        // An empty tree and an empty blob encode alike but differ in kind
        let empty_tree = Tree::default().id().unwrap();
        assert_ne!(empty_tree, Blob::new(Vec::new()).id().unwrap());
    }

    #[test]
    fn test_parse_object_id() {
        let oid = blob_id("parse me");
        assert_eq!(oid.to_hex().parse::<ObjectId>().unwrap(), oid);
        assert_eq!("abcd".parse::<ObjectId>(), Err(OidParseError::Length(2)));
        assert!(matches!("zz".parse::<ObjectId>(), Err(OidParseError::Hex(_))));
        assert_eq!(oid.abbrev().len(), 12);
        assert_eq!(oid.to_string(), oid.abbrev());
    }

    #[test]
    fn test_tree_keeps_names_sorted() {
        let a = blob_id("a");
        let b = blob_id("b");
        let mut tree: Tree = [
            TreeEntry::new("zeta", a, EntryMode::Regular),
            TreeEntry::new("alpha", b, EntryMode::Directory),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = tree.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(tree.entry(1).unwrap().oid, a);
        assert!(tree.entry(2).is_none());
        assert!(tree.get("missing").is_none());

        let replaced = tree.insert(TreeEntry::new("zeta", b, EntryMode::Executable));
        assert_eq!(replaced.map(|e| e.oid), Some(a));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("zeta").unwrap().mode, EntryMode::Executable);
    }

    #[test]
    fn test_entry_mode_bits() {
        assert!(EntryMode::Symlink.is_symlink());
        assert!(!EntryMode::Regular.is_symlink());
        assert!(!EntryMode::Gitlink.is_symlink());
        assert_eq!(EntryMode::Symlink.object_type(), ObjectType::Blob);
        assert_eq!(EntryMode::Gitlink.object_type(), ObjectType::Commit);
        assert_eq!(EntryMode::try_from(0o100664u32), Ok(EntryMode::Regular));
        assert_eq!(EntryMode::try_from(0o777u32), Err(UnknownMode(0o777)));

        // Modes travel as their bits
        let entry = TreeEntry::new("run.sh", blob_id("x"), EntryMode::Executable);
        let bytes = bincode::serialize(&entry).unwrap();
        let back: TreeEntry = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.mode, EntryMode::Executable);
    }

    #[test]
    fn test_commit_parents() {
        let tree = Tree::default().id().unwrap();
        let root = Commit::new(tree, Vec::new()).with_message("root").at(1);
        assert!(root.is_root());
        assert!(root.first_parent().is_none());

        let root_id = root.id().unwrap();
        let child = Commit::new(tree, vec![root_id])
            .with_message("child")
            .signed(Signature::new("dev", "dev@example.com"))
            .at(2);
        assert_eq!(child.first_parent(), Some(&root_id));
        assert_eq!(child.committer.name, "dev");
        assert_ne!(child.id().unwrap(), root_id);
    }
}
