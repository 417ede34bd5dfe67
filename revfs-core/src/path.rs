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

//! Repository path helpers
//!
//! Repository paths are '/'-separated and relative to the repository root.
//! Callers may pass a single leading '/', which is stripped before any
//! matching. Change-set keys use the absolute form (`/trunk/a.txt`).

/// Strip one leading separator
pub fn strip_root(path: &str) -> &str {
    path.strip_prefix('/').unwrap_or(path)
}

/// If `path` is `ancestor` or lies beneath it, return the remainder.
///
/// An empty ancestor contains every path. `"trunk"` contains `"trunk"`
/// (remainder `""`) and `"trunk/a"` (remainder `"a"`) but not `"trunkx"`.
pub fn skip_ancestor<'p>(ancestor: &str, path: &'p str) -> Option<&'p str> {
    if ancestor.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(ancestor)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}

/// Split at the first separator: `"a/b/c"` -> `("a", "b/c")`
pub fn split_first(path: &str) -> (&str, &str) {
    match path.find('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (path, ""),
    }
}

/// Join two relative paths, treating empty components as absent
pub fn join(base: &str, component: &str) -> String {
    match (base.is_empty(), component.is_empty()) {
        (true, _) => component.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, component),
    }
}

/// Absolute form of a relative path (`"trunk"` -> `"/trunk"`)
pub fn to_fspath(path: &str) -> String {
    format!("/{}", strip_root(path))
}

/// Last component
pub fn basename(path: &str) -> &str {
    let path = strip_root(path);
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Everything before the last component
pub fn dirname(path: &str) -> &str {
    let path = strip_root(path);
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}
