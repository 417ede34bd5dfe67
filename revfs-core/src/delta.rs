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

//! Text deltas between file versions
//!
//! A delta is a list of windows that either copy a byte range of the source
//! or insert new bytes. It is computed with the patience algorithm over
//! line-split content, so unchanged lines become copies.

use serde::{Deserialize, Serialize};
use similar::{capture_diff_slices, Algorithm, DiffOp};

/// One delta window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaOp {
    /// Copy `len` bytes of the source starting at `offset`
    Copy { offset: u64, len: u64 },
    /// Emit new bytes
    Insert(Vec<u8>),
}

/// Delta turning a source byte string into a target byte string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextDelta {
    pub source_len: u64,
    pub target_len: u64,
    pub ops: Vec<DeltaOp>,
}

impl TextDelta {
    /// Compute the delta from `source` to `target`
    pub fn compute(source: &[u8], target: &[u8]) -> Self {
        let old_lines: Vec<&[u8]> = source.split_inclusive(|b| *b == b'\n').collect();
        let new_lines: Vec<&[u8]> = target.split_inclusive(|b| *b == b'\n').collect();

        // offsets[i] = byte offset of line i in the source
        let mut offsets = Vec::with_capacity(old_lines.len() + 1);
        let mut acc = 0u64;
        offsets.push(acc);
        for line in &old_lines {
            acc += line.len() as u64;
            offsets.push(acc);
        }

        let mut delta = TextDelta {
            source_len: source.len() as u64,
            target_len: target.len() as u64,
            ops: Vec::new(),
        };

        for op in capture_diff_slices(Algorithm::Patience, &old_lines, &new_lines) {
            match op {
                DiffOp::Equal { old_index, len, .. } => {
                    let offset = offsets[old_index];
                    delta.push_copy(offset, offsets[old_index + len] - offset);
                }
                DiffOp::Delete { .. } => {}
                DiffOp::Insert {
                    new_index, new_len, ..
                }
                | DiffOp::Replace {
                    new_index, new_len, ..
                } => {
                    let data = new_lines[new_index..new_index + new_len].concat();
                    delta.push_insert(data);
                }
            }
        }
        delta
    }

    /// Delta from nothing: a single insert of the whole target
    pub fn from_empty(target: &[u8]) -> Self {
        Self::compute(&[], target)
    }

    /// Apply to `source`; `None` if the delta does not fit it
    pub fn apply(&self, source: &[u8]) -> Option<Vec<u8>> {
        if source.len() as u64 != self.source_len {
            return None;
        }
        let mut out = Vec::with_capacity(self.target_len as usize);
        for op in &self.ops {
            match op {
                DeltaOp::Copy { offset, len } => {
                    let start = usize::try_from(*offset).ok()?;
                    let end = start.checked_add(usize::try_from(*len).ok()?)?;
                    out.extend_from_slice(source.get(start..end)?);
                }
                DeltaOp::Insert(data) => out.extend_from_slice(data),
            }
        }
        (out.len() as u64 == self.target_len).then_some(out)
    }

    /// Bytes carried by insert windows
    pub fn new_data_len(&self) -> u64 {
        self.ops
            .iter()
            .map(|op| match op {
                DeltaOp::Insert(data) => data.len() as u64,
                DeltaOp::Copy { .. } => 0,
            })
            .sum()
    }

    fn push_copy(&mut self, offset: u64, len: u64) {
        if len == 0 {
            return;
        }
        if let Some(DeltaOp::Copy {
            offset: prev_offset,
            len: prev_len,
        }) = self.ops.last_mut()
        {
            if *prev_offset + *prev_len == offset {
                *prev_len += len;
                return;
            }
        }
        self.ops.push(DeltaOp::Copy { offset, len });
    }

    fn push_insert(&mut self, data: Vec<u8>) {
        if data.is_empty() {
            return;
        }
        if let Some(DeltaOp::Insert(prev)) = self.ops.last_mut() {
            prev.extend_from_slice(&data);
            return;
        }
        self.ops.push(DeltaOp::Insert(data));
    }
}
