// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Unified diffs between snapshots

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::buffer::TextBuffer;

/// Lines of unchanged context around each hunk
pub const CONTEXT_LINES: usize = 3;

/// Which snapshot pairs a session summary diffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// First snapshot against last snapshot
    #[default]
    Squashed,
    /// Every consecutive pair of snapshots
    Pairwise,
}

/// A unified diff of one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Path of the diffed file
    pub path: String,
    /// Number of added lines
    pub insertions: usize,
    /// Number of removed lines
    pub deletions: usize,
    /// Unified diff text with `before`/`after` headers, empty when unchanged
    pub unified: String,
}

impl FileDiff {
    /// Whether the two snapshots were identical
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }

    /// Diff text split into lines (no terminators)
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.unified.lines()
    }
}

/// Render every line newline-terminated so a missing final newline never
/// shows up as a change
fn terminated(buffer: &TextBuffer) -> String {
    let mut text = String::new();
    for line in buffer.lines() {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// Diff two buffers line by line
#[must_use]
pub fn diff_buffers(path: &str, before: &TextBuffer, after: &TextBuffer) -> FileDiff {
    let old = terminated(before);
    let new = terminated(after);
    let diff = TextDiff::from_lines(&old, &new);

    let mut insertions = 0;
    let mut deletions = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => insertions += 1,
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Equal => {}
        }
    }

    let unified = if insertions + deletions == 0 {
        String::new()
    } else {
        diff.unified_diff()
            .context_radius(CONTEXT_LINES)
            .header("before", "after")
            .to_string()
    };

    FileDiff {
        path: path.to_string(),
        insertions,
        deletions,
        unified,
    }
}
