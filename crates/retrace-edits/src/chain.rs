// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Per-file version history
//!
//! Every edited path owns an append-only [`VersionChain`]. Index 0 is the
//! baseline captured the first time the path is referenced, the last entry is
//! the current state. Chains are only grown through [`FileHistory`]: seed
//! once, derive the next snapshot, read the latest.

use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::buffer::{AppliedEdit, TextBuffer};
use crate::diff::{DiffMode, FileDiff, diff_buffers};
use crate::error::EditError;
use crate::range::{EditStyle, TextEdit};

// ============================================================================
// Seed Sources
// ============================================================================

/// Provides the pre-session content of a file
pub trait SeedSource {
    /// Read the content stored at `path`
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the content cannot be read; callers degrade
    /// to an empty baseline.
    fn read_seed(&self, path: &str) -> io::Result<String>;
}

/// Reads seeds from the live filesystem
///
/// Paths are read as-is, or re-rooted under `root` when one is set (for
/// sessions recorded on another machine).
#[derive(Debug, Clone, Default)]
pub struct FsSeed {
    root: Option<PathBuf>,
}

impl FsSeed {
    /// Read absolute paths directly
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve every path relative to `root`
    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Filesystem location used for `path`
    #[must_use]
    pub fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path.trim_start_matches('/')),
            None => Path::new(path).to_path_buf(),
        }
    }
}

impl SeedSource for FsSeed {
    fn read_seed(&self, path: &str) -> io::Result<String> {
        std::fs::read_to_string(self.resolve(path))
    }
}

/// In-memory seeds keyed by path
#[derive(Debug, Clone, Default)]
pub struct MemorySeed {
    files: HashMap<String, String>,
}

impl MemorySeed {
    /// Create an empty seed map
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register content for `path`
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }
}

impl SeedSource for MemorySeed {
    fn read_seed(&self, path: &str) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no seed for {path}"))
        })
    }
}

/// A seed source that never has content
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeed;

impl SeedSource for NoSeed {
    fn read_seed(&self, path: &str) -> io::Result<String> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("seeding disabled for {path}"),
        ))
    }
}

// ============================================================================
// Snapshots and Chains
// ============================================================================

/// Where a snapshot came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Baseline read through the seed source
    Seeded,
    /// Baseline substituted with an empty buffer because the seed was missing
    MissingSeed,
    /// Baseline of a file created during the session
    Created,
    /// Derived by applying edits from the named tool
    Edited {
        /// Identifier of the tool that produced the edits
        tool: String,
    },
}

/// An immutable captured state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    buffer: TextBuffer,
    origin: SnapshotOrigin,
}

impl Snapshot {
    /// Captured buffer
    #[must_use]
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// How the snapshot was produced
    #[must_use]
    pub fn origin(&self) -> &SnapshotOrigin {
        &self.origin
    }
}

/// Ordered snapshots of one path, oldest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionChain {
    path: String,
    snapshots: Vec<Snapshot>,
}

impl VersionChain {
    fn with_baseline(path: &str, buffer: TextBuffer, origin: SnapshotOrigin) -> Self {
        Self {
            path: path.to_string(),
            snapshots: vec![Snapshot { buffer, origin }],
        }
    }

    /// Path this chain tracks
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of snapshots, baseline included
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a chain is created with its baseline
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The baseline snapshot (index 0)
    #[must_use]
    pub fn baseline(&self) -> &Snapshot {
        &self.snapshots[0]
    }

    /// The current snapshot
    #[must_use]
    pub fn latest(&self) -> &Snapshot {
        &self.snapshots[self.snapshots.len() - 1]
    }

    /// Index of the current snapshot
    #[must_use]
    pub fn latest_index(&self) -> usize {
        self.snapshots.len() - 1
    }

    /// Snapshot at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    /// All snapshots, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshots.iter()
    }

    /// Whether any edit has been recorded after the baseline
    #[must_use]
    pub fn has_edits(&self) -> bool {
        self.snapshots.len() > 1
    }

    /// Diff between two snapshot indices
    #[must_use]
    pub fn diff(&self, from: usize, to: usize) -> Option<FileDiff> {
        let before = self.get(from)?;
        let after = self.get(to)?;
        Some(diff_buffers(&self.path, before.buffer(), after.buffer()))
    }

    /// Diff between the baseline and the current snapshot
    #[must_use]
    pub fn squashed_diff(&self) -> FileDiff {
        diff_buffers(&self.path, self.baseline().buffer(), self.latest().buffer())
    }

    /// Diffs between each pair of consecutive snapshots
    #[must_use]
    pub fn pairwise_diffs(&self) -> Vec<FileDiff> {
        self.snapshots
            .windows(2)
            .map(|pair| diff_buffers(&self.path, pair[0].buffer(), pair[1].buffer()))
            .collect()
    }

    fn push(&mut self, snapshot: Snapshot) -> usize {
        self.snapshots.push(snapshot);
        self.snapshots.len() - 1
    }
}

// ============================================================================
// File History
// ============================================================================

/// Buffer a derivation starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    /// Copy of the chain's current snapshot
    Latest,
    /// A fresh empty buffer
    Empty,
}

/// Result of recording a derived snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Path that was edited
    pub path: String,
    /// Snapshot index the edits were diffed against
    pub before: usize,
    /// Index of the newly appended snapshot
    pub after: usize,
}

/// Version chains for every referenced path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHistory {
    chains: BTreeMap<String, VersionChain>,
}

impl FileHistory {
    /// Create an empty history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Chain for `path`, if it has been referenced
    #[must_use]
    pub fn chain(&self, path: &str) -> Option<&VersionChain> {
        self.chains.get(path)
    }

    /// All chains ordered by path
    pub fn chains(&self) -> impl Iterator<Item = &VersionChain> {
        self.chains.values()
    }

    /// Number of tracked paths
    #[must_use]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no path has been referenced
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Seed the baseline of `path` from `source` unless already present
    ///
    /// A missing seed is replaced with an empty buffer and logged.
    pub fn seed(&mut self, path: &str, source: &dyn SeedSource) -> &VersionChain {
        self.chains.entry(path.to_string()).or_insert_with(|| {
            let (buffer, origin) = match source.read_seed(path) {
                Ok(content) => {
                    debug!(path = %path, "Seeded file baseline");
                    (TextBuffer::from_text(&content), SnapshotOrigin::Seeded)
                }
                Err(e) => {
                    warn!(
                        path = %path,
                        error = %e,
                        "Could not read seed file, using empty baseline"
                    );
                    (TextBuffer::new(), SnapshotOrigin::MissingSeed)
                }
            };
            VersionChain::with_baseline(path, buffer, origin)
        })
    }

    /// Seed `path` with an empty baseline for a file created in the session
    pub fn seed_created(&mut self, path: &str) -> &VersionChain {
        self.chains.entry(path.to_string()).or_insert_with(|| {
            VersionChain::with_baseline(path, TextBuffer::new(), SnapshotOrigin::Created)
        })
    }

    /// A working copy to derive the next snapshot from
    ///
    /// `Base::Latest` on an unseeded path yields an empty buffer.
    #[must_use]
    pub fn working_copy(&self, path: &str, base: Base) -> TextBuffer {
        match base {
            Base::Empty => TextBuffer::new(),
            Base::Latest => self
                .chains
                .get(path)
                .map(|chain| chain.latest().buffer().clone())
                .unwrap_or_default(),
        }
    }

    /// Append `buffer` as the next snapshot of `path`
    ///
    /// The path is seeded with an empty baseline first if it was never
    /// referenced.
    pub fn commit(&mut self, path: &str, buffer: TextBuffer, tool: &str) -> Revision {
        let chain = self.chains.entry(path.to_string()).or_insert_with(|| {
            warn!(path = %path, "Committing edits to an unseeded path");
            VersionChain::with_baseline(path, TextBuffer::new(), SnapshotOrigin::MissingSeed)
        });
        let before = chain.latest_index();
        let after = chain.push(Snapshot {
            buffer,
            origin: SnapshotOrigin::Edited {
                tool: tool.to_string(),
            },
        });
        Revision {
            path: path.to_string(),
            before,
            after,
        }
    }

    /// Copy the base buffer, apply `batches`, and append the result
    pub fn derive(
        &mut self,
        path: &str,
        base: Base,
        batches: &[Vec<TextEdit>],
        style: EditStyle,
        tool: &str,
    ) -> (Revision, Vec<AppliedEdit>) {
        let mut buffer = self.working_copy(path, base);
        let applied = buffer.apply_batches(batches, style);
        (self.commit(path, buffer, tool), applied)
    }

    /// Diff two snapshots of `path`
    ///
    /// # Errors
    ///
    /// Returns `EditError::UnknownPath` if the path has no chain and
    /// `EditError::SnapshotOutOfRange` if either index is past its end.
    pub fn diff_versions(
        &self,
        path: &str,
        from: usize,
        to: usize,
    ) -> Result<FileDiff, EditError> {
        let chain = self.chain(path).ok_or_else(|| EditError::UnknownPath {
            path: path.to_string(),
        })?;
        for index in [from, to] {
            if index >= chain.len() {
                return Err(EditError::SnapshotOutOfRange {
                    path: path.to_string(),
                    index,
                    len: chain.len(),
                });
            }
        }
        Ok(diff_buffers(
            path,
            chain.snapshots[from].buffer(),
            chain.snapshots[to].buffer(),
        ))
    }

    /// Diffs for every path that has edits
    #[must_use]
    pub fn summary(&self, mode: DiffMode) -> Vec<FileDiff> {
        self.chains
            .values()
            .filter(|chain| chain.has_edits())
            .flat_map(|chain| match mode {
                DiffMode::Squashed => vec![chain.squashed_diff()],
                DiffMode::Pairwise => chain.pairwise_diffs(),
            })
            .collect()
    }
}
