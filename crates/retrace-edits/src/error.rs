// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for retrace-edits

use thiserror::Error;

/// Errors that can occur when reading back version history
#[derive(Debug, Error)]
pub enum EditError {
    /// The path was never seeded or edited
    #[error("Unknown path: {path}")]
    UnknownPath {
        /// The path that was looked up
        path: String,
    },

    /// A snapshot index beyond the end of the chain
    #[error("Snapshot {index} out of range for {path} ({len} snapshots)")]
    SnapshotOutOfRange {
        /// Path of the chain
        path: String,
        /// Requested index
        index: usize,
        /// Number of snapshots in the chain
        len: usize,
    },
}
