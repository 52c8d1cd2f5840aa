// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! retrace-edits: text-edit reconstruction for retrace
//!
//! This library crate replays the position-addressed edits recorded in a chat
//! session against in-memory line buffers, keeps every resulting version of
//! each file, and derives unified diffs between versions.

#![warn(missing_docs)]

//! # Example
//!
//! ```
//! use retrace_edits::{Base, EditRange, EditStyle, FileHistory, MemorySeed, TextEdit};
//!
//! let seeds = MemorySeed::new().with_file("/src/lib.rs", "foo\nbar");
//! let mut history = FileHistory::new();
//! history.seed("/src/lib.rs", &seeds);
//!
//! let edits = vec![vec![TextEdit::new(EditRange::new(2, 1, 2, 4), "baz\nqux")]];
//! history.derive("/src/lib.rs", Base::Latest, &edits, EditStyle::Replace, "example");
//!
//! let chain = history.chain("/src/lib.rs").unwrap();
//! assert_eq!(chain.latest().buffer().lines(), ["foo", "baz", "qux"]);
//! println!("{}", chain.squashed_diff().unified);
//! ```

pub mod buffer;
pub mod chain;
pub mod diff;
pub mod error;
pub mod range;

pub use buffer::{AppliedEdit, TextBuffer};
pub use chain::{
    Base, FileHistory, FsSeed, MemorySeed, NoSeed, Revision, SeedSource, Snapshot,
    SnapshotOrigin, VersionChain,
};
pub use diff::{DiffMode, FileDiff, diff_buffers};
pub use error::EditError;
pub use range::{
    DocumentUri, EditRange, EditStyle, RangeCorrection, TextEdit, TextEditGroup,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffer::TextBuffer;
    pub use crate::chain::{Base, FileHistory, SeedSource, VersionChain};
    pub use crate::diff::{DiffMode, FileDiff};
    pub use crate::error::EditError;
    pub use crate::range::{EditRange, EditStyle, TextEdit, TextEditGroup};
}
