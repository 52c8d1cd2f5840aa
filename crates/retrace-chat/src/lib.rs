// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! retrace-chat: chat session parsing for retrace
//!
//! This library crate turns the flat event log of an AI coding-assistant
//! session into structured records, and replays the file edits those records
//! carry into a [`retrace_edits::FileHistory`].

#![warn(missing_docs)]

//! ## Pipeline
//!
//! 1. [`parse_session_json`] validates the exported session document.
//! 2. [`RecordStream`] classifies each response's events lazily, using a
//!    [`Pushback`] cursor and per-tool [`Matcher`] grammars.
//! 3. [`Transcript::reconstruct`] drives the stream and applies every edit
//!    invocation to the [`SessionContext`].
//!
//! ```rust,no_run
//! use std::path::Path;
//! use retrace_chat::{NoModels, parse_session_file, reconstruct_session};
//! use retrace_edits::{DiffMode, FsSeed};
//!
//! let document = parse_session_file(Path::new("session.json")).expect("parse");
//! let (transcript, history) = reconstruct_session(&document, &FsSeed::new(), &NoModels);
//! println!("{} turns", transcript.turns.len());
//! for diff in history.summary(DiffMode::Squashed) {
//!     println!("{}", diff.unified);
//! }
//! ```

pub mod classifier;
pub mod cursor;
pub mod error;
pub mod event;
pub mod matcher;
pub mod reconstruct;
pub mod record;
pub mod session;

pub use classifier::{Diagnostic, DiagnosticKind, RecordStream};
pub use cursor::Pushback;
pub use error::ChatError;
pub use event::{Event, EventKind, ToolId};
pub use matcher::{MatchedFilter, Matcher, Repeat, Violation};
pub use reconstruct::{
    ModelLookup, NoModels, SessionContext, Transcript, Turn, reconstruct_session,
};
pub use record::{
    Chunk, Confirmation, EditInvocation, EditTool, FileMatches, InlineReference, Location,
    ProgressNotice, Record, ReferenceKind, SearchResults, TerminalCommand, TextRun, ToolMessage,
};
pub use session::{SessionDocument, SessionRequest, parse_session_file, parse_session_json};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classifier::{Diagnostic, RecordStream};
    pub use crate::error::ChatError;
    pub use crate::event::Event;
    pub use crate::reconstruct::{ModelLookup, SessionContext, Transcript, Turn};
    pub use crate::record::{EditInvocation, Record};
    pub use crate::session::{SessionDocument, parse_session_json};
}
