// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for edit application
//!
//! Edit metadata recorded in session exports is not trusted, so applying any
//! sequence of ranges to any buffer must never panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use retrace_edits::{EditRange, EditStyle, TextBuffer, TextEdit};

#[derive(Debug, Arbitrary)]
struct FuzzEdit {
    start_line: u8,
    start_column: u8,
    end_line: u8,
    end_column: u8,
    text: String,
    insert: bool,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    content: String,
    edits: Vec<FuzzEdit>,
}

fuzz_target!(|input: FuzzInput| {
    let mut buffer = TextBuffer::from_text(&input.content);
    for edit in input.edits {
        let range = EditRange::new(
            usize::from(edit.start_line),
            usize::from(edit.start_column),
            usize::from(edit.end_line),
            usize::from(edit.end_column),
        );
        let style = if edit.insert {
            EditStyle::Insert
        } else {
            EditStyle::Replace
        };
        let applied = buffer.apply(&TextEdit::new(range, edit.text), style);
        assert!(buffer.len() >= applied.range.start_line_number);
    }
});
