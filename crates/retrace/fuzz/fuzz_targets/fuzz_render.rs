// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for Markdown rendering
//!
//! Every document that parses must replay and render without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use retrace::render::{MarkdownRenderer, PathFormatter};
use retrace_chat::{NoModels, parse_session_json, reconstruct_session};
use retrace_edits::NoSeed;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data)
        && let Ok(document) = parse_session_json(input)
    {
        let (transcript, history) = reconstruct_session(&document, &NoSeed, &NoModels);
        let paths = PathFormatter::new(["/"]);
        let _ = MarkdownRenderer::new(&history, &paths)
            .with_squash(true)
            .render(&transcript);
    }
});
