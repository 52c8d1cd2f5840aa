// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for session document parsing and reconstruction
//!
//! Any document that parses must also reconstruct without panicking.

#![no_main]

use libfuzzer_sys::fuzz_target;

use retrace_chat::{NoModels, parse_session_json, reconstruct_session};
use retrace_edits::NoSeed;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(document) = parse_session_json(input) {
            let _ = reconstruct_session(&document, &NoSeed, &NoModels);
        }
    }
});
