// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for display path shortening

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use retrace::render::PathFormatter;

#[derive(Debug, Arbitrary)]
struct Input {
    roots: Vec<String>,
    path: String,
}

fuzz_target!(|input: Input| {
    let paths = PathFormatter::new(input.roots.iter().map(String::as_str));
    let _ = paths.format(&input.path);
});
