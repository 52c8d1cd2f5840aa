// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Integration tests for retrace-edits
//!
//! These tests replay realistic edit sequences against seeded files and check
//! the resulting versions and diffs.

use std::path::Path;

use retrace_edits::{
    Base, DiffMode, EditRange, EditStyle, FileHistory, FsSeed, MemorySeed, NoSeed,
    SnapshotOrigin, TextEdit, TextEditGroup,
};
use similar_asserts::assert_eq;

/// Get the fixtures directory for test data
fn fixtures_dir() -> std::path::PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    Path::new(&manifest_dir).join("tests/fixtures")
}

#[test]
fn test_insert_into_created_file_diffs_as_one_addition() {
    let mut history = FileHistory::new();
    history.seed("/a.txt", &NoSeed);

    let edits = vec![vec![TextEdit::new(EditRange::new(1, 1, 1, 1), "hello")]];
    let (revision, _) = history.derive("/a.txt", Base::Empty, &edits, EditStyle::Insert, "insert");

    let chain = history.chain("/a.txt").expect("chain");
    assert_eq!(chain.latest().buffer().lines(), &["hello".to_string()]);

    let diff = history
        .diff_versions("/a.txt", revision.before, revision.after)
        .expect("diff");
    assert_eq!(diff.insertions, 1);
    assert_eq!(diff.deletions, 0);
    let changed: Vec<&str> = diff
        .lines()
        .skip(2)
        .filter(|l| l.starts_with(['+', '-']))
        .collect();
    assert_eq!(changed, vec!["+hello"]);
}

#[test]
fn test_edit_group_from_session_json() {
    let json = r#"{
        "kind": "textEditGroup",
        "uri": {"$mid": 1, "fsPath": "/proj/main.rs", "path": "/proj/main.rs", "scheme": "file"},
        "edits": [
            [{"text": "fn main() {\n    println!(\"hi\");\n}", "range": {"startLineNumber": 1, "startColumn": 1, "endLineNumber": 1, "endColumn": 1}}],
            [{"text": "\"bye\"", "range": {"startLineNumber": 2, "startColumn": 14, "endLineNumber": 2, "endColumn": 18}}]
        ],
        "done": true
    }"#;
    let group: TextEditGroup = serde_json::from_str(json).expect("parse edit group");
    assert_eq!(group.path(), "/proj/main.rs");

    let mut history = FileHistory::new();
    history.seed_created(group.path());
    history.derive(group.path(), Base::Latest, &group.edits, EditStyle::Replace, "create");

    let chain = history.chain(group.path()).expect("chain");
    assert_eq!(
        chain.latest().buffer().lines(),
        &["fn main() {", "    println!(\"bye\");", "}"].map(String::from)
    );
}

#[test]
fn test_squashed_diff_spans_all_versions() {
    let seeds = MemorySeed::new().with_file("/notes.md", "# Title\n\nfirst\nsecond\nthird");
    let mut history = FileHistory::new();
    history.seed("/notes.md", &seeds);

    let steps = [
        (EditRange::new(3, 1, 3, 6), "FIRST"),
        (EditRange::new(5, 1, 5, 6), "THIRD"),
        (EditRange::new(5, 6, 5, 6), "\nfourth"),
    ];
    for (range, text) in steps {
        history.derive(
            "/notes.md",
            Base::Latest,
            &[vec![TextEdit::new(range, text)]],
            EditStyle::Replace,
            "replace",
        );
    }

    let chain = history.chain("/notes.md").expect("chain");
    assert_eq!(chain.len(), 4);
    assert_eq!(
        chain.latest().buffer().to_text(),
        "# Title\n\nFIRST\nsecond\nTHIRD\nfourth"
    );

    let squashed = chain.squashed_diff();
    assert_eq!(squashed.insertions, 3);
    assert_eq!(squashed.deletions, 2);

    let pairwise = history.summary(DiffMode::Pairwise);
    assert_eq!(pairwise.len(), 3);
    assert_eq!(pairwise.iter().map(|d| d.insertions).sum::<usize>(), 3);
}

#[test]
fn test_seed_from_fixture_file() {
    let seed = FsSeed::rooted(fixtures_dir());
    let mut history = FileHistory::new();
    let chain = history.seed("/seed.txt", &seed);

    assert_eq!(chain.baseline().origin(), &SnapshotOrigin::Seeded);
    assert_eq!(
        chain.baseline().buffer().lines(),
        &["first line", "second line", ""].map(String::from)
    );
}

#[test]
fn test_missing_fixture_degrades_to_empty_baseline() {
    let seed = FsSeed::rooted(fixtures_dir());
    let mut history = FileHistory::new();
    let chain = history.seed("/does-not-exist.txt", &seed);
    assert_eq!(chain.baseline().origin(), &SnapshotOrigin::MissingSeed);
    assert!(chain.baseline().buffer().is_empty());
}
