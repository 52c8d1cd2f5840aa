// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI parsing tests
//!
//! These tests verify global flags, the subcommands and their argument
//! groups, and configuration validation.


use std::path::PathBuf;

use clap::Parser;
use retrace::config::{Command, Config, ConfigError, DiffModeArg, SessionSource};
use similar_asserts::assert_eq;
use test_utils::TempTestDir;

// ============================================================================
// Global flags
// ============================================================================

#[test]
fn test_database_short_flag_d() {
    let config = Config::try_parse_from(["retrace", "-d", "/custom/path/db.sqlite"])
        .expect("parse should succeed");
    assert_eq!(config.database, Some(PathBuf::from("/custom/path/db.sqlite")));
}

#[test]
fn test_database_flag_missing_value_fails() {
    let result = Config::try_parse_from(["retrace", "--database"]);
    assert!(result.is_err());
}

#[test]
fn test_workspace_long_flag() {
    let temp = TempTestDir::new("ws_long_flag");
    let config = Config::try_parse_from(["retrace", "--workspace", temp.path_str()])
        .expect("parse should succeed");
    assert_eq!(config.seed_root(), Some(temp.path()));
}

#[test]
fn test_strip_root_repeats() {
    let config = Config::try_parse_from([
        "retrace",
        "--strip-root",
        "/work",
        "--strip-root",
        "/work/demo",
    ])
    .expect("parse should succeed");
    assert_eq!(
        config.strip_roots,
        vec![PathBuf::from("/work"), PathBuf::from("/work/demo")]
    );
}

#[test]
fn test_verbose_and_quiet_flags() {
    let config = Config::try_parse_from(["retrace", "-v"]).expect("parse should succeed");
    assert_eq!(config.log_level(), tracing::Level::DEBUG);

    let config = Config::try_parse_from(["retrace", "--quiet"]).expect("parse should succeed");
    assert_eq!(config.log_level(), tracing::Level::WARN);
}

#[test]
fn test_no_seed_flag() {
    let config = Config::try_parse_from(["retrace", "--no-seed"]).expect("parse should succeed");
    assert!(config.no_seed);
}

// ============================================================================
// Subcommands
// ============================================================================

#[test]
fn test_render_from_file() {
    let config = Config::try_parse_from([
        "retrace", "render", "--file", "s.json", "-o", "out.md", "--squash",
    ])
    .expect("parse should succeed");
    let Some(Command::Render {
        source,
        output,
        squash,
    }) = config.command
    else {
        panic!("expected render command");
    };
    assert_eq!(
        source,
        SessionSource {
            file: Some(PathBuf::from("s.json")),
            key: None,
        }
    );
    assert_eq!(output, Some(PathBuf::from("out.md")));
    assert!(squash);
}

#[test]
fn test_render_requires_a_source() {
    assert!(Config::try_parse_from(["retrace", "render"]).is_err());
}

#[test]
fn test_render_rejects_file_and_key_together() {
    let result = Config::try_parse_from(["retrace", "render", "--file", "a.json", "--key", "a"]);
    assert!(result.is_err());
}

#[test]
fn test_summary_diff_mode() {
    let config = Config::try_parse_from([
        "retrace",
        "summary",
        "--key",
        "abc",
        "--diff-mode",
        "pairwise",
    ])
    .expect("parse should succeed");
    let Some(Command::Summary {
        diff_mode, json, ..
    }) = config.command
    else {
        panic!("expected summary command");
    };
    assert_eq!(diff_mode, DiffModeArg::Pairwise);
    assert!(!json);
}

#[test]
fn test_summary_defaults_to_squashed() {
    let config = Config::try_parse_from(["retrace", "summary", "-f", "s.json"])
        .expect("parse should succeed");
    assert!(matches!(
        config.command,
        Some(Command::Summary {
            diff_mode: DiffModeArg::Squashed,
            ..
        })
    ));
}

#[test]
fn test_summary_rejects_unknown_diff_mode() {
    let result = Config::try_parse_from([
        "retrace",
        "summary",
        "-f",
        "s.json",
        "--diff-mode",
        "sideways",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_import_key_is_optional() {
    let config = Config::try_parse_from(["retrace", "import", "--file", "chat.json"])
        .expect("parse should succeed");
    let Some(Command::Import { file, key }) = config.command else {
        panic!("expected import command");
    };
    assert_eq!(file, PathBuf::from("chat.json"));
    assert_eq!(key, None);
    assert!(Config::try_parse_from(["retrace", "-d", "x.db", "import", "-f", "a.json"])
        .expect("parse should succeed")
        .uses_database());
}

#[test]
fn test_model_requires_both_values() {
    assert!(Config::try_parse_from(["retrace", "model", "--response-id", "r1"]).is_err());
    let config = Config::try_parse_from([
        "retrace",
        "model",
        "--response-id",
        "r1",
        "--model",
        "gpt-4o",
    ])
    .expect("parse should succeed");
    assert!(matches!(
        config.command,
        Some(Command::Model { ref response_id, ref model }) if response_id == "r1" && model == "gpt-4o"
    ));
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_validate_workspace_is_a_file() {
    let temp = TempTestDir::new("ws_is_file");
    let file = temp.create_file("not-a-dir.txt", "x");
    let config = Config {
        workspace: Some(file),
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::WorkspaceNotDirectory(_))
    ));
}

#[test]
fn test_validate_creates_database_directory_for_import() {
    let temp = TempTestDir::new("db_parent");
    let db = temp.path().join("nested/dir/retrace.db");
    let config = Config::try_parse_from([
        "retrace",
        "-d",
        db.to_str().expect("utf-8 path"),
        "import",
        "-f",
        "chat.json",
    ])
    .expect("parse should succeed");

    config.validate().expect("validate should succeed");
    assert!(temp.path().join("nested/dir").is_dir());
}

#[test]
fn test_validate_leaves_database_alone_for_file_render() {
    let temp = TempTestDir::new("db_untouched");
    let db = temp.path().join("nested/retrace.db");
    let config = Config::try_parse_from([
        "retrace",
        "-d",
        db.to_str().expect("utf-8 path"),
        "render",
        "-f",
        "chat.json",
    ])
    .expect("parse should succeed");

    config.validate().expect("validate should succeed");
    assert!(!temp.path().join("nested").exists());
}
