// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Environment variable fallbacks for the global flags
//!
//! Each test touches a different variable so they can run concurrently.


use std::path::PathBuf;

use clap::Parser;
use retrace::config::Config;
use similar_asserts::assert_eq;
use test_utils::{EnvGuard, TempTestDir};

#[test]
fn test_database_from_env_and_flag_override() {
    let _guard = EnvGuard::set("RETRACE_DATABASE", "/from/env/retrace.db");

    let config = Config::try_parse_from(["retrace"]).expect("parse should succeed");
    assert_eq!(config.database_path(), PathBuf::from("/from/env/retrace.db"));

    let config = Config::try_parse_from(["retrace", "-d", "/from/flag.db"])
        .expect("parse should succeed");
    assert_eq!(config.database_path(), PathBuf::from("/from/flag.db"));
}

#[test]
fn test_workspace_from_env() {
    let temp = TempTestDir::new("ws_env");
    let _guard = EnvGuard::set("RETRACE_WORKSPACE", temp.path_str());

    let config = Config::try_parse_from(["retrace"]).expect("parse should succeed");
    assert_eq!(config.seed_root(), Some(temp.path()));
    config.validate().expect("existing workspace should validate");
}
