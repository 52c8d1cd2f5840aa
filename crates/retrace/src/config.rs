//! Configuration for the retrace command line
//!
//! This module provides the clap-derived [`Config`], including the document
//! store location, the workspace used to seed file baselines, display path
//! prefixes, and logging options.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use retrace_edits::DiffMode;

/// Retrace - replay chat-assistant sessions into transcripts and diffs
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "retrace")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run (prints help when omitted)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to the SQLite document store
    ///
    /// If the file doesn't exist, it will be created and initialized.
    /// Defaults to retrace/retrace.db under the platform data directory.
    #[arg(short, long, env = "RETRACE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Directory that absolute paths in the session are re-rooted under
    ///
    /// Edited files are seeded from this directory instead of the live
    /// filesystem, for sessions recorded on another machine.
    #[arg(short, long, env = "RETRACE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Path prefix removed from displayed paths (repeatable)
    ///
    /// When several prefixes match, the longest one wins.
    #[arg(long = "strip-root", value_name = "DIR")]
    pub strip_roots: Vec<PathBuf>,

    /// Start every edited file from an empty baseline
    #[arg(long, default_value = "false")]
    pub no_seed: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Logs every recovered inconsistency in the session, including
    /// widened insertion spans. Logs are written to stderr.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

/// Where a session document is loaded from
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct SessionSource {
    /// Session export JSON file
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Key of a session previously imported into the document store
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Diff selection for the summary subcommand
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiffModeArg {
    /// First snapshot against the final snapshot of each file
    #[default]
    Squashed,
    /// Every consecutive pair of snapshots
    Pairwise,
}

impl From<DiffModeArg> for DiffMode {
    fn from(arg: DiffModeArg) -> Self {
        match arg {
            DiffModeArg::Squashed => DiffMode::Squashed,
            DiffModeArg::Pairwise => DiffMode::Pairwise,
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a session as a Markdown transcript
    ///
    /// Example:
    ///   retrace --strip-root /home/me/project render --file session.json
    Render {
        #[command(flatten)]
        source: SessionSource,

        /// Write the transcript here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Append the squashed per-file diffs after the transcript
        #[arg(long, default_value = "false")]
        squash: bool,
    },

    /// Print per-file diffs with insertion and deletion counts
    Summary {
        #[command(flatten)]
        source: SessionSource,

        /// Which snapshot pairs to diff
        #[arg(long, value_enum, default_value_t = DiffModeArg::Squashed)]
        diff_mode: DiffModeArg,

        /// Print the diffs as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Store a session export under a key
    Import {
        /// Session export JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Key to store the session under (defaults to the file stem)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Record which model produced a response
    Model {
        /// Response identifier from the session's result metadata
        #[arg(long)]
        response_id: String,

        /// Model name to display for the response
        #[arg(long)]
        model: String,
    },
}

impl Command {
    /// Whether running this command needs the document store
    #[must_use]
    pub fn uses_database(&self) -> bool {
        match self {
            Self::Render { source, .. } | Self::Summary { source, .. } => source.key.is_some(),
            Self::Import { .. } | Self::Model { .. } => true,
        }
    }
}

impl Config {
    /// Get the database path, using a default if not specified
    ///
    /// Default location is platform-specific:
    /// - macOS: ~/Library/Application Support/retrace/retrace.db
    /// - Linux: ~/.local/share/retrace/retrace.db
    /// - Windows: %LOCALAPPDATA%\retrace\retrace.db
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("retrace")
                .join("retrace.db")
        })
    }

    /// Root that seed files are re-rooted under, if any
    #[must_use]
    pub fn seed_root(&self) -> Option<&Path> {
        self.workspace.as_deref()
    }

    /// Whether the configured command needs the document store
    #[must_use]
    pub fn uses_database(&self) -> bool {
        self.command.as_ref().is_some_and(Command::uses_database)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The workspace path is specified but doesn't exist or isn't a directory
    /// - The command uses the document store and its parent directory cannot
    ///   be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref workspace) = self.workspace {
            if !workspace.exists() {
                return Err(ConfigError::WorkspaceNotFound(workspace.clone()));
            }
            if !workspace.is_dir() {
                return Err(ConfigError::WorkspaceNotDirectory(workspace.clone()));
            }
        }

        if self.uses_database() {
            let db_path = self.database_path();
            if let Some(parent) = db_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::DatabaseDirectoryCreateFailed(parent.to_path_buf(), e)
                })?;
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Workspace path not found
    #[error("Workspace path not found: {0}")]
    WorkspaceNotFound(PathBuf),

    /// Workspace path is not a directory
    #[error("Workspace path is not a directory: {0}")]
    WorkspaceNotDirectory(PathBuf),

    /// Failed to create database directory
    #[error("Failed to create database directory {0}: {1}")]
    DatabaseDirectoryCreateFailed(PathBuf, std::io::Error),
}
