//! retrace: replay chat-assistant session exports
//!
//! This binary loads a session export (from a file or the SQLite document
//! store), replays its file edits and prints a Markdown transcript or a
//! per-file diff summary.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use retrace::config::{Command, Config, SessionSource};
use retrace::render::{MarkdownRenderer, PathFormatter, render_summary};
use retrace::store::{DocumentStore, SessionStore, Table};
use retrace_chat::{ModelLookup, NoModels, Transcript, parse_session_file, reconstruct_session};
use retrace_edits::{DiffMode, FileHistory, FsSeed, NoSeed, SeedSource};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// A replayed session
struct Replay {
    transcript: Transcript,
    history: FileHistory,
    key: Option<String>,
}

fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to stderr so rendered output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log_level().into()))
        .init();

    config.validate()?;

    let Some(command) = &config.command else {
        Config::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Render {
            source,
            output,
            squash,
        } => cmd_render(&config, source, output.as_deref(), *squash),
        Command::Summary {
            source,
            diff_mode,
            json,
        } => cmd_summary(&config, source, (*diff_mode).into(), *json),
        Command::Import { file, key } => cmd_import(&config, file, key.as_deref()),
        Command::Model { response_id, model } => cmd_model(&config, response_id, model),
    }
}

fn cmd_render(
    config: &Config,
    source: &SessionSource,
    output: Option<&Path>,
    squash: bool,
) -> Result<()> {
    let replay = replay(config, source)?;
    let paths = PathFormatter::new(config.strip_roots.iter().cloned());

    let mut renderer = MarkdownRenderer::new(&replay.history, &paths).with_squash(squash);
    if let Some(key) = &replay.key {
        renderer = renderer.with_document_id(key.as_str());
    }
    let markdown = renderer.render(&replay.transcript);

    match output {
        Some(path) => {
            fs::write(path, markdown)
                .with_context(|| format!("writing transcript to {}", path.display()))?;
            info!(path = %path.display(), "Wrote transcript");
        }
        None => std::io::stdout().lock().write_all(markdown.as_bytes())?,
    }
    Ok(())
}

fn cmd_summary(config: &Config, source: &SessionSource, mode: DiffMode, json: bool) -> Result<()> {
    let replay = replay(config, source)?;
    let diffs = replay.history.summary(mode);
    debug!(files = diffs.len(), ?mode, "Computed summary");

    let text = if json {
        let mut text = serde_json::to_string_pretty(&diffs)?;
        text.push('\n');
        text
    } else {
        let paths = PathFormatter::new(config.strip_roots.iter().cloned());
        render_summary(&diffs, &paths)
    };
    std::io::stdout().lock().write_all(text.as_bytes())?;
    Ok(())
}

fn cmd_import(config: &Config, file: &Path, key: Option<&str>) -> Result<()> {
    let key = match key {
        Some(key) => key.to_string(),
        None => match file.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => stem.to_string(),
            None => bail!("Cannot derive a key from {}; pass --key", file.display()),
        },
    };
    let json = fs::read_to_string(file)
        .with_context(|| format!("reading session export {}", file.display()))?;

    let store = open_store(config)?;
    let document = store.put_session(&key, &json)?;
    info!(sessions = store.count(Table::ChatLogs)?, "Document store updated");
    println!("Imported {key} ({} turns)", document.request_count());
    Ok(())
}

fn cmd_model(config: &Config, response_id: &str, model: &str) -> Result<()> {
    let store = open_store(config)?;
    store.put_model(response_id, model)?;
    println!("{response_id} -> {model}");
    Ok(())
}

fn open_store(config: &Config) -> Result<SessionStore> {
    let path = config.database_path();
    let store = SessionStore::open(&path)
        .with_context(|| format!("opening document store {}", path.display()))?;
    store.initialize()?;
    Ok(store)
}

fn seed_source(config: &Config) -> Box<dyn SeedSource> {
    if config.no_seed {
        Box::new(NoSeed)
    } else if let Some(root) = config.seed_root() {
        Box::new(FsSeed::rooted(root))
    } else {
        Box::new(FsSeed::new())
    }
}

fn replay(config: &Config, source: &SessionSource) -> Result<Replay> {
    // Model names come from the store whenever one exists; a file replay
    // never writes to it
    let store = if source.key.is_some() {
        Some(open_store(config)?)
    } else {
        SessionStore::for_model_lookup(&config.database_path())
    };

    let document = match (&source.file, &source.key, &store) {
        (Some(file), _, _) => parse_session_file(file)
            .with_context(|| format!("loading session export {}", file.display()))?,
        (None, Some(key), Some(store)) => store.fetch_session(key)?,
        _ => bail!("Either --file or --key is required"),
    };

    let models: &dyn ModelLookup = match &store {
        Some(store) => store,
        None => &NoModels,
    };
    let seeds = seed_source(config);
    let (transcript, history) = reconstruct_session(&document, &*seeds, models);
    info!(
        turns = transcript.turns.len(),
        edits = transcript.edit_count(),
        diagnostics = transcript.diagnostics().count(),
        "Replayed session"
    );

    Ok(Replay {
        transcript,
        history,
        key: source.key.clone(),
    })
}
