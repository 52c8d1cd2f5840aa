// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Markdown rendering of reconstructed transcripts
//!
//! Each turn renders as two `<blockquote>` blocks, one for the requester and
//! one for the responder. Edits render as "Edited `path`" followed by a
//! collapsible unified diff.

use std::path::{Path, PathBuf};
use std::time::Duration;

use retrace_chat::{
    Chunk, EditInvocation, Record, ReferenceKind, TextRun, ToolMessage, Transcript, Turn,
};
use retrace_edits::{DiffMode, FileDiff, FileHistory};
use tracing::warn;

// ============================================================================
// Paths and Durations
// ============================================================================

/// Shortens absolute paths for display
///
/// The longest configured root that prefixes a path is stripped from it.
/// Paths under no root, or equal to one, are shown unchanged.
#[derive(Debug, Clone, Default)]
pub struct PathFormatter {
    roots: Vec<PathBuf>,
}

impl PathFormatter {
    /// A formatter stripping any of `roots`
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        let mut roots: Vec<PathBuf> = roots.into_iter().map(Into::into).collect();
        roots.sort_by_key(|root| std::cmp::Reverse(root.components().count()));
        Self { roots }
    }

    /// Display form of `path`
    #[must_use]
    pub fn format(&self, path: &str) -> String {
        let full = Path::new(path);
        self.roots
            .iter()
            .filter_map(|root| full.strip_prefix(root).ok())
            .find(|relative| !relative.as_os_str().is_empty())
            .map_or_else(|| path.to_string(), |relative| relative.display().to_string())
    }
}

/// Format a response time as `1 min, 2.500 s`
///
/// The minutes part is omitted under one minute.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.as_secs() / 60;
    let seconds = duration
        .saturating_sub(Duration::from_secs(minutes * 60))
        .as_secs_f64();
    if minutes > 0 {
        format!("{minutes} min, {seconds:.3} s")
    } else {
        format!("{seconds:.3} s")
    }
}

// ============================================================================
// Markdown Writer
// ============================================================================

/// Line-oriented Markdown builder
#[derive(Debug, Default)]
struct Markdown {
    lines: Vec<String>,
}

impl Markdown {
    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    fn blank(&mut self) {
        self.lines.push(String::new());
    }

    fn paragraph(&mut self, text: impl Into<String>) {
        self.line(text);
        self.blank();
    }

    fn blockquote(&mut self, body: impl FnOnce(&mut Self)) {
        self.line("<blockquote>");
        self.blank();
        body(self);
        self.line("</blockquote>");
        self.blank();
    }

    fn details(&mut self, summary: Option<&str>, body: impl FnOnce(&mut Self)) {
        self.line("<details>");
        if let Some(summary) = summary {
            self.line(format!("<summary>{summary}</summary>"));
        }
        self.blank();
        body(self);
        self.line("</details>");
        self.blank();
    }

    /// Fenced code block; the fence outgrows any backtick run in the body
    fn code_block<'l>(&mut self, language: &str, lines: impl IntoIterator<Item = &'l str>) {
        let lines: Vec<&str> = lines.into_iter().collect();
        let longest_run = lines
            .iter()
            .map(|line| longest_backtick_run(line))
            .max()
            .unwrap_or(0);
        let fence = "`".repeat(longest_run.max(2) + 1);

        self.line(format!("{fence}{language}"));
        for line in lines {
            self.line(line);
        }
        self.line(fence);
        self.blank();
    }

    fn finish(self) -> String {
        let mut out = String::new();
        for line in self.lines {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

fn longest_backtick_run(line: &str) -> usize {
    line.split(|c: char| c != '`').map(str::len).max().unwrap_or(0)
}

/// Collapsible list of search results
fn listing(md: &mut Markdown, lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let summary = match lines.len() {
        1 => "1 result".to_string(),
        n => format!("{n} results"),
    };
    md.details(Some(&summary), |md| md.paragraph(lines.join("  \n")));
}

// ============================================================================
// Transcript Rendering
// ============================================================================

/// Renders a [`Transcript`] against the history it produced
pub struct MarkdownRenderer<'a> {
    history: &'a FileHistory,
    paths: &'a PathFormatter,
    document_id: Option<String>,
    squash: bool,
}

impl<'a> MarkdownRenderer<'a> {
    /// A renderer without header or squashed summary
    #[must_use]
    pub fn new(history: &'a FileHistory, paths: &'a PathFormatter) -> Self {
        Self {
            history,
            paths,
            document_id: None,
            squash: false,
        }
    }

    /// Open with a `Document ID` line naming the stored session
    #[must_use]
    pub fn with_document_id(mut self, key: impl Into<String>) -> Self {
        self.document_id = Some(key.into());
        self
    }

    /// Append the squashed per-file diffs after the last turn
    #[must_use]
    pub fn with_squash(mut self, squash: bool) -> Self {
        self.squash = squash;
        self
    }

    /// Render the whole transcript
    #[must_use]
    pub fn render(&self, transcript: &Transcript) -> String {
        let mut md = Markdown::default();
        if let Some(key) = &self.document_id {
            md.paragraph(format!("Document ID: `chat-logs/{key}`"));
        }
        for turn in &transcript.turns {
            self.turn(&mut md, transcript, turn);
        }
        if self.squash {
            self.squashed(&mut md);
        }
        md.finish()
    }

    fn turn(&self, md: &mut Markdown, transcript: &Transcript, turn: &Turn) {
        md.blockquote(|md| {
            md.line(format!("#### {}:", transcript.requester));
            md.paragraph(turn.message.as_str());
        });

        md.blockquote(|md| {
            match &turn.model {
                Some(model) => md.paragraph(format!("#### {} ({model}):", transcript.responder)),
                None => md.paragraph(format!("#### {}:", transcript.responder)),
            }
            for record in &turn.records {
                self.record(md, record);
            }
            if let Some(elapsed) = turn.elapsed {
                md.paragraph(format!("`({})`", format_duration(elapsed)));
            }
        });
    }

    fn record(&self, md: &mut Markdown, record: &Record) {
        match record {
            Record::Text(run) => {
                let text = self.text_run(run);
                if !text.trim().is_empty() {
                    md.paragraph(text);
                }
            }
            Record::Confirmation(confirmation) => md.blockquote(|md| {
                if !confirmation.title.is_empty() {
                    md.paragraph(format!("**{}**", confirmation.title));
                }
                md.paragraph(confirmation.message.as_str());
            }),
            Record::Progress(notice) => {
                if !notice.message.trim().is_empty() {
                    md.paragraph(format!("_{}_", notice.message.trim()));
                }
            }
            Record::ReadFile(message) | Record::GetErrors(message) | Record::ListDirectory(message) => {
                md.blockquote(|md| md.paragraph(self.tool_message(message)));
            }
            Record::FindTextInFiles(results) => {
                md.blockquote(|md| md.paragraph(self.tool_message(&results.message)));
                let lines: Vec<String> = results
                    .matches
                    .iter()
                    .map(|location| format!("`{}:{}`", self.paths.format(location.path()), location.range))
                    .collect();
                listing(md, &lines);
            }
            Record::FindFiles(files) => {
                md.blockquote(|md| md.paragraph(self.tool_message(&files.message)));
                let lines: Vec<String> = files
                    .paths
                    .iter()
                    .map(|path| format!("`{}`", self.paths.format(path)))
                    .collect();
                listing(md, &lines);
            }
            Record::RunInTerminal(command) => {
                md.blockquote(|md| md.paragraph(self.tool_message(&command.message)));
                if let Some(line) = &command.command {
                    md.code_block(command.language.as_deref().unwrap_or("sh"), line.lines());
                }
            }
            Record::Edit(invocation) => self.edit(md, invocation),
        }
    }

    fn edit(&self, md: &mut Markdown, invocation: &EditInvocation) {
        for revision in &invocation.revisions {
            let path = self.paths.format(&revision.path);
            match self
                .history
                .diff_versions(&revision.path, revision.before, revision.after)
            {
                Ok(diff) if diff.is_empty() => {
                    md.paragraph(format!("Edited `{path}` (no changes)"));
                }
                Ok(diff) => {
                    md.paragraph(format!(
                        "Edited `{path}` (+{} -{})",
                        diff.insertions, diff.deletions
                    ));
                    md.details(None, |md| md.code_block("diff", diff.lines()));
                }
                Err(e) => {
                    warn!(path = %revision.path, error = %e, "Revision missing from file history");
                    md.paragraph(format!("Edited `{path}`"));
                }
            }
        }
        if !invocation.complete {
            md.paragraph(format!("_{} ended early_", invocation.tool.label()));
        }
    }

    fn squashed(&self, md: &mut Markdown) {
        let diffs = self.history.summary(DiffMode::Squashed);
        if diffs.is_empty() {
            return;
        }
        md.paragraph("## Summary");
        for diff in &diffs {
            md.paragraph(format!(
                "#### `{}` (+{} -{})",
                self.paths.format(&diff.path),
                diff.insertions,
                diff.deletions
            ));
            md.code_block("diff", diff.lines());
        }
    }

    fn text_run(&self, run: &TextRun) -> String {
        run.chunks()
            .iter()
            .map(|chunk| match chunk {
                Chunk::Text(text) => text.clone(),
                Chunk::Reference(reference) => match reference.kind {
                    ReferenceKind::Path => format!("`{}`", self.paths.format(&reference.text)),
                    ReferenceKind::Symbol => format!("`{}`", reference.text),
                    ReferenceKind::Unresolved => String::new(),
                },
            })
            .collect()
    }

    fn tool_message(&self, message: &ToolMessage) -> String {
        message.resolved_with(|path| self.paths.format(path))
    }
}

/// Plain-text summary: one header line per diff followed by its hunks
#[must_use]
pub fn render_summary(diffs: &[FileDiff], paths: &PathFormatter) -> String {
    let mut out = String::new();
    for diff in diffs {
        out.push_str(&format!(
            "{} (+{} -{})\n",
            paths.format(&diff.path),
            diff.insertions,
            diff.deletions
        ));
        out.push_str(&diff.unified);
        if !diff.unified.is_empty() && !diff.unified.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrace_chat::{NoModels, parse_session_json, reconstruct_session};
    use retrace_edits::MemorySeed;
    use similar_asserts::assert_eq;

    #[test]
    fn test_format_duration_under_a_minute() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.500 s");
    }

    #[test]
    fn test_format_duration_with_minutes() {
        assert_eq!(format_duration(Duration::from_millis(62_500)), "1 min, 2.500 s");
    }

    #[test]
    fn test_path_formatter_longest_root_wins() {
        let paths = PathFormatter::new(["/work", "/work/demo"]);
        assert_eq!(paths.format("/work/demo/src/main.rs"), "src/main.rs");
        assert_eq!(paths.format("/work/other/a.rs"), "other/a.rs");
    }

    #[test]
    fn test_path_formatter_leaves_unmatched_paths() {
        let paths = PathFormatter::new(["/work/demo"]);
        assert_eq!(paths.format("/work/demonstration/a.rs"), "/work/demonstration/a.rs");
        assert_eq!(paths.format("/work/demo"), "/work/demo");
        assert_eq!(PathFormatter::default().format("/a/b"), "/a/b");
    }

    #[test]
    fn test_code_block_fence_outgrows_content() {
        let mut md = Markdown::default();
        md.code_block("md", ["```rust", "fn f() {}", "```"]);
        let out = md.finish();
        assert!(out.starts_with("````md\n"));
        assert!(out.ends_with("````\n\n"));
    }

    #[test]
    fn test_blockquote_layout() {
        let mut md = Markdown::default();
        md.blockquote(|md| md.paragraph("hi"));
        assert_eq!(md.finish(), "<blockquote>\n\nhi\n\n</blockquote>\n\n");
    }

    #[test]
    fn test_render_turn_with_edit() {
        let json = r#"{
            "requesterUsername": "alice",
            "responderUsername": "Assistant",
            "requests": [{
                "message": {"text": "Rename it"},
                "response": [
                    {"value": "On it."},
                    {"kind": "toolInvocationSerialized", "toolId": "copilot_replaceString"},
                    {"value": "\n```\n"},
                    {"kind": "undoStop"},
                    {"kind": "codeblockUri", "uri": {"path": "/w/a.txt"}},
                    {"kind": "textEditGroup", "uri": {"path": "/w/a.txt"}, "edits": [[
                        {"range": {"startLineNumber": 1, "startColumn": 1, "endLineNumber": 1, "endColumn": 4}, "text": "new"}
                    ]]},
                    {"value": "\n```\n"}
                ],
                "result": {"timings": {"totalElapsed": 1500}},
                "modelId": "test-model"
            }]
        }"#;
        let document = parse_session_json(json).expect("parse");
        let seeds = MemorySeed::new().with_file("/w/a.txt", "old\n");
        let (transcript, history) = reconstruct_session(&document, &seeds, &NoModels);
        let paths = PathFormatter::new(["/w"]);

        let out = MarkdownRenderer::new(&history, &paths)
            .with_document_id("abc")
            .render(&transcript);

        assert!(out.starts_with("Document ID: `chat-logs/abc`\n\n<blockquote>\n\n#### alice:\nRename it\n"));
        assert!(out.contains("#### Assistant (test-model):"));
        assert!(out.contains("On it.\n"));
        assert!(out.contains("Edited `a.txt` (+1 -1)"));
        assert!(out.contains("-old\n+new\n"));
        assert!(out.contains("`(1.500 s)`"));
    }

    #[test]
    fn test_render_summary_lists_counts() {
        let diff = FileDiff {
            path: "/w/a.txt".to_string(),
            insertions: 1,
            deletions: 0,
            unified: "--- before\n+++ after\n@@ -0,0 +1 @@\n+x\n".to_string(),
        };
        let out = render_summary(&[diff], &PathFormatter::new(["/w"]));
        assert_eq!(out, "a.txt (+1 -0)\n--- before\n+++ after\n@@ -0,0 +1 @@\n+x\n");
    }
}
