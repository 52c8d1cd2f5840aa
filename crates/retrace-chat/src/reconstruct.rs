// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Transcript reconstruction
//!
//! A [`SessionContext`] carries everything one session needs: the seed
//! source for file baselines, the model lookup, and the [`FileHistory`] that
//! edit invocations grow. It is passed explicitly into every step, so two
//! sessions never share state.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::time::Duration;

use chrono::{DateTime, Utc};
use retrace_edits::{Base, FileHistory, SeedSource, TextEdit};
use tracing::{debug, info};

use crate::classifier::{Diagnostic, RecordStream};
use crate::record::{EditInvocation, EditTool, Record};
use crate::session::{SessionDocument, SessionRequest};

/// Resolves the model that produced a response
pub trait ModelLookup {
    /// Model name for `response_id`, if known
    fn model_for(&self, response_id: &str) -> Option<String>;
}

/// A lookup that knows no models
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModels;

impl ModelLookup for NoModels {
    fn model_for(&self, _response_id: &str) -> Option<String> {
        None
    }
}

impl<S: BuildHasher> ModelLookup for HashMap<String, String, S> {
    fn model_for(&self, response_id: &str) -> Option<String> {
        self.get(response_id).cloned()
    }
}

/// Per-session state threaded through reconstruction
pub struct SessionContext<'a> {
    seeds: &'a dyn SeedSource,
    models: &'a dyn ModelLookup,
    history: FileHistory,
}

impl<'a> SessionContext<'a> {
    /// A context with an empty file history
    #[must_use]
    pub fn new(seeds: &'a dyn SeedSource, models: &'a dyn ModelLookup) -> Self {
        Self {
            seeds,
            models,
            history: FileHistory::new(),
        }
    }

    /// File versions recorded so far
    #[must_use]
    pub fn history(&self) -> &FileHistory {
        &self.history
    }

    /// Finish the session and keep its file versions
    #[must_use]
    pub fn into_history(self) -> FileHistory {
        self.history
    }

    /// Model name for a response
    #[must_use]
    pub fn model_for(&self, response_id: &str) -> Option<String> {
        self.models.model_for(response_id)
    }

    /// Record one snapshot per edited path and store the revisions on
    /// `invocation`
    ///
    /// - replace-string: groups for a path accumulate on a copy of its latest
    ///   version
    /// - insert-edit: each group rewrites the file from an empty buffer, so
    ///   the last group for a path wins
    /// - create-file: groups accumulate on an empty buffer over an empty
    ///   baseline
    pub fn apply_invocation(&mut self, invocation: &mut EditInvocation) {
        let tool = invocation.tool;
        let mut revisions = Vec::new();

        for path in invocation.paths() {
            let groups = invocation.groups.iter().filter(|g| g.path() == path);
            let (base, batches): (Base, Vec<Vec<TextEdit>>) = match tool {
                EditTool::ReplaceString => {
                    self.history.seed(path, self.seeds);
                    (Base::Latest, groups.flat_map(|g| g.edits.clone()).collect())
                }
                EditTool::InsertEdit => {
                    self.history.seed(path, self.seeds);
                    let last = groups.last().map(|g| g.edits.clone());
                    (Base::Empty, last.unwrap_or_default())
                }
                EditTool::CreateFile => {
                    self.history.seed_created(path);
                    (Base::Empty, groups.flat_map(|g| g.edits.clone()).collect())
                }
            };

            let (revision, applied) =
                self.history
                    .derive(path, base, &batches, tool.style(), tool.tool_id().as_str());
            debug!(
                path = %path,
                tool = tool.label(),
                snapshot = revision.after,
                edits = applied.len(),
                corrected = applied.iter().filter(|a| a.was_corrected()).count(),
                "Recorded file version"
            );
            revisions.push(revision);
        }

        invocation.revisions = revisions;
    }
}

/// One request and its reconstructed response
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Request identifier
    pub request_id: Option<String>,
    /// What the user asked
    pub message: String,
    /// Model that answered
    pub model: Option<String>,
    /// Response time
    pub elapsed: Option<Duration>,
    /// When the request was sent
    pub timestamp: Option<DateTime<Utc>>,
    /// Structured response records, in event order
    pub records: Vec<Record>,
    /// Problems recovered while classifying the response
    pub diagnostics: Vec<Diagnostic>,
}

impl Turn {
    /// Edit invocations of this turn
    pub fn edits(&self) -> impl Iterator<Item = &EditInvocation> {
        self.records.iter().filter_map(|record| match record {
            Record::Edit(invocation) => Some(invocation),
            _ => None,
        })
    }

    fn reconstruct(request: &SessionRequest, context: &mut SessionContext<'_>) -> Self {
        let mut stream = RecordStream::new(&request.response);
        let mut records = Vec::new();
        for mut record in stream.by_ref() {
            if let Record::Edit(invocation) = &mut record {
                context.apply_invocation(invocation);
            }
            records.push(record);
        }

        let model = request
            .response_id()
            .and_then(|id| context.model_for(id))
            .or_else(|| request.model_id.clone());

        Self {
            request_id: request.request_id.clone(),
            message: request.message.text.clone(),
            model,
            elapsed: request.elapsed(),
            timestamp: request.created_at(),
            records,
            diagnostics: stream.take_diagnostics(),
        }
    }
}

/// A reconstructed session
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Display name of the user
    pub requester: String,
    /// Display name of the assistant
    pub responder: String,
    /// Turns in order
    pub turns: Vec<Turn>,
}

impl Transcript {
    /// Classify every response and replay its edits into `context`
    pub fn reconstruct(document: &SessionDocument, context: &mut SessionContext<'_>) -> Self {
        let turns: Vec<Turn> = document
            .requests
            .iter()
            .map(|request| Turn::reconstruct(request, context))
            .collect();

        let transcript = Self {
            requester: document.requester_username.clone(),
            responder: document.responder_username.clone(),
            turns,
        };
        info!(
            turns = transcript.turns.len(),
            files = context.history().len(),
            diagnostics = transcript.diagnostics().count(),
            "Reconstructed session"
        );
        transcript
    }

    /// Every diagnostic of every turn
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.turns.iter().flat_map(|turn| turn.diagnostics.iter())
    }

    /// Number of edit invocations in the session
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.turns.iter().map(|turn| turn.edits().count()).sum()
    }
}

/// Reconstruct a session with a fresh context
///
/// Returns the transcript together with the finalized file history.
pub fn reconstruct_session(
    document: &SessionDocument,
    seeds: &dyn SeedSource,
    models: &dyn ModelLookup,
) -> (Transcript, FileHistory) {
    let mut context = SessionContext::new(seeds, models);
    let transcript = Transcript::reconstruct(document, &mut context);
    (transcript, context.into_history())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::parse_session_json;
    use retrace_edits::{DocumentUri, EditRange, MemorySeed, NoSeed, SnapshotOrigin, TextEditGroup};
    use serde_json::json;
    use similar_asserts::assert_eq;

    fn group(path: &str, range: EditRange, text: &str) -> TextEditGroup {
        TextEditGroup {
            uri: DocumentUri {
                path: path.to_string(),
            },
            edits: vec![vec![TextEdit::new(range, text)]],
        }
    }

    fn invocation(tool: EditTool, groups: Vec<TextEditGroup>) -> EditInvocation {
        let mut invocation = EditInvocation::new(tool);
        invocation.groups = groups;
        invocation
    }

    fn lines(history: &FileHistory, path: &str) -> Vec<String> {
        history
            .chain(path)
            .expect("chain")
            .latest()
            .buffer()
            .lines()
            .to_vec()
    }

    #[test]
    fn test_replace_string_accumulates_groups_on_one_snapshot() {
        let seeds = MemorySeed::new().with_file("/f.rs", "foo\nbar");
        let mut context = SessionContext::new(&seeds, &NoModels);
        let mut call = invocation(
            EditTool::ReplaceString,
            vec![
                group("/f.rs", EditRange::new(1, 1, 1, 4), "one"),
                group("/f.rs", EditRange::new(2, 1, 2, 4), "two"),
            ],
        );
        context.apply_invocation(&mut call);

        let history = context.into_history();
        let chain = history.chain("/f.rs").expect("chain");
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.latest().buffer().lines(), ["one", "two"]);
        assert_eq!(call.revisions.len(), 1);
        assert_eq!(call.revisions[0].before, 0);
        assert_eq!(call.revisions[0].after, 1);
    }

    #[test]
    fn test_replace_string_continues_from_latest_version() {
        let seeds = MemorySeed::new().with_file("/f.rs", "a\nb");
        let mut context = SessionContext::new(&seeds, &NoModels);
        for (line, text) in [(1, "x"), (2, "y")] {
            let mut call = invocation(
                EditTool::ReplaceString,
                vec![group("/f.rs", EditRange::new(line, 1, line, 2), text)],
            );
            context.apply_invocation(&mut call);
        }
        let history = context.into_history();
        assert_eq!(history.chain("/f.rs").expect("chain").len(), 3);
        assert_eq!(lines(&history, "/f.rs"), ["x", "y"]);
    }

    #[test]
    fn test_insert_edit_last_group_wins() {
        let mut context = SessionContext::new(&NoSeed, &NoModels);
        let mut call = invocation(
            EditTool::InsertEdit,
            vec![
                group("/a.txt", EditRange::point(1, 1), "first draft"),
                group("/a.txt", EditRange::point(1, 1), "final"),
            ],
        );
        context.apply_invocation(&mut call);
        let history = context.into_history();
        assert_eq!(history.chain("/a.txt").expect("chain").len(), 2);
        assert_eq!(lines(&history, "/a.txt"), ["final"]);
    }

    #[test]
    fn test_insert_edit_into_created_file() {
        let mut context = SessionContext::new(&NoSeed, &NoModels);
        let mut call = invocation(
            EditTool::InsertEdit,
            vec![group("/a.txt", EditRange::new(1, 1, 1, 1), "hello")],
        );
        context.apply_invocation(&mut call);
        let history = context.into_history();
        let chain = history.chain("/a.txt").expect("chain");
        assert_eq!(chain.latest().buffer().lines(), ["hello"]);

        let diff = chain.squashed_diff();
        assert_eq!(diff.insertions, 1);
        assert_eq!(diff.deletions, 0);
        assert!(diff.lines().any(|l| l == "+hello"));
    }

    #[test]
    fn test_create_file_seeds_empty_baseline() {
        let seeds = MemorySeed::new().with_file("/new.rs", "stale content");
        let mut context = SessionContext::new(&seeds, &NoModels);
        let mut call = invocation(
            EditTool::CreateFile,
            vec![group("/new.rs", EditRange::point(1, 1), "fn main() {}")],
        );
        context.apply_invocation(&mut call);
        let history = context.into_history();
        let chain = history.chain("/new.rs").expect("chain");
        assert_eq!(chain.baseline().origin(), &SnapshotOrigin::Created);
        assert!(chain.baseline().buffer().is_empty());
        assert_eq!(chain.latest().buffer().lines(), ["fn main() {}"]);
    }

    #[test]
    fn test_one_revision_per_path() {
        let mut context = SessionContext::new(&NoSeed, &NoModels);
        let mut call = invocation(
            EditTool::ReplaceString,
            vec![
                group("/b", EditRange::point(1, 1), "b"),
                group("/a", EditRange::point(1, 1), "a"),
                group("/b", EditRange::point(2, 1), "b2"),
            ],
        );
        context.apply_invocation(&mut call);
        let paths: Vec<&str> = call.revisions.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["/b", "/a"]);
        assert_eq!(context.history().len(), 2);
    }

    #[test]
    fn test_model_lookup_falls_back_to_model_id() {
        let doc = parse_session_json(
            &json!({
                "requesterUsername": "alice",
                "responderUsername": "Copilot",
                "requests": [
                    {
                        "message": {"text": "one"},
                        "response": [],
                        "result": {"metadata": {"responseId": "r1"}},
                        "modelId": "editor-model"
                    },
                    {
                        "message": {"text": "two"},
                        "response": [],
                        "result": {"metadata": {"responseId": "r2"}},
                        "modelId": "editor-model"
                    }
                ]
            })
            .to_string(),
        )
        .expect("parse");
        let models: HashMap<String, String> =
            HashMap::from([("r1".to_string(), "gpt-4.1".to_string())]);
        let (transcript, _) = reconstruct_session(&doc, &NoSeed, &models);
        assert_eq!(transcript.turns[0].model.as_deref(), Some("gpt-4.1"));
        assert_eq!(transcript.turns[1].model.as_deref(), Some("editor-model"));
    }

    #[test]
    fn test_transcript_replays_edits_in_order() {
        let doc = parse_session_json(
            &json!({
                "requesterUsername": "alice",
                "responderUsername": "Copilot",
                "requests": [{
                    "requestId": "q1",
                    "message": {"text": "rename bar"},
                    "response": [
                        {"value": "Renaming."},
                        {"kind": "toolInvocationSerialized", "toolId": "copilot_replaceString"},
                        {"value": "\n```\n"},
                        {"kind": "undoStop"},
                        {"kind": "codeblockUri", "uri": {"path": "/f.rs"}},
                        {
                            "kind": "textEditGroup",
                            "uri": {"path": "/f.rs"},
                            "edits": [[{
                                "text": "baz\nqux",
                                "range": {"startLineNumber": 2, "startColumn": 1, "endLineNumber": 2, "endColumn": 4}
                            }]]
                        },
                        {"value": "\n```\n"},
                        {"kind": "mysteryKind"}
                    ]
                }]
            })
            .to_string(),
        )
        .expect("parse");

        let seeds = MemorySeed::new().with_file("/f.rs", "foo\nbar");
        let (transcript, history) = reconstruct_session(&doc, &seeds, &NoModels);

        assert_eq!(transcript.requester, "alice");
        assert_eq!(transcript.edit_count(), 1);
        let turn = &transcript.turns[0];
        assert_eq!(turn.request_id.as_deref(), Some("q1"));
        assert_eq!(turn.records.len(), 2);
        assert_eq!(turn.diagnostics.len(), 1);
        let edit = turn.edits().next().expect("edit");
        assert_eq!(edit.revisions.len(), 1);
        assert_eq!(lines(&history, "/f.rs"), ["foo", "baz", "qux"]);
    }
}
