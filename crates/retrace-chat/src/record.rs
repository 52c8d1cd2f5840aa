// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Structured records assembled from response events

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use retrace_edits::{DocumentUri, EditRange, EditStyle, Revision, TextEditGroup};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::event::{Event, EventKind, ToolId};
use crate::matcher::Matcher;

/// `[](key)` links in tool messages, keyed into the message's `uris` map
static URI_LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\]\((?P<uri>[^)]*)\)").expect("Invalid regex pattern"));

/// One logical element of a response
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// A run of markdown text and inline references
    Text(TextRun),
    /// A confirmation prompt
    Confirmation(Confirmation),
    /// A progress notice
    Progress(ProgressNotice),
    /// A file read
    ReadFile(ToolMessage),
    /// A diagnostics fetch
    GetErrors(ToolMessage),
    /// A directory listing
    ListDirectory(ToolMessage),
    /// A text search with its matches
    FindTextInFiles(SearchResults),
    /// A file search with its matches
    FindFiles(FileMatches),
    /// A terminal command
    RunInTerminal(TerminalCommand),
    /// A file-editing tool call with its edit groups
    Edit(EditInvocation),
}

impl Record {
    /// Short name of the record type
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Confirmation(_) => "confirmation",
            Self::Progress(_) => "progress",
            Self::ReadFile(_) => "read-file",
            Self::GetErrors(_) => "get-errors",
            Self::ListDirectory(_) => "list-directory",
            Self::FindTextInFiles(_) => "find-text-in-files",
            Self::FindFiles(_) => "find-files",
            Self::RunInTerminal(_) => "run-in-terminal",
            Self::Edit(invocation) => invocation.tool.label(),
        }
    }
}

// ============================================================================
// Text Runs
// ============================================================================

/// What an inline reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// A file path
    Path,
    /// A code symbol
    Symbol,
    /// Neither a path nor a name was present
    Unresolved,
}

/// An inline file or symbol reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineReference {
    /// What the reference points at
    pub kind: ReferenceKind,
    /// The path or symbol name
    pub text: String,
}

impl InlineReference {
    /// Read the `inlineReference` payload of an event
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        let payload = event.field("inlineReference");
        let lookup = |key: &str| payload.and_then(|p| p.get(key)).and_then(Value::as_str);

        if let Some(path) = lookup("path") {
            Self {
                kind: ReferenceKind::Path,
                text: path.to_string(),
            }
        } else if let Some(name) = lookup("name") {
            Self {
                kind: ReferenceKind::Symbol,
                text: name.to_string(),
            }
        } else {
            debug!(event = %event.summary(), "Inline reference without path or name");
            Self {
                kind: ReferenceKind::Unresolved,
                text: String::new(),
            }
        }
    }
}

/// One piece of a text run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Markdown text
    Text(String),
    /// An inline reference
    Reference(InlineReference),
}

/// Consecutive text and inline-reference events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextRun {
    chunks: Vec<Chunk>,
}

impl TextRun {
    /// Build a run from chunks, repairing references that split inline code
    #[must_use]
    pub fn new(mut chunks: Vec<Chunk>) -> Self {
        repair_inline_code(&mut chunks);
        Self { chunks }
    }

    /// Build a run from text and inline-reference events
    ///
    /// Events of any other kind are ignored.
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Self {
        let chunks = events
            .into_iter()
            .filter_map(|event| {
                if event.is_inline_reference() {
                    Some(Chunk::Reference(InlineReference::from_event(event)))
                } else if event.is_plain_text() {
                    Some(Chunk::Text(event.text().unwrap_or_default().to_string()))
                } else {
                    None
                }
            })
            .collect();
        Self::new(chunks)
    }

    /// The chunks in order
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Whether the run has no chunks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenated text with references inlined verbatim
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.chunks
            .iter()
            .map(|chunk| match chunk {
                Chunk::Text(text) => text.as_str(),
                Chunk::Reference(reference) => reference.text.as_str(),
            })
            .collect()
    }
}

/// Fold a reference that sits inside an open inline-code span into the span
///
/// The assistant emits `` `foo/`[ref]`/bar` `` as text, reference, text. When
/// the preceding text has an unclosed backtick and the following text closes
/// it, the three chunks become text, code, text.
fn repair_inline_code(chunks: &mut [Chunk]) {
    for i in 1..chunks.len().saturating_sub(1) {
        let (head, tail) = chunks.split_at_mut(i);
        let (middle, tail) = tail.split_at_mut(1);
        let (Chunk::Text(before), Chunk::Reference(reference), Chunk::Text(after)) =
            (&mut head[i - 1], &middle[0], &mut tail[0])
        else {
            continue;
        };
        if before.matches('`').count() % 2 == 0 {
            continue;
        }
        let (Some(open), Some(close)) = (before.rfind('`'), after.find('`')) else {
            continue;
        };

        let code_head = before.split_off(open + 1);
        before.truncate(open);
        let code_tail: String = after.drain(..=close).collect();
        let code = format!("`{code_head}{}{code_tail}", reference.text);
        middle[0] = Chunk::Text(code);
    }
}

// ============================================================================
// Tool Messages
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageField {
    Plain(String),
    Markdown {
        #[serde(default)]
        value: String,
        #[serde(default)]
        uris: BTreeMap<String, DocumentUri>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolPayload {
    #[serde(default)]
    invocation_message: Option<MessageField>,
    #[serde(default)]
    past_tense_message: Option<MessageField>,
    #[serde(default)]
    result_details: Option<Value>,
    #[serde(default)]
    tool_specific_data: Option<Value>,
}

impl ToolPayload {
    fn message(&mut self) -> ToolMessage {
        match self
            .past_tense_message
            .take()
            .or_else(|| self.invocation_message.take())
        {
            Some(MessageField::Plain(message)) => ToolMessage::new(message),
            Some(MessageField::Markdown { value, uris }) => ToolMessage {
                message: value,
                uris: uris.into_iter().map(|(key, uri)| (key, uri.path)).collect(),
            },
            None => ToolMessage::default(),
        }
    }

    fn details<T: for<'de> Deserialize<'de>>(&self) -> Vec<T> {
        let Some(Value::Array(items)) = &self.result_details else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| match T::deserialize(item) {
                Ok(detail) => Some(detail),
                Err(e) => {
                    debug!(error = %e, "Skipping unreadable result detail");
                    None
                }
            })
            .collect()
    }
}

/// A past-tense tool message with its link targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolMessage {
    /// Markdown message, may contain `[](key)` links
    pub message: String,
    /// Link key to document path
    pub uris: BTreeMap<String, String>,
}

impl ToolMessage {
    /// A message without links
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            uris: BTreeMap::new(),
        }
    }

    /// The message with each `[](key)` link replaced by its path in backticks
    #[must_use]
    pub fn resolved(&self) -> String {
        self.resolved_with(|path| path.to_string())
    }

    /// Like [`ToolMessage::resolved`], passing each path through `format`
    ///
    /// Links whose key is not in `uris` are left as written.
    pub fn resolved_with(&self, format: impl Fn(&str) -> String) -> String {
        URI_LINK_PATTERN
            .replace_all(&self.message, |caps: &Captures<'_>| {
                match self.uris.get(&caps["uri"]) {
                    Some(path) => format!("`{}`", format(path)),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    pub(crate) fn from_event(event: &Event) -> Result<Self, serde_json::Error> {
        Ok(event.decode::<ToolPayload>()?.message())
    }
}

/// A position inside a document
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Location {
    /// Document containing the match
    pub uri: DocumentUri,
    /// Span of the match
    pub range: EditRange,
}

impl Location {
    /// Path of the document
    #[must_use]
    pub fn path(&self) -> &str {
        &self.uri.path
    }
}

/// Result of a text search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    /// What the tool reported
    pub message: ToolMessage,
    /// Every match location
    pub matches: Vec<Location>,
}

impl SearchResults {
    pub(crate) fn from_event(event: &Event) -> Result<Self, serde_json::Error> {
        let mut payload = event.decode::<ToolPayload>()?;
        Ok(Self {
            message: payload.message(),
            matches: payload.details(),
        })
    }
}

/// Result of a file search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileMatches {
    /// What the tool reported
    pub message: ToolMessage,
    /// Matching paths
    pub paths: Vec<String>,
}

impl FileMatches {
    pub(crate) fn from_event(event: &Event) -> Result<Self, serde_json::Error> {
        let mut payload = event.decode::<ToolPayload>()?;
        let paths = payload
            .details::<DocumentUri>()
            .into_iter()
            .map(|uri| uri.path)
            .collect();
        Ok(Self {
            message: payload.message(),
            paths,
        })
    }
}

/// A terminal command run by the assistant
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminalCommand {
    /// What the tool reported
    pub message: ToolMessage,
    /// The command line, when recorded
    pub command: Option<String>,
    /// Shell language of the command
    pub language: Option<String>,
}

impl TerminalCommand {
    pub(crate) fn from_event(event: &Event) -> Result<Self, serde_json::Error> {
        let mut payload = event.decode::<ToolPayload>()?;
        let data = payload.tool_specific_data.take().unwrap_or(Value::Null);
        let command = data
            .get("command")
            .or_else(|| data.pointer("/commandLine/original"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let language = data.get("language").and_then(Value::as_str).map(str::to_string);
        Ok(Self {
            message: payload.message(),
            command,
            language,
        })
    }
}

/// A confirmation prompt
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Confirmation {
    /// Prompt title
    pub title: String,
    /// Prompt body
    pub message: String,
}

impl Confirmation {
    pub(crate) fn from_event(event: &Event) -> Self {
        Self {
            title: text_field(event.field("title")),
            message: text_field(event.field("message")),
        }
    }
}

/// A progress notice
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressNotice {
    /// Notice text
    pub message: String,
}

impl ProgressNotice {
    pub(crate) fn from_event(event: &Event) -> Self {
        Self {
            message: text_field(event.field("content")),
        }
    }
}

/// A string field that may also be a `{value}` markdown object
fn text_field(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other
            .get("value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        None => String::new(),
    }
}

// ============================================================================
// Edit Invocations
// ============================================================================

const FOUR_TICK_FENCE: &str = "\n````\n";
const THREE_TICK_FENCE: &str = "\n```\n";

fn is_insert_edit_tool(event: &Event) -> bool {
    event.is_tool(ToolId::InsertEdit)
}

fn is_replace_string_tool(event: &Event) -> bool {
    event.is_tool(ToolId::ReplaceString)
}

fn is_create_file_tool(event: &Event) -> bool {
    event.is_tool(ToolId::CreateFile)
}

fn is_internal_edit_tool(event: &Event) -> bool {
    event.is_tool(ToolId::EditFileInternal)
}

fn is_four_tick_fence(event: &Event) -> bool {
    event.is_fence(FOUR_TICK_FENCE)
}

fn is_three_tick_fence(event: &Event) -> bool {
    event.is_fence(THREE_TICK_FENCE)
}

fn is_undo_stop(event: &Event) -> bool {
    event.is_kind(EventKind::UndoStop)
}

fn is_codeblock_uri(event: &Event) -> bool {
    event.is_kind(EventKind::CodeblockUri)
}

fn is_text_edit_group(event: &Event) -> bool {
    event.is_kind(EventKind::TextEditGroup)
}

fn is_edit_scaffolding(event: &Event) -> bool {
    is_four_tick_fence(event)
        || is_three_tick_fence(event)
        || is_undo_stop(event)
        || is_codeblock_uri(event)
        || is_internal_edit_tool(event)
}

static INSERT_EDIT_GRAMMAR: &[Matcher<Event>] = &[
    Matcher::once("copilot_insertEdit invocation", is_insert_edit_tool),
    Matcher::once("vscode_editFile_internal invocation", is_internal_edit_tool),
    Matcher::once("opening ```` fence", is_four_tick_fence),
    Matcher::once("undoStop", is_undo_stop),
    Matcher::once("codeblockUri", is_codeblock_uri),
    Matcher::once("closing ```` fence", is_four_tick_fence),
    Matcher::zero_or_more("textEditGroup", is_text_edit_group),
];

static REPLACE_STRING_GRAMMAR: &[Matcher<Event>] = &[
    Matcher::once("copilot_replaceString invocation", is_replace_string_tool),
    Matcher::once("opening ``` fence", is_three_tick_fence),
    Matcher::once("undoStop", is_undo_stop),
    Matcher::once("codeblockUri", is_codeblock_uri),
    Matcher::zero_or_more("textEditGroup", is_text_edit_group),
    Matcher::once("closing ``` fence", is_three_tick_fence),
];

static CREATE_FILE_GRAMMAR: &[Matcher<Event>] = &[
    Matcher::once("copilot_createFile invocation", is_create_file_tool),
    Matcher::zero_or_more("edit scaffolding", is_edit_scaffolding),
    Matcher::zero_or_more("textEditGroup", is_text_edit_group),
    Matcher::zero_or_more("edit scaffolding", is_edit_scaffolding),
];

/// Tools whose invocations carry file edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditTool {
    /// Rewrites the whole file; every group starts from an empty buffer
    InsertEdit,
    /// Edits accumulate on the latest version of the file
    ReplaceString,
    /// Creates a file; edits accumulate on an empty baseline
    CreateFile,
}

impl EditTool {
    /// The edit tool for a tool identifier
    #[must_use]
    pub fn from_tool_id(tool: ToolId) -> Option<Self> {
        match tool {
            ToolId::InsertEdit => Some(Self::InsertEdit),
            ToolId::ReplaceString => Some(Self::ReplaceString),
            ToolId::CreateFile => Some(Self::CreateFile),
            _ => None,
        }
    }

    /// The tool identifier that opens this tool's event run
    #[must_use]
    pub fn tool_id(self) -> ToolId {
        match self {
            Self::InsertEdit => ToolId::InsertEdit,
            Self::ReplaceString => ToolId::ReplaceString,
            Self::CreateFile => ToolId::CreateFile,
        }
    }

    /// Expected event sequence of one invocation
    #[must_use]
    pub fn grammar(self) -> &'static [Matcher<Event>] {
        match self {
            Self::InsertEdit => INSERT_EDIT_GRAMMAR,
            Self::ReplaceString => REPLACE_STRING_GRAMMAR,
            Self::CreateFile => CREATE_FILE_GRAMMAR,
        }
    }

    /// How this tool's edit text is applied
    #[must_use]
    pub fn style(self) -> EditStyle {
        match self {
            Self::InsertEdit => EditStyle::Insert,
            Self::ReplaceString | Self::CreateFile => EditStyle::Replace,
        }
    }

    /// Short name for logs and records
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::InsertEdit => "insert-edit",
            Self::ReplaceString => "replace-string",
            Self::CreateFile => "create-file",
        }
    }
}

/// One invocation of a file-editing tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditInvocation {
    /// Which tool made the edits
    pub tool: EditTool,
    /// Edit groups in event order
    pub groups: Vec<TextEditGroup>,
    /// Whether the event run matched the tool's grammar in full
    pub complete: bool,
    /// Snapshots recorded for this invocation, one per edited path
    pub revisions: Vec<Revision>,
}

impl EditInvocation {
    /// An invocation with no groups yet
    #[must_use]
    pub fn new(tool: EditTool) -> Self {
        Self {
            tool,
            groups: Vec::new(),
            complete: true,
            revisions: Vec::new(),
        }
    }

    /// Edited paths in order of first appearance
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for group in &self.groups {
            if !paths.contains(&group.path()) {
                paths.push(group.path());
            }
        }
        paths
    }
}
