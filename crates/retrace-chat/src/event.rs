// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Raw response events
//!
//! Events are kept as untyped JSON because the set of kinds grows without
//! notice. The closed [`EventKind`] and [`ToolId`] enums cover the kinds the
//! classifier understands; anything else parses to `None`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One record of a response's flat event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(Value);

/// Discriminants understood by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Reference to a file or symbol inside a text run
    InlineReference,
    /// A confirmation prompt shown to the user
    Confirmation,
    /// A progress notice
    ProgressTaskSerialized,
    /// A completed tool call
    ToolInvocationSerialized,
    /// Position-addressed edits to one document
    TextEditGroup,
    /// Editor undo checkpoint
    UndoStop,
    /// Target document of the following code block
    CodeblockUri,
    /// Announcement of an upcoming tool call
    PrepareToolInvocation,
}

impl EventKind {
    /// Parse a `kind` field value
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "inlineReference" => Self::InlineReference,
            "confirmation" => Self::Confirmation,
            "progressTaskSerialized" => Self::ProgressTaskSerialized,
            "toolInvocationSerialized" => Self::ToolInvocationSerialized,
            "textEditGroup" => Self::TextEditGroup,
            "undoStop" => Self::UndoStop,
            "codeblockUri" => Self::CodeblockUri,
            "prepareToolInvocation" => Self::PrepareToolInvocation,
            _ => return None,
        })
    }

    /// The wire name of this kind
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InlineReference => "inlineReference",
            Self::Confirmation => "confirmation",
            Self::ProgressTaskSerialized => "progressTaskSerialized",
            Self::ToolInvocationSerialized => "toolInvocationSerialized",
            Self::TextEditGroup => "textEditGroup",
            Self::UndoStop => "undoStop",
            Self::CodeblockUri => "codeblockUri",
            Self::PrepareToolInvocation => "prepareToolInvocation",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool identifiers understood by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    /// Read a file
    ReadFile,
    /// Grep the workspace
    FindTextInFiles,
    /// Glob the workspace
    FindFiles,
    /// Create a new file
    CreateFile,
    /// Rewrite a file through the insert-edit tool
    InsertEdit,
    /// Replace a string inside a file
    ReplaceString,
    /// List a directory
    ListDirectory,
    /// Fetch compiler diagnostics
    GetErrors,
    /// Run a terminal command
    RunInTerminal,
    /// The editor's internal edit step, only valid inside an insert-edit run
    EditFileInternal,
}

impl ToolId {
    /// Parse a `toolId` field value
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "copilot_readFile" => Self::ReadFile,
            "copilot_findTextInFiles" => Self::FindTextInFiles,
            "copilot_findFiles" => Self::FindFiles,
            "copilot_createFile" => Self::CreateFile,
            "copilot_insertEdit" => Self::InsertEdit,
            "copilot_replaceString" => Self::ReplaceString,
            "copilot_listDirectory" => Self::ListDirectory,
            "copilot_getErrors" => Self::GetErrors,
            "copilot_runInTerminal" | "run_in_terminal" => Self::RunInTerminal,
            "vscode_editFile_internal" => Self::EditFileInternal,
            _ => return None,
        })
    }

    /// The canonical wire name of this tool
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadFile => "copilot_readFile",
            Self::FindTextInFiles => "copilot_findTextInFiles",
            Self::FindFiles => "copilot_findFiles",
            Self::CreateFile => "copilot_createFile",
            Self::InsertEdit => "copilot_insertEdit",
            Self::ReplaceString => "copilot_replaceString",
            Self::ListDirectory => "copilot_listDirectory",
            Self::GetErrors => "copilot_getErrors",
            Self::RunInTerminal => "copilot_runInTerminal",
            Self::EditFileInternal => "vscode_editFile_internal",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Event {
    /// Wrap a JSON value
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON
    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }

    /// Unwrap into the underlying JSON
    #[must_use]
    pub fn into_json(self) -> Value {
        self.0
    }

    /// A top-level field
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `kind` discriminant as written
    #[must_use]
    pub fn raw_kind(&self) -> Option<&str> {
        self.field("kind").and_then(Value::as_str)
    }

    /// The discriminant, if it is one the classifier knows
    #[must_use]
    pub fn kind(&self) -> Option<EventKind> {
        self.raw_kind().and_then(EventKind::parse)
    }

    /// Whether the discriminant equals `kind`
    #[must_use]
    pub fn is_kind(&self, kind: EventKind) -> bool {
        self.kind() == Some(kind)
    }

    /// The `value` field as a string
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.field("value").and_then(Value::as_str)
    }

    /// A markdown chunk: a `value` field and no discriminant
    ///
    /// An explicit `"kind": null` counts as no discriminant.
    #[must_use]
    pub fn is_plain_text(&self) -> bool {
        self.field("kind").is_none_or(Value::is_null) && self.field("value").is_some()
    }

    /// Whether this is an inline file or symbol reference
    #[must_use]
    pub fn is_inline_reference(&self) -> bool {
        self.is_kind(EventKind::InlineReference)
    }

    /// Whether the `value` field is exactly `fence`
    #[must_use]
    pub fn is_fence(&self, fence: &str) -> bool {
        self.text() == Some(fence)
    }

    /// The `toolId` field as written
    #[must_use]
    pub fn raw_tool_id(&self) -> Option<&str> {
        self.field("toolId").and_then(Value::as_str)
    }

    /// The tool identifier, if it is one the classifier knows
    #[must_use]
    pub fn tool_id(&self) -> Option<ToolId> {
        self.raw_tool_id().and_then(ToolId::parse)
    }

    /// Whether this event carries the tool identifier `tool`
    #[must_use]
    pub fn is_tool(&self, tool: ToolId) -> bool {
        self.tool_id() == Some(tool)
    }

    /// Deserialize the event into a typed payload
    ///
    /// # Errors
    ///
    /// Returns the serde error if the event does not have the shape of `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }

    /// A short description for diagnostics
    #[must_use]
    pub fn summary(&self) -> String {
        const MAX_TEXT: usize = 40;

        if let Some(tool) = self.raw_tool_id() {
            return format!("{} ({tool})", self.raw_kind().unwrap_or("<no kind>"));
        }
        if let Some(kind) = self.raw_kind() {
            return kind.to_string();
        }
        match self.text() {
            Some(text) if text.chars().count() > MAX_TEXT => {
                let head: String = text.chars().take(MAX_TEXT).collect();
                format!("text {head:?}...")
            }
            Some(text) => format!("text {text:?}"),
            None => "<no kind>".to_string(),
        }
    }
}

impl From<Value> for Event {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
