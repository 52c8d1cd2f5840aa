// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Turns a response's flat event log into structured records
//!
//! [`RecordStream`] pulls events lazily and yields one [`Record`] per logical
//! element. Edit tools are parsed against their grammar. Nothing here fails:
//! unknown or out-of-place events produce a [`Diagnostic`] and the stream
//! continues with the next event.

use std::fmt;
use std::slice;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::cursor::Pushback;
use crate::event::{Event, EventKind, ToolId};
use crate::matcher::MatchedFilter;
use crate::record::{
    Confirmation, EditInvocation, EditTool, FileMatches, ProgressNotice, Record, SearchResults,
    TerminalCommand, TextRun, ToolMessage,
};

/// Why an event produced no record, or only part of one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The discriminant is not one the classifier knows
    UnrecognizedEvent,
    /// A tool invocation with an unknown tool identifier
    UnknownTool,
    /// A known event outside the run it belongs to
    UnexpectedEvent,
    /// An edit tool's events broke its grammar
    GrammarViolation,
    /// An edit tool's events ended before its grammar was satisfied
    TruncatedInvocation,
    /// An event of a known kind with an unreadable payload
    InvalidPayload,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnrecognizedEvent => "unrecognized event",
            Self::UnknownTool => "unknown tool",
            Self::UnexpectedEvent => "unexpected event",
            Self::GrammarViolation => "grammar violation",
            Self::TruncatedInvocation => "truncated invocation",
            Self::InvalidPayload => "invalid payload",
        })
    }
}

/// A recovered problem in the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong
    pub kind: DiagnosticKind,
    /// Index of the offending event in the response
    pub position: usize,
    /// Summary of the offending event
    pub event: String,
    /// Extra context
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at event {}: {} ({})",
            self.kind, self.position, self.event, self.detail
        )
    }
}

/// Lazily classified records of one response
pub struct RecordStream<'a> {
    events: Pushback<slice::Iter<'a, Event>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RecordStream<'a> {
    /// Classify `events` in order
    #[must_use]
    pub fn new(events: &'a [Event]) -> Self {
        Self {
            events: Pushback::new(events.iter()),
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics collected so far
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the diagnostics collected so far
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn report(
        &mut self,
        kind: DiagnosticKind,
        position: usize,
        event: &Event,
        detail: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            position,
            event: event.summary(),
            detail: detail.into(),
        };
        warn!(
            kind = %diagnostic.kind,
            position = diagnostic.position,
            event = %diagnostic.event,
            detail = %diagnostic.detail,
            "Skipping event"
        );
        self.diagnostics.push(diagnostic);
    }

    /// Consume a maximal run of text and inline-reference events
    fn text_run(&mut self) -> TextRun {
        let mut run = Vec::new();
        while let Some(event) = self.events.next() {
            if event.is_plain_text() || event.is_inline_reference() {
                run.push(event);
            } else {
                self.events.push_back(event);
                break;
            }
        }
        TextRun::from_events(run)
    }

    /// Match one edit invocation against its tool's grammar
    fn edit_invocation(&mut self, tool: EditTool) -> EditInvocation {
        let start = self.events.position();
        let mut filter = MatchedFilter::new(&mut self.events, tool.grammar());
        let matched: Vec<&'a Event> = filter.by_ref().collect();
        let satisfied = filter.is_satisfied();
        let violation = filter.into_violation();

        let mut invocation = EditInvocation::new(tool);
        invocation.complete = satisfied;

        if let Some(violation) = violation {
            let position = self.events.position();
            self.report(
                DiagnosticKind::GrammarViolation,
                position,
                violation.item,
                format!("{} expected {}", tool.label(), violation.expected),
            );
        } else if !satisfied {
            if let Some(last) = matched.last() {
                self.report(
                    DiagnosticKind::TruncatedInvocation,
                    start + matched.len() - 1,
                    last,
                    format!("{} ended early", tool.label()),
                );
            }
        }

        for (offset, event) in matched.iter().enumerate() {
            if !event.is_kind(EventKind::TextEditGroup) {
                continue;
            }
            match event.decode() {
                Ok(group) => invocation.groups.push(group),
                Err(e) => self.report(
                    DiagnosticKind::InvalidPayload,
                    start + offset,
                    event,
                    e.to_string(),
                ),
            }
        }

        debug!(
            tool = tool.label(),
            groups = invocation.groups.len(),
            complete = invocation.complete,
            "Parsed edit invocation"
        );
        invocation
    }

    /// Build the record for a non-edit tool invocation
    fn tool_record(&mut self, tool: ToolId, event: &'a Event, position: usize) -> Option<Record> {
        let record = match tool {
            ToolId::ReadFile => ToolMessage::from_event(event).map(Record::ReadFile),
            ToolId::GetErrors => ToolMessage::from_event(event).map(Record::GetErrors),
            ToolId::ListDirectory => ToolMessage::from_event(event).map(Record::ListDirectory),
            ToolId::FindTextInFiles => {
                SearchResults::from_event(event).map(Record::FindTextInFiles)
            }
            ToolId::FindFiles => FileMatches::from_event(event).map(Record::FindFiles),
            ToolId::RunInTerminal => TerminalCommand::from_event(event).map(Record::RunInTerminal),
            ToolId::InsertEdit | ToolId::ReplaceString | ToolId::CreateFile => {
                let Some(edit_tool) = EditTool::from_tool_id(tool) else {
                    return None;
                };
                self.events.push_back(event);
                return Some(Record::Edit(self.edit_invocation(edit_tool)));
            }
            ToolId::EditFileInternal => {
                self.report(
                    DiagnosticKind::UnexpectedEvent,
                    position,
                    event,
                    "internal edit step outside an insert-edit run",
                );
                return None;
            }
        };

        match record {
            Ok(record) => Some(record),
            Err(e) => {
                self.report(DiagnosticKind::InvalidPayload, position, event, e.to_string());
                None
            }
        }
    }
}

impl Iterator for RecordStream<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let event = self.events.next()?;
            let position = self.events.position() - 1;

            if event.is_plain_text() || event.is_inline_reference() {
                self.events.push_back(event);
                return Some(Record::Text(self.text_run()));
            }

            let Some(kind) = event.kind() else {
                let detail = match event.field("kind") {
                    None | Some(Value::Null) => "no kind and no value".to_string(),
                    Some(raw) => format!("kind {raw}"),
                };
                self.report(DiagnosticKind::UnrecognizedEvent, position, event, detail);
                continue;
            };

            let record = match kind {
                EventKind::PrepareToolInvocation => None,
                EventKind::Confirmation => {
                    Some(Record::Confirmation(Confirmation::from_event(event)))
                }
                EventKind::ProgressTaskSerialized => {
                    Some(Record::Progress(ProgressNotice::from_event(event)))
                }
                EventKind::ToolInvocationSerialized => match event.tool_id() {
                    Some(tool) => self.tool_record(tool, event, position),
                    None => {
                        let detail = event.raw_tool_id().unwrap_or("<missing toolId>").to_string();
                        self.report(DiagnosticKind::UnknownTool, position, event, detail);
                        None
                    }
                },
                EventKind::TextEditGroup | EventKind::UndoStop | EventKind::CodeblockUri => {
                    self.report(
                        DiagnosticKind::UnexpectedEvent,
                        position,
                        event,
                        "outside an edit invocation",
                    );
                    None
                }
                EventKind::InlineReference => {
                    self.events.push_back(event);
                    Some(Record::Text(self.text_run()))
                }
            };

            if let Some(record) = record {
                return Some(record);
            }
        }
    }
}
