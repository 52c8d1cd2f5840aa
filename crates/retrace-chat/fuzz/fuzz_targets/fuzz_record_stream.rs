// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for event classification
//!
//! Builds event sequences from a small vocabulary of realistic events so the
//! fuzzer reaches the grammar paths quickly.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::json;

use retrace_chat::{Event, NoModels, Record, RecordStream, SessionContext};
use retrace_edits::NoSeed;

#[derive(Debug, Arbitrary)]
enum FuzzEvent {
    Text(String),
    Reference(String),
    Tool(u8),
    Fence(bool),
    UndoStop,
    CodeblockUri,
    EditGroup { line: u8, column: u8, text: String },
    Unknown(String),
}

const TOOLS: &[&str] = &[
    "copilot_readFile",
    "copilot_insertEdit",
    "copilot_replaceString",
    "copilot_createFile",
    "vscode_editFile_internal",
    "copilot_findFiles",
    "run_in_terminal",
    "copilot_unknown",
];

impl FuzzEvent {
    fn into_event(self) -> Event {
        let value = match self {
            Self::Text(text) => json!({"value": text}),
            Self::Reference(name) => json!({"kind": "inlineReference", "inlineReference": {"name": name}}),
            Self::Tool(i) => json!({
                "kind": "toolInvocationSerialized",
                "toolId": TOOLS[usize::from(i) % TOOLS.len()]
            }),
            Self::Fence(four) => json!({"value": if four { "\n````\n" } else { "\n```\n" }}),
            Self::UndoStop => json!({"kind": "undoStop"}),
            Self::CodeblockUri => json!({"kind": "codeblockUri", "uri": {"path": "/f"}}),
            Self::EditGroup { line, column, text } => json!({
                "kind": "textEditGroup",
                "uri": {"path": "/f"},
                "edits": [[{
                    "text": text,
                    "range": {
                        "startLineNumber": line,
                        "startColumn": column,
                        "endLineNumber": line,
                        "endColumn": column
                    }
                }]]
            }),
            Self::Unknown(kind) => json!({"kind": kind}),
        };
        Event::new(value)
    }
}

fuzz_target!(|input: Vec<FuzzEvent>| {
    let events: Vec<Event> = input.into_iter().map(FuzzEvent::into_event).collect();
    let mut context = SessionContext::new(&NoSeed, &NoModels);
    for mut record in RecordStream::new(&events) {
        if let Record::Edit(invocation) = &mut record {
            context.apply_invocation(invocation);
        }
    }
});
