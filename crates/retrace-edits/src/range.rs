// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Edit ranges and text edits as they appear in chat session exports
//!
//! Field names follow the editor's camelCase wire format so the types can be
//! deserialized straight out of a `textEditGroup` event.

use serde::{Deserialize, Serialize};

/// A 1-indexed line/column span inside a text buffer
///
/// Columns are character offsets into their line. The range is not trusted:
/// see [`EditRange::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRange {
    /// First line touched by the edit
    pub start_line_number: usize,
    /// Column on the first line where the edit begins
    pub start_column: usize,
    /// Last line touched by the edit
    pub end_line_number: usize,
    /// Column on the last line where the untouched suffix begins
    pub end_column: usize,
}

impl EditRange {
    /// Create a range from its four coordinates
    #[must_use]
    pub const fn new(
        start_line_number: usize,
        start_column: usize,
        end_line_number: usize,
        end_column: usize,
    ) -> Self {
        Self {
            start_line_number,
            start_column,
            end_line_number,
            end_column,
        }
    }

    /// A collapsed range at a single position
    #[must_use]
    pub const fn point(line: usize, column: usize) -> Self {
        Self::new(line, column, line, column)
    }

    /// Whether the range starts and ends on the same line
    #[must_use]
    pub fn is_single_line(&self) -> bool {
        self.start_line_number == self.end_line_number
    }

    /// Highest line number the range addresses
    #[must_use]
    pub fn max_line(&self) -> usize {
        self.start_line_number.max(self.end_line_number)
    }

    /// Unpack into `(start_line, start_column, end_line, end_column)`
    #[must_use]
    pub fn unpack(&self) -> (usize, usize, usize, usize) {
        (
            self.start_line_number,
            self.start_column,
            self.end_line_number,
            self.end_column,
        )
    }

    /// Repair coordinates that violate the range invariants
    ///
    /// Zero lines or columns are raised to 1, an end line before the start
    /// line collapses onto the start line, and a single-line range whose end
    /// column precedes its start column collapses to an empty span. The
    /// returned corrections are empty when the range was already valid.
    #[must_use]
    pub fn normalized(&self) -> (Self, Vec<RangeCorrection>) {
        let mut range = *self;
        let mut corrections = Vec::new();

        if range.start_line_number == 0 || range.end_line_number == 0 {
            range.start_line_number = range.start_line_number.max(1);
            range.end_line_number = range.end_line_number.max(1);
            corrections.push(RangeCorrection::ZeroLine);
        }
        if range.start_column == 0 || range.end_column == 0 {
            range.start_column = range.start_column.max(1);
            range.end_column = range.end_column.max(1);
            corrections.push(RangeCorrection::ZeroColumn);
        }
        if range.end_line_number < range.start_line_number {
            range.end_line_number = range.start_line_number;
            range.end_column = range.start_column;
            corrections.push(RangeCorrection::EndLineBeforeStart);
        }
        if range.is_single_line() && range.end_column < range.start_column {
            range.end_column = range.start_column;
            corrections.push(RangeCorrection::EndColumnBeforeStart);
        }

        (range, corrections)
    }
}

impl std::fmt::Display for EditRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start_line_number, self.start_column, self.end_line_number, self.end_column
        )
    }
}

/// A correction applied to inconsistent edit metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeCorrection {
    /// A line number of 0 was raised to 1
    ZeroLine,
    /// A column of 0 was raised to 1
    ZeroColumn,
    /// The end line preceded the start line
    EndLineBeforeStart,
    /// The end column preceded the start column on a single line
    EndColumnBeforeStart,
    /// A column pointed past the end of its line
    ColumnPastLineEnd,
    /// A line number lay too far past the end of the buffer to pad up to
    LineFarPastEnd,
    /// The declared span was narrower than the inserted text
    WidenedEndColumn,
}

/// Replacement text for one range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// The addressed span
    pub range: EditRange,
    /// Replacement text, may contain line breaks
    pub text: String,
}

impl TextEdit {
    /// Create an edit replacing `range` with `text`
    #[must_use]
    pub fn new(range: EditRange, text: impl Into<String>) -> Self {
        Self {
            range,
            text: text.into(),
        }
    }
}

/// URI of an edited document, only the path is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUri {
    /// Absolute path of the document
    pub path: String,
}

/// The payload of a `textEditGroup` event
///
/// `edits` is a list of batches; batches and the edits inside them are
/// applied in order without any reordering by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEditGroup {
    /// Document the edits target
    pub uri: DocumentUri,
    /// Batches of edits
    #[serde(default)]
    pub edits: Vec<Vec<TextEdit>>,
}

impl TextEditGroup {
    /// Path of the edited document
    #[must_use]
    pub fn path(&self) -> &str {
        &self.uri.path
    }

    /// All edits flattened in application order
    pub fn flattened(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter().flatten()
    }

    /// Total number of edits across all batches
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.edits.iter().map(Vec::len).sum()
    }
}

/// How an edit's text is interpreted against its range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStyle {
    /// Replace exactly the declared span
    Replace,
    /// Block insertion: leading newlines on single-line ranges are dropped
    /// and the declared span widens to fit the inserted text
    Insert,
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn test_range_deserializes_from_camel_case() {
        let json = r#"{"startLineNumber":2,"startColumn":1,"endLineNumber":3,"endColumn":7}"#;
        let range: EditRange = serde_json::from_str(json).expect("deserialize");
        assert_eq!(range, EditRange::new(2, 1, 3, 7));
    }

    #[test]
    fn test_valid_range_needs_no_correction() {
        let (range, corrections) = EditRange::new(1, 3, 2, 1).normalized();
        assert_eq!(range, EditRange::new(1, 3, 2, 1));
        assert!(corrections.is_empty());
    }

    #[test]
    fn test_reversed_columns_collapse() {
        let (range, corrections) = EditRange::new(4, 9, 4, 2).normalized();
        assert_eq!(range, EditRange::new(4, 9, 4, 9));
        assert_eq!(corrections, vec![RangeCorrection::EndColumnBeforeStart]);
    }

    #[test]
    fn test_reversed_lines_collapse_onto_start() {
        let (range, corrections) = EditRange::new(5, 2, 3, 8).normalized();
        assert_eq!(range, EditRange::point(5, 2));
        assert_eq!(corrections, vec![RangeCorrection::EndLineBeforeStart]);
    }

    #[test]
    fn test_zero_coordinates_raised() {
        let (range, corrections) = EditRange::new(0, 0, 0, 0).normalized();
        assert_eq!(range, EditRange::point(1, 1));
        assert_eq!(
            corrections,
            vec![RangeCorrection::ZeroLine, RangeCorrection::ZeroColumn]
        );
    }

    #[test]
    fn test_group_flattens_in_order() {
        let json = r#"{
            "uri": {"path": "/a.txt"},
            "edits": [
                [{"range": {"startLineNumber":1,"startColumn":1,"endLineNumber":1,"endColumn":1}, "text": "a"}],
                [],
                [
                    {"range": {"startLineNumber":2,"startColumn":1,"endLineNumber":2,"endColumn":1}, "text": "b"},
                    {"range": {"startLineNumber":1,"startColumn":1,"endLineNumber":1,"endColumn":1}, "text": "c"}
                ]
            ]
        }"#;
        let group: TextEditGroup = serde_json::from_str(json).expect("deserialize");
        assert_eq!(group.path(), "/a.txt");
        assert_eq!(group.edit_count(), 3);
        let texts: Vec<&str> = group.flattened().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_group_without_edits() {
        let group: TextEditGroup =
            serde_json::from_str(r#"{"uri": {"path": "/x"}}"#).expect("deserialize");
        assert_eq!(group.edit_count(), 0);
    }

    #[test]
    fn test_range_display() {
        assert_eq!(EditRange::new(1, 2, 3, 4).to_string(), "1:2-3:4");
    }
}
