// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! In-memory line buffer and edit application
//!
//! Lines and columns are 1-indexed and columns count characters, matching the
//! coordinates recorded in chat session exports. Edits never fail: metadata
//! that does not fit the buffer is corrected and reported instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::range::{EditRange, EditStyle, RangeCorrection, TextEdit};

/// Furthest an edit may reach past the last line before it is pulled back
pub const MAX_PADDING_LINES: usize = 10_000;

/// An ordered sequence of lines without terminators
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBuffer {
    lines: Vec<String>,
}

/// Outcome of applying a single edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEdit {
    /// The range actually used after corrections
    pub range: EditRange,
    /// Corrections made to the declared range
    pub corrections: Vec<RangeCorrection>,
    /// Number of buffer lines replaced
    pub lines_replaced: usize,
    /// Number of lines written in their place
    pub lines_written: usize,
}

impl AppliedEdit {
    /// Whether the declared metadata had to be adjusted
    #[must_use]
    pub fn was_corrected(&self) -> bool {
        !self.corrections.is_empty()
    }
}

impl TextBuffer {
    /// Create an empty buffer (no lines at all)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer from already split lines
    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Split file content on `\n`
    ///
    /// An empty string yields a single empty line, distinguishing an empty
    /// file from a missing one.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::from_lines(text.split('\n'))
    }

    /// All lines in order
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Line `number` (1-indexed)
    #[must_use]
    pub fn line(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Number of lines
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the buffer holds no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the lines with `\n`
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Right-pad with empty lines until the buffer has `count` lines
    pub fn pad_to(&mut self, count: usize) {
        if count > self.lines.len() {
            self.lines.resize(count, String::new());
        }
    }

    /// Apply every edit of every batch, strictly in the given order
    pub fn apply_batches(
        &mut self,
        batches: &[Vec<TextEdit>],
        style: EditStyle,
    ) -> Vec<AppliedEdit> {
        batches
            .iter()
            .flatten()
            .map(|edit| self.apply(edit, style))
            .collect()
    }

    /// Apply a single edit
    ///
    /// The text is split on `\n`; the first produced line is prefixed with the
    /// start line's content before `start_column` and the last produced line
    /// is suffixed with the end line's content from `end_column` on. The
    /// produced lines replace the inclusive line range.
    pub fn apply(&mut self, edit: &TextEdit, style: EditStyle) -> AppliedEdit {
        let (mut range, mut corrections) = edit.range.normalized();

        let line_limit = self.lines.len() + MAX_PADDING_LINES;
        if range.max_line() > line_limit {
            range.start_line_number = range.start_line_number.min(line_limit);
            range.end_line_number = range.end_line_number.min(line_limit);
            corrections.push(RangeCorrection::LineFarPastEnd);
        }
        self.pad_to(range.max_line());

        let start_index = range.start_line_number - 1;
        let end_index = range.end_line_number - 1;

        let start_limit = self.lines[start_index].chars().count() + 1;
        let end_limit = self.lines[end_index].chars().count() + 1;
        if range.start_column > start_limit || range.end_column > end_limit {
            range.start_column = range.start_column.min(start_limit);
            range.end_column = range.end_column.min(end_limit);
            if range.is_single_line() {
                range.end_column = range.end_column.max(range.start_column);
            }
            corrections.push(RangeCorrection::ColumnPastLineEnd);
        }

        let text = match style {
            EditStyle::Insert if range.is_single_line() => {
                edit.text.trim_start_matches('\n')
            }
            _ => edit.text.as_str(),
        };
        let produced: Vec<&str> = text.split('\n').collect();

        if style == EditStyle::Insert && range.is_single_line() {
            let width = produced.last().map_or(0, |line| line.chars().count());
            if width > range.end_column - range.start_column {
                range.end_column = range.start_column.saturating_add(width);
                corrections.push(RangeCorrection::WidenedEndColumn);
            }
        }

        // Columns are within their lines now, except a widened end column
        let prefix = split_at_column(&self.lines[start_index], range.start_column)
            .map_or_else(|| self.lines[start_index].clone(), |(prefix, _)| prefix.to_string());
        let suffix = split_at_column(&self.lines[end_index], range.end_column)
            .map_or_else(String::new, |(_, suffix)| suffix.to_string());

        let last = produced.len() - 1;
        let replacement: Vec<String> = produced
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let mut out = String::new();
                if i == 0 {
                    out.push_str(&prefix);
                }
                out.push_str(line);
                if i == last {
                    out.push_str(&suffix);
                }
                out
            })
            .collect();

        let lines_written = replacement.len();
        self.lines.splice(start_index..=end_index, replacement);

        for correction in &corrections {
            match correction {
                RangeCorrection::WidenedEndColumn => {
                    debug!(
                        declared = %edit.range,
                        effective = %range,
                        "Widened edit to fit inserted text"
                    );
                }
                other => {
                    warn!(
                        declared = %edit.range,
                        effective = %range,
                        correction = ?other,
                        "Corrected inconsistent edit range"
                    );
                }
            }
        }

        AppliedEdit {
            range,
            corrections,
            lines_replaced: end_index - start_index + 1,
            lines_written,
        }
    }
}

/// Split `line` before the character at 1-indexed `column`
///
/// Returns `None` when the column lies past the end of the line.
fn split_at_column(line: &str, column: usize) -> Option<(&str, &str)> {
    let skip = column.saturating_sub(1);
    let offset = match line.char_indices().nth(skip) {
        Some((offset, _)) => offset,
        None if line.chars().count() == skip => line.len(),
        None => return None,
    };
    Some(line.split_at(offset))
}

impl From<Vec<String>> for TextBuffer {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn edit(range: (usize, usize, usize, usize), text: &str) -> TextEdit {
        TextEdit::new(EditRange::new(range.0, range.1, range.2, range.3), text)
    }

    #[test]
    fn test_from_text_empty_is_one_line() {
        assert_eq!(TextBuffer::from_text("").lines(), &[String::new()]);
        assert!(TextBuffer::new().is_empty());
    }

    #[test]
    fn test_single_line_replace_keeps_prefix_and_suffix() {
        let mut buffer = TextBuffer::from_lines(["let x = 1;"]);
        buffer.apply(&edit((1, 9, 1, 10), "42"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["let x = 42;".to_string()]);
    }

    #[test]
    fn test_replace_with_line_break_splits_line() {
        let mut buffer = TextBuffer::from_lines(["foo", "bar"]);
        let applied = buffer.apply(&edit((2, 1, 2, 4), "baz\nqux"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["foo", "baz", "qux"].map(String::from));
        assert!(!applied.was_corrected());
        assert_eq!(applied.lines_replaced, 1);
        assert_eq!(applied.lines_written, 2);
    }

    #[test]
    fn test_multi_line_range_joins_lines() {
        let mut buffer = TextBuffer::from_lines(["alpha", "beta", "gamma"]);
        buffer.apply(&edit((1, 3, 3, 3), "-"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["al-mma".to_string()]);
    }

    #[test]
    fn test_deletion_with_empty_text() {
        let mut buffer = TextBuffer::from_lines(["one", "two", "three"]);
        buffer.apply(&edit((1, 4, 2, 4), ""), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["one", "three"].map(String::from));
    }

    #[test]
    fn test_edit_past_end_pads_with_empty_lines() {
        let mut buffer = TextBuffer::from_lines(["first"]);
        buffer.apply(&edit((4, 1, 4, 1), "fourth"), EditStyle::Replace);
        assert_eq!(
            buffer.lines(),
            &["first", "", "", "fourth"].map(String::from)
        );
    }

    #[test]
    fn test_columns_count_characters_not_bytes() {
        let mut buffer = TextBuffer::from_lines(["héllo wörld"]);
        buffer.apply(&edit((1, 7, 1, 12), "rust"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["héllo rust".to_string()]);
    }

    #[test]
    fn test_insert_strips_leading_newlines_on_single_line_range() {
        let mut buffer = TextBuffer::new();
        buffer.apply(&edit((1, 1, 1, 1), "\n\nfn main() {}"), EditStyle::Insert);
        assert_eq!(buffer.lines(), &["fn main() {}".to_string()]);
    }

    #[test]
    fn test_replace_keeps_leading_newlines() {
        let mut buffer = TextBuffer::from_lines(["x"]);
        buffer.apply(&edit((1, 2, 1, 2), "\ny"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["x", "y"].map(String::from));
    }

    #[test]
    fn test_insert_widens_narrow_range() {
        let mut buffer = TextBuffer::from_lines(["hello"]);
        let applied = buffer.apply(&edit((1, 1, 1, 1), "HELLO"), EditStyle::Insert);
        assert_eq!(buffer.lines(), &["HELLO".to_string()]);
        assert_eq!(applied.range, EditRange::new(1, 1, 1, 6));
        assert_eq!(applied.corrections, vec![RangeCorrection::WidenedEndColumn]);
    }

    #[test]
    fn test_insert_into_empty_buffer() {
        let mut buffer = TextBuffer::new();
        buffer.apply(&edit((1, 1, 1, 1), "hello"), EditStyle::Insert);
        assert_eq!(buffer.lines(), &["hello".to_string()]);
    }

    #[test]
    fn test_reversed_columns_do_not_panic() {
        let mut buffer = TextBuffer::from_lines(["abcdef"]);
        let applied = buffer.apply(&edit((1, 5, 1, 2), "X"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["abcdXef".to_string()]);
        assert!(applied.was_corrected());
    }

    #[test]
    fn test_column_past_line_end_is_clamped() {
        let mut buffer = TextBuffer::from_lines(["abc", "def"]);
        let applied = buffer.apply(&edit((1, 10, 1, 12), "!"), EditStyle::Replace);
        assert_eq!(buffer.lines(), &["abc!", "def"].map(String::from));
        assert_eq!(applied.corrections, vec![RangeCorrection::ColumnPastLineEnd]);
    }

    #[test]
    fn test_huge_columns_on_insert_are_clamped() {
        let mut buffer = TextBuffer::from_lines(["abc"]);
        let applied = buffer.apply(
            &TextEdit::new(EditRange::new(1, usize::MAX, 1, usize::MAX), "x"),
            EditStyle::Insert,
        );
        assert_eq!(buffer.lines(), &["abcx".to_string()]);
        assert_eq!(applied.range, EditRange::new(1, 4, 1, 5));
        assert_eq!(
            applied.corrections,
            vec![
                RangeCorrection::ColumnPastLineEnd,
                RangeCorrection::WidenedEndColumn
            ]
        );
    }

    #[test]
    fn test_line_far_past_end_is_pulled_back() {
        let mut buffer = TextBuffer::from_lines(["abc"]);
        let applied = buffer.apply(
            &TextEdit::new(EditRange::new(usize::MAX, 1, usize::MAX, 1), "tail"),
            EditStyle::Replace,
        );
        assert_eq!(buffer.len(), 1 + MAX_PADDING_LINES);
        assert_eq!(buffer.line(1 + MAX_PADDING_LINES), Some("tail"));
        assert!(applied.corrections.contains(&RangeCorrection::LineFarPastEnd));
    }

    #[test]
    fn test_batches_apply_in_order() {
        let mut buffer = TextBuffer::from_lines(["a"]);
        let batches = vec![
            vec![edit((1, 2, 1, 2), "\nb")],
            vec![edit((2, 2, 2, 2), "\nc"), edit((1, 1, 1, 2), "A")],
        ];
        let applied = buffer.apply_batches(&batches, EditStyle::Replace);
        assert_eq!(applied.len(), 3);
        assert_eq!(buffer.lines(), &["A", "b", "c"].map(String::from));
    }
}
