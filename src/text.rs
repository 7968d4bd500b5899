// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Offset and position conversions over document text.
//!
//! Offsets handed around by the editor (caret offset, spans reported by
//! language services) count Unicode scalar values, not bytes. Positions use
//! the `lsp_types` convention: zero-based line and zero-based character.

use lsp_types::{Position, Range};

/// Converts a character offset into a zero-based line/character position.
///
/// Offsets past the end of the text clamp to the end position.
#[must_use]
pub fn offset_to_position(text: &str, offset: usize) -> Position {
    let mut line = 0u32;
    let mut character = 0u32;
    for (index, ch) in text.chars().enumerate() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            character = 0;
        } else {
            character += 1;
        }
    }
    Position { line, character }
}

/// Converts a zero-based position into a character offset.
///
/// A character past the end of its line clamps to the line end (before the
/// newline); a line past the end of the text clamps to the text end.
#[must_use]
pub fn position_to_offset(text: &str, position: Position) -> usize {
    let mut offset = 0usize;
    let mut lines = text.split('\n').peekable();
    let mut line = 0u32;
    while let Some(content) = lines.next() {
        let len = content.chars().count();
        if line == position.line {
            return offset + len.min(position.character as usize);
        }
        offset += len;
        if lines.peek().is_some() {
            offset += 1;
        }
        line += 1;
    }
    offset
}

/// Converts a `[start, end)` character span into a range.
#[must_use]
pub fn span_to_range(text: &str, start: usize, end: usize) -> Range {
    Range {
        start: offset_to_position(text, start),
        end: offset_to_position(text, end),
    }
}

/// Converts a range back into a `[start, end)` character span.
#[must_use]
pub fn range_to_span(text: &str, range: Range) -> (usize, usize) {
    (
        position_to_offset(text, range.start),
        position_to_offset(text, range.end),
    )
}

/// Converts a UTF-8 byte offset into a character offset.
///
/// A byte offset inside a multi-byte character rounds up to the next
/// character boundary; offsets past the end clamp to the character count.
#[must_use]
pub fn byte_to_char(text: &str, byte: usize) -> usize {
    text.char_indices()
        .take_while(|(start, _)| *start < byte)
        .count()
        .min(text.chars().count())
}

/// Converts a character offset into a UTF-8 byte offset.
#[must_use]
pub fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(byte, _)| byte)
}
