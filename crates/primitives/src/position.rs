//! Conversion between rope character indices and LSP positions.
//!
//! Lines follow ropey's line-break rules; columns are counted in the requested
//! [`OffsetEncoding`]. All conversions return `None` when the input lies outside
//! the text, which callers treat as a stale snapshot.

use ropey::{Rope, RopeSlice};

use crate::lsp::{LspPosition, LspRange, OffsetEncoding};

/// Converts a character index into an LSP position.
///
/// `char_idx == text.len_chars()` is valid and maps to the end of the text.
pub fn char_to_lsp_position(text: &Rope, char_idx: usize, encoding: OffsetEncoding) -> Option<LspPosition> {
	if char_idx > text.len_chars() {
		return None;
	}
	let line = text.char_to_line(char_idx);
	let line_start = text.line_to_char(line);
	let character = match encoding {
		OffsetEncoding::Utf8 => text.char_to_byte(char_idx) - text.char_to_byte(line_start),
		OffsetEncoding::Utf16 => text.char_to_utf16_cu(char_idx) - text.char_to_utf16_cu(line_start),
		OffsetEncoding::Utf32 => char_idx - line_start,
	};
	Some(LspPosition::new(line as u32, character as u32))
}

/// Converts an LSP position into a character index.
///
/// Columns past the end of the line clamp to the line's last content
/// character. A column pointing inside a multi-unit character resolves to the
/// start of that character.
pub fn lsp_position_to_char(text: &Rope, pos: LspPosition, encoding: OffsetEncoding) -> Option<usize> {
	let line = pos.line as usize;
	if line >= text.len_lines() {
		return None;
	}
	let line_start = text.line_to_char(line);
	let slice = text.line(line);

	let mut units = 0u32;
	let mut column = 0usize;
	for ch in slice.chars().take(content_len(slice)) {
		let next = units + encoding.char_units(ch);
		if next > pos.character {
			break;
		}
		units = next;
		column += 1;
	}
	Some(line_start + column)
}

/// Converts a character range into an LSP range.
pub fn char_range_to_lsp_range(text: &Rope, start: usize, end: usize, encoding: OffsetEncoding) -> Option<LspRange> {
	let start = char_to_lsp_position(text, start, encoding)?;
	let end = char_to_lsp_position(text, end, encoding)?;
	Some(LspRange::new(start, end))
}

/// Converts an LSP range into a `(start, end)` character range.
pub fn lsp_range_to_char_range(text: &Rope, range: LspRange, encoding: OffsetEncoding) -> Option<(usize, usize)> {
	let start = lsp_position_to_char(text, range.start, encoding)?;
	let end = lsp_position_to_char(text, range.end, encoding)?;
	Some((start, end))
}

/// Length of a line in characters, excluding its trailing line break.
fn content_len(line: RopeSlice<'_>) -> usize {
	let len = line.len_chars();
	if len == 0 || !is_line_break(line.char(len - 1)) {
		return len;
	}
	if len >= 2 && line.char(len - 1) == '\n' && line.char(len - 2) == '\r' {
		len - 2
	} else {
		len - 1
	}
}

/// Line breaks recognised by ropey's `unicode_lines` feature.
fn is_line_break(ch: char) -> bool {
	matches!(ch, '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

#[cfg(test)]
mod tests;
