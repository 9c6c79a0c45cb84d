//! Batching of buffer edits into `didChange` content changes.

use lockstep_primitives::{EditDelta, LspRange, OffsetEncoding, TextEdit};
use lsp_types::TextDocumentContentChangeEvent;
use ropey::Rope;

use crate::capabilities::SyncKind;

/// Changes waiting for the next `didChange`.
///
/// The variant is chosen once from the session's [`SyncKind`] and never
/// changes. The batch only accumulates; flushing is up to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChanges {
	/// The server wants no content changes.
	None,
	/// Latest full text, replacing whatever was pending.
	Full(Option<String>),
	/// One ranged record per edit, in edit order.
	Incremental(Vec<TextDocumentContentChangeEvent>),
}

impl PendingChanges {
	/// Empty batch for `kind`.
	pub fn new(kind: SyncKind) -> Self {
		match kind {
			SyncKind::None => Self::None,
			SyncKind::Full => Self::Full(None),
			SyncKind::Incremental => Self::Incremental(Vec::new()),
		}
	}

	/// Adds one edit.
	///
	/// `delta` is the edit's derived delta, `None` if it could not be derived.
	/// `text` is the buffer after the edit was applied.
	pub fn push(&mut self, edit: &TextEdit, delta: Option<EditDelta>, text: &Rope, encoding: OffsetEncoding) {
		match self {
			Self::None => {}
			Self::Full(pending) => *pending = Some(text.to_string()),
			Self::Incremental(records) => records.push(incremental_record(edit, delta, text, encoding)),
		}
	}

	/// Takes the pending records, or `None` if there is nothing to send.
	pub fn take(&mut self) -> Option<Vec<TextDocumentContentChangeEvent>> {
		match self {
			Self::None => None,
			Self::Full(pending) => pending.take().map(|text| vec![full_record(text)]),
			Self::Incremental(records) if records.is_empty() => None,
			Self::Incremental(records) => Some(std::mem::take(records)),
		}
	}

	/// Drops everything pending.
	pub fn clear(&mut self) {
		match self {
			Self::None => {}
			Self::Full(pending) => *pending = None,
			Self::Incremental(records) => records.clear(),
		}
	}

	/// Number of records the next flush would send.
	pub fn len(&self) -> usize {
		match self {
			Self::None => 0,
			Self::Full(pending) => usize::from(pending.is_some()),
			Self::Incremental(records) => records.len(),
		}
	}

	/// Returns `true` if a flush would send nothing.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

fn incremental_record(edit: &TextEdit, delta: Option<EditDelta>, text: &Rope, encoding: OffsetEncoding) -> TextDocumentContentChangeEvent {
	let Some(delta) = delta else {
		tracing::warn!(offset = edit.offset, len = text.len_chars(), "edit outside buffer, sending full text");
		return full_record(text.to_string());
	};
	TextDocumentContentChangeEvent {
		range: Some(to_lsp_range(delta.old_range())),
		range_length: Some(edit.range_length(encoding)),
		text: edit.inserted.clone(),
	}
}

fn full_record(text: String) -> TextDocumentContentChangeEvent {
	TextDocumentContentChangeEvent {
		range: None,
		range_length: None,
		text,
	}
}

/// Converts a primitive range to its protocol form.
pub fn to_lsp_range(range: LspRange) -> lsp_types::Range {
	lsp_types::Range {
		start: lsp_types::Position {
			line: range.start.line,
			character: range.start.character,
		},
		end: lsp_types::Position {
			line: range.end.line,
			character: range.end.character,
		},
	}
}

/// Converts a protocol range to its primitive form.
pub fn from_lsp_range(range: lsp_types::Range) -> LspRange {
	LspRange::new(
		lockstep_primitives::LspPosition::new(range.start.line, range.start.character),
		lockstep_primitives::LspPosition::new(range.end.line, range.end.character),
	)
}

#[cfg(test)]
mod tests {
	use lsp_types::{Position, Range};

	use super::*;

	fn edit(text: &mut Rope, offset: usize, removed: &str, inserted: &str) -> TextEdit {
		let edit = TextEdit::new(offset, removed, inserted);
		assert!(edit.apply(text));
		edit
	}

	/// Pushes an edit the way a session does, deriving its delta from the post-edit text.
	fn push(pending: &mut PendingChanges, edit: &TextEdit, text: &Rope) {
		pending.push(edit, edit.delta_after(text, OffsetEncoding::Utf16), text, OffsetEncoding::Utf16);
	}

	#[test]
	fn test_none_never_accumulates() {
		let mut text = Rope::from("abc");
		let mut pending = PendingChanges::new(SyncKind::None);
		let e = edit(&mut text, 0, "", "x");
		push(&mut pending, &e, &text);
		assert!(pending.is_empty());
		assert_eq!(pending.take(), None);
	}

	#[test]
	fn test_full_coalesces_to_latest_text() {
		let mut text = Rope::from("abc");
		let mut pending = PendingChanges::new(SyncKind::Full);
		for i in 0..5 {
			let e = edit(&mut text, i, "", "x");
			push(&mut pending, &e, &text);
		}
		assert_eq!(pending.len(), 1);

		let records = pending.take().unwrap();
		assert_eq!(records.len(), 1);
		assert_eq!(records[0].range, None);
		assert_eq!(records[0].text, "xxxxxabc");
		assert_eq!(pending.take(), None);
	}

	#[test]
	fn test_incremental_keeps_order() {
		let mut text = Rope::from("hello\nworld\n");
		let mut pending = PendingChanges::new(SyncKind::Incremental);
		for (offset, removed, inserted) in [(0, "", ">> "), (8, "\n", " "), (9, "world", "there")] {
			let e = edit(&mut text, offset, removed, inserted);
			push(&mut pending, &e, &text);
		}
		assert_eq!(text.to_string(), ">> hello there\n");

		let records = pending.take().unwrap();
		assert_eq!(records.len(), 3);
		assert_eq!(records[0].range, Some(Range::new(Position::new(0, 0), Position::new(0, 0))));
		assert_eq!(records[0].text, ">> ");
		assert_eq!(records[1].range, Some(Range::new(Position::new(0, 8), Position::new(1, 0))));
		assert_eq!(records[1].range_length, Some(1));
		assert_eq!(records[2].range, Some(Range::new(Position::new(0, 9), Position::new(0, 14))));
		assert_eq!(records[2].text, "there");
		assert!(pending.is_empty());
	}

	#[test]
	fn test_incremental_range_length_uses_encoding() {
		let mut text = Rope::from("a\u{1F600}b");
		let mut pending = PendingChanges::new(SyncKind::Incremental);
		let e = edit(&mut text, 1, "\u{1F600}", "");
		push(&mut pending, &e, &text);
		let records = pending.take().unwrap();
		assert_eq!(records[0].range, Some(Range::new(Position::new(0, 1), Position::new(0, 3))));
		assert_eq!(records[0].range_length, Some(2));
	}

	#[test]
	fn test_incremental_ranges_are_pre_edit_across_crlf() {
		let mut text = Rope::from("a\r\nb");
		let mut pending = PendingChanges::new(SyncKind::Incremental);
		let e = edit(&mut text, 1, "\r", "");
		push(&mut pending, &e, &text);
		let e = edit(&mut text, 1, "", "\r");
		push(&mut pending, &e, &text);
		assert_eq!(text.to_string(), "a\r\nb");

		let records = pending.take().unwrap();
		assert_eq!(records[0].range, Some(Range::new(Position::new(0, 1), Position::new(0, 2))));
		assert_eq!(records[0].text, "");
		assert_eq!(records[1].range, Some(Range::new(Position::new(0, 1), Position::new(0, 1))));
		assert_eq!(records[1].text, "\r");
	}

	#[test]
	fn test_incremental_falls_back_to_full_text_for_stale_edit() {
		let text = Rope::from("abc");
		let mut pending = PendingChanges::new(SyncKind::Incremental);
		push(&mut pending, &TextEdit::insert(40, "x"), &text);

		let records = pending.take().unwrap();
		assert_eq!(records, vec![full_record("abc".into())]);
	}

	#[test]
	fn test_clear() {
		let text = Rope::from("abc");
		let mut pending = PendingChanges::new(SyncKind::Full);
		push(&mut pending, &TextEdit::insert(0, ""), &text);
		pending.clear();
		assert_eq!(pending.take(), None);
	}
}
