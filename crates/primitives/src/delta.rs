use std::ops::Range;

use ropey::Rope;

use crate::lsp::{LspPosition, LspRange, OffsetEncoding};
use crate::position::char_to_lsp_position;

/// One local mutation in LSP coordinates.
///
/// Text in `[start, old_end)` (pre-edit coordinates) was replaced by text
/// occupying `[start, new_end)` (post-edit coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditDelta {
	/// Where the replaced span begins, before the edit.
	pub start: LspPosition,
	/// End of the replaced span, before the edit.
	pub old_end: LspPosition,
	/// End of the inserted span, after the edit.
	pub new_end: LspPosition,
}

impl EditDelta {
	/// Creates a delta from its three positions.
	pub const fn new(start: LspPosition, old_end: LspPosition, new_end: LspPosition) -> Self {
		Self { start, old_end, new_end }
	}

	/// The replaced span in pre-edit coordinates.
	pub const fn old_range(&self) -> LspRange {
		LspRange::new(self.start, self.old_end)
	}

	/// The inserted span in post-edit coordinates.
	pub const fn new_range(&self) -> LspRange {
		LspRange::new(self.start, self.new_end)
	}
}

/// A raw buffer mutation as reported by the editor.
///
/// `offset` is a character index in pre-edit coordinates. The removed text is
/// kept so the pre-edit extent can be recovered after the buffer has already
/// applied the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
	/// Character index where the mutation begins.
	pub offset: usize,
	/// Text that was removed.
	pub removed: String,
	/// Text that was inserted.
	pub inserted: String,
}

impl TextEdit {
	/// Creates an edit replacing `removed` at `offset` with `inserted`.
	pub fn new(offset: usize, removed: impl Into<String>, inserted: impl Into<String>) -> Self {
		Self {
			offset,
			removed: removed.into(),
			inserted: inserted.into(),
		}
	}

	/// Pure insertion at `offset`.
	pub fn insert(offset: usize, text: impl Into<String>) -> Self {
		Self::new(offset, String::new(), text)
	}

	/// Pure deletion of `removed` at `offset`.
	pub fn delete(offset: usize, removed: impl Into<String>) -> Self {
		Self::new(offset, removed, String::new())
	}

	/// Captures the replacement of `chars` in `before` by `inserted`.
	///
	/// Returns `None` if `chars` is out of bounds.
	pub fn replace(before: &Rope, chars: Range<usize>, inserted: impl Into<String>) -> Option<Self> {
		if chars.start > chars.end || chars.end > before.len_chars() {
			return None;
		}
		let removed = before.slice(chars.clone()).to_string();
		Some(Self::new(chars.start, removed, inserted))
	}

	/// Number of characters removed.
	pub fn removed_chars(&self) -> usize {
		self.removed.chars().count()
	}

	/// Length of the removed text in `encoding` code units.
	pub fn range_length(&self, encoding: OffsetEncoding) -> u32 {
		encoding.str_units(&self.removed)
	}

	/// Number of characters inserted.
	pub fn inserted_chars(&self) -> usize {
		self.inserted.chars().count()
	}

	/// Applies the mutation to `rope`.
	///
	/// Returns `false` without touching the rope if the edit does not fit.
	pub fn apply(&self, rope: &mut Rope) -> bool {
		splice(rope, self.offset, self.removed_chars(), &self.inserted)
	}

	/// Undoes the mutation on `rope`, which must already contain it.
	///
	/// Returns `false` without touching the rope if the edit does not fit.
	pub fn revert(&self, rope: &mut Rope) -> bool {
		splice(rope, self.offset, self.inserted_chars(), &self.removed)
	}

	/// Derives the [`EditDelta`] from the buffer before the mutation.
	///
	/// Returns `None` when the edit does not fit `before`.
	pub fn delta(&self, before: &Rope, encoding: OffsetEncoding) -> Option<EditDelta> {
		let mut after = before.clone();
		if !self.apply(&mut after) {
			return None;
		}
		self.delta_between(before, &after, encoding)
	}

	/// Derives the [`EditDelta`] from the buffer after the mutation.
	///
	/// Gives the same delta as [`TextEdit::delta`] on the pre-edit buffer.
	/// Returns `None` when the edit does not fit `after`.
	pub fn delta_after(&self, after: &Rope, encoding: OffsetEncoding) -> Option<EditDelta> {
		let mut before = after.clone();
		if !self.revert(&mut before) {
			return None;
		}
		self.delta_between(&before, after, encoding)
	}

	/// Resolves the edit against both sides. A `\r\n` pair that the edit
	/// splits or joins moves line boundaries next to the edit, so the start and
	/// old end come from `before` and the new end from `after`.
	fn delta_between(&self, before: &Rope, after: &Rope, encoding: OffsetEncoding) -> Option<EditDelta> {
		Some(EditDelta::new(
			char_to_lsp_position(before, self.offset, encoding)?,
			char_to_lsp_position(before, self.offset + self.removed_chars(), encoding)?,
			char_to_lsp_position(after, self.offset + self.inserted_chars(), encoding)?,
		))
	}
}

/// Replaces `len` characters at `offset` with `text`.
fn splice(rope: &mut Rope, offset: usize, len: usize, text: &str) -> bool {
	let end = offset + len;
	if end > rope.len_chars() {
		return false;
	}
	rope.remove(offset..end);
	rope.insert(offset, text);
	true
}
