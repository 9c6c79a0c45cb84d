//! Carrying positions and ranges forward across edits.
//!
//! A range recorded against an earlier revision of a buffer is re-anchored by
//! folding [`EditDelta::rebase`] over the deltas recorded since. The transform
//! is closed-form: it reads only the range and the deltas, never the text.

use crate::delta::EditDelta;
use crate::lsp::{LspPosition, LspRange};

impl EditDelta {
	/// Maps `range` from before this edit to after it.
	///
	/// Boundary rules:
	/// * an edit starting exactly at `range.end` leaves the range untouched;
	/// * an edit whose old end lands exactly at `range.start` translates the
	///   whole range;
	/// * an edit whose old end lands exactly at `range.end` keeps the range
	///   start and shifts its end.
	///
	/// When the replaced span runs past `range.end` the remainder of the range
	/// was overwritten and it collapses onto the edit start.
	pub fn rebase(&self, range: LspRange) -> LspRange {
		if self.start >= range.end {
			return range;
		}

		if self.old_end <= range.start {
			return LspRange::new(self.shift(range.start), self.shift(range.end));
		}

		let start = range.start.min(self.start);
		if self.old_end <= range.end {
			LspRange::new(start, self.shift(range.end))
		} else {
			LspRange::new(start, self.start)
		}
	}

	/// Translates a position at or after `old_end` into post-edit coordinates.
	fn shift(&self, pos: LspPosition) -> LspPosition {
		if pos.line == self.old_end.line {
			LspPosition::new(
				self.new_end.line,
				self.new_end
					.character
					.saturating_add(pos.character.saturating_sub(self.old_end.character)),
			)
		} else {
			LspPosition::new(
				self.new_end.line.saturating_add(pos.line.saturating_sub(self.old_end.line)),
				pos.character,
			)
		}
	}
}

/// Rebases `range` across `deltas`, oldest first.
pub fn rebase_range<'a>(range: LspRange, deltas: impl IntoIterator<Item = &'a EditDelta>) -> LspRange {
	deltas.into_iter().fold(range, |range, delta| delta.rebase(range))
}

/// Rebases a single position across `deltas`, oldest first.
///
/// The position is treated as a zero-width range, so an edit starting exactly
/// at it leaves it in place.
pub fn rebase_position<'a>(pos: LspPosition, deltas: impl IntoIterator<Item = &'a EditDelta>) -> LspPosition {
	rebase_range(LspRange::point(pos), deltas).start
}
