use std::fmt;

/// LSP position in line/character coordinates.
///
/// Ordered by line, then character. `character` counts code units of the
/// session's [`OffsetEncoding`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LspPosition {
	/// Zero-based line index.
	pub line: u32,
	/// Zero-based character offset in the line.
	pub character: u32,
}

impl LspPosition {
	/// Creates a new LSP position.
	pub const fn new(line: u32, character: u32) -> Self {
		Self { line, character }
	}
}

impl fmt::Display for LspPosition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.line, self.character)
	}
}

/// LSP range with start and end positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LspRange {
	/// Start position (inclusive).
	pub start: LspPosition,
	/// End position (exclusive).
	pub end: LspPosition,
}

impl LspRange {
	/// Creates a new LSP range.
	pub const fn new(start: LspPosition, end: LspPosition) -> Self {
		Self { start, end }
	}

	/// Creates a zero-length range at a position.
	pub const fn point(pos: LspPosition) -> Self {
		Self { start: pos, end: pos }
	}

	/// Returns `true` if the range covers no text.
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}
}

impl fmt::Display for LspRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}..{}", self.start, self.end)
	}
}

/// Offset encoding for LSP positions.
///
/// Decides how many units one character occupies in `LspPosition::character`.
/// LSP uses UTF-16 unless the server negotiates something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OffsetEncoding {
	/// UTF-8 byte offsets.
	Utf8,
	/// UTF-16 code unit offsets (LSP default).
	#[default]
	Utf16,
	/// UTF-32 / Unicode codepoint offsets.
	Utf32,
}

impl OffsetEncoding {
	/// Parse from the LSP `PositionEncodingKind` label (`"utf-8"`, `"utf-16"`, `"utf-32"`).
	pub fn from_label(label: &str) -> Option<Self> {
		match label {
			"utf-8" => Some(Self::Utf8),
			"utf-16" => Some(Self::Utf16),
			"utf-32" => Some(Self::Utf32),
			_ => None,
		}
	}

	/// The LSP `PositionEncodingKind` label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Utf8 => "utf-8",
			Self::Utf16 => "utf-16",
			Self::Utf32 => "utf-32",
		}
	}

	/// Number of code units `ch` occupies in this encoding.
	pub fn char_units(self, ch: char) -> u32 {
		match self {
			Self::Utf8 => ch.len_utf8() as u32,
			Self::Utf16 => ch.len_utf16() as u32,
			Self::Utf32 => 1,
		}
	}

	/// Number of code units `text` occupies in this encoding.
	pub fn str_units(self, text: &str) -> u32 {
		match self {
			Self::Utf8 => text.len() as u32,
			Self::Utf16 => text.encode_utf16().count() as u32,
			Self::Utf32 => text.chars().count() as u32,
		}
	}
}

impl fmt::Display for OffsetEncoding {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
