use super::*;

#[test]
fn test_utf32_round_trip() {
	let text = Rope::from("hello\nworld\n");
	let encoding = OffsetEncoding::Utf32;

	let pos = LspPosition::new(0, 3);
	let char_idx = lsp_position_to_char(&text, pos, encoding).unwrap();
	assert_eq!(char_idx, 3);
	assert_eq!(char_to_lsp_position(&text, char_idx, encoding).unwrap(), pos);

	let pos = LspPosition::new(1, 2);
	let char_idx = lsp_position_to_char(&text, pos, encoding).unwrap();
	assert_eq!(char_idx, 8); // "hello\n" = 6 chars, + 2
	assert_eq!(char_to_lsp_position(&text, char_idx, encoding).unwrap(), pos);
}

#[test]
fn test_utf16_with_emoji() {
	// U+1F600 is one codepoint but two UTF-16 code units.
	let text = Rope::from("a\u{1F600}b\n");
	let encoding = OffsetEncoding::Utf16;

	assert_eq!(lsp_position_to_char(&text, LspPosition::new(0, 1), encoding), Some(1));
	assert_eq!(lsp_position_to_char(&text, LspPosition::new(0, 3), encoding), Some(2));

	let back = char_to_lsp_position(&text, 2, encoding).unwrap();
	assert_eq!(back.character, 3);
}

#[test]
fn test_utf16_inside_surrogate_pair_rounds_down() {
	let text = Rope::from("a\u{1F600}b");
	assert_eq!(lsp_position_to_char(&text, LspPosition::new(0, 2), OffsetEncoding::Utf16), Some(1));
}

#[test]
fn test_utf8_with_multibyte() {
	let text = Rope::from("caf\u{00E9}!\n");
	let encoding = OffsetEncoding::Utf8;

	assert_eq!(lsp_position_to_char(&text, LspPosition::new(0, 3), encoding), Some(3));
	// U+00E9 occupies bytes 3..5, so '!' sits at byte 5.
	assert_eq!(char_to_lsp_position(&text, 4, encoding).unwrap().character, 5);
	assert_eq!(lsp_position_to_char(&text, LspPosition::new(0, 5), encoding), Some(4));
}

#[test]
fn test_out_of_bounds() {
	let text = Rope::from("hello\n");
	let encoding = OffsetEncoding::Utf32;

	assert!(lsp_position_to_char(&text, LspPosition::new(5, 0), encoding).is_none());
	assert!(char_to_lsp_position(&text, 100, encoding).is_none());
}

#[test]
fn test_end_of_text_is_valid() {
	let text = Rope::from("hello\n");
	let end = char_to_lsp_position(&text, text.len_chars(), OffsetEncoding::Utf16).unwrap();
	assert_eq!(end, LspPosition::new(1, 0));
}

#[test]
fn test_clamp_column() {
	let text = Rope::from("hi\n");
	let char_idx = lsp_position_to_char(&text, LspPosition::new(0, 100), OffsetEncoding::Utf32).unwrap();
	assert_eq!(char_idx, 2);
}

#[test]
fn test_clamp_column_excludes_crlf() {
	let text = Rope::from("hi\r\nthere");
	let char_idx = lsp_position_to_char(&text, LspPosition::new(0, 100), OffsetEncoding::Utf16).unwrap();
	assert_eq!(char_idx, 2);
	assert_eq!(char_to_lsp_position(&text, 4, OffsetEncoding::Utf16).unwrap(), LspPosition::new(1, 0));
}

#[test]
fn test_range_conversion() {
	let text = Rope::from("hello\nworld\n");
	let encoding = OffsetEncoding::Utf32;

	let lsp_range = LspRange::new(LspPosition::new(0, 1), LspPosition::new(1, 3));

	let (start, end) = lsp_range_to_char_range(&text, lsp_range, encoding).unwrap();
	assert_eq!(start, 1);
	assert_eq!(end, 9);

	let back = char_range_to_lsp_range(&text, start, end, encoding).unwrap();
	assert_eq!(back, lsp_range);
}
