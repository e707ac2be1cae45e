//! Token scanning for autocomplete.
//!
//! A token is a maximal run of symbol characters ending at the caret. The
//! scan never recognizes a token that starts at the absolute beginning of
//! the text: without a boundary character before it there is no way to
//! tell a fresh token from the tail of something larger.

/// Whether a character can appear in an autocompletable symbol.
///
/// ASCII alphanumerics, `_`, `$`, any supplementary-plane code point, and
/// the zero-width joiners (so emoji sequences stay in one token).
pub fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c == '$'
        || c as u32 >= 0x10000
        || c == '\u{200C}'
        || c == '\u{200D}'
}

/// The symbol token ending at character `offset`, with its start offset.
///
/// Returns `None` for a zero-length token or when the scan runs off the
/// start of the text.
pub fn token_ending_at(text: &str, offset: usize) -> Option<(usize, &str)> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let offset = offset.min(chars.len());

    let mut start = offset;
    while start > 0 && is_symbol_char(chars[start - 1].1) {
        start -= 1;
    }

    if start == offset || start == 0 {
        return None;
    }

    let byte_start = chars[start].0;
    let byte_end = chars
        .get(offset)
        .map(|&(i, _)| i)
        .unwrap_or(text.len());
    Some((start, &text[byte_start..byte_end]))
}
