//! Wrapping and boundary helpers for the InputBox, plus its dimensions.
//!
//! Stateless; nothing here knows about `InputBox` or `CursorState`.

/// Border (2) + padding (2) consumed horizontally by the bordered block
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders consumed vertically
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Visible content lines before internal scrolling kicks in
pub(super) const COLLAPSED_LINES: u16 = 5;
/// Visible content lines while the input is expanded
pub(super) const EXPANDED_LINES: u16 = 15;
/// Column offset from the area's left edge to the text (border + padding)
pub(super) const TEXT_OFFSET_X: u16 = 2;
/// Row offset from the area's top edge to the text (border)
pub(super) const TEXT_OFFSET_Y: u16 = 1;

pub(super) fn wrap_options(inner_width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(inner_width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

/// Width left for text once borders and padding are taken out; 0 if none.
pub(super) fn inner_width(content_width: u16) -> u16 {
    content_width.saturating_sub(HORIZONTAL_OVERHEAD)
}

/// Wrapped lines of `text`, with the empty line a trailing newline opens.
pub(super) fn wrapped_lines(text: &str, width: u16) -> Vec<String> {
    if width == 0 || text.is_empty() {
        return vec![String::new()];
    }
    let mut lines: Vec<String> = textwrap::wrap(text, wrap_options(width))
        .into_iter()
        .map(|line| line.into_owned())
        .collect();
    if lines.is_empty() {
        lines.push(String::new());
    }
    if text.ends_with('\n') && !lines.last().is_some_and(|l| l.is_empty()) {
        lines.push(String::new());
    }
    lines
}

pub(super) fn wrap_line_count(text: &str, width: u16) -> u16 {
    u16::try_from(wrapped_lines(text, width).len()).unwrap_or(u16::MAX)
}

pub(super) fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(super) fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `pos` (readline `backward-word`): skip
/// separators, then word characters.
pub(super) fn prev_word_boundary(text: &str, pos: usize) -> usize {
    let before = &text[..pos];
    let word_end = before
        .char_indices()
        .rev()
        .find(|&(_, c)| is_word_char(c))
        .map(|(i, c)| i + c.len_utf8());
    let Some(word_end) = word_end else {
        return 0;
    };
    before[..word_end]
        .char_indices()
        .rev()
        .find(|&(_, c)| !is_word_char(c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0)
}

/// End of the word after `pos` (readline `forward-word`).
pub(super) fn next_word_boundary(text: &str, pos: usize) -> usize {
    let after = &text[pos..];
    let Some(word_start) = after.find(is_word_char) else {
        return text.len();
    };
    after[word_start..]
        .find(|c: char| !is_word_char(c))
        .map(|i| pos + word_start + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_one_line() {
        assert_eq!(wrap_line_count("", 80), 1);
        assert_eq!(wrap_line_count("hello", 0), 1);
    }

    #[test]
    fn long_text_wraps() {
        assert_eq!(wrap_line_count("aaaaaaaaaa", 5), 2);
        assert_eq!(wrap_line_count("a\nb\nc", 80), 3);
    }

    #[test]
    fn trailing_newline_opens_a_line() {
        assert_eq!(wrapped_lines("hello\n", 80), ["hello", ""]);
        assert_eq!(wrap_line_count("aaaaaaaaaa\n", 5), 3);
    }

    #[test]
    fn char_boundaries_respect_utf8() {
        let s = "a🔥b";
        assert_eq!(prev_char_boundary(s, 5), 1);
        assert_eq!(prev_char_boundary(s, 1), 0);
        assert_eq!(next_char_boundary(s, 1), 5);
        assert_eq!(next_char_boundary(s, 5), 6);
    }

    #[test]
    fn word_left() {
        assert_eq!(prev_word_boundary("hello world", 11), 6);
        assert_eq!(prev_word_boundary("hello world", 8), 6);
        assert_eq!(prev_word_boundary("hello world", 6), 0);
        assert_eq!(prev_word_boundary("foo.bar", 7), 4);
        assert_eq!(prev_word_boundary("   ", 3), 0);
        assert_eq!(prev_word_boundary("café latte", "café latte".len()), 6);
    }

    #[test]
    fn word_right() {
        assert_eq!(next_word_boundary("hello world", 0), 5);
        assert_eq!(next_word_boundary("hello world", 5), 11);
        assert_eq!(next_word_boundary("hello_world test", 0), 11);
        assert_eq!(next_word_boundary("café latte", 0), 5);
        assert_eq!(next_word_boundary("end  ", 3), 5);
    }
}
