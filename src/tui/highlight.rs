//! Syntax highlighting for code blocks (syntect), with an optional
//! line-number gutter.

use std::sync::LazyLock;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";
const PLAIN_FG: Color = Color::White;
const GUTTER_FG: Color = Color::DarkGray;

/// Renders `code` as one `Line` per source line.
///
/// `lang` is the fence's language tag; unknown or missing tags fall back to
/// plain text.
pub fn highlight(code: &str, lang: Option<&str>, line_numbers: bool) -> Vec<Line<'static>> {
    let mut lines = highlighted_lines(code, lang);
    if lines.is_empty() {
        lines.push(Line::default());
    }
    if line_numbers {
        add_gutter(&mut lines);
    }
    lines
}

fn highlighted_lines(code: &str, lang: Option<&str>) -> Vec<Line<'static>> {
    let syntax = lang.and_then(|token| SYNTAX_SET.find_syntax_by_token(token));
    let (Some(syntax), Some(theme)) = (syntax, THEME_SET.themes.get(THEME)) else {
        return code
            .lines()
            .map(|line| Line::from(Span::styled(expand_tabs(line), Style::default().fg(PLAIN_FG))))
            .collect();
    };

    let mut highlighter = HighlightLines::new(syntax, theme);
    LinesWithEndings::from(code)
        .map(|line| match highlighter.highlight_line(line, &SYNTAX_SET) {
            Ok(ranges) => Line::from(
                ranges
                    .into_iter()
                    .filter_map(|(style, fragment)| {
                        let content = expand_tabs(fragment.trim_end_matches(['\n', '\r']));
                        if content.is_empty() {
                            return None;
                        }
                        let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
                        Some(Span::styled(content, Style::default().fg(fg)))
                    })
                    .collect::<Vec<_>>(),
            ),
            Err(_) => Line::from(Span::styled(
                expand_tabs(line.trim_end_matches(['\n', '\r'])),
                Style::default().fg(PLAIN_FG),
            )),
        })
        .collect()
}

/// Ratatui renders `\t` as zero-width.
fn expand_tabs(text: &str) -> String {
    text.replace('\t', "    ")
}

fn add_gutter(lines: &mut [Line<'static>]) {
    let width = lines.len().to_string().len();
    let style = Style::default().fg(GUTTER_FG);
    for (index, line) in lines.iter_mut().enumerate() {
        line.spans
            .insert(0, Span::styled(format!("{:>width$} │ ", index + 1), style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn one_line_per_source_line() {
        let lines = highlight("a = 1\nb = 2\n", Some("python"), false);
        assert_eq!(lines.len(), 2);
        assert_eq!(plain(&lines[0]), "a = 1");
        assert_eq!(plain(&lines[1]), "b = 2");
    }

    #[test]
    fn known_language_is_colored() {
        let lines = highlight("fn main() {}\n", Some("rust"), false);
        assert!(lines[0].spans.iter().any(|s| matches!(s.style.fg, Some(Color::Rgb(..)))));
    }

    #[test]
    fn unknown_language_falls_back_to_plain() {
        let lines = highlight("whatever\n", Some("no-such-lang"), false);
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[0].spans[0].style.fg, Some(PLAIN_FG));
    }

    #[test]
    fn gutter_is_right_aligned() {
        let code: String = (1..=10).map(|n| format!("x{n}\n")).collect();
        let lines = highlight(&code, None, true);
        assert_eq!(plain(&lines[0]), " 1 │ x1");
        assert_eq!(plain(&lines[9]), "10 │ x10");
    }

    #[test]
    fn empty_code_still_has_a_line() {
        assert_eq!(highlight("", None, true).len(), 1);
    }

    #[test]
    fn tabs_expanded_to_spaces() {
        let lines = highlight("\tindented\n", None, false);
        assert_eq!(plain(&lines[0]), "    indented");
    }
}
