//! Prose markdown → ratatui `Text`.
//!
//! Fenced code never reaches this module; the segment parser splits it into
//! separate code blocks first. What is left is rendered minimally: headings
//! as bold text (no `#` markers), emphasis, inline code, lists, block quotes
//! and links. Indented code blocks are shown as plain, dimmed lines.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};

/// Render `content` with `base_fg` as the body color.
pub fn render(content: &str, base_fg: Color) -> Text<'static> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);

    let mut w = Writer::new(base_fg);
    for event in Parser::new_ext(content, opts) {
        w.handle(event);
    }
    w.text
}

struct Writer {
    text: Text<'static>,
    base_fg: Color,
    /// Inline styles, composed with `patch` so bold inside italic works.
    styles: Vec<Style>,
    /// Prefix spans repeated on every line (block quote bars).
    prefixes: Vec<Span<'static>>,
    /// None = bullet list, Some(n) = ordered list at item n.
    lists: Vec<Option<u64>>,
    in_code: bool,
    link_url: Option<String>,
    /// A blank line goes before the next block element.
    pending_gap: bool,
}

impl Writer {
    fn new(base_fg: Color) -> Self {
        Self {
            text: Text::default(),
            base_fg,
            styles: Vec::new(),
            prefixes: Vec::new(),
            lists: Vec::new(),
            in_code: false,
            link_url: None,
            pending_gap: false,
        }
    }

    fn style(&self) -> Style {
        self.styles
            .last()
            .copied()
            .unwrap_or_else(|| Style::default().fg(self.base_fg))
    }

    fn push_style(&mut self, overlay: Style) {
        self.styles.push(self.style().patch(overlay));
    }

    fn new_line(&mut self) {
        let mut line = Line::default();
        line.spans.extend(self.prefixes.iter().cloned());
        self.text.lines.push(line);
    }

    fn push_span(&mut self, span: Span<'static>) {
        if self.text.lines.is_empty() {
            self.new_line();
        }
        if let Some(line) = self.text.lines.last_mut() {
            line.push_span(span);
        }
    }

    fn start_block(&mut self) {
        if self.pending_gap {
            self.new_line();
            self.pending_gap = false;
        }
        self.new_line();
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => self.push_span(Span::styled(
                c.to_string(),
                Style::default().fg(Color::White).bg(Color::DarkGray),
            )),
            Event::SoftBreak => self.push_span(Span::raw(" ")),
            Event::HardBreak => self.new_line(),
            Event::Rule => {
                self.start_block();
                self.push_span(Span::styled("─".repeat(40), Style::default().fg(Color::DarkGray)));
                self.pending_gap = true;
            }
            Event::TaskListMarker(checked) => {
                self.push_span(Span::raw(if checked { "[x] " } else { "[ ] " }));
            }
            _ => {}
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                // The first paragraph of a list item continues the marker line
                if self.lists.is_empty() || !self.line_is_marker_only() {
                    self.start_block();
                }
            }
            Tag::Heading { level, .. } => {
                self.start_block();
                self.push_style(heading_style(level));
            }
            Tag::BlockQuote(_) => {
                self.start_block();
                self.pending_gap = false;
                self.prefixes
                    .push(Span::styled("│ ", Style::default().fg(Color::DarkGray)));
                self.push_style(Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM));
                // The opening line was created before the bar was pushed
                self.text.lines.pop();
            }
            Tag::CodeBlock(_) => {
                self.start_block();
                self.text.lines.pop();
                self.in_code = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() && !self.text.lines.is_empty() {
                    self.pending_gap = true;
                }
                self.lists.push(start);
            }
            Tag::Item => {
                if self.pending_gap {
                    self.new_line();
                    self.pending_gap = false;
                }
                self.new_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.push_span(Span::styled(marker, Style::default().fg(Color::DarkGray)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT)),
            Tag::Link { dest_url, .. } => {
                self.link_url = Some(dest_url.to_string());
                self.push_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED));
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::CodeBlock => {
                self.in_code = false;
                self.pending_gap = true;
            }
            TagEnd::Heading(_) => {
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::BlockQuote(_) => {
                self.prefixes.pop();
                self.styles.pop();
                self.pending_gap = true;
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.pending_gap = self.lists.is_empty();
            }
            TagEnd::Item => self.pending_gap = false,
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(url) = self.link_url.take() {
                    self.push_span(Span::styled(
                        format!(" ({url})"),
                        Style::default().fg(Color::DarkGray),
                    ));
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, cow: CowStr<'_>) {
        let text = cow.replace('\t', "    ");
        if self.in_code {
            let style = Style::default().fg(self.base_fg).add_modifier(Modifier::DIM);
            for line in text.lines() {
                self.new_line();
                self.push_span(Span::styled(format!("    {line}"), style));
            }
            return;
        }
        let style = self.style();
        self.push_span(Span::styled(text, style));
    }

    /// True if the current line holds only prefixes and a list marker.
    fn line_is_marker_only(&self) -> bool {
        self.text.lines.last().is_some_and(|line| {
            line.spans.len() == self.prefixes.len() + 1
                && line.spans.last().is_some_and(|s| {
                    let marker = s.content.trim();
                    marker == "•" || marker.ends_with('.')
                })
        })
    }
}

fn heading_style(level: HeadingLevel) -> Style {
    match level {
        HeadingLevel::H1 => Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        _ => Style::default().add_modifier(Modifier::BOLD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &Text<'_>) -> Vec<String> {
        text.lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn heading_is_bold_without_hashes() {
        let text = render("## Setup", Color::Blue);
        assert_eq!(lines(&text), ["Setup"]);
        let span = &text.lines[0].spans[0];
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(span.style.fg, Some(Color::Blue));
    }

    #[test]
    fn bold_text_is_bold() {
        let text = render("Some **bold** text", Color::Blue);
        let bold = text.lines[0].spans.iter().find(|s| s.content == "bold").unwrap();
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn inline_code_styled() {
        let text = render("Use `foo()` here", Color::Blue);
        let code = text.lines[0].spans.iter().find(|s| s.content == "foo()").unwrap();
        assert_eq!(code.style.bg, Some(Color::DarkGray));
    }

    #[test]
    fn paragraphs_are_separated_by_blank_line() {
        let text = render("first\n\nsecond", Color::Green);
        assert_eq!(lines(&text), ["first", "", "second"]);
    }

    #[test]
    fn lists_get_markers() {
        let text = render("- a\n- b\n\n1. x\n2. y", Color::Green);
        let rendered = lines(&text);
        assert!(rendered.contains(&"• a".to_string()), "{rendered:?}");
        assert!(rendered.contains(&"• b".to_string()), "{rendered:?}");
        assert!(rendered.contains(&"1. x".to_string()), "{rendered:?}");
        assert!(rendered.contains(&"2. y".to_string()), "{rendered:?}");
    }

    #[test]
    fn block_quote_lines_are_prefixed() {
        let text = render("> quoted", Color::Green);
        assert_eq!(lines(&text), ["│ quoted"]);
    }

    #[test]
    fn link_url_follows_text() {
        let text = render("[docs](https://example.com)", Color::Green);
        assert_eq!(lines(&text), ["docs (https://example.com)"]);
    }

    #[test]
    fn plain_text_uses_base_color() {
        let text = render("hello", Color::Green);
        assert_eq!(text.lines[0].spans[0].style.fg, Some(Color::Green));
    }
}
