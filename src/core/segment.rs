//! # Segment Parser
//!
//! Splits a (possibly still growing) response buffer into an ordered list of
//! [`Segment`]s: runs of prose and fenced code blocks.
//!
//! ```text
//! "Here you go:\n```rust\nfn main() {}\n```\nDone."
//!  └──── Prose ───┘└────────── Code ─────────┘└Prose┘
//! ```
//!
//! Each segment keeps its exact byte span in the buffer plus a `display`
//! string: the code body without its fence lines for code, the trimmed text
//! for prose.
//!
//! ## Streaming vs. final
//!
//! While tokens are still arriving, anything that is not yet decidable is left
//! out of the result and reported through [`Analysis::consumed`]:
//!
//! - a fence that has been opened but not closed, and
//! - an unterminated last line that is (or may still grow into) an opening
//!   fence, e.g. `` ` `` or ```` ```py ````.
//!
//! [`Mode::Final`] is used once the stream has ended: an open fence is then
//! closed by the end of the buffer and emitted as code.
//!
//! The parser never fails. Whitespace-only prose runs are consumed without
//! producing a segment.

use std::borrow::Cow;
use std::ops::Range;

/// The two kinds of widget a segment can become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Prose,
    Code,
}

/// A classified run of the response buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    /// Byte range of `raw` within the parsed buffer.
    pub span: Range<usize>,
    /// Exact source text, fence lines included.
    pub raw: &'a str,
    /// Code body for code, trimmed text for prose.
    pub display: Cow<'a, str>,
}

impl Segment<'_> {
    /// Language tag of a code segment's opening fence, if any.
    pub fn language(&self) -> Option<&str> {
        match self.kind {
            SegmentKind::Code => fence_language(self.raw),
            SegmentKind::Prose => None,
        }
    }
}

/// How to treat input whose classification is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// More input may follow: undecided tails are held back.
    #[default]
    Streaming,
    /// The buffer is complete: open fences end at the end of the buffer.
    Final,
}

/// Result of scanning a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis<'a> {
    pub segments: Vec<Segment<'a>>,
    /// End of the analyzed prefix. Bytes from here on are pending.
    pub consumed: usize,
}

/// Parse a buffer that may still grow.
pub fn parse(buffer: &str) -> Vec<Segment<'_>> {
    analyze(buffer, Mode::Streaming).segments
}

/// Parse a buffer whose stream has ended.
pub fn parse_final(buffer: &str) -> Vec<Segment<'_>> {
    analyze(buffer, Mode::Final).segments
}

/// Scan `buffer` into segments, reporting how much of it was decided.
pub fn analyze(buffer: &str, mode: Mode) -> Analysis<'_> {
    let mut segments = Vec::new();
    let mut prose_start = 0;
    let mut consumed = buffer.len();
    let mut pos = 0;

    while let Some(line) = line_at(buffer, pos) {
        let Some(fence) = opening_fence(line.text) else {
            if mode == Mode::Streaming && !line.terminated && may_become_fence(line.text) {
                consumed = line.start;
                break;
            }
            pos = line.next;
            continue;
        };

        // An opener still being typed could gain an info string or turn out
        // not to be a fence at all.
        if mode == Mode::Streaming && !line.terminated {
            consumed = line.start;
            break;
        }

        let Some(block) = fenced_block(buffer, &line, fence, mode) else {
            consumed = line.start;
            break;
        };

        push_prose(&mut segments, buffer, prose_start..line.start);
        pos = block.span.end;
        prose_start = pos;
        segments.push(block);
    }

    push_prose(&mut segments, buffer, prose_start..consumed);
    Analysis { segments, consumed }
}

/// Language tag from the opening fence line of `raw`.
///
/// ```
/// use parley::core::segment::fence_language;
/// assert_eq!(fence_language("```python\nprint(1)\n```"), Some("python"));
/// assert_eq!(fence_language("~~~\nplain\n~~~"), None);
/// ```
pub fn fence_language(raw: &str) -> Option<&str> {
    let first = raw.split('\n').next()?;
    let (_, info) = opening_fence_with_info(first)?;
    info.split_whitespace().next()
}

// ── Lines ───────────────────────────────────────────────────────────────────

struct Line<'a> {
    start: usize,
    /// Line content without the trailing `\n`.
    text: &'a str,
    /// Offset of the next line (past the `\n`, or the buffer end).
    next: usize,
    terminated: bool,
}

fn line_at(buffer: &str, start: usize) -> Option<Line<'_>> {
    let rest = buffer.get(start..).filter(|rest| !rest.is_empty())?;
    Some(match rest.find('\n') {
        Some(i) => Line {
            start,
            text: &rest[..i],
            next: start + i + 1,
            terminated: true,
        },
        None => Line {
            start,
            text: rest,
            next: buffer.len(),
            terminated: false,
        },
    })
}

// ── Fences ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fence {
    marker: u8,
    len: usize,
    indent: usize,
}

/// Splits up to three leading spaces off `line`. `None` if there are more.
fn fence_indent(line: &str) -> Option<(usize, &str)> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let rest = line.trim_start_matches(' ');
    let indent = line.len() - rest.len();
    (indent <= 3).then_some((indent, rest))
}

fn marker_run(rest: &str, marker: u8) -> usize {
    rest.bytes().take_while(|&b| b == marker).count()
}

fn opening_fence_with_info(line: &str) -> Option<(Fence, &str)> {
    let (indent, rest) = fence_indent(line)?;
    let marker = *rest.as_bytes().first()?;
    if marker != b'`' && marker != b'~' {
        return None;
    }
    let len = marker_run(rest, marker);
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == b'`' && info.contains('`') {
        return None;
    }
    Some((Fence { marker, len, indent }, info))
}

fn opening_fence(line: &str) -> Option<Fence> {
    opening_fence_with_info(line).map(|(fence, _)| fence)
}

fn closes(fence: Fence, line: &str) -> bool {
    let Some((_, rest)) = fence_indent(line) else {
        return false;
    };
    let len = marker_run(rest, fence.marker);
    len >= fence.len && rest[len..].trim().is_empty()
}

/// True if appending characters to `line` could still make it an opener.
fn may_become_fence(line: &str) -> bool {
    let Some((_, rest)) = fence_indent(line) else {
        return false;
    };
    match rest.as_bytes().first() {
        None => true,
        Some(&m) if m == b'`' || m == b'~' => rest.bytes().all(|b| b == m),
        Some(_) => false,
    }
}

// ── Segment construction ────────────────────────────────────────────────────

fn fenced_block<'a>(
    buffer: &'a str,
    opener: &Line<'a>,
    fence: Fence,
    mode: Mode,
) -> Option<Segment<'a>> {
    let body_start = opener.next;
    let mut pos = body_start;
    while let Some(line) = line_at(buffer, pos) {
        if closes(fence, line.text) {
            return Some(code_segment(
                buffer,
                opener.start..line.next,
                body_start..line.start,
                fence.indent,
            ));
        }
        pos = line.next;
    }

    match mode {
        Mode::Streaming => None,
        Mode::Final => Some(code_segment(
            buffer,
            opener.start..buffer.len(),
            body_start..buffer.len(),
            fence.indent,
        )),
    }
}

fn code_segment(buffer: &str, span: Range<usize>, body: Range<usize>, indent: usize) -> Segment<'_> {
    let body = &buffer[body];
    let display = if indent == 0 {
        Cow::Borrowed(body)
    } else {
        Cow::Owned(strip_indent(body, indent))
    };
    Segment {
        kind: SegmentKind::Code,
        raw: &buffer[span.clone()],
        span,
        display,
    }
}

/// Removes up to `indent` leading spaces from every body line.
fn strip_indent(body: &str, indent: usize) -> String {
    body.split_inclusive('\n')
        .map(|line| {
            let spaces = line.len() - line.trim_start_matches(' ').len();
            &line[spaces.min(indent)..]
        })
        .collect()
}

fn push_prose<'a>(segments: &mut Vec<Segment<'a>>, buffer: &'a str, span: Range<usize>) {
    let raw = &buffer[span.clone()];
    let display = raw.trim();
    if display.is_empty() {
        return;
    }
    segments.push(Segment {
        kind: SegmentKind::Prose,
        span,
        raw,
        display: Cow::Borrowed(display),
    });
}
