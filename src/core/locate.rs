//! Tag span location over raw source lines.
//!
//! Finds an opening tag from an upstream-reported line/column and tag name,
//! then scans forward to the `>` that closes it. No host-language grammar is
//! involved: a small scanner keeps `>` characters that live inside quoted
//! literals or `{ ... }` expressions from being read as the tag's close, which
//! is enough for both JSX and HTML-style templates.

/// How far (in characters) a reported column may drift from the real `<`.
pub const COLUMN_TOLERANCE: usize = 2;

/// Coarse scanner state, exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// Tag name, attribute names, whitespace.
    Normal,
    /// Inside a quoted literal opened by the given quote character.
    InString(char),
    /// Inside a brace expression at the given depth (no open string).
    InExpression(usize),
}

/// Character-level scanner for one opening tag.
///
/// Tracks bracket depth, an optional open quote (with backslash escapes) and
/// brace depth. Brackets only count outside strings and outside braces.
#[derive(Debug, Default, Clone)]
pub struct TagScanner {
    bracket_depth: usize,
    brace_depth: usize,
    quote: Option<char>,
    escaped: bool,
}

impl TagScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        match (self.quote, self.brace_depth) {
            (Some(q), _) => ScanState::InString(q),
            (None, 0) => ScanState::Normal,
            (None, depth) => ScanState::InExpression(depth),
        }
    }

    /// Feed one character; returns true when it is the tag's closing `>`.
    pub fn feed(&mut self, ch: char) -> bool {
        if let Some(q) = self.quote {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == q {
                self.quote = None;
            }
            return false;
        }

        match ch {
            '"' | '\'' | '`' => self.quote = Some(ch),
            '{' => self.brace_depth += 1,
            '}' => self.brace_depth = self.brace_depth.saturating_sub(1),
            '<' if self.brace_depth == 0 => self.bracket_depth += 1,
            // A stray `>` before any `<` (e.g. an arrow) never closes anything
            '>' if self.brace_depth == 0 && self.bracket_depth > 0 => {
                self.bracket_depth -= 1;
                return self.bracket_depth == 0;
            }
            _ => {}
        }
        false
    }
}

/// Byte position of the `<` that opens `tag_name` near the 1-based `column`.
///
/// The exact column is tried first, then neighbours up to
/// [`COLUMN_TOLERANCE`] characters away, nearest first (left before right on
/// ties). Only the first `<` found is verified: it must be followed by
/// `tag_name` and then whitespace, `>`, `/` or end of line.
pub fn locate_tag_start(line: &str, column: usize, tag_name: &str) -> Option<usize> {
    if column == 0 || tag_name.is_empty() {
        return None;
    }

    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let last = chars.len().checked_sub(1)?;
    let c = column - 1;
    let lo = c.saturating_sub(COLUMN_TOLERANCE);
    let hi = c.saturating_add(COLUMN_TOLERANCE).min(last);

    let candidate = std::iter::once(Some(c))
        .chain((1..=COLUMN_TOLERANCE).flat_map(|d| [c.checked_sub(d), c.checked_add(d)]))
        .flatten()
        .filter(|&i| i >= lo && i <= hi)
        .find(|&i| chars[i].1 == '<')?;

    let start = chars[candidate].0;
    let after = line[start + 1..].strip_prefix(tag_name)?;
    match after.chars().next() {
        None => Some(start),
        Some(ch) if ch.is_whitespace() || ch == '>' || ch == '/' => Some(start),
        Some(_) => None,
    }
}

/// Byte index just past the tag name, i.e. where a new attribute goes.
pub fn locate_insertion_point(line: &str, column: usize, tag_name: &str) -> Option<usize> {
    locate_tag_start(line, column, tag_name).map(|start| start + 1 + tag_name.len())
}

/// Scan from `(start_line, start_byte)` for the `>` closing the tag there.
///
/// Returns `(line index, byte index of '>')`, or `None` when the input ends
/// first. String state carries across line breaks (template literals).
pub fn find_tag_close<S: AsRef<str>>(
    lines: &[S],
    start_line: usize,
    start_byte: usize,
) -> Option<(usize, usize)> {
    let mut scanner = TagScanner::new();

    for (line_idx, line) in lines.iter().enumerate().skip(start_line) {
        let text = line.as_ref();
        let from = if line_idx == start_line { start_byte } else { 0 };
        let segment = text.get(from..)?;

        for (offset, ch) in segment.char_indices() {
            if scanner.feed(ch) {
                return Some((line_idx, from + offset));
            }
        }
    }

    None
}

/// Index of the line holding the `>` that closes the tag begun on
/// `start_line`; falls back to `start_line` when no close is found.
pub fn locate_tag_end_line<S: AsRef<str>>(lines: &[S], start_line: usize) -> usize {
    find_tag_close(lines, start_line, 0)
        .map(|(line, _)| line)
        .unwrap_or(start_line)
}

/// Textual extent of one opening tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    /// Line holding the `<`.
    pub start_line: usize,
    /// Byte offset of the `<` in `start_line`.
    pub start: usize,
    /// Byte offset just past the tag name in `start_line`.
    pub name_end: usize,
    /// Line holding the closing `>` (or `start_line` when unclosed).
    pub end_line: usize,
    /// Exclusive byte offset of the span's end in `end_line`.
    pub end: usize,
    /// Whether a closing `>` was actually found.
    pub closed: bool,
}

impl TagSpan {
    /// Span text with original line breaks rejoined as `\n`.
    pub fn text<S: AsRef<str>>(&self, lines: &[S]) -> String {
        if self.start_line == self.end_line {
            return lines[self.start_line].as_ref()[self.start..self.end].to_string();
        }

        let mut out = String::from(&lines[self.start_line].as_ref()[self.start..]);
        for line in &lines[self.start_line + 1..self.end_line] {
            out.push('\n');
            out.push_str(line.as_ref());
        }
        out.push('\n');
        out.push_str(&lines[self.end_line].as_ref()[..self.end]);
        out
    }

    /// Offset of the insertion point relative to the span text.
    pub fn insertion_offset(&self) -> usize {
        self.name_end - self.start
    }
}

/// Locate the full span of `tag_name` reported at 1-based `column` on line
/// `line_idx`. An unclosed tag degrades to the rest of its first line.
pub fn locate_tag_span<S: AsRef<str>>(
    lines: &[S],
    line_idx: usize,
    column: usize,
    tag_name: &str,
) -> Option<TagSpan> {
    let line = lines.get(line_idx)?.as_ref();
    let start = locate_tag_start(line, column, tag_name)?;
    let name_end = start + 1 + tag_name.len();

    let span = match find_tag_close(lines, line_idx, start) {
        Some((end_line, close)) => TagSpan {
            start_line: line_idx,
            start,
            name_end,
            end_line,
            end: close + 1,
            closed: true,
        },
        None => TagSpan {
            start_line: line_idx,
            start,
            name_end,
            end_line: line_idx,
            end: line.len(),
            closed: false,
        },
    };
    Some(span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_point_after_tag_name() {
        assert_eq!(locate_insertion_point("<input />", 1, "input"), Some(6));
        assert_eq!(locate_insertion_point("  <button>", 3, "button"), Some(9));
        assert_eq!(locate_insertion_point("<div", 1, "div"), Some(4));
    }

    #[test]
    fn huge_column_is_not_found() {
        assert_eq!(locate_insertion_point("<a>", usize::MAX, "a"), None);
        assert_eq!(locate_tag_span(&["<a>"], 0, usize::MAX - 1, "a"), None);
    }

    #[test]
    fn tolerates_small_column_drift() {
        let line = "    <a href=\"/\">";
        assert_eq!(locate_insertion_point(line, 5, "a"), Some(6));
        assert_eq!(locate_insertion_point(line, 3, "a"), Some(6));
        assert_eq!(locate_insertion_point(line, 7, "a"), Some(6));
        assert_eq!(locate_insertion_point(line, 8, "a"), None);
    }

    #[test]
    fn rejects_longer_tag_name_prefix() {
        assert_eq!(locate_tag_start("<ButtonGroup>", 1, "Button"), None);
        assert_eq!(locate_tag_start("<Button/>", 1, "Button"), Some(0));
        assert_eq!(locate_tag_start("<Button\tx>", 1, "Button"), Some(0));
    }

    #[test]
    fn rejects_out_of_range_columns() {
        assert_eq!(locate_tag_start("<a>", 0, "a"), None);
        assert_eq!(locate_tag_start("<a>", 40, "a"), None);
        assert_eq!(locate_tag_start("", 1, "a"), None);
    }

    #[test]
    fn columns_count_characters_not_bytes() {
        let line = "é <span>";
        assert_eq!(locate_tag_start(line, 3, "span"), Some(3));
    }

    #[test]
    fn end_line_skips_gt_inside_strings_and_braces() {
        let lines = [
            "<button",
            "  title=\"a > b\"",
            "  onClick={() => setOpen(x > 1)}",
            "  data-x={`${a}>`}",
            ">",
        ];
        assert_eq!(locate_tag_end_line(&lines, 0), 4);
    }

    #[test]
    fn end_line_same_line() {
        let lines = ["<input value={'>'} />", "<p>"];
        assert_eq!(locate_tag_end_line(&lines, 0), 0);
        assert_eq!(find_tag_close(&lines, 0, 0), Some((0, 20)));
    }

    #[test]
    fn end_line_fail_soft_when_unclosed() {
        let lines = ["<div className=\"oops", "still open"];
        assert_eq!(locate_tag_end_line(&lines, 0), 0);
    }

    #[test]
    fn escaped_quote_stays_inside_string() {
        let lines = [r#"<a onClick={() => alert("say \"hi\" >")}>"#];
        let (_, close) = find_tag_close(&lines, 0, 0).unwrap();
        assert_eq!(close, lines[0].len() - 1);
    }

    #[test]
    fn scanner_reports_state() {
        let mut s = TagScanner::new();
        assert_eq!(s.state(), ScanState::Normal);
        s.feed('<');
        s.feed('{');
        assert_eq!(s.state(), ScanState::InExpression(1));
        s.feed('"');
        assert_eq!(s.state(), ScanState::InString('"'));
        s.feed('"');
        s.feed('}');
        assert_eq!(s.state(), ScanState::Normal);
        assert!(s.feed('>'));
    }

    #[test]
    fn span_text_rejoins_lines() {
        let lines = ["  return <button", "  className=\"btn\"", "> Go"];
        let span = locate_tag_span(&lines, 0, 10, "button").unwrap();
        assert!(span.closed);
        assert_eq!(span.start, 9);
        assert_eq!(span.end_line, 2);
        assert_eq!(span.text(&lines), "<button\n  className=\"btn\"\n>");
        assert_eq!(span.insertion_offset(), 7);
    }

    #[test]
    fn span_anchored_at_tag_ignores_preceding_braces() {
        let lines = ["{open && <Modal", "  title=\"x\">"];
        let span = locate_tag_span(&lines, 0, 10, "Modal").unwrap();
        assert_eq!((span.end_line, span.end), (1, 12));
    }
}
