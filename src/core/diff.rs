//! Line diff and unified-diff rendering for annotation previews.
//!
//! The line matcher is a bounded-lookahead walk rather than an LCS: it keeps
//! both sides in lockstep and, on a mismatch, looks at most [`LOOKAHEAD`]
//! lines ahead for the nearest point where they agree again. Annotation
//! edits are single-line substitutions, so this is always exact for them and
//! still readable for anything else.

use serde::Serialize;

/// Context lines around each hunk.
pub const CONTEXT_LINES: usize = 3;

/// How far ahead the matcher searches for a resynchronization point.
pub const LOOKAHEAD: usize = 20;

/// One aligned record of the walk; indices are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOp {
    Equal { old: usize, new: usize },
    Remove { old: usize },
    Add { new: usize },
}

impl LineOp {
    fn old(self) -> Option<usize> {
        match self {
            LineOp::Equal { old, .. } | LineOp::Remove { old } => Some(old),
            LineOp::Add { .. } => None,
        }
    }

    fn new(self) -> Option<usize> {
        match self {
            LineOp::Equal { new, .. } | LineOp::Add { new } => Some(new),
            LineOp::Remove { .. } => None,
        }
    }

    fn is_change(self) -> bool {
        !matches!(self, LineOp::Equal { .. })
    }
}

/// A single hunk in a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize, // 1-based line number in old file
    pub old_count: usize, // Number of lines in old version
    pub new_start: usize, // 1-based line number in new file
    pub new_count: usize, // Number of lines in new version
    pub lines: Vec<HunkLine>,
}

/// A line in a hunk with its change type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String), // Unchanged line (starts with ' ')
    Remove(String),  // Removed line (starts with '-')
    Add(String),     // Added line (starts with '+')
}

/// Nearest `(skip_old, skip_new)` after which both sides agree again.
/// At equal offsets a substitution wins over an insertion, which wins over
/// a deletion.
fn find_sync<S: AsRef<str>>(a: &[S], b: &[S], i: usize, j: usize) -> Option<(usize, usize)> {
    let eq = |x: usize, y: usize| a[x].as_ref() == b[y].as_ref();

    for off in 1..=LOOKAHEAD {
        if i + off < a.len() && j + off < b.len() && eq(i + off, j + off) {
            return Some((off, off));
        }
        if j + off < b.len() && eq(i, j + off) {
            return Some((0, off));
        }
        if i + off < a.len() && eq(i + off, j) {
            return Some((off, 0));
        }
    }
    None
}

fn align<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<LineOp> {
    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].as_ref() == b[j].as_ref() {
            ops.push(LineOp::Equal { old: i, new: j });
            i += 1;
            j += 1;
            continue;
        }

        match find_sync(a, b, i, j) {
            Some((skip_old, skip_new)) => {
                ops.extend((i..i + skip_old).map(|old| LineOp::Remove { old }));
                ops.extend((j..j + skip_new).map(|new| LineOp::Add { new }));
                i += skip_old;
                j += skip_new;
            }
            None => break,
        }
    }

    // Either one side ran out or no sync point was found: flush both tails
    ops.extend((i..a.len()).map(|old| LineOp::Remove { old }));
    ops.extend((j..b.len()).map(|new| LineOp::Add { new }));
    ops
}

/// Start and count for one side of a hunk header.
///
/// With no lines on that side, the start is the last line before the hunk
/// (0 at file start), found by walking back through earlier records.
fn header_range(ops: &[LineOp], lo: usize, hi: usize, side: fn(LineOp) -> Option<usize>) -> (usize, usize) {
    let mut present = ops[lo..=hi].iter().filter_map(|&op| side(op));
    match present.next() {
        Some(first) => (first + 1, 1 + present.count()),
        None => {
            let before = ops[..lo].iter().rev().find_map(|&op| side(op));
            (before.map_or(0, |idx| idx + 1), 0)
        }
    }
}

/// Group aligned records into hunks with `context` lines on each side.
fn group_hunks<S: AsRef<str>>(a: &[S], b: &[S], ops: &[LineOp], context: usize) -> Vec<Hunk> {
    let changes: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| op.is_change())
        .map(|(idx, _)| idx)
        .collect();

    let mut groups: Vec<(usize, usize)> = Vec::new();
    for &idx in &changes {
        match groups.last_mut() {
            Some((_, last)) if idx - *last <= 2 * context => *last = idx,
            _ => groups.push((idx, idx)),
        }
    }

    groups
        .into_iter()
        .map(|(first, last)| {
            let lo = first.saturating_sub(context);
            let hi = (last + context).min(ops.len() - 1);
            let (old_start, old_count) = header_range(ops, lo, hi, LineOp::old);
            let (new_start, new_count) = header_range(ops, lo, hi, LineOp::new);

            let lines = ops[lo..=hi]
                .iter()
                .map(|&op| match op {
                    LineOp::Equal { old, .. } => HunkLine::Context(a[old].as_ref().to_string()),
                    LineOp::Remove { old } => HunkLine::Remove(a[old].as_ref().to_string()),
                    LineOp::Add { new } => HunkLine::Add(b[new].as_ref().to_string()),
                })
                .collect();

            Hunk {
                old_start,
                old_count,
                new_start,
                new_count,
                lines,
            }
        })
        .collect()
}

/// Hunks turning `original` into `modified`; empty when they are equal.
pub fn compute_hunks<S: AsRef<str>>(original: &[S], modified: &[S]) -> Vec<Hunk> {
    let ops = align(original, modified);
    group_hunks(original, modified, &ops, CONTEXT_LINES)
}

/// Render a unified diff with `a/` and `b/` prefixed headers.
///
/// Returns an empty string when both sides are line-for-line equal.
pub fn format_unified_diff<S: AsRef<str>>(file_path: &str, original: &[S], modified: &[S]) -> String {
    let hunks = compute_hunks(original, modified);
    if hunks.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str(&format!("--- a/{}\n", file_path));
    output.push_str(&format!("+++ b/{}\n", file_path));
    for hunk in &hunks {
        render_hunk(&mut output, hunk);
    }
    output
}

/// Render a single hunk
fn render_hunk(output: &mut String, hunk: &Hunk) {
    output.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
    ));

    for line in &hunk.lines {
        match line {
            HunkLine::Context(content) => output.push_str(&format!(" {}\n", content)),
            HunkLine::Remove(content) => output.push_str(&format!("-{}\n", content)),
            HunkLine::Add(content) => output.push_str(&format!("+{}\n", content)),
        }
    }
}

/// Reviewable change to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePatch {
    pub file_path: String,
    #[serde(skip)]
    pub original: String,
    #[serde(skip)]
    pub modified: String,
    pub diff: String,
}

/// Added/removed line counts of a patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
}

impl FilePatch {
    /// Diff `original` against `modified`, splitting on `\n` only so that the
    /// diff is empty exactly when the two texts are identical.
    pub fn new(file_path: impl Into<String>, original: String, modified: String) -> Self {
        let file_path = file_path.into();
        let diff = if original == modified {
            String::new()
        } else {
            let old: Vec<&str> = original.split('\n').collect();
            let new: Vec<&str> = modified.split('\n').collect();
            format_unified_diff(&file_path, &old, &new)
        };

        Self {
            file_path,
            original,
            modified,
            diff,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.diff.is_empty()
    }

    pub fn stats(&self) -> DiffStats {
        self.diff
            .lines()
            .skip(2)
            .fold(DiffStats::default(), |mut acc, line| {
                if line.starts_with('+') {
                    acc.added += 1;
                } else if line.starts_with('-') {
                    acc.removed += 1;
                }
                acc
            })
    }
}
