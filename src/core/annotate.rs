//! Applies every annotation target of one file in a single pass.
//!
//! Targets are processed bottom to top (line descending, then column
//! descending) so an edit never shifts a position that has not been visited
//! yet. Each edit stays within the lines of its own tag span and never adds
//! or removes a line break.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::core::attribute::{AttributeEditor, AttributeOutcome};
use crate::core::locate::{TagSpan, locate_tag_span};

/// One desired attribute injection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationTarget {
    pub agent_id: String,
    /// 1-based line of the tag's `<`.
    pub line: usize,
    /// 1-based column of the tag's `<`.
    pub column: usize,
    /// Logical element type (`button`, `input`, ...).
    #[serde(rename = "type")]
    pub element_type: String,
    /// Literal tag name in source when it differs from `element_type`.
    #[serde(default)]
    pub source_tag_name: Option<String>,
}

impl AnnotationTarget {
    /// Name matched against the source text.
    pub fn tag_name(&self) -> &str {
        self.source_tag_name
            .as_deref()
            .unwrap_or(&self.element_type)
    }
}

/// Per-file outcome of [`annotate_source`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationResult {
    pub original_source: String,
    pub annotated_source: String,
    pub modified: bool,
    pub annotations_applied: usize,
    pub annotations_skipped: usize,
}

impl AnnotationResult {
    fn unmodified(source: &str) -> Self {
        Self {
            original_source: source.to_string(),
            annotated_source: source.to_string(),
            modified: false,
            annotations_applied: 0,
            annotations_skipped: 0,
        }
    }
}

/// Annotate `source` with `data-agent-id` for every target.
///
/// Targets whose line is out of range, whose tag cannot be found near the
/// reported column, or whose existing attribute is malformed are dropped
/// without being counted. `agent_id` values are trusted to be unique.
pub fn annotate_source(source: &str, targets: &[AnnotationTarget]) -> AnnotationResult {
    annotate_source_with(&AttributeEditor::default(), source, targets)
}

/// [`annotate_source`] with an explicit attribute editor.
pub fn annotate_source_with(
    editor: &AttributeEditor,
    source: &str,
    targets: &[AnnotationTarget],
) -> AnnotationResult {
    if targets.is_empty() {
        return AnnotationResult::unmodified(source);
    }

    let mut lines: Vec<String> = source.split('\n').map(str::to_owned).collect();

    let mut ordered: Vec<&AnnotationTarget> = targets.iter().collect();
    ordered.sort_by(|a, b| b.line.cmp(&a.line).then(b.column.cmp(&a.column)));

    let mut applied = 0;
    let mut skipped = 0;

    for target in ordered {
        let Some(line_idx) = target.line.checked_sub(1).filter(|&i| i < lines.len()) else {
            trace!(agent_id = %target.agent_id, line = target.line, "line out of range");
            continue;
        };

        if target.agent_id.contains(['"', '\n', '\r']) {
            warn!(agent_id = %target.agent_id, "agent id cannot be written as an attribute value");
            continue;
        }

        let tag_name = target.tag_name();
        let Some(span) = locate_tag_span(&lines, line_idx, target.column, tag_name) else {
            debug!(
                agent_id = %target.agent_id,
                line = target.line,
                column = target.column,
                tag = tag_name,
                "tag not found at reported position"
            );
            continue;
        };

        let tag_text = span.text(&lines);
        let edit = editor.apply(&tag_text, span.insertion_offset(), &target.agent_id);

        match &edit.outcome {
            AttributeOutcome::Inserted | AttributeOutcome::Replaced { .. } => {
                splice_span(&mut lines, &span, &edit.tag_text);
                applied += 1;
            }
            AttributeOutcome::Unchanged => skipped += 1,
            AttributeOutcome::Malformed => {
                warn!(
                    agent_id = %target.agent_id,
                    line = target.line,
                    "existing {} is not a quoted string; leaving tag untouched",
                    editor.name()
                );
            }
        }
    }

    if applied == 0 {
        let mut result = AnnotationResult::unmodified(source);
        result.annotations_skipped = skipped;
        return result;
    }

    AnnotationResult {
        original_source: source.to_string(),
        annotated_source: lines.join("\n"),
        modified: true,
        annotations_applied: applied,
        annotations_skipped: skipped,
    }
}

/// Write `replacement` (span text after editing) back over `span`.
/// The replacement has exactly as many lines as the span.
fn splice_span(lines: &mut [String], span: &TagSpan, replacement: &str) {
    let pieces: Vec<&str> = replacement.split('\n').collect();
    debug_assert_eq!(pieces.len(), span.end_line - span.start_line + 1);

    if span.start_line == span.end_line {
        let line = &mut lines[span.start_line];
        line.replace_range(span.start..span.end, replacement);
        return;
    }

    let last = pieces.len() - 1;
    for (k, piece) in pieces.iter().enumerate() {
        let line = &mut lines[span.start_line + k];
        if k == 0 {
            line.replace_range(span.start.., piece);
        } else if k == last {
            line.replace_range(..span.end, piece);
        } else {
            *line = (*piece).to_string();
        }
    }
}
