//! Insert-or-update of a single attribute inside an opening tag's text.

use regex::{Captures, Regex};

use crate::core::locate::{ScanState, TagScanner};

/// The attribute every annotation writes.
pub const AGENT_ID_ATTR: &str = "data-agent-id";

/// What happened to one tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeOutcome {
    /// Attribute was absent and has been added after the tag name.
    Inserted,
    /// Attribute held a different value; it now holds the desired one.
    Replaced { previous: String },
    /// Attribute already holds the desired value.
    Unchanged,
    /// Attribute is present but not as a well-formed quoted string
    /// (unterminated quote, `{expr}` value); the tag is left alone.
    Malformed,
}

/// Result of [`AttributeEditor::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeEdit {
    pub tag_text: String,
    pub outcome: AttributeOutcome,
}

impl AttributeEdit {
    pub fn applied(&self) -> bool {
        matches!(
            self.outcome,
            AttributeOutcome::Inserted | AttributeOutcome::Replaced { .. }
        )
    }

    pub fn skipped(&self) -> bool {
        self.outcome == AttributeOutcome::Unchanged
    }
}

/// Compiled matcher for one attribute name.
#[derive(Debug, Clone)]
pub struct AttributeEditor {
    name: String,
    quoted: Regex,
    assigned: Regex,
}

impl Default for AttributeEditor {
    fn default() -> Self {
        Self::new(AGENT_ID_ATTR)
    }
}

impl AttributeEditor {
    pub fn new(name: &str) -> Self {
        let escaped = regex::escape(name);
        // Values may not contain their own quote unescaped, nor a newline
        let quoted = format!(
            r#"(?:^|\s)(?P<attr>{escaped}\s*=\s*(?:"(?P<dq>(?:[^"\\\n]|\\.)*)"|'(?P<sq>(?:[^'\\\n]|\\.)*)'))"#
        );
        let assigned = format!(r"(?:^|\s)(?P<attr>{escaped}\s*=)");

        Self {
            name: name.to_string(),
            quoted: Regex::new(&quoted).expect("escaped attribute pattern is valid"),
            assigned: Regex::new(&assigned).expect("escaped attribute pattern is valid"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bring `tag_text` to carry `name="desired"`.
    ///
    /// `insert_at` is the byte offset just past the tag name; it is only used
    /// when the attribute is absent. Existing values are rewritten in place
    /// with double quotes and nothing else in the text moves.
    pub fn apply(&self, tag_text: &str, insert_at: usize, desired: &str) -> AttributeEdit {
        if let Some(caps) = own_attribute(&self.quoted, tag_text) {
            let current = caps
                .name("dq")
                .or_else(|| caps.name("sq"))
                .map_or("", |m| m.as_str());

            if current == desired {
                return AttributeEdit {
                    tag_text: tag_text.to_string(),
                    outcome: AttributeOutcome::Unchanged,
                };
            }

            let Some(attr) = caps.name("attr") else {
                return AttributeEdit {
                    tag_text: tag_text.to_string(),
                    outcome: AttributeOutcome::Malformed,
                };
            };
            let mut out = String::with_capacity(tag_text.len() + desired.len());
            out.push_str(&tag_text[..attr.start()]);
            out.push_str(&format!("{}=\"{}\"", self.name, desired));
            out.push_str(&tag_text[attr.end()..]);

            return AttributeEdit {
                tag_text: out,
                outcome: AttributeOutcome::Replaced {
                    previous: current.to_string(),
                },
            };
        }

        if own_attribute(&self.assigned, tag_text).is_some() {
            return AttributeEdit {
                tag_text: tag_text.to_string(),
                outcome: AttributeOutcome::Malformed,
            };
        }

        let mut out = String::with_capacity(tag_text.len() + self.name.len() + desired.len() + 4);
        out.push_str(&tag_text[..insert_at]);
        out.push_str(&format!(" {}=\"{}\"", self.name, desired));
        out.push_str(&tag_text[insert_at..]);

        AttributeEdit {
            tag_text: out,
            outcome: AttributeOutcome::Inserted,
        }
    }
}

/// First match of `re` whose `attr` group belongs to the tag itself rather
/// than to a string literal or a `{...}` expression (e.g. a child element
/// passed as a prop).
fn own_attribute<'t>(re: &Regex, tag_text: &'t str) -> Option<Captures<'t>> {
    re.captures_iter(tag_text).find(|caps| {
        caps.name("attr")
            .is_some_and(|m| at_top_level(tag_text, m.start()))
    })
}

fn at_top_level(tag_text: &str, offset: usize) -> bool {
    let mut scanner = TagScanner::new();
    for ch in tag_text[..offset].chars() {
        scanner.feed(ch);
    }
    scanner.state() == ScanState::Normal
}

/// One-shot form of [`AttributeEditor::apply`].
pub fn apply_attribute(
    tag_text: &str,
    attr_name: &str,
    desired: &str,
    insert_at: usize,
) -> AttributeEdit {
    AttributeEditor::new(attr_name).apply(tag_text, insert_at, desired)
}
