//! End-to-end behaviour of the annotation core on small, literal sources.

use uic::core::annotate::{AnnotationTarget, annotate_source};
use uic::core::diff::format_unified_diff;

fn target(
    id: &str,
    line: usize,
    column: usize,
    ty: &str,
) -> AnnotationTarget
{
    AnnotationTarget {
        agent_id: id.to_string(),
        line,
        column,
        element_type: ty.to_string(),
        source_tag_name: None,
    }
}

#[test]
fn self_closing_tag_gets_attribute()
{
    let r = annotate_source("<input />", &[target("test.input", 1, 1, "input")]);

    assert_eq!(r.annotated_source, r#"<input data-agent-id="test.input" />"#);
    assert_eq!(r.annotations_applied, 1);
    assert!(r.modified);
}

#[test]
fn existing_value_is_replaced()
{
    let r = annotate_source(
        r#"<button data-agent-id="old.id">Click</button>"#,
        &[target("new.id", 1, 1, "button")],
    );

    assert_eq!(r.annotated_source, r#"<button data-agent-id="new.id">Click</button>"#);
    assert_eq!((r.annotations_applied, r.annotations_skipped), (1, 0));
}

#[test]
fn multiline_tag_only_touches_first_line()
{
    let src = "<button\n  className=\"btn\"\n>";
    let r = annotate_source(src, &[target("x.y", 1, 1, "button")]);

    let lines: Vec<&str> = r
        .annotated_source
        .split('\n')
        .collect();
    assert_eq!(lines, ["<button data-agent-id=\"x.y\"", "  className=\"btn\"", ">"]);
}

#[test]
fn single_line_change_yields_single_hunk()
{
    let diff = format_unified_diff("t.ts", &["a"], &["b"]);

    assert!(diff.contains("\n-a\n"));
    assert!(diff.contains("\n+b\n"));
    assert_eq!(diff.matches("@@ -1,1 +1,1 @@").count(), 1);
    assert_eq!(diff.matches("@@").count(), 2);
}

#[test]
fn two_targets_in_one_pass()
{
    let src = "<form>\n  <input name=\"q\" />\n  <button type=\"submit\">Go</button>\n</form>";
    let r = annotate_source(
        src,
        &[target("search.query", 2, 3, "input"), target("search.submit", 3, 3, "button")],
    );

    assert_eq!(r.annotations_applied, 2);
    assert_eq!(
        r.annotated_source,
        "<form>\n  <input data-agent-id=\"search.query\" name=\"q\" />\n  <button data-agent-id=\"search.submit\" type=\"submit\">Go</button>\n</form>"
    );
}

#[test]
fn second_pass_is_a_no_op()
{
    let src = "<nav>\n  <a href=\"/\">Home</a>\n</nav>\n";
    let targets = [target("nav.root", 1, 1, "nav"), target("nav.home", 2, 3, "a")];

    let first = annotate_source(src, &targets);
    let second = annotate_source(&first.annotated_source, &targets);

    assert!(!second.modified);
    assert_eq!(second.annotations_skipped, 2);
    assert_eq!(second.annotated_source, first.annotated_source);
}

#[test]
fn arrow_function_in_props_does_not_end_tag()
{
    let src = "<button onClick={() => setOpen(a > b)}>Toggle</button>";
    let r = annotate_source(src, &[target("menu.toggle", 1, 1, "button")]);

    assert_eq!(
        r.annotated_source,
        r#"<button data-agent-id="menu.toggle" onClick={() => setOpen(a > b)}>Toggle</button>"#
    );
}

#[test]
fn column_off_by_two_still_matches()
{
    let src = "    <select value={v}>";
    let r = annotate_source(src, &[target("filters.sort", 1, 7, "select")]);

    assert_eq!(r.annotated_source, r#"    <select data-agent-id="filters.sort" value={v}>"#);
}

#[test]
fn single_quoted_existing_value_is_rewritten_with_double_quotes()
{
    let r = annotate_source("<div data-agent-id='a.b'>", &[target("c.d", 1, 1, "div")]);

    assert_eq!(r.annotated_source, r#"<div data-agent-id="c.d">"#);
}

#[test]
fn render_prop_child_and_parent_both_annotated()
{
    let src = "<Foo\n  render={<Bar />}\n>";
    let r = annotate_source(src, &[target("foo", 1, 1, "Foo"), target("bar", 2, 11, "Bar")]);

    assert_eq!(r.annotations_applied, 2);
    assert_eq!(
        r.annotated_source,
        "<Foo data-agent-id=\"foo\"\n  render={<Bar data-agent-id=\"bar\" />}\n>"
    );

    let again = annotate_source(&r.annotated_source, &[target("foo", 1, 1, "Foo"), target("bar", 2, 11, "Bar")]);
    assert!(!again.modified);
    assert_eq!(again.annotations_skipped, 2);
}
