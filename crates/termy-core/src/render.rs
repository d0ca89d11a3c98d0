//! Reference rendering: raw document text plus a resolved [`TermIndex`] in,
//! HTML out.
//!
//! Rendering is independent of validation and never fails. Unresolved
//! references produce visible "not found" markers instead of errors, because
//! the output feeds a live preview where availability matters more than
//! strictness.
//!
//! The pass order is fixed: line-level block rendering first (headings,
//! definition paragraphs, plain paragraphs, inline spans), then construct
//! substitution over the whole text in the order `tref`, `xref`, `ref`,
//! `def`. Construct substitution is insensitive to whether a line ended up
//! wrapped in a paragraph or heading tag.

use std::sync::LazyLock;

use html_escape::{encode_double_quoted_attribute, encode_text};
use regex::{Captures, Regex};

use crate::markup::{self, split_aliases};
use crate::term::TermIndex;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("static pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("static pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("static pattern"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("static pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("static pattern"));

/// Render document content to HTML, resolving term markup against `index`.
pub fn render_references(content: &str, index: &TermIndex) -> String {
    if content.is_empty() {
        return String::new();
    }

    let html = render_markdown_lines(content);
    let html = markup::TREF_ANYWHERE
        .replace_all(&html, |caps: &Captures| render_tref(caps, index))
        .into_owned();
    let html = markup::XREF_ANYWHERE
        .replace_all(&html, |caps: &Captures| render_xref(caps, index))
        .into_owned();
    let html = markup::REF_ANYWHERE
        .replace_all(&html, |caps: &Captures| render_ref(caps, index))
        .into_owned();
    markup::DEF_ANYWHERE
        .replace_all(&html, |caps: &Captures| render_def(caps))
        .into_owned()
}

/// Line-level markdown pass: headings, `~` definition paragraphs, plain
/// paragraphs, and the inline spans inside them. Blank lines separate blocks
/// and produce no output of their own.
fn render_markdown_lines(content: &str) -> String {
    let mut blocks = Vec::new();
    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(caps) = HEADING.captures(line.trim()) {
            let level = caps[1].len();
            blocks.push(format!(
                "<h{level}>{}</h{level}>",
                render_inline(caps[2].trim())
            ));
        } else if let Some(rest) = line.strip_prefix('~') {
            let rest = rest.strip_prefix(' ').unwrap_or(rest);
            blocks.push(format!(
                "<p class=\"definition-paragraph\">{}</p>",
                render_inline(rest)
            ));
        } else {
            blocks.push(format!("<p>{}</p>", render_inline(line)));
        }
    }
    blocks.join("\n")
}

fn render_inline(text: &str) -> String {
    let html = CODE.replace_all(text, "<code>$1</code>").into_owned();
    let html = BOLD.replace_all(&html, "<strong>$1</strong>").into_owned();
    let html = ITALIC.replace_all(&html, "<em>$1</em>").into_owned();
    LINK.replace_all(&html, "<a href=\"$2\">$1</a>").into_owned()
}

/// Term name plus the optional parenthesized alias list, escaped.
fn display_name(id: &str, aliases: &[String]) -> String {
    if aliases.is_empty() {
        encode_text(id).into_owned()
    } else {
        format!("{} ({})", encode_text(id), encode_text(&aliases.join(", ")))
    }
}

fn render_tref(caps: &Captures, index: &TermIndex) -> String {
    let spec = caps[1].trim();
    let id = caps[2].trim();
    let aliases = caps.get(3).map(|m| split_aliases(m.as_str())).unwrap_or_default();
    let name = display_name(id, &aliases);

    match index.lookup_external(spec, id) {
        Some(term) if !term.definition_html.is_empty() => format!(
            "<div class=\"external-term-reference\">\
             <div class=\"term-name\">{name}</div>\
             <div class=\"term-definition\">{}</div></div>",
            term.definition_html
        ),
        _ => format!(
            "<div class=\"external-term-reference\">\
             <div class=\"term-name\">{name}</div>\
             <div class=\"term-definition not-found\">Definition not found for {} from {}</div></div>",
            encode_text(id),
            encode_text(spec)
        ),
    }
}

fn render_xref(caps: &Captures, index: &TermIndex) -> String {
    let spec = caps[1].trim();
    let id = caps[2].trim();

    let tooltip = match index.lookup_external(spec, id) {
        Some(term) if !term.definition_text.is_empty() => {
            format!("External reference: {}", term.definition_text)
        }
        Some(_) => format!("External reference: {id}"),
        None => format!("External reference to {id} from {spec}"),
    };

    format!(
        "<span class=\"term-reference external\" title=\"{}\">{}</span>",
        encode_double_quoted_attribute(&tooltip),
        encode_text(id)
    )
}

fn render_ref(caps: &Captures, index: &TermIndex) -> String {
    let id = caps[1].trim();

    match index.lookup_local(id) {
        Some(term) => {
            let tooltip = if term.definition_text.is_empty() {
                "Local term reference"
            } else {
                term.definition_text.as_str()
            };
            format!(
                "<span class=\"term-reference local\" title=\"{}\">{}</span>",
                encode_double_quoted_attribute(tooltip),
                encode_text(id)
            )
        }
        None => format!(
            "<span class=\"term-reference local missing\" title=\"Term not found\">{}</span>",
            encode_text(id)
        ),
    }
}

fn render_def(caps: &Captures) -> String {
    let id = caps[1].trim();
    let aliases = caps.get(2).map(|m| split_aliases(m.as_str())).unwrap_or_default();

    let aliases_html = if aliases.is_empty() {
        String::new()
    } else {
        format!(
            "<div class=\"definition-aliases\">Aliases: {}</div>",
            encode_text(&aliases.join(", "))
        )
    };

    format!(
        "<div class=\"term-definition-marker\">\
         <div class=\"definition-term-name\">{}</div>{aliases_html}</div>",
        encode_text(id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn index_with(terms: Vec<Term>) -> TermIndex {
        TermIndex::build(terms)
    }

    fn local_term(id: &str, text: &str) -> Term {
        Term {
            id: id.to_string(),
            source: format!("terms/{id}.md"),
            definition_text: text.to_string(),
            definition_html: format!("<dl><dd>{text}</dd></dl>"),
            ..Term::default()
        }
    }

    fn external_term(spec: &str, id: &str, text: &str) -> Term {
        Term {
            id: id.to_string(),
            source: "https://example.org/spec/".to_string(),
            definition_text: text.to_string(),
            definition_html: format!("<dd>{text}</dd>"),
            external: true,
            external_spec: Some(spec.to_string()),
            ..Term::default()
        }
    }

    #[test]
    fn test_unresolved_tref_renders_not_found_marker() {
        let html = render_references("[[tref: other-spec, widget]]", &TermIndex::default());
        assert!(html.contains("Definition not found for widget from other-spec"));
        assert!(html.contains("external-term-reference"));
    }

    #[test]
    fn test_resolved_tref_includes_definition() {
        let index = index_with(vec![external_term("other-spec", "widget", "a widget")]);
        let html = render_references("[[tref: other-spec, widget, w]]", &index);
        assert!(html.contains("widget (w)"));
        assert!(html.contains("<dd>a widget</dd>"));
        assert!(!html.contains("not-found"));
    }

    #[test]
    fn test_resolved_ref_tooltip_is_definition_text() {
        let index = index_with(vec![local_term("gadget", "a thing")]);
        let html = render_references("[[ref: gadget]]", &index);
        assert!(html.contains("title=\"a thing\""));
        assert!(html.contains("term-reference local"));
    }

    #[test]
    fn test_unresolved_ref_marked_missing() {
        let html = render_references("[[ref: gadget]]", &TermIndex::default());
        assert!(html.contains("term-reference local missing"));
        assert!(html.contains("title=\"Term not found\""));
    }

    #[test]
    fn test_ref_does_not_match_external_terms() {
        let index = index_with(vec![external_term("other-spec", "gadget", "external")]);
        let html = render_references("[[ref: gadget]]", &index);
        assert!(html.contains("missing"));
    }

    #[test]
    fn test_ref_lookup_case_sensitive() {
        let index = index_with(vec![local_term("Gadget", "a thing")]);
        let html = render_references("[[ref: gadget]]", &index);
        assert!(html.contains("missing"));
    }

    #[test]
    fn test_xref_fallback_tooltip() {
        let html = render_references("[[xref: other-spec, widget]]", &TermIndex::default());
        assert!(html.contains("External reference to widget from other-spec"));
        assert!(html.contains("term-reference external"));
    }

    #[test]
    fn test_xref_resolved_tooltip() {
        let index = index_with(vec![external_term("other-spec", "widget", "a widget")]);
        let html = render_references("[[xref: other-spec, widget]]", &index);
        assert!(html.contains("External reference: a widget"));
    }

    #[test]
    fn test_def_marker_with_aliases() {
        let html = render_references("[[def: example, ex, sample]]", &TermIndex::default());
        assert!(html.contains("term-definition-marker"));
        assert!(html.contains("<div class=\"definition-term-name\">example</div>"));
        assert!(html.contains("Aliases: ex, sample"));
    }

    #[test]
    fn test_def_marker_without_aliases() {
        let html = render_references("[[def: example]]", &TermIndex::default());
        assert!(!html.contains("definition-aliases"));
    }

    #[test]
    fn test_definition_paragraphs() {
        let html = render_references("~ Some definition text", &TermIndex::default());
        assert_eq!(
            html,
            "<p class=\"definition-paragraph\">Some definition text</p>"
        );
    }

    #[test]
    fn test_markdown_blocks_and_inline() {
        let content = "## Heading\n\nSome **bold** and *italic* and `code` and [a link](https://example.org).";
        let html = render_references(content, &TermIndex::default());
        assert!(html.contains("<h2>Heading</h2>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<code>code</code>"));
        assert!(html.contains("<a href=\"https://example.org\">a link</a>"));
    }

    #[test]
    fn test_constructs_inside_wrapped_lines() {
        let index = index_with(vec![local_term("gadget", "a thing")]);
        let html = render_references("A paragraph with [[ref: gadget]] inline.", &index);
        assert!(html.starts_with("<p>"));
        assert!(html.contains("<span class=\"term-reference local\""));
    }

    #[test]
    fn test_interpolated_text_is_escaped() {
        let html = render_references("[[ref: <script>]]", &TermIndex::default());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_tooltip_quotes_escaped() {
        let index = index_with(vec![local_term("gadget", "say \"hi\"")]);
        let html = render_references("[[ref: gadget]]", &index);
        assert!(html.contains("&quot;hi&quot;"));
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(render_references("", &TermIndex::default()), "");
    }

    #[test]
    fn test_multiple_construct_types_on_one_line() {
        let index = index_with(vec![
            local_term("gadget", "a thing"),
            external_term("other-spec", "widget", "a widget"),
        ]);
        let html = render_references(
            "[[ref: gadget]] then [[xref: other-spec, widget]]",
            &index,
        );
        assert!(html.contains("term-reference local"));
        assert!(html.contains("term-reference external"));
    }
}
