//! Term extraction from document content.

use std::collections::BTreeSet;

use crate::markup::{self, DefinitionLine};
use crate::term::Term;

/// Extract every term defined in `content`.
///
/// Scans lines top to bottom. A definition line (`[[def: ...]]` or
/// `[[tref: ...]]` opening the trimmed line) starts a term; the `~`-prefixed
/// lines that follow form its body. Blank lines inside the body are skipped
/// without terminating it; the body ends at the first non-blank line without
/// the `~` prefix, or at end of file. A file may define any number of terms.
///
/// `source` labels where the content came from (a repository path for local
/// files) and is recorded on each extracted term.
///
/// Extraction is best-effort and infallible: malformed definition lines yield
/// no term and scanning continues. Calling it twice on the same input returns
/// structurally equal results.
pub fn extract_terms(content: &str, source: &str) -> Vec<Term> {
    let lines: Vec<&str> = content.lines().collect();
    let mut terms = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let Some(definition) = markup::parse_definition_line(lines[i].trim()) else {
            i += 1;
            continue;
        };

        let mut body: Vec<&str> = Vec::new();
        let mut j = i + 1;
        while j < lines.len() {
            let raw = lines[j];
            if markup::is_content_line(raw) {
                body.push(markup::strip_content_prefix(raw));
                j += 1;
            } else if raw.trim().is_empty() {
                j += 1;
            } else {
                break;
            }
        }

        terms.push(build_term(definition, &body, source));
        i = j;
    }

    terms
}

fn build_term(definition: DefinitionLine, body: &[&str], source: &str) -> Term {
    let definition_html = if body.is_empty() {
        String::new()
    } else {
        format!("<dl><dd>{}</dd></dl>", body.join("</dd><dd>"))
    };
    let definition_text = body.join(" ").trim().to_string();

    match definition {
        DefinitionLine::Local { id, aliases } => Term {
            id,
            aliases,
            source: source.to_string(),
            definition_html,
            definition_text,
            external: false,
            external_spec: None,
            classes: BTreeSet::from(["local".to_string()]),
        },
        DefinitionLine::External { spec, id, aliases } => Term {
            id,
            aliases,
            source: source.to_string(),
            definition_html,
            definition_text,
            external: true,
            external_spec: Some(spec),
            classes: BTreeSet::from(["external".to_string()]),
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_extract_single_term() {
        let content = "[[def: example, ex]]\n~ Part one\n~ Part two\n\nUnrelated text";
        let terms = extract_terms(content, "terms/example.md");

        assert_eq!(terms.len(), 1);
        let term = &terms[0];
        assert_eq!(term.id, "example");
        assert_eq!(term.aliases, vec!["ex"]);
        assert_eq!(term.source, "terms/example.md");
        assert_eq!(term.definition_text, "Part one Part two");
        assert_eq!(
            term.definition_html,
            "<dl><dd>Part one</dd><dd>Part two</dd></dl>"
        );
        assert!(!term.external);
        assert_eq!(term.external_spec, None);
    }

    #[test]
    fn test_extract_multiple_terms() {
        let content = "\
[[def: first]]
~ One.

[[def: second, 2nd]]
~ Two.
Trailing prose.
[[def: third]]
~ Three.";
        let terms = extract_terms(content, "terms/many.md");
        let ids: Vec<&str> = terms.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(terms[1].aliases, vec!["2nd"]);
    }

    #[test]
    fn test_tref_line_yields_external_term() {
        let content = "[[tref: other-spec, widget]]\n~ Imported locally.";
        let terms = extract_terms(content, "terms/widget.md");

        assert_eq!(terms.len(), 1);
        assert!(terms[0].external);
        assert_eq!(terms[0].external_spec.as_deref(), Some("other-spec"));
        assert_eq!(terms[0].id, "widget");
        assert_eq!(terms[0].definition_text, "Imported locally.");
    }

    #[test]
    fn test_body_ends_at_prose_line() {
        let content = "[[def: example]]\n~ Body.\nNot body.\n~ Also not body.";
        let terms = extract_terms(content, "terms/example.md");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].definition_text, "Body.");
    }

    #[test]
    fn test_blank_lines_inside_body_skipped() {
        let content = "[[def: example]]\n~ One.\n\n~ Two.";
        let terms = extract_terms(content, "terms/example.md");
        assert_eq!(terms[0].definition_text, "One. Two.");
    }

    #[test]
    fn test_bare_tilde_and_no_space() {
        let content = "[[def: example]]\n~One.\n~\n~ Two.";
        let terms = extract_terms(content, "terms/example.md");
        assert_eq!(terms[0].definition_text, "One.  Two.");
        assert_eq!(
            terms[0].definition_html,
            "<dl><dd>One.</dd><dd></dd><dd>Two.</dd></dl>"
        );
    }

    #[test]
    fn test_term_without_body() {
        let terms = extract_terms("[[def: lonely]]", "terms/lonely.md");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].definition_html, "");
        assert_eq!(terms[0].definition_text, "");
        assert!(!terms[0].has_definition());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let content = "[[def: broken\n[[def: ]]\n[[def: good]]\n~ Fine.";
        let terms = extract_terms(content, "terms/mixed.md");
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].id, "good");
    }

    #[test]
    fn test_references_yield_no_terms() {
        let content = "[[ref: example]]\n[[xref: other-spec, widget]]";
        assert!(extract_terms(content, "doc.md").is_empty());
    }

    #[test]
    fn test_idempotent() {
        let content = "[[def: example, ex]]\n~ Part one\n~ Part two";
        let first = extract_terms(content, "terms/example.md");
        let second = extract_terms(content, "terms/example.md");
        assert_eq!(first, second);
    }
}
