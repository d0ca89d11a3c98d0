//! Structural validation for term-definition files.
//!
//! The rules only apply to files inside the configured terms directory
//! (`<spec_directory>/<spec_terms_directory>`). Directory containment is the
//! sole applicability gate; an older heuristic that also sniffed filenames
//! and content for term markup has been removed.

/// Result of validating a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Human-readable warnings, in rule-check order.
    pub warnings: Vec<String>,
    /// Convenience flag: `!warnings.is_empty()`.
    pub has_warnings: bool,
}

impl ValidationReport {
    fn clean() -> Self {
        Self::default()
    }

    fn from_warnings(warnings: Vec<String>) -> Self {
        Self {
            has_warnings: !warnings.is_empty(),
            warnings,
        }
    }
}

/// Path-prefix containment test against the terms directory.
///
/// Leading and trailing slashes are normalized away on both sides; a path
/// equal to the directory itself also counts as inside.
pub fn is_in_terms_directory(file_path: &str, terms_path: &str) -> bool {
    let terms = terms_path.trim_matches('/');
    let file = file_path.trim_matches('/');
    if terms.is_empty() || file.is_empty() {
        return false;
    }
    file == terms || file.starts_with(&format!("{terms}/"))
}

/// Validate a candidate term-definition file.
///
/// `terms_path` is the resolved `<spec_directory>/<spec_terms_directory>`
/// path. Files outside it are never validated, regardless of content; empty
/// or whitespace-only content yields zero warnings unconditionally.
///
/// The rules, each contributing at most one warning, in order:
///
/// 1. the first line must start with `[[def:` or `[[tref:`;
/// 2. `[[def:`/`[[tref:` must not appear on any later line (first hit stops
///    the scan);
/// 3. `[[ref:`/`[[xref:` must not appear on the first line;
/// 4. every later non-blank line must start with `~` - the first violation
///    reports its 1-based line number and the first 20 characters of the
///    line.
///
/// "First line" means the first non-blank line; rules 2 and 4 scan the lines
/// after it.
pub fn validate_content(content: &str, file_path: &str, terms_path: &str) -> ValidationReport {
    if content.trim().is_empty() {
        return ValidationReport::clean();
    }
    if !is_in_terms_directory(file_path, terms_path) {
        return ValidationReport::clean();
    }

    let lines: Vec<&str> = content.lines().collect();
    let Some(first_idx) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return ValidationReport::clean();
    };
    let first_line = lines[first_idx].trim();

    let mut warnings = Vec::new();

    // Rule 1
    if !first_line.starts_with("[[def:") && !first_line.starts_with("[[tref:") {
        warnings.push("First line must start with [[def: or [[tref:".to_string());
    }

    // Rule 2
    for line in &lines[first_idx + 1..] {
        if line.contains("[[def:") || line.contains("[[tref:") {
            warnings.push("[[def: and [[tref: can only exist on the first line".to_string());
            break;
        }
    }

    // Rule 3
    if first_line.contains("[[ref:") || first_line.contains("[[xref:") {
        warnings.push("[[ref: and [[xref: cannot exist on the first line".to_string());
    }

    // Rule 4
    for (idx, line) in lines.iter().enumerate().skip(first_idx + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if !line.starts_with('~') {
            let preview: String = line.chars().take(20).collect();
            warnings.push(format!(
                "Line {} must start with ~ (Found: \"{}...\")",
                idx + 1,
                preview
            ));
            break;
        }
    }

    ValidationReport::from_warnings(warnings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const TERMS_PATH: &str = "spec/terms-definitions";

    fn inside(name: &str) -> String {
        format!("{TERMS_PATH}/{name}")
    }

    #[test]
    fn test_outside_terms_directory_never_validated() {
        let report = validate_content("anything at all", "README.md", TERMS_PATH);
        assert_eq!(report, ValidationReport::default());
        assert!(!report.has_warnings);
    }

    #[test]
    fn test_empty_content_clean() {
        let report = validate_content("   \n\n", &inside("example.md"), TERMS_PATH);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_rule_one_missing_def() {
        let report = validate_content("Not a def line\n~ body", &inside("example.md"), TERMS_PATH);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("must start with [[def:"));
        assert!(report.has_warnings);
    }

    #[test]
    fn test_rule_two_def_after_first_line() {
        let content = "[[def: one]]\n~ body\n[[def: two]]";
        let report = validate_content(content, &inside("example.md"), TERMS_PATH);
        assert_eq!(
            report.warnings,
            vec!["[[def: and [[tref: can only exist on the first line".to_string()]
        );
    }

    #[test]
    fn test_rule_three_ref_on_first_line() {
        let content = "[[def: one]] and [[ref: other]]\n~ body";
        let report = validate_content(content, &inside("example.md"), TERMS_PATH);
        assert_eq!(
            report.warnings,
            vec!["[[ref: and [[xref: cannot exist on the first line".to_string()]
        );
    }

    #[test]
    fn test_rule_four_reports_line_and_snippet() {
        let content = "[[def: foo]]\n~ ok\nbad line";
        let report = validate_content(content, &inside("foo.md"), TERMS_PATH);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("Line 3"));
        assert!(report.warnings[0].contains("bad line"));
    }

    #[test]
    fn test_rule_four_stops_at_first_violation() {
        let content = "[[def: foo]]\nbad one\nbad two";
        let report = validate_content(content, &inside("foo.md"), TERMS_PATH);
        let rule_four: Vec<&String> = report
            .warnings
            .iter()
            .filter(|w| w.contains("must start with ~"))
            .collect();
        assert_eq!(rule_four.len(), 1);
        assert!(rule_four[0].contains("Line 2"));
    }

    #[test]
    fn test_first_nonblank_line_is_first_line() {
        // Leading blank lines shift "first line" without tripping rule 2.
        let content = "\n\n[[def: foo]]\n~ body";
        let report = validate_content(content, &inside("foo.md"), TERMS_PATH);
        assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);
    }

    #[test]
    fn test_tref_first_line_accepted() {
        let content = "[[tref: other-spec, widget]]\n~ body";
        let report = validate_content(content, &inside("widget.md"), TERMS_PATH);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_multiple_rules_fire_in_order() {
        let content = "[[xref: spec, other]]\nprose\n[[def: late]]";
        let report = validate_content(content, &inside("bad.md"), TERMS_PATH);
        assert_eq!(report.warnings.len(), 4);
        assert!(report.warnings[0].contains("must start with [[def:"));
        assert!(report.warnings[1].contains("can only exist on the first line"));
        assert!(report.warnings[2].contains("cannot exist on the first line"));
        assert!(report.warnings[3].contains("must start with ~"));
    }

    #[test]
    fn test_path_normalization() {
        assert!(is_in_terms_directory(
            "/spec/terms-definitions/foo.md",
            "spec/terms-definitions/"
        ));
        assert!(is_in_terms_directory("spec/terms-definitions", TERMS_PATH));
        assert!(!is_in_terms_directory(
            "spec/terms-definitions-extra/foo.md",
            TERMS_PATH
        ));
        assert!(!is_in_terms_directory("spec/other/foo.md", TERMS_PATH));
    }
}
