//! The inline term markup grammar.
//!
//! Four forms, all occupying a full `[[...]]` bracket span:
//!
//! - `[[def: id, alias, ...]]` - introduces a local term definition
//! - `[[tref: spec, id, alias, ...]]` - imports a term from an external spec
//! - `[[ref: id]]` - inline reference to a local term
//! - `[[xref: spec, id]]` - inline reference to an external term
//!
//! `def` and `tref` are definition lines: they must open the (trimmed) line
//! and are followed by `~`-prefixed content lines. `ref` and `xref` carry no
//! content; they are resolved at render time against a term index.
//!
//! This grammar is the one bit-exact format contract the engine owns: what it
//! recognizes as a definition vs. a reference must match the companion
//! static-site generator byte for byte.

use std::sync::LazyLock;

use regex::Regex;

/// `[[def: id(, alias)*]]` anchored at line start.
pub(crate) static DEF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[def:\s*([^,\]]+)(?:,\s*([^\]]+))?\]\]").expect("static pattern")
});

/// `[[tref: spec, id(, alias)*]]` anchored at line start.
pub(crate) static TREF_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[\[tref:\s*([^,\]]+),\s*([^,\]]+)(?:,\s*([^\]]+))?\]\]").expect("static pattern")
});

/// `[[def: ...]]` anywhere in a document.
pub(crate) static DEF_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[def:\s*([^,\]]+)(?:,\s*([^\]]+))?\]\]").expect("static pattern")
});

/// `[[tref: ...]]` anywhere in a document.
pub(crate) static TREF_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[tref:\s*([^,\]]+),\s*([^,\]]+)(?:,\s*([^\]]+))?\]\]").expect("static pattern")
});

/// `[[xref: spec, id]]` anywhere in a document.
pub(crate) static XREF_ANYWHERE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[xref:\s*([^,\]]+),\s*([^\]]+)\]\]").expect("static pattern")
});

/// `[[ref: id]]` anywhere in a document.
pub(crate) static REF_ANYWHERE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[ref:\s*([^\]]+)\]\]").expect("static pattern"));

/// A parsed definition line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionLine {
    /// `[[def: id, ...]]` - a local definition.
    Local { id: String, aliases: Vec<String> },
    /// `[[tref: spec, id, ...]]` - an imported external definition.
    External {
        spec: String,
        id: String,
        aliases: Vec<String>,
    },
}

impl DefinitionLine {
    /// The term id, regardless of form.
    pub fn id(&self) -> &str {
        match self {
            DefinitionLine::Local { id, .. } => id,
            DefinitionLine::External { id, .. } => id,
        }
    }
}

/// Parse a definition line (`def` or `tref` form) from the start of a trimmed
/// line.
///
/// Returns `None` for anything that is not a well-formed definition line:
/// missing `]]`, empty id after trimming, or a line where the markup is not
/// the first token. Parsing is best-effort; a malformed line is simply not a
/// definition.
pub fn parse_definition_line(line: &str) -> Option<DefinitionLine> {
    if let Some(caps) = DEF_LINE.captures(line) {
        let id = caps[1].trim().to_string();
        if id.is_empty() {
            return None;
        }
        let aliases = caps.get(2).map(|m| split_aliases(m.as_str())).unwrap_or_default();
        return Some(DefinitionLine::Local { id, aliases });
    }
    if let Some(caps) = TREF_LINE.captures(line) {
        let spec = caps[1].trim().to_string();
        let id = caps[2].trim().to_string();
        if spec.is_empty() || id.is_empty() {
            return None;
        }
        let aliases = caps.get(3).map(|m| split_aliases(m.as_str())).unwrap_or_default();
        return Some(DefinitionLine::External { spec, id, aliases });
    }
    None
}

/// Split a comma-separated alias list, trimming each entry and dropping the
/// ones that are empty after trimming.
pub fn split_aliases(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a raw (untrimmed) line is a definition content line.
pub(crate) fn is_content_line(line: &str) -> bool {
    line.starts_with('~')
}

/// Strip the `~` content prefix and the single optional space after it.
pub(crate) fn strip_content_prefix(line: &str) -> &str {
    let rest = line.strip_prefix('~').unwrap_or(line);
    rest.strip_prefix(' ').unwrap_or(rest)
}
