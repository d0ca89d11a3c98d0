//! Term records and the deduplicated, sorted term index.

use std::collections::BTreeSet;
use std::collections::hash_map::{Entry, HashMap};

use serde::{Deserialize, Serialize};

/// A single term definition, local or external.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Canonical term identifier, case-sensitive as authored.
    pub id: String,
    /// Alternate names for the same term, order-preserving.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Where the term was found: a repository path for local terms, the
    /// published page URL for external ones.
    pub source: String,
    /// Pre-rendered HTML of the definition body. May be empty.
    #[serde(default)]
    pub definition_html: String,
    /// Plain-text flattening of the definition body, used for tooltips and
    /// search.
    #[serde(default)]
    pub definition_text: String,
    /// True when the term was sourced from a remote specification.
    #[serde(default)]
    pub external: bool,
    /// Identifier of the owning external specification. Some iff `external`.
    #[serde(default)]
    pub external_spec: Option<String>,
    /// Structural tags carried from the source markup, informational only.
    #[serde(default)]
    pub classes: BTreeSet<String>,
}

impl Term {
    /// The identity used for deduplication: `(id, external_spec)`.
    ///
    /// Two local terms with the same id are duplicates; a local and an
    /// external term sharing an id are distinct entries.
    pub fn key(&self) -> TermKey {
        TermKey {
            id: self.id.clone(),
            external_spec: self.external_spec.clone(),
        }
    }

    /// Whether the term carries any definition body at all.
    pub fn has_definition(&self) -> bool {
        !self.definition_html.is_empty() || !self.definition_text.is_empty()
    }
}

/// Deduplication key for a term.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermKey {
    pub id: String,
    pub external_spec: Option<String>,
}

/// The aggregate result of a load operation: terms sorted case-insensitively
/// by id, with no duplicate `(id, external_spec)` pairs.
///
/// Indexes are rebuilt wholesale on every refresh, never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermIndex {
    terms: Vec<Term>,
}

impl TermIndex {
    /// Build an index from an arbitrary collection of terms.
    ///
    /// Sorts by id using a case-insensitive ordinal comparison (stable, so
    /// equal keys keep their input order) and drops duplicate
    /// `(id, external_spec)` entries. The first occurrence wins, unless it
    /// has an empty definition body and a later duplicate has content - then
    /// the later entry replaces it. This lets a bare local `tref` declaration
    /// be backfilled by the fetched external definition.
    pub fn build(mut terms: Vec<Term>) -> Self {
        terms.sort_by(|a, b| a.id.to_lowercase().cmp(&b.id.to_lowercase()));

        let mut kept: Vec<Term> = Vec::with_capacity(terms.len());
        let mut by_key: HashMap<TermKey, usize> = HashMap::new();
        for term in terms {
            match by_key.entry(term.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(kept.len());
                    kept.push(term);
                }
                Entry::Occupied(slot) => {
                    let existing = &mut kept[*slot.get()];
                    if !existing.has_definition() && term.has_definition() {
                        *existing = term;
                    }
                }
            }
        }

        Self { terms: kept }
    }

    /// Look up a local (non-external) term by exact, case-sensitive id.
    pub fn lookup_local(&self, id: &str) -> Option<&Term> {
        self.terms.iter().find(|t| !t.external && t.id == id)
    }

    /// Look up an external term by exact, case-sensitive `(spec, id)`.
    pub fn lookup_external(&self, spec: &str, id: &str) -> Option<&Term> {
        self.terms
            .iter()
            .find(|t| t.external && t.external_spec.as_deref() == Some(spec) && t.id == id)
    }

    /// All terms, in index order.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Iterate over the terms in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    /// Iterate over just the external terms.
    pub fn externals(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter().filter(|t| t.external)
    }

    /// Filter terms for display: case-insensitive substring match against
    /// the id, aliases, owning external spec, and definition text. An empty
    /// query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&Term> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.terms.iter().collect();
        }
        self.terms
            .iter()
            .filter(|t| {
                t.id.to_lowercase().contains(&query)
                    || t.aliases.iter().any(|a| a.to_lowercase().contains(&query))
                    || t.external_spec
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&query))
                    || t.definition_text.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Number of terms in the index.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the index holds no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Consume the index, yielding its terms in index order.
    pub fn into_terms(self) -> Vec<Term> {
        self.terms
    }
}

impl IntoIterator for TermIndex {
    type Item = Term;
    type IntoIter = std::vec::IntoIter<Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.terms.into_iter()
    }
}
