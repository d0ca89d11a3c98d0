//! termy-core - Core library for term-reference resolution
//!
//! This crate provides the building blocks for:
//! - Parsing the inline term markup embedded in Spec-Up-T markdown documents
//!   (`[[def: ...]]`, `[[tref: ...]]`, `[[ref: ...]]`, `[[xref: ...]]`)
//! - Extracting term definitions from document content
//! - Validating the structural rules for term-definition files
//! - Rendering documents with term references resolved to HTML
//!
//! Everything in this crate is synchronous and free of I/O. Loading content
//! from a repository, fetching published pages, and caching live in the
//! `termy` crate, behind injected capabilities.
//!
//! # Extracting Terms
//!
//! Terms are defined in markdown with a definition line followed by
//! `~`-prefixed content lines:
//!
//! ```markdown
//! [[def: example, ex]]
//! ~ Part one of the definition.
//! ~ Part two.
//! ```
//!
//! Extract them with [`extract_terms`]:
//!
//! ```
//! use termy_core::extract_terms;
//!
//! let content = "[[def: example, ex]]\n~ Part one\n~ Part two";
//! let terms = extract_terms(content, "spec/terms-definitions/example.md");
//! assert_eq!(terms.len(), 1);
//! assert_eq!(terms[0].id, "example");
//! assert_eq!(terms[0].aliases, vec!["ex"]);
//! assert_eq!(terms[0].definition_text, "Part one Part two");
//! ```
//!
//! # Building an Index
//!
//! A [`TermIndex`] holds a deduplicated set of terms sorted case-insensitively
//! by id. Lookups stay case-sensitive:
//!
//! ```
//! use termy_core::{TermIndex, extract_terms};
//!
//! let terms = extract_terms("[[def: gadget]]\n~ A thing.", "terms/gadget.md");
//! let index = TermIndex::build(terms);
//! assert!(index.lookup_local("gadget").is_some());
//! assert!(index.lookup_local("Gadget").is_none());
//! ```
//!
//! # Rendering
//!
//! [`render_references`] resolves the four markup forms against an index and
//! never fails; unresolved references render with visible "not found" markers
//! so a live preview stays available for invalid documents.

pub mod extract;
pub mod markup;
pub mod render;
pub mod term;
pub mod validate;

pub use extract::extract_terms;
pub use markup::{DefinitionLine, parse_definition_line, split_aliases};
pub use render::render_references;
pub use term::{Term, TermIndex, TermKey};
pub use validate::{ValidationReport, is_in_terms_directory, validate_content};
