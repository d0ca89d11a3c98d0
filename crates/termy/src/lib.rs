//! termy - term index building for Spec-Up-T repositories
//!
//! This crate orchestrates the synchronous engine in [`termy_core`] over
//! injected capabilities:
//!
//! - [`capabilities`] - the contracts the engine consumes but does not
//!   implement: repository file access ([`RepoFiles`]), published-page
//!   retrieval ([`HtmlFetcher`]), plus in-memory and filesystem backends
//! - [`cache`] - the scoped key-value store holding built indexes, with TTL
//!   semantics applied by the builder
//! - [`external`] - fetching and parsing external specifications' published
//!   term lists, with per-descriptor failure isolation
//! - [`index`] - the [`TermIndexer`] that puts it all together
//!
//! # Building an index
//!
//! ```no_run
//! use std::sync::Arc;
//! use termy::capabilities::{FsRepo, MemoryFetcher};
//! use termy::cache::MemoryCache;
//! use termy::index::TermIndexer;
//!
//! # async fn example() -> eyre::Result<()> {
//! let indexer = TermIndexer::new(
//!     Arc::new(FsRepo::new("/path/to/checkout")),
//!     Arc::new(MemoryFetcher::new()),
//!     Arc::new(MemoryCache::new()),
//! );
//! let index = indexer.build_index("owner/repo/main").await?;
//! for term in index.iter() {
//!     println!("{}", term.id);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Every embedding context owns its own [`TermIndexer`]; there is no shared
//! global state. With the `fetch` feature enabled, [`fetch::HttpFetcher`]
//! provides a ready-made HTTP backend for the fetch capability.

pub mod cache;
pub mod capabilities;
pub mod external;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod index;

pub use cache::{CacheEntry, MemoryCache, TermCache};
pub use capabilities::{
    CapabilityError, DirEntry, FsRepo, HtmlFetcher, MemoryFetcher, MemoryRepo, RepoFiles,
};
pub use external::{ExternalFetchReport, ExternalFetcher, FetchOptions, FetchOutcome, FetchStatus};
pub use index::{IndexerOptions, TermIndexer};

pub use termy_config::{ExternalSpecDescriptor, SpecEntry, SpecsConfig};
pub use termy_core::{Term, TermIndex, TermKey, ValidationReport, extract_terms, render_references};

/// Validate a document against the structural rules for term-definition
/// files, resolving the terms directory from `config`.
///
/// Convenience wrapper over [`termy_core::validate_content`] for callers
/// holding a [`SpecsConfig`] rather than a resolved path.
pub fn validate_content(content: &str, file_path: &str, config: &SpecsConfig) -> ValidationReport {
    termy_core::validate_content(content, file_path, &config.terms_path())
}
