//! Term index building.
//!
//! [`TermIndexer`] combines local extraction results (every term file in the
//! configured terms directory) with external fetcher results into one
//! [`TermIndex`], through an injected cache with TTL semantics.
//!
//! Each embedding context (editor session, preview session) constructs its
//! own indexer with its dependencies injected; there are no ambient
//! singletons. Indexes are rebuilt wholesale - a fresh `refresh` supersedes
//! an in-flight build's eventual result at the cache-write step
//! (last-write-wins).

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use eyre::{Result, ensure};
use futures_util::future::join_all;
use termy_config::SpecsConfig;
use termy_core::{TermIndex, ValidationReport, extract_terms};
use tracing::{debug, info, warn};

use crate::cache::TermCache;
use crate::capabilities::{CapabilityError, RepoFiles};
use crate::external::{ExternalFetcher, FetchOptions, FetchStatus};

/// Where the configuration lives in the hosting repository.
pub const SPECS_CONFIG_PATH: &str = "specs.json";

/// How long a cached index stays fresh, measured from write time.
pub const CACHE_TTL: Duration = Duration::from_secs(3600);

/// How many file reads are in flight at once during local extraction.
pub const FILE_BATCH_SIZE: usize = 5;

/// File extensions scanned for term definitions.
pub const TERM_FILE_EXTENSIONS: &[&str] = &["md", "txt", "rst", "adoc"];

/// Whether a file name carries one of the scanned extensions.
pub fn is_term_file(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| TERM_FILE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Tuning knobs for an indexer.
#[derive(Debug, Clone)]
pub struct IndexerOptions {
    /// Cache time-to-live.
    pub ttl: Duration,
    /// External retrieval policy.
    pub fetch: FetchOptions,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            ttl: CACHE_TTL,
            fetch: FetchOptions::default(),
        }
    }
}

/// Builds term indexes for one repository scope.
pub struct TermIndexer {
    repo: Arc<dyn RepoFiles>,
    cache: Arc<dyn TermCache>,
    fetcher: ExternalFetcher,
    ttl: Duration,
}

impl TermIndexer {
    pub fn new(
        repo: Arc<dyn RepoFiles>,
        html: Arc<dyn crate::capabilities::HtmlFetcher>,
        cache: Arc<dyn TermCache>,
    ) -> Self {
        Self::with_options(repo, html, cache, IndexerOptions::default())
    }

    pub fn with_options(
        repo: Arc<dyn RepoFiles>,
        html: Arc<dyn crate::capabilities::HtmlFetcher>,
        cache: Arc<dyn TermCache>,
        options: IndexerOptions,
    ) -> Self {
        Self {
            repo,
            cache,
            fetcher: ExternalFetcher::with_options(html, options.fetch),
            ttl: options.ttl,
        }
    }

    /// Load `specs.json` from the repository.
    ///
    /// Missing or malformed configuration degrades to the built-in defaults;
    /// only an authentication failure propagates, since the engine cannot
    /// recover from it.
    pub async fn load_config(&self) -> Result<SpecsConfig> {
        match self.repo.read_file(SPECS_CONFIG_PATH).await {
            Ok(content) => match SpecsConfig::from_json(&content) {
                Ok(config) => Ok(config),
                Err(err) => {
                    warn!("specs.json is malformed, using defaults: {err}");
                    Ok(SpecsConfig::default())
                }
            },
            Err(err) if err.is_auth() => Err(err.into()),
            Err(err) => {
                warn!("specs.json unavailable, using defaults: {err}");
                Ok(SpecsConfig::default())
            }
        }
    }

    /// Build the term index for `scope`, a non-empty opaque key (typically
    /// `owner/repo/branch`).
    ///
    /// A non-expired cache entry short-circuits all fetching - a full
    /// bypass, not a freshness check against the source. Otherwise the index
    /// is rebuilt from every term file plus every external spec, cached, and
    /// returned. Partial failure yields a smaller index, not an error; the
    /// build only fails on an authentication failure or a contract
    /// violation.
    pub async fn build_index(&self, scope: &str) -> Result<TermIndex> {
        ensure!(!scope.trim().is_empty(), "scope key must not be empty");

        let now = SystemTime::now();
        if let Some(entry) = self.cache.get(scope).await
            && !entry.is_expired(self.ttl, now)
        {
            debug!(scope, "term index cache hit");
            return Ok(TermIndex::build(entry.terms));
        }

        let config = self.load_config().await?;
        let mut terms = self.extract_local_terms(&config).await?;

        let report = self.fetcher.fetch_all(&config.external_specs()).await;
        for outcome in &report.outcomes {
            if let FetchStatus::Failed { reason } = &outcome.status {
                debug!(spec = %outcome.spec, "descriptor failed: {reason}");
            }
        }
        terms.extend(report.terms);

        let index = TermIndex::build(terms);
        self.cache
            .set(scope, index.terms().to_vec(), SystemTime::now())
            .await;
        info!(scope, count = index.len(), "term index built");
        Ok(index)
    }

    /// Build an index for a single file, merging its terms with whatever
    /// external terms are already present in the cached index for `scope`.
    ///
    /// Supports single-file editing contexts without a full directory
    /// re-scan: local terms from other files are not re-scanned, previously
    /// cached external terms are preserved, and the cache is left untouched
    /// (writing this partial view would clobber the other files' terms).
    ///
    /// `content` is used when provided; otherwise the file is read through
    /// the repository capability.
    pub async fn build_index_for_single_file(
        &self,
        scope: &str,
        path: &str,
        content: Option<&str>,
    ) -> Result<TermIndex> {
        ensure!(!scope.trim().is_empty(), "scope key must not be empty");

        let mut terms = match content {
            Some(content) => extract_terms(content, path),
            None => match self.repo.read_file(path).await {
                Ok(content) => extract_terms(&content, path),
                Err(err) if err.is_auth() => return Err(err.into()),
                Err(err) => {
                    warn!(path, "term file unavailable: {err}");
                    Vec::new()
                }
            },
        };

        let now = SystemTime::now();
        if let Some(entry) = self.cache.get(scope).await
            && !entry.is_expired(self.ttl, now)
        {
            terms.extend(entry.terms.into_iter().filter(|t| t.external));
        }

        Ok(TermIndex::build(terms))
    }

    /// Drop the cached index for `scope` and rebuild it.
    pub async fn refresh(&self, scope: &str) -> Result<TermIndex> {
        self.cache.delete(scope).await;
        self.build_index(scope).await
    }

    /// Validate a document against the structural rules for term files,
    /// resolving the terms directory from the repository configuration.
    pub async fn validate_file(&self, content: &str, path: &str) -> Result<ValidationReport> {
        let config = self.load_config().await?;
        Ok(termy_core::validate_content(content, path, &config.terms_path()))
    }

    /// Extract terms from every term file in the configured terms directory.
    ///
    /// Files are read in batches of [`FILE_BATCH_SIZE`] concurrently-awaited
    /// requests. Result order across batches is irrelevant - the index is
    /// sorted before being returned. A single file's failure skips that file;
    /// a missing terms directory yields zero local terms.
    async fn extract_local_terms(
        &self,
        config: &SpecsConfig,
    ) -> Result<Vec<termy_core::Term>> {
        let terms_path = config.terms_path();
        let entries = match self.repo.list_directory(&terms_path).await {
            Ok(entries) => entries,
            Err(err) if err.is_auth() => return Err(err.into()),
            Err(err) => {
                warn!(directory = %terms_path, "terms directory unavailable: {err}");
                return Ok(Vec::new());
            }
        };

        let files: Vec<_> = entries
            .into_iter()
            .filter(|e| e.is_file && is_term_file(&e.name))
            .collect();

        let mut terms = Vec::new();
        for batch in files.chunks(FILE_BATCH_SIZE) {
            let reads = batch.iter().map(|file| async move {
                (file.path.as_str(), self.repo.read_file(&file.path).await)
            });
            for (path, result) in join_all(reads).await {
                match result {
                    Ok(content) => terms.extend(extract_terms(&content, path)),
                    Err(CapabilityError::AuthRequired) => {
                        return Err(CapabilityError::AuthRequired.into());
                    }
                    Err(err) => warn!(path, "skipping unreadable term file: {err}"),
                }
            }
        }
        Ok(terms)
    }
}
