//! Fetching term lists from external specifications' published pages.
//!
//! Each [`ExternalSpecDescriptor`] names a published HTML page. The fetcher
//! retrieves it through the injected [`HtmlFetcher`] capability - trying the
//! proxy endpoint first when one is configured, then the direct URL - and
//! extracts the structured term list from the rendered markup.
//!
//! Descriptors are independent: a failed one contributes zero terms and is
//! reported as a [`FetchOutcome`], never an error. They are processed
//! sequentially with a small pacing delay so connectivity status can be
//! surfaced incrementally and the retrieval capability is not hammered.

use std::collections::BTreeSet;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use termy_config::ExternalSpecDescriptor;
use termy_core::Term;
use tracing::{debug, info, warn};

use crate::capabilities::{CapabilityError, HtmlFetcher};

static TERM_LIST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl.terms-and-definitions-list").expect("static selector"));
static ANY_DL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl").expect("static selector"));

/// Retrieval policy for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-attempt timeout passed to the fetch capability.
    pub timeout: Duration,
    /// Politeness delay between successive descriptors (not between retry
    /// attempts within one descriptor).
    pub pacing: Duration,
    /// CORS-bypass proxy prefix, e.g. `https://editor.example/proxy.php?url=`.
    /// When set, the proxied URL is attempted before the direct one.
    pub proxy_base: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            pacing: Duration::from_millis(250),
            proxy_base: None,
        }
    }
}

/// What happened to one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Fetched { terms: usize },
    Failed { reason: String },
}

/// Per-descriptor diagnostic, surfaced so an observer can report progress
/// and connectivity incrementally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub spec: String,
    pub url: String,
    pub status: FetchStatus,
}

/// Aggregate result of fetching all descriptors.
#[derive(Debug, Clone, Default)]
pub struct ExternalFetchReport {
    pub terms: Vec<Term>,
    pub outcomes: Vec<FetchOutcome>,
}

/// Fetches and parses external specifications' published term lists.
pub struct ExternalFetcher {
    fetcher: Arc<dyn HtmlFetcher>,
    options: FetchOptions,
}

impl ExternalFetcher {
    pub fn new(fetcher: Arc<dyn HtmlFetcher>) -> Self {
        Self::with_options(fetcher, FetchOptions::default())
    }

    pub fn with_options(fetcher: Arc<dyn HtmlFetcher>, options: FetchOptions) -> Self {
        Self { fetcher, options }
    }

    /// Fetch every descriptor's term list.
    ///
    /// Infallible at this boundary: each descriptor's outcome is independent,
    /// and failures are reported in the returned outcomes rather than raised.
    pub async fn fetch_all(&self, descriptors: &[ExternalSpecDescriptor]) -> ExternalFetchReport {
        let mut report = ExternalFetchReport::default();

        for (i, descriptor) in descriptors.iter().enumerate() {
            if i > 0 && !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }

            let status = match self.fetch_one(descriptor).await {
                Ok(terms) => {
                    info!(
                        spec = %descriptor.external_spec,
                        count = terms.len(),
                        "fetched external terms"
                    );
                    let status = FetchStatus::Fetched { terms: terms.len() };
                    report.terms.extend(terms);
                    status
                }
                Err(err) => {
                    warn!(
                        spec = %descriptor.external_spec,
                        url = %descriptor.gh_page,
                        "external spec unavailable: {err}"
                    );
                    FetchStatus::Failed {
                        reason: err.to_string(),
                    }
                }
            };

            report.outcomes.push(FetchOutcome {
                spec: descriptor.external_spec.clone(),
                url: descriptor.gh_page.clone(),
                status,
            });
        }

        report
    }

    /// Fetch one descriptor, trying each retrieval strategy in priority
    /// order until a fetch succeeds. The first successfully retrieved page
    /// is parsed; a page without a term list fails the descriptor rather
    /// than falling through to the next strategy (the next endpoint would
    /// serve the same document).
    async fn fetch_one(
        &self,
        descriptor: &ExternalSpecDescriptor,
    ) -> Result<Vec<Term>, CapabilityError> {
        if descriptor.gh_page.trim().is_empty() {
            return Err(CapabilityError::Malformed(
                "descriptor has no published page URL".to_string(),
            ));
        }

        let mut last_err = None;
        for url in self.attempt_urls(&descriptor.gh_page) {
            match self.fetcher.fetch_html(&url, self.options.timeout).await {
                Ok(html) => {
                    let terms = parse_published_terms(
                        &html,
                        &descriptor.external_spec,
                        &descriptor.gh_page,
                    );
                    if terms.is_empty() {
                        return Err(CapabilityError::Malformed(
                            "no term list found in published page".to_string(),
                        ));
                    }
                    return Ok(terms);
                }
                Err(err) => {
                    debug!(url = %url, "retrieval attempt failed: {err}");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| CapabilityError::Network("no retrieval strategy".to_string())))
    }

    /// Retrieval endpoints for a page, in priority order.
    fn attempt_urls(&self, gh_page: &str) -> Vec<String> {
        let mut urls = Vec::with_capacity(2);
        if let Some(proxy) = &self.options.proxy_base {
            urls.push(format!("{proxy}{gh_page}"));
        }
        urls.push(gh_page.to_string());
        urls
    }
}

/// Extract the published term list from a rendered spec page.
///
/// The list is a `<dl class="terms-and-definitions-list">` (any `<dl>` when
/// the classed container is absent) holding repeated `<dt>`/`<dd>` runs. A
/// `<dt>` counts as a term only when it carries the canonical original
/// identifier - an element whose `id` attribute starts with `term:`; entries
/// without it are skipped entirely, with no fallback identifier synthesis.
/// The `<dd>` siblings up to the next `<dt>` form the definition body.
pub fn parse_published_terms(html: &str, spec: &str, source_url: &str) -> Vec<Term> {
    let document = Html::parse_document(html);
    let container = document
        .select(&TERM_LIST)
        .next()
        .or_else(|| document.select(&ANY_DL).next());
    let Some(container) = container else {
        return Vec::new();
    };

    let mut terms = Vec::new();
    let mut current: Option<PublishedTerm> = None;

    for child in container.children() {
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };
        match element.value().name() {
            "dt" => {
                if let Some(done) = current.take() {
                    terms.push(done.into_term(spec, source_url));
                }
                current = canonical_marker(element).map(|(id, classes)| PublishedTerm {
                    id,
                    classes,
                    html: Vec::new(),
                    text: Vec::new(),
                });
            }
            "dd" => {
                if let Some(term) = current.as_mut() {
                    term.html.push(element.html());
                    term.text.push(flatten_text(element));
                }
            }
            _ => {}
        }
    }
    if let Some(done) = current.take() {
        terms.push(done.into_term(spec, source_url));
    }

    terms
}

struct PublishedTerm {
    id: String,
    classes: BTreeSet<String>,
    html: Vec<String>,
    text: Vec<String>,
}

impl PublishedTerm {
    fn into_term(self, spec: &str, source_url: &str) -> Term {
        let definition_text = self
            .text
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join(" ");
        Term {
            id: self.id,
            aliases: Vec::new(),
            source: source_url.to_string(),
            definition_html: self.html.concat(),
            definition_text,
            external: true,
            external_spec: Some(spec.to_string()),
            classes: self.classes,
        }
    }
}

/// Find the canonical original identifier on a `<dt>`: the first element
/// (the `dt` itself or a descendant) whose `id` starts with `term:`. Returns
/// the identifier and the marker element's CSS classes.
fn canonical_marker(dt: ElementRef) -> Option<(String, BTreeSet<String>)> {
    for node in dt.descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        if let Some(id) = element.value().attr("id")
            && let Some(canonical) = id.strip_prefix("term:")
        {
            let canonical = canonical.trim();
            if !canonical.is_empty() {
                let classes = element.value().classes().map(str::to_string).collect();
                return Some((canonical.to_string(), classes));
            }
        }
    }
    None
}

/// Flatten an element's text content: tags stripped, whitespace collapsed,
/// fragments joined with single spaces.
fn flatten_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
