//! Capabilities the engine consumes but does not implement.
//!
//! The core is a library embedded in a larger application; repository file
//! access and HTML retrieval are injected behind these traits. Any concrete
//! backend (GitHub REST, filesystem, plain HTTP) implements the same
//! interface. In-memory implementations with call counters live here too,
//! for tests and other hermetic embeddings.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Error taxonomy for injected capabilities.
///
/// Every variant except [`CapabilityError::AuthRequired`] is environmental
/// and degrades to "absence" at the smallest possible scope. Auth-required
/// is propagated: the engine cannot recover from it, and the embedding
/// application needs to distinguish it from a plain not-found to trigger a
/// re-authentication flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("authentication required")]
    AuthRequired,
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl CapabilityError {
    /// Whether this is the one error class the engine must propagate.
    pub fn is_auth(&self) -> bool {
        matches!(self, CapabilityError::AuthRequired)
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    pub is_file: bool,
    pub is_dir: bool,
}

/// Read access to the hosting repository at a fixed ref.
#[async_trait]
pub trait RepoFiles: Send + Sync {
    /// Fetch a single file's text content.
    async fn read_file(&self, path: &str) -> Result<String, CapabilityError>;

    /// Enumerate a directory's immediate entries.
    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, CapabilityError>;
}

/// Retrieval of published HTML documents, through whatever CORS-bypass or
/// proxy mechanism the embedding application provides.
#[async_trait]
pub trait HtmlFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`.
    async fn fetch_html(&self, url: &str, timeout: Duration) -> Result<String, CapabilityError>;
}

/// In-memory [`RepoFiles`] with call counters.
#[derive(Debug, Default)]
pub struct MemoryRepo {
    files: HashMap<String, String>,
    failing_reads: HashSet<String>,
    auth_required: bool,
    read_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content.
    pub fn add(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.files
            .insert(path.into().trim_matches('/').to_string(), content.into());
        self
    }

    /// Make reads of `path` fail with a network error.
    pub fn fail_read(mut self, path: impl Into<String>) -> Self {
        self.failing_reads
            .insert(path.into().trim_matches('/').to_string());
        self
    }

    /// Make every call fail with [`CapabilityError::AuthRequired`].
    pub fn deny_all(mut self) -> Self {
        self.auth_required = true;
        self
    }

    /// Number of `read_file` calls so far.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::Relaxed)
    }

    /// Number of `list_directory` calls so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RepoFiles for MemoryRepo {
    async fn read_file(&self, path: &str) -> Result<String, CapabilityError> {
        self.read_calls.fetch_add(1, Ordering::Relaxed);
        if self.auth_required {
            return Err(CapabilityError::AuthRequired);
        }
        let path = path.trim_matches('/');
        if self.failing_reads.contains(path) {
            return Err(CapabilityError::Network("injected read failure".to_string()));
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound(path.to_string()))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, CapabilityError> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        if self.auth_required {
            return Err(CapabilityError::AuthRequired);
        }
        let dir = path.trim_matches('/');
        let mut entries: Vec<DirEntry> = self
            .files
            .keys()
            .filter_map(|file| {
                let (parent, name) = file.rsplit_once('/')?;
                (parent == dir).then(|| DirEntry {
                    name: name.to_string(),
                    path: file.clone(),
                    is_file: true,
                    is_dir: false,
                })
            })
            .collect();
        if entries.is_empty() && !self.files.keys().any(|f| f.starts_with(&format!("{dir}/"))) {
            return Err(CapabilityError::NotFound(dir.to_string()));
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

/// In-memory [`HtmlFetcher`] with call recording.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    pages: HashMap<String, String>,
    failures: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn add_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    /// Make fetches of `url` fail with a network error.
    pub fn fail(mut self, url: impl Into<String>) -> Self {
        self.failures.insert(url.into());
        self
    }

    /// Every URL requested so far, in order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }

    /// Number of fetches so far.
    pub fn fetch_calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait]
impl HtmlFetcher for MemoryFetcher {
    async fn fetch_html(&self, url: &str, _timeout: Duration) -> Result<String, CapabilityError> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.failures.contains(url) {
            return Err(CapabilityError::Network("injected fetch failure".to_string()));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| CapabilityError::NotFound(url.to_string()))
    }
}

/// Filesystem-backed [`RepoFiles`], rooted at a directory.
#[derive(Debug, Clone)]
pub struct FsRepo {
    root: PathBuf,
}

impl FsRepo {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn map_io(path: &str, err: std::io::Error) -> CapabilityError {
        match err.kind() {
            std::io::ErrorKind::NotFound => CapabilityError::NotFound(path.to_string()),
            std::io::ErrorKind::PermissionDenied => CapabilityError::AuthRequired,
            _ => CapabilityError::Network(err.to_string()),
        }
    }
}

#[async_trait]
impl RepoFiles for FsRepo {
    async fn read_file(&self, path: &str) -> Result<String, CapabilityError> {
        let full = self.root.join(path.trim_matches('/'));
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| Self::map_io(path, e))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, CapabilityError> {
        let dir = path.trim_matches('/');
        let full = self.root.join(dir);
        let mut reader = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| Self::map_io(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| Self::map_io(path, e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| Self::map_io(path, e))?;
            let entry_path = if dir.is_empty() {
                name.clone()
            } else {
                format!("{dir}/{name}")
            };
            entries.push(DirEntry {
                name,
                path: entry_path,
                is_file: file_type.is_file(),
                is_dir: file_type.is_dir(),
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_repo_read_and_list() {
        let repo = MemoryRepo::new()
            .add("spec/terms-definitions/a.md", "[[def: a]]")
            .add("spec/terms-definitions/b.md", "[[def: b]]")
            .add("spec/other.md", "prose");

        let entries = repo.list_directory("spec/terms-definitions").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_file));

        let content = repo.read_file("spec/terms-definitions/a.md").await.unwrap();
        assert_eq!(content, "[[def: a]]");
        assert_eq!(repo.read_calls(), 1);
        assert_eq!(repo.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_memory_repo_missing_directory() {
        let repo = MemoryRepo::new().add("spec/other.md", "prose");
        let err = repo.list_directory("spec/terms-definitions").await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_repo_auth_denied() {
        let repo = MemoryRepo::new().add("specs.json", "{}").deny_all();
        let err = repo.read_file("specs.json").await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_fs_repo_read_and_list() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("spec/terms-definitions")).unwrap();
        std::fs::write(
            dir.path().join("spec/terms-definitions/a.md"),
            "[[def: a]]\n~ Body.",
        )
        .unwrap();

        let repo = FsRepo::new(dir.path());
        let entries = repo.list_directory("spec/terms-definitions").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_file);
        assert_eq!(entries[0].name, "a.md");
        assert_eq!(entries[0].path, "spec/terms-definitions/a.md");

        let content = repo.read_file("spec/terms-definitions/a.md").await.unwrap();
        assert!(content.starts_with("[[def: a]]"));

        let err = repo.read_file("missing.md").await.unwrap_err();
        assert!(matches!(err, CapabilityError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_fetcher_records_requests() {
        let fetcher = MemoryFetcher::new()
            .add_page("https://example.org/", "<html></html>")
            .fail("https://broken.example.org/");

        assert!(
            fetcher
                .fetch_html("https://example.org/", Duration::from_secs(1))
                .await
                .is_ok()
        );
        assert!(
            fetcher
                .fetch_html("https://broken.example.org/", Duration::from_secs(1))
                .await
                .is_err()
        );
        assert_eq!(
            fetcher.requested_urls(),
            vec![
                "https://example.org/".to_string(),
                "https://broken.example.org/".to_string()
            ]
        );
    }
}
