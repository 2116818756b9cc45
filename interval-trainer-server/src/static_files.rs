//! Serving the built web client from disk.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

const LOG_TARGET: &str = "interval_trainer::static";

/// Entry point of the single-page client
pub const INDEX_FILE: &str = "index.html";

/// A file read from the static directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFile {
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Outcome of a static lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaticLookup {
    /// The requested file
    Found(StaticFile),
    /// The requested file does not exist; this is `index.html`
    Fallback(StaticFile),
    /// Neither the file nor `index.html` exist
    NotFound,
}

#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to a file under the root.
    ///
    /// Returns `None` for anything that is not a plain relative path, such as
    /// `..` segments or absolute components.
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
        let relative = request_path.trim_start_matches('/');
        if relative.is_empty() {
            return Some(self.root.join(INDEX_FILE));
        }

        let mut path = self.root.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return None;
                }
            }
        }
        Some(path)
    }

    /// Look up the file for `request_path`, falling back to `index.html`.
    pub async fn lookup(&self, request_path: &str) -> StaticLookup {
        match self.resolve(request_path) {
            Some(path) => {
                if let Some(file) = read_file(&path).await {
                    return StaticLookup::Found(file);
                }
            }
            None => {
                warn!(target: LOG_TARGET, "Refused path outside static root: {}", request_path);
            }
        }

        match read_file(&self.root.join(INDEX_FILE)).await {
            Some(index) => {
                debug!(target: LOG_TARGET, "Serving {} for {}", INDEX_FILE, request_path);
                StaticLookup::Fallback(index)
            }
            None => StaticLookup::NotFound,
        }
    }
}

async fn read_file(path: &Path) -> Option<StaticFile> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    if !metadata.is_file() {
        return None;
    }

    match tokio::fs::read(path).await {
        Ok(body) => Some(StaticFile {
            content_type: content_type(path),
            body,
        }),
        Err(e) => {
            warn!(target: LOG_TARGET, "Failed to read {}: {}", path.display(), e);
            None
        }
    }
}

/// Guess the MIME type from the file extension
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json" | "map") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}
