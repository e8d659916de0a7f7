use std::path::PathBuf;
use thiserror::Error;

/// Which resolution step came back empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundStage {
    /// The search endpoint produced no usable candidate.
    Identifier,
    /// A project title matched, but none for the configured loader.
    WrongLoader,
    /// The mod exists but no file matches the target version/loader.
    File,
}

impl std::fmt::Display for NotFoundStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotFoundStage::Identifier => write!(f, "no matching project"),
            NotFoundStage::WrongLoader => write!(f, "project exists but not for this loader"),
            NotFoundStage::File => write!(f, "no file for the requested version and loader"),
        }
    }
}

/// Central error type for the resolve/download/verify pipeline.
/// Every module returns `Result<T, SyncError>`.
#[derive(Debug, Error)]
pub enum SyncError {
    // ── Registry ────────────────────────────────────────
    #[error("Unsupported host '{0}'")]
    UnsupportedHost(String),

    // ── Resolution ──────────────────────────────────────
    #[error("{mod_name} not found on {host}: {stage}")]
    NotFound {
        mod_name: String,
        host: String,
        stage: NotFoundStage,
    },

    #[error("Refusing unsafe file name from host: {0:?}")]
    UnsafeFileName(String),

    // ── Integrity ───────────────────────────────────────
    #[error("Checksum mismatch for {path:?}: expected one of {expected:?}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: Vec<String>,
        actual: String,
    },

    #[error("Checksum still mismatched for {mod_name} after {attempts} attempts")]
    ChecksumExhausted { mod_name: String, attempts: u32 },

    #[error("Download of {mod_name} abandoned: {source}")]
    TransientDownload {
        mod_name: String,
        #[source]
        source: Box<SyncError>,
    },

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Config ──────────────────────────────────────────
    #[error("Config error: {0}")]
    Config(Box<figment::Error>),
}

/// Convenience alias used throughout the crate.
pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Network and IO faults; these abandon a single mod, never the run.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Io { .. }
                | SyncError::Http(_)
                | SyncError::DownloadFailed { .. }
                | SyncError::TransientDownload { .. }
        )
    }
}

impl From<std::io::Error> for SyncError {
    fn from(source: std::io::Error) -> Self {
        SyncError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl From<figment::Error> for SyncError {
    fn from(err: figment::Error) -> Self {
        SyncError::Config(Box::new(err))
    }
}
