use async_trait::async_trait;

use crate::core::checksum::HashAlgorithm;
use crate::core::config::AdapterConfig;
use crate::core::error::{SyncError, SyncResult};

/// Host-assigned key for a mod. Meaningless outside that host's namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostIdentifier(String);

impl HostIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HostIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A concrete downloadable file, already normalized from the host's response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub filename: String,
    pub download_url: String,
    pub expected_hashes: Vec<String>,
    pub algorithm: HashAlgorithm,
}

impl FileDescriptor {
    /// Rejects file names that would escape the mod directory.
    pub fn new(
        filename: impl Into<String>,
        download_url: impl Into<String>,
        expected_hashes: Vec<String>,
        algorithm: HashAlgorithm,
    ) -> SyncResult<Self> {
        let filename = filename.into();
        if !is_plain_file_name(&filename) {
            return Err(SyncError::UnsafeFileName(filename));
        }
        Ok(Self {
            filename,
            download_url: download_url.into(),
            expected_hashes,
            algorithm,
        })
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.contains(':')
}

/// One search hit, reduced to what matching needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModCandidate {
    pub id: HostIdentifier,
    pub title: String,
    pub loaders: Vec<String>,
}

/// Result of scanning a host's search hits for a mod name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateMatch {
    Found(HostIdentifier),
    /// A title matched, but never together with the configured loader.
    WrongLoader,
    NotFound,
}

/// Pick the first hit whose title contains `mod_name` and whose loader list
/// contains `loader` (case-insensitive), in the order the host returned them.
///
/// Case-sensitive title containment is tried first; only when no hit
/// qualifies that way is the title compared case-folded.
pub fn select_candidate(candidates: &[ModCandidate], mod_name: &str, loader: &str) -> CandidateMatch {
    let exact = scan_candidates(candidates, loader, |title| title.contains(mod_name));
    if let CandidateMatch::Found(_) = exact {
        return exact;
    }

    let folded_name = mod_name.to_lowercase();
    let folded = scan_candidates(candidates, loader, |title| {
        title.to_lowercase().contains(&folded_name)
    });
    match (exact, folded) {
        (_, found @ CandidateMatch::Found(_)) => found,
        (CandidateMatch::WrongLoader, _) | (_, CandidateMatch::WrongLoader) => {
            CandidateMatch::WrongLoader
        }
        _ => CandidateMatch::NotFound,
    }
}

fn scan_candidates(
    candidates: &[ModCandidate],
    loader: &str,
    title_matches: impl Fn(&str) -> bool,
) -> CandidateMatch {
    let mut title_seen = false;
    for candidate in candidates {
        if !title_matches(&candidate.title) {
            continue;
        }
        title_seen = true;
        if candidate
            .loaders
            .iter()
            .any(|l| l.eq_ignore_ascii_case(loader))
        {
            return CandidateMatch::Found(candidate.id.clone());
        }
    }

    if title_seen {
        CandidateMatch::WrongLoader
    } else {
        CandidateMatch::NotFound
    }
}

/// A mod-hosting service: turns names into identifiers and identifiers into files.
#[async_trait]
pub trait HostAdapter: Send + Sync {
    /// Registry key, e.g. `"modrinth"`.
    fn host_tag(&self) -> &'static str;

    fn hash_algorithm(&self) -> HashAlgorithm;

    fn config(&self) -> &AdapterConfig;

    /// Search the host for `mod_name`. Anything but `Found` has already
    /// been logged with its reason.
    async fn resolve_identifier(&self, mod_name: &str) -> SyncResult<CandidateMatch>;

    /// Newest file for the configured version and loader, if any.
    async fn resolve_file(&self, id: &HostIdentifier) -> SyncResult<Option<FileDescriptor>>;
}
