// ─── Modrinth ───
// Search hits carry loader names in `categories`; every file carries one
// sha512. A version matches when its newest listed game version equals the
// target exactly.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::adapter::{
    select_candidate, CandidateMatch, FileDescriptor, HostAdapter, HostIdentifier, ModCandidate,
};
use crate::core::checksum::HashAlgorithm;
use crate::core::config::AdapterConfig;
use crate::core::error::{SyncError, SyncResult};

pub const HOST_TAG: &str = "modrinth";

const MODRINTH_API_BASE: &str = "https://api.modrinth.com/v2";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub project_id: String,
    pub title: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectVersion {
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub loaders: Vec<String>,
    #[serde(default)]
    pub files: Vec<VersionFile>,
}

#[derive(Debug, Deserialize)]
pub struct VersionFile {
    pub url: String,
    pub filename: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub hashes: VersionFileHashes,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionFileHashes {
    pub sha512: Option<String>,
}

impl From<SearchHit> for ModCandidate {
    fn from(hit: SearchHit) -> Self {
        ModCandidate {
            id: HostIdentifier::new(hit.project_id),
            title: hit.title,
            loaders: hit.categories,
        }
    }
}

/// First version (host order, newest first) whose last game version is `target`.
pub fn pick_version<'a>(versions: &'a [ProjectVersion], target: &str) -> Option<&'a ProjectVersion> {
    versions
        .iter()
        .find(|v| v.game_versions.last().map(String::as_str) == Some(target))
}

/// Normalize a version into a descriptor: primary file, else the first one.
pub fn describe_version(version: &ProjectVersion) -> SyncResult<Option<FileDescriptor>> {
    let Some(file) = version
        .files
        .iter()
        .find(|f| f.primary)
        .or_else(|| version.files.first())
    else {
        return Ok(None);
    };

    let hashes = file.hashes.sha512.iter().cloned().collect();
    FileDescriptor::new(&file.filename, &file.url, hashes, HashAlgorithm::Sha512).map(Some)
}

pub struct ModrinthAdapter {
    config: AdapterConfig,
    client: Client,
    api_base: String,
}

impl ModrinthAdapter {
    pub fn new(config: AdapterConfig, client: Client) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| MODRINTH_API_BASE.to_string());
        Self {
            config,
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> SyncResult<T> {
        debug!("GET {} {:?}", url, query);
        let resp = self.client.get(url).query(query).send().await?;

        if !resp.status().is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl HostAdapter for ModrinthAdapter {
    fn host_tag(&self) -> &'static str {
        HOST_TAG
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Sha512
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn resolve_identifier(&self, mod_name: &str) -> SyncResult<CandidateMatch> {
        let url = format!("{}/search", self.api_base);
        let query = mod_name.to_lowercase();
        let response: SearchResponse = self.get_json(&url, &[("query", query.as_str())]).await?;

        let candidates: Vec<ModCandidate> = response.hits.into_iter().map(Into::into).collect();
        let resolution = select_candidate(&candidates, mod_name, &self.config.loader);
        match &resolution {
            CandidateMatch::Found(id) => {
                info!("{}: {} -> project {}", HOST_TAG, mod_name, id);
            }
            CandidateMatch::WrongLoader => {
                warn!(
                    "Found {} on {} but not for loader '{}'",
                    mod_name, HOST_TAG, self.config.loader
                );
            }
            CandidateMatch::NotFound => {
                warn!(
                    "{} not found, check on {} if it exists or mod name spelling",
                    mod_name, HOST_TAG
                );
            }
        }
        Ok(resolution)
    }

    async fn resolve_file(&self, id: &HostIdentifier) -> SyncResult<Option<FileDescriptor>> {
        let url = format!("{}/project/{}/version", self.api_base, id);
        let versions: Vec<ProjectVersion> = self.get_json(&url, &[]).await?;

        match pick_version(&versions, &self.config.version) {
            Some(version) => {
                debug!(
                    "{}: project {} matched game versions {:?} (loaders {:?})",
                    HOST_TAG, id, version.game_versions, version.loaders
                );
                describe_version(version)
            }
            None => {
                warn!(
                    "{}: project {} has no file for Minecraft {}",
                    HOST_TAG, id, self.config.version
                );
                Ok(None)
            }
        }
    }
}
