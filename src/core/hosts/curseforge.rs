// ─── CurseForge ───
// Search hits advertise loaders through numeric `modLoader` codes on their
// latest file indexes. File `gameVersions` mixes game versions and loader
// names ("1.20.1", "Fabric"): versions match by substring, loader names
// exactly (case-insensitive). Files may carry any number of md5 digests.

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
use crate::core::loader::LoaderType;

pub const HOST_TAG: &str = "curseforge";

/// Fallback source for the API key when the host block has none.
pub const API_KEY_ENV: &str = "CURSEFORGE_API_KEY";

const CURSEFORGE_API_BASE: &str = "https://api.curseforge.com/v1";
const API_KEY_HEADER: &str = "x-api-key";
const MINECRAFT_GAME_ID: &str = "432";
const MODS_CLASS_ID: &str = "6";
const HASH_ALGO_MD5: u32 = 2;

#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMod {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub latest_files_indexes: Vec<FileIndex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileIndex {
    #[serde(default)]
    pub mod_loader: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModFile {
    pub file_name: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub game_versions: Vec<String>,
    #[serde(default)]
    pub hashes: Vec<FileHash>,
}

#[derive(Debug, Deserialize)]
pub struct FileHash {
    pub value: String,
    pub algo: u32,
}

impl From<SearchMod> for ModCandidate {
    fn from(hit: SearchMod) -> Self {
        let mut loaders: Vec<String> = Vec::new();
        for index in &hit.latest_files_indexes {
            let Some(loader) = index.mod_loader.and_then(LoaderType::from_curseforge_code) else {
                continue;
            };
            let name = loader.to_string();
            if !loaders.contains(&name) {
                loaders.push(name);
            }
        }

        ModCandidate {
            id: HostIdentifier::new(hit.id.to_string()),
            title: hit.name,
            loaders,
        }
    }
}

/// True when some entry contains `version` and some entry is exactly the
/// `loader` name (case-insensitive), so `forge` never matches `NeoForge`.
pub fn file_matches(file: &ModFile, version: &str, loader: &str) -> bool {
    let has_version = file.game_versions.iter().any(|v| v.contains(version));
    let has_loader = file
        .game_versions
        .iter()
        .any(|v| v.eq_ignore_ascii_case(loader));
    has_version && has_loader
}

/// First downloadable file (host order, newest first) that matches.
pub fn pick_file<'a>(files: &'a [ModFile], version: &str, loader: &str) -> Option<&'a ModFile> {
    files
        .iter()
        .filter(|f| f.download_url.is_some())
        .find(|f| file_matches(f, version, loader))
}

pub fn describe_file(file: &ModFile) -> SyncResult<Option<FileDescriptor>> {
    let Some(url) = file.download_url.as_deref() else {
        return Ok(None);
    };
    let hashes = file
        .hashes
        .iter()
        .filter(|h| h.algo == HASH_ALGO_MD5)
        .map(|h| h.value.clone())
        .collect();
    FileDescriptor::new(&file.file_name, url, hashes, HashAlgorithm::Md5).map(Some)
}

pub struct CurseForgeAdapter {
    config: AdapterConfig,
    client: Client,
    api_base: String,
    api_key: Option<String>,
}

impl CurseForgeAdapter {
    pub fn new(config: AdapterConfig, client: Client) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| CURSEFORGE_API_BASE.to_string());
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        if api_key.is_none() {
            warn!(
                "No CurseForge API key configured (set api_key or {}); requests will likely be rejected",
                API_KEY_ENV
            );
        }

        Self {
            config,
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    async fn get_data<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> SyncResult<T> {
        debug!("GET {} {:?}", url, query);
        let mut req = self.client.get(url).query(query);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let resp = req.send().await?;

        if !resp.status().is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        Ok(resp.json::<Envelope<T>>().await?.data)
    }
}

#[async_trait]
impl HostAdapter for CurseForgeAdapter {
    fn host_tag(&self) -> &'static str {
        HOST_TAG
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        HashAlgorithm::Md5
    }

    fn config(&self) -> &AdapterConfig {
        &self.config
    }

    async fn resolve_identifier(&self, mod_name: &str) -> SyncResult<CandidateMatch> {
        let url = format!("{}/mods/search", self.api_base);
        let hits: Vec<SearchMod> = self
            .get_data(
                &url,
                &[
                    ("gameId", MINECRAFT_GAME_ID),
                    ("classId", MODS_CLASS_ID),
                    ("searchFilter", mod_name),
                ],
            )
            .await?;

        let candidates: Vec<ModCandidate> = hits.into_iter().map(Into::into).collect();
        let resolution = select_candidate(&candidates, mod_name, &self.config.loader);
        match &resolution {
            CandidateMatch::Found(id) => {
                info!("{}: {} -> mod {}", HOST_TAG, mod_name, id);
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
        let url = format!("{}/mods/{}/files", self.api_base, id);
        let files: Vec<ModFile> = self.get_data(&url, &[]).await?;

        match pick_file(&files, &self.config.version, &self.config.loader) {
            Some(file) => describe_file(file),
            None => {
                warn!(
                    "{}: mod {} has no {} file for Minecraft {}",
                    HOST_TAG, id, self.config.loader, self.config.version
                );
                Ok(None)
            }
        }
    }
}
