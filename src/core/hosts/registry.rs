use std::collections::HashMap;
use std::sync::OnceLock;

use async_trait::async_trait;
use reqwest::Client;

use super::adapter::{CandidateMatch, FileDescriptor, HostAdapter, HostIdentifier};
use super::curseforge::{self, CurseForgeAdapter};
use super::modrinth::{self, ModrinthAdapter};
use crate::core::checksum::HashAlgorithm;
use crate::core::config::AdapterConfig;
use crate::core::error::{SyncError, SyncResult};

/// Adapter dispatcher without `Box<dyn>`: one variant per supported host.
pub enum Host {
    Modrinth(ModrinthAdapter),
    CurseForge(CurseForgeAdapter),
}

type HostFactory = fn(AdapterConfig, Client) -> Host;

static REGISTRY: OnceLock<HashMap<&'static str, HostFactory>> = OnceLock::new();

fn registry() -> &'static HashMap<&'static str, HostFactory> {
    REGISTRY.get_or_init(|| {
        let mut hosts: HashMap<&'static str, HostFactory> = HashMap::new();
        hosts.insert(modrinth::HOST_TAG, |config, client| {
            Host::Modrinth(ModrinthAdapter::new(config, client))
        });
        hosts.insert(curseforge::HOST_TAG, |config, client| {
            Host::CurseForge(CurseForgeAdapter::new(config, client))
        });
        hosts
    })
}

/// Host tags the registry can build, sorted.
pub fn supported_hosts() -> Vec<&'static str> {
    let mut tags: Vec<_> = registry().keys().copied().collect();
    tags.sort_unstable();
    tags
}

impl Host {
    /// Build the adapter registered under `host_name`, bound to `config`.
    pub fn create(host_name: &str, config: AdapterConfig, client: Client) -> SyncResult<Self> {
        let factory = registry()
            .get(host_name)
            .ok_or_else(|| SyncError::UnsupportedHost(host_name.to_string()))?;
        Ok(factory(config, client))
    }

    fn adapter(&self) -> &dyn HostAdapter {
        match self {
            Host::Modrinth(a) => a,
            Host::CurseForge(a) => a,
        }
    }
}

#[async_trait]
impl HostAdapter for Host {
    fn host_tag(&self) -> &'static str {
        self.adapter().host_tag()
    }

    fn hash_algorithm(&self) -> HashAlgorithm {
        self.adapter().hash_algorithm()
    }

    fn config(&self) -> &AdapterConfig {
        self.adapter().config()
    }

    async fn resolve_identifier(&self, mod_name: &str) -> SyncResult<CandidateMatch> {
        match self {
            Host::Modrinth(a) => a.resolve_identifier(mod_name).await,
            Host::CurseForge(a) => a.resolve_identifier(mod_name).await,
        }
    }

    async fn resolve_file(&self, id: &HostIdentifier) -> SyncResult<Option<FileDescriptor>> {
        match self {
            Host::Modrinth(a) => a.resolve_file(id).await,
            Host::CurseForge(a) => a.resolve_file(id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::http::build_http_client;

    fn config() -> AdapterConfig {
        let mut config = AdapterConfig::new("1.20.1", "fabric", "/tmp/mods");
        config.api_key = Some("key".into());
        config
    }

    #[test]
    fn every_supported_host_round_trips_its_tag() {
        let client = build_http_client().unwrap();
        for tag in supported_hosts() {
            let host = Host::create(tag, config(), client.clone()).unwrap();
            assert_eq!(host.host_tag(), tag);
            assert_eq!(host.config(), &config());
        }
    }

    #[test]
    fn hosts_declare_their_hash_algorithm() {
        let client = build_http_client().unwrap();
        let modrinth = Host::create("modrinth", config(), client.clone()).unwrap();
        let curseforge = Host::create("curseforge", config(), client).unwrap();
        assert_eq!(modrinth.hash_algorithm(), HashAlgorithm::Sha512);
        assert_eq!(curseforge.hash_algorithm(), HashAlgorithm::Md5);
    }

    #[test]
    fn unknown_host_is_rejected() {
        let client = build_http_client().unwrap();
        for name in ["planetminecraft", "Modrinth", ""] {
            let err = Host::create(name, config(), client.clone()).err().unwrap();
            assert!(matches!(err, SyncError::UnsupportedHost(ref h) if h == name));
        }
    }

    #[test]
    fn supported_hosts_lists_both_adapters() {
        assert_eq!(supported_hosts(), vec!["curseforge", "modrinth"]);
    }
}
