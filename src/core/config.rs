// ─── Host Block Configuration ───
// Loads the YAML mod list: one top-level key per host, each holding the
// target game version, loader, destination directory and mod names.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::providers::{Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::core::error::{SyncError, SyncResult};

/// Everything one adapter needs for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub version: String,
    /// Always lower-case.
    pub loader: String,
    pub mod_dir: PathBuf,
    /// Host auth value (CurseForge `x-api-key`).
    pub api_key: Option<String>,
    /// Overrides the host's default API base URL.
    pub api_base: Option<String>,
}

impl AdapterConfig {
    pub fn new(version: impl Into<String>, loader: &str, mod_dir: impl Into<PathBuf>) -> Self {
        Self {
            version: version.into(),
            loader: loader.to_lowercase(),
            mod_dir: mod_dir.into(),
            api_key: None,
            api_base: None,
        }
    }
}

/// A single host's section of the mod list file.
#[derive(Debug, Clone, Deserialize)]
pub struct HostBlock {
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    pub loader: String,
    #[serde(default)]
    pub mod_dir: Option<PathBuf>,
    pub mods: Vec<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_base: Option<String>,
}

impl HostBlock {
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            version: self.version.clone(),
            loader: self.loader.to_lowercase(),
            mod_dir: self.mod_dir.clone().unwrap_or_else(default_mod_dir),
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

/// The whole mod list file, keyed by host name.
///
/// Host blocks are visited in alphabetical order of their keys, not file
/// order: figment parses YAML mappings into sorted maps. Blocks are
/// independent, so only the log order is affected.
#[derive(Debug, Clone, Default)]
pub struct ModsConfig {
    pub hosts: BTreeMap<String, HostBlock>,
}

impl ModsConfig {
    pub fn load(path: &Path) -> SyncResult<Self> {
        info!("Using mod list: {:?}", path);
        if !path.is_file() {
            return Err(SyncError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "mod list not found"),
            });
        }
        let hosts = Figment::new().merge(Yaml::file(path)).extract()?;
        Ok(Self { hosts })
    }

    pub fn from_yaml_str(raw: &str) -> SyncResult<Self> {
        let hosts = Figment::new().merge(Yaml::string(raw)).extract()?;
        Ok(Self { hosts })
    }
}

/// The user's downloads directory, falling back to `~/Downloads`, then `.`.
pub fn default_mod_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// YAML reads an unquoted `1.20` as a float; accept it and render it back.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Str(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Str(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(n) => n.to_string(),
    })
}
