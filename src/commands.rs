use std::path::Path;

use tracing::{error, info, warn};

use crate::core::config::ModsConfig;
use crate::core::error::{SyncError, SyncResult};
use crate::core::http::build_http_client;
use crate::core::hosts::supported_hosts;
use crate::core::sync::{sync_host, SyncReport};

/// Result of one host block in a run.
#[derive(Debug)]
pub struct HostSummary {
    pub host: String,
    pub result: Result<SyncReport, SyncError>,
}

/// Result of a whole mod list run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub hosts: Vec<HostSummary>,
}

impl RunSummary {
    /// `true` when every host block ran and every mod ended installed or skipped.
    pub fn is_clean(&self) -> bool {
        self.hosts.iter().all(|h| match &h.result {
            Ok(report) => report.failed() == 0,
            Err(_) => false,
        })
    }
}

/// Load the mod list at `path` and sync each host block in turn.
///
/// A rejected host block is logged and the next one still runs.
pub async fn sync_from_file(path: &Path) -> SyncResult<RunSummary> {
    let config = ModsConfig::load(path)?;
    sync_config(&config).await
}

/// Runs every host block in the order `ModsConfig::hosts` yields them (alphabetical).
pub async fn sync_config(config: &ModsConfig) -> SyncResult<RunSummary> {
    let client = build_http_client()?;
    let mut summary = RunSummary::default();

    for (host, block) in &config.hosts {
        let result = sync_host(host, block, &client).await;
        match &result {
            Ok(report) => log_report(report),
            Err(e @ SyncError::UnsupportedHost(_)) => error!(
                "{}; supported hosts: {}",
                e,
                supported_hosts().join(", ")
            ),
            Err(e) => error!("{}: {}", host, e),
        }
        summary.hosts.push(HostSummary {
            host: host.clone(),
            result,
        });
    }

    Ok(summary)
}

fn log_report(report: &SyncReport) {
    info!(
        "{}: {} installed, {} already current, {} failed",
        report.host,
        report.installed(),
        report.skipped(),
        report.failed()
    );
    for (mod_name, err) in report.failures() {
        warn!("{}: {} needs attention: {}", report.host, mod_name, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unsupported_host_does_not_stop_other_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = format!(
            "bukkit:\n  version: '1.20'\n  loader: paper\n  mods: [EssentialsX]\nmodrinth:\n  version: '1.20'\n  loader: fabric\n  mod_dir: '{}'\n  mods: []\n",
            dir.path().join("mods").display()
        );
        let config = ModsConfig::from_yaml_str(&yaml).unwrap();

        let summary = sync_config(&config).await.unwrap();

        assert_eq!(summary.hosts.len(), 2);
        assert!(matches!(summary.hosts[0].result, Err(SyncError::UnsupportedHost(_))));
        let modrinth = summary.hosts[1].result.as_ref().unwrap();
        assert_eq!(modrinth.mods.len(), 0);
        assert!(dir.path().join("mods").is_dir());
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn missing_mod_list_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = sync_from_file(&dir.path().join("absent.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
