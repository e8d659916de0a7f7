mod outcome;
mod pipeline;

pub use outcome::{ModOutcome, ModReport, SyncReport};
pub use pipeline::{ModSync, DEFAULT_MAX_ATTEMPTS};

use reqwest::Client;
use tracing::info;

use crate::core::config::HostBlock;
use crate::core::downloader::Downloader;
use crate::core::error::{SyncError, SyncResult};
use crate::core::hosts::{Host, HostAdapter};
use crate::core::inventory::LocalInventory;

/// Run one host block end to end: registry lookup, inventory scan, then
/// every mod in the order listed.
///
/// Only an unknown host or an unusable mod directory fails the block as a
/// whole; everything else is reported per mod.
pub async fn sync_host(host_name: &str, block: &HostBlock, client: &Client) -> SyncResult<SyncReport> {
    let host = Host::create(host_name, block.adapter_config(), client.clone())?;
    let mod_dir = host.config().mod_dir.clone();
    info!(
        "{}: Minecraft {} / {} -> {:?}",
        host.host_tag(),
        host.config().version,
        host.config().loader,
        mod_dir
    );

    tokio::fs::create_dir_all(&mod_dir)
        .await
        .map_err(|source| SyncError::Io {
            path: mod_dir.clone(),
            source,
        })?;
    let inventory = LocalInventory::build(&mod_dir)?;

    let downloader = Downloader::new(client.clone());
    let mut sync = ModSync::new(&host, &downloader, inventory);
    Ok(sync.sync_all(&block.mods).await)
}
