use std::path::Path;

use tracing::{info, warn};

use super::outcome::{ModOutcome, ModReport, SyncReport};
use crate::core::checksum;
use crate::core::downloader::FileFetcher;
use crate::core::error::{NotFoundStage, SyncError, SyncResult};
use crate::core::hosts::{CandidateMatch, FileDescriptor, HostAdapter};
use crate::core::inventory::{fingerprint, InventoryEntry, LocalInventory};

/// Downloads per mod before a persistent checksum mismatch is given up on.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Drives each mod through resolve → inventory check → download → verify.
///
/// Mods are processed strictly one after another. The inventory is owned
/// for the whole host block and refreshed in place after every install.
pub struct ModSync<'a, A: HostAdapter, F: FileFetcher> {
    adapter: &'a A,
    fetcher: &'a F,
    inventory: LocalInventory,
    max_attempts: u32,
}

impl<'a, A: HostAdapter, F: FileFetcher> ModSync<'a, A, F> {
    pub fn new(adapter: &'a A, fetcher: &'a F, inventory: LocalInventory) -> Self {
        Self {
            adapter,
            fetcher,
            inventory,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn inventory(&self) -> &LocalInventory {
        &self.inventory
    }

    /// Sync every mod in order. Per-mod failures are logged and recorded;
    /// they never stop the remaining mods.
    pub async fn sync_all(&mut self, mods: &[String]) -> SyncReport {
        let mut report = SyncReport::new(self.adapter.host_tag());

        for mod_name in mods {
            let result = self.sync_mod(mod_name).await;
            match &result {
                Ok(ModOutcome::Skipped { file_name }) => {
                    info!("{} is current ({})", mod_name, file_name);
                }
                Ok(ModOutcome::Installed {
                    file_name,
                    replaced,
                    attempts,
                    ..
                }) => match replaced {
                    Some(old) => info!(
                        "{} updated: {} -> {} ({} attempt(s))",
                        mod_name, old, file_name, attempts
                    ),
                    None => info!("{} installed: {} ({} attempt(s))", mod_name, file_name, attempts),
                },
                Err(e) if e.is_transient() => {
                    warn!("Skipping {} for this run (host or network problem): {}", mod_name, e)
                }
                Err(e) => warn!("Skipping {}: {}", mod_name, e),
            }
            report.mods.push(ModReport {
                mod_name: mod_name.clone(),
                result,
            });
        }

        report
    }

    pub async fn sync_mod(&mut self, mod_name: &str) -> SyncResult<ModOutcome> {
        let adapter = self.adapter;
        let host = adapter.host_tag();
        let not_found = |stage| SyncError::NotFound {
            mod_name: mod_name.to_string(),
            host: host.to_string(),
            stage,
        };

        // Resolving
        let id = match adapter.resolve_identifier(mod_name).await? {
            CandidateMatch::Found(id) => id,
            CandidateMatch::WrongLoader => return Err(not_found(NotFoundStage::WrongLoader)),
            CandidateMatch::NotFound => return Err(not_found(NotFoundStage::Identifier)),
        };

        // Resolved
        let file = adapter
            .resolve_file(&id)
            .await?
            .ok_or_else(|| not_found(NotFoundStage::File))?;

        let dest = adapter.config().mod_dir.join(&file.filename);
        info!(
            "From:{} Resolved:{}({}) File:{}",
            host, mod_name, id, file.filename
        );

        // Skip
        if dest.is_file() {
            if checksum::verify(&dest, &file.expected_hashes, file.algorithm).await? {
                self.record(&file, &dest);
                return Ok(ModOutcome::Skipped {
                    file_name: file.filename,
                });
            }
            warn!(
                "{:?} exists but does not match the published {} digest; downloading again",
                dest, file.algorithm
            );
        }

        // Replace
        let replaced = self
            .retire_superseded(&file)
            .await
            .map_err(|e| transient(mod_name, e))?;

        // Fresh
        let attempts = match self.download_verified(mod_name, &file, &dest).await {
            Ok(attempts) => attempts,
            Err(e) => {
                // Whatever was on disk for this mod is gone now.
                self.inventory.remove(&fingerprint(&file.filename));
                return Err(e);
            }
        };
        self.record(&file, &dest);

        Ok(ModOutcome::Installed {
            verified: !file.expected_hashes.is_empty(),
            file_name: file.filename,
            replaced,
            attempts,
        })
    }

    /// Remove an older file of the same mod, if the inventory knows one.
    async fn retire_superseded(&mut self, file: &FileDescriptor) -> SyncResult<Option<String>> {
        let old = match self.inventory.get(&fingerprint(&file.filename)) {
            Some(old) if old.file_name != file.filename => old.clone(),
            _ => return Ok(None),
        };

        info!("Replacing {} with {}", old.file_name, file.filename);
        match tokio::fs::remove_file(&old.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(SyncError::Io {
                    path: old.path,
                    source,
                })
            }
        }
        Ok(Some(old.file_name))
    }

    /// Download until the file verifies or attempts run out. Returns the
    /// number of downloads it took.
    async fn download_verified(
        &self,
        mod_name: &str,
        file: &FileDescriptor,
        dest: &Path,
    ) -> SyncResult<u32> {
        for attempt in 1..=self.max_attempts {
            info!(
                "Downloading:{} File:{} (attempt {}/{})",
                mod_name, file.filename, attempt, self.max_attempts
            );

            if let Err(e) = self.fetcher.fetch_to(&file.download_url, dest).await {
                discard_partial(dest).await;
                return Err(transient(mod_name, e));
            }

            match checksum::ensure_verified(dest, &file.expected_hashes, file.algorithm).await {
                Ok(()) => return Ok(attempt),
                Err(e @ SyncError::ChecksumMismatch { .. }) => {
                    warn!("{} (attempt {}/{})", e, attempt, self.max_attempts);
                }
                Err(e) => {
                    discard_partial(dest).await;
                    return Err(transient(mod_name, e));
                }
            }
        }

        discard_partial(dest).await;
        Err(SyncError::ChecksumExhausted {
            mod_name: mod_name.to_string(),
            attempts: self.max_attempts,
        })
    }

    fn record(&mut self, file: &FileDescriptor, dest: &Path) {
        self.inventory.insert(InventoryEntry {
            file_name: file.filename.clone(),
            path: dest.to_path_buf(),
        });
    }
}

fn transient(mod_name: &str, source: SyncError) -> SyncError {
    SyncError::TransientDownload {
        mod_name: mod_name.to_string(),
        source: Box::new(source),
    }
}

/// A file that failed to download or verify must not look current next run.
async fn discard_partial(dest: &Path) {
    if let Err(e) = tokio::fs::remove_file(dest).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove incomplete file {:?}: {}", dest, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checksum::HashAlgorithm;
    use crate::core::config::AdapterConfig;
    use crate::core::hosts::HostIdentifier;
    use async_trait::async_trait;
    use sha2::{Digest, Sha512};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct FakeHost {
        config: AdapterConfig,
        ids: HashMap<String, String>,
        files: HashMap<String, FileDescriptor>,
        wrong_loader: Vec<String>,
    }

    impl FakeHost {
        fn new(mod_dir: &Path) -> Self {
            Self {
                config: AdapterConfig::new("1.20.1", "fabric", mod_dir),
                ids: HashMap::new(),
                files: HashMap::new(),
                wrong_loader: Vec::new(),
            }
        }

        fn with_mod(mut self, name: &str, file: FileDescriptor) -> Self {
            let id = format!("id-{}", name.to_lowercase());
            self.ids.insert(name.to_string(), id.clone());
            self.files.insert(id, file);
            self
        }

        fn with_id_only(mut self, name: &str) -> Self {
            self.ids.insert(name.to_string(), format!("id-{}", name));
            self
        }

        fn with_wrong_loader(mut self, name: &str) -> Self {
            self.wrong_loader.push(name.to_string());
            self
        }
    }

    #[async_trait]
    impl HostAdapter for FakeHost {
        fn host_tag(&self) -> &'static str {
            "fake"
        }

        fn hash_algorithm(&self) -> HashAlgorithm {
            HashAlgorithm::Sha512
        }

        fn config(&self) -> &AdapterConfig {
            &self.config
        }

        async fn resolve_identifier(&self, mod_name: &str) -> SyncResult<CandidateMatch> {
            if self.wrong_loader.iter().any(|n| n == mod_name) {
                return Ok(CandidateMatch::WrongLoader);
            }
            Ok(match self.ids.get(mod_name) {
                Some(id) => CandidateMatch::Found(HostIdentifier::new(id)),
                None => CandidateMatch::NotFound,
            })
        }

        async fn resolve_file(&self, id: &HostIdentifier) -> SyncResult<Option<FileDescriptor>> {
            Ok(self.files.get(id.as_str()).cloned())
        }
    }

    /// Serves canned bodies in order, repeating the last one.
    struct ScriptedFetcher {
        bodies: Mutex<Vec<Vec<u8>>>,
        calls: AtomicU32,
        fail: bool,
    }

    impl ScriptedFetcher {
        fn new(bodies: &[&[u8]]) -> Self {
            Self {
                bodies: Mutex::new(bodies.iter().map(|b| b.to_vec()).collect()),
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new(&[])
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl FileFetcher for ScriptedFetcher {
        async fn fetch_to(&self, url: &str, dest: &Path) -> SyncResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SyncError::DownloadFailed {
                    url: url.to_string(),
                    status: 503,
                });
            }
            let body = {
                let mut bodies = self.bodies.lock().unwrap();
                if bodies.len() > 1 {
                    bodies.remove(0)
                } else {
                    bodies[0].clone()
                }
            };
            tokio::fs::write(dest, &body).await?;
            Ok(body.len() as u64)
        }
    }

    fn sha512_hex(bytes: &[u8]) -> String {
        hex::encode(Sha512::digest(bytes))
    }

    fn descriptor(filename: &str, good: &[u8]) -> FileDescriptor {
        FileDescriptor::new(
            filename,
            format!("https://cdn.example/{}", filename),
            vec![sha512_hex(good)],
            HashAlgorithm::Sha512,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn mismatch_twice_then_match_installs_after_three_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"good"));
        let fetcher = ScriptedFetcher::new(&[b"bad1", b"bad2", b"good"]);

        let mut sync = ModSync::new(&host, &fetcher, LocalInventory::default());
        let outcome = sync.sync_mod("CoolMod").await.unwrap();

        assert_eq!(
            outcome,
            ModOutcome::Installed {
                file_name: "CoolMod-1.5.3.jar".into(),
                replaced: None,
                attempts: 3,
                verified: true,
            }
        );
        assert_eq!(fetcher.calls(), 3);
        assert_eq!(std::fs::read(dir.path().join("CoolMod-1.5.3.jar")).unwrap(), b"good");
    }

    #[tokio::test]
    async fn persistent_mismatch_exhausts_retries_and_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"good"));
        let fetcher = ScriptedFetcher::new(&[b"corrupt"]);

        let mut sync = ModSync::new(&host, &fetcher, LocalInventory::default());
        let err = sync.sync_mod("CoolMod").await.unwrap_err();

        assert!(matches!(err, SyncError::ChecksumExhausted { attempts: 3, .. }));
        assert_eq!(fetcher.calls(), DEFAULT_MAX_ATTEMPTS);
        assert!(!dir.path().join("CoolMod-1.5.3.jar").exists());
    }

    #[tokio::test]
    async fn retry_cap_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"good"));
        let fetcher = ScriptedFetcher::new(&[b"corrupt"]);

        let mut sync = ModSync::new(&host, &fetcher, LocalInventory::default()).with_max_attempts(5);
        let err = sync.sync_mod("CoolMod").await.unwrap_err();

        assert!(matches!(err, SyncError::ChecksumExhausted { attempts: 5, .. }));
        assert_eq!(fetcher.calls(), 5);
    }

    #[tokio::test]
    async fn older_version_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CoolMod-1.2.0.jar"), b"old").unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"new"));
        let fetcher = ScriptedFetcher::new(&[b"new"]);

        let inventory = LocalInventory::build(dir.path()).unwrap();
        let mut sync = ModSync::new(&host, &fetcher, inventory);
        let outcome = sync.sync_mod("CoolMod").await.unwrap();

        assert_eq!(
            outcome,
            ModOutcome::Installed {
                file_name: "CoolMod-1.5.3.jar".into(),
                replaced: Some("CoolMod-1.2.0.jar".into()),
                attempts: 1,
                verified: true,
            }
        );
        assert!(!dir.path().join("CoolMod-1.2.0.jar").exists());
        assert_eq!(std::fs::read(dir.path().join("CoolMod-1.5.3.jar")).unwrap(), b"new");
        assert_eq!(
            sync.inventory().get("coolmodjar").unwrap().file_name,
            "CoolMod-1.5.3.jar"
        );
    }

    #[tokio::test]
    async fn second_run_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path())
            .with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"cool"))
            .with_mod("Other", descriptor("Other-2.0.jar", b"other"));
        let fetcher = ScriptedFetcher::new(&[b"cool", b"other"]);
        let mods = vec!["CoolMod".to_string(), "Other".to_string()];

        let first = ModSync::new(&host, &fetcher, LocalInventory::build(dir.path()).unwrap())
            .sync_all(&mods)
            .await;
        assert_eq!(first.installed(), 2);

        let second = ModSync::new(&host, &fetcher, LocalInventory::build(dir.path()).unwrap())
            .sync_all(&mods)
            .await;
        assert_eq!(second.skipped(), 2);
        assert_eq!(second.failed(), 0);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn existing_file_failing_verification_is_downloaded_again() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CoolMod-1.5.3.jar"), b"trunc").unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"full"));
        let fetcher = ScriptedFetcher::new(&[b"full"]);

        let inventory = LocalInventory::build(dir.path()).unwrap();
        let outcome = ModSync::new(&host, &fetcher, inventory)
            .sync_mod("CoolMod")
            .await
            .unwrap();

        assert!(matches!(outcome, ModOutcome::Installed { replaced: None, .. }));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn unresolvable_mods_are_not_found_at_the_right_stage() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_id_only("NoFiles");
        let fetcher = ScriptedFetcher::new(&[b""]);
        let mut sync = ModSync::new(&host, &fetcher, LocalInventory::default());

        let err = sync.sync_mod("Missing").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::NotFound { stage: NotFoundStage::Identifier, .. }
        ));

        let err = sync.sync_mod("NoFiles").await.unwrap_err();
        assert!(matches!(err, SyncError::NotFound { stage: NotFoundStage::File, .. }));
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn title_match_on_other_loader_is_reported_as_wrong_loader() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_wrong_loader("Jei");
        let fetcher = ScriptedFetcher::new(&[b""]);
        let mut sync = ModSync::new(&host, &fetcher, LocalInventory::default());

        let err = sync.sync_mod("Jei").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::NotFound { stage: NotFoundStage::WrongLoader, .. }
        ));
        assert!(err.to_string().contains("not for this loader"), "{err}");
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn failed_replacement_drops_retired_file_from_inventory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("CoolMod-1.2.0.jar"), b"old").unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"new"));
        let fetcher = ScriptedFetcher::failing();

        let inventory = LocalInventory::build(dir.path()).unwrap();
        let mut sync = ModSync::new(&host, &fetcher, inventory);
        let err = sync.sync_mod("CoolMod").await.unwrap_err();

        assert!(matches!(err, SyncError::TransientDownload { .. }));
        assert!(!dir.path().join("CoolMod-1.2.0.jar").exists());
        assert!(sync.inventory().get("coolmodjar").is_none());
    }

    #[tokio::test]
    async fn transient_failure_abandons_only_that_mod() {
        let dir = tempfile::tempdir().unwrap();
        let host = FakeHost::new(dir.path()).with_mod("CoolMod", descriptor("CoolMod-1.5.3.jar", b"x"));
        let fetcher = ScriptedFetcher::failing();
        let mods = vec!["CoolMod".to_string(), "Missing".to_string()];

        let report = ModSync::new(&host, &fetcher, LocalInventory::default())
            .sync_all(&mods)
            .await;

        assert_eq!(report.host, "fake");
        assert_eq!(report.failed(), 2);
        let failures: Vec<_> = report.failures().collect();
        assert!(matches!(failures[0], ("CoolMod", SyncError::TransientDownload { .. })));
        assert!(matches!(failures[1], ("Missing", SyncError::NotFound { .. })));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn missing_digest_installs_unverified() {
        let dir = tempfile::tempdir().unwrap();
        let file = FileDescriptor::new(
            "Plain-1.0.jar",
            "https://cdn.example/Plain-1.0.jar",
            vec![],
            HashAlgorithm::Md5,
        )
        .unwrap();
        let host = FakeHost::new(dir.path()).with_mod("Plain", file);
        let fetcher = ScriptedFetcher::new(&[b"whatever"]);

        let outcome = ModSync::new(&host, &fetcher, LocalInventory::default())
            .sync_mod("Plain")
            .await
            .unwrap();

        assert!(matches!(
            outcome,
            ModOutcome::Installed { attempts: 1, verified: false, .. }
        ));
    }
}
