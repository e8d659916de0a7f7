// ─── Local Inventory ───
// Maps a version-independent fingerprint of every mod archive already on
// disk to the file that currently holds it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{SyncError, SyncResult};

/// Extension of the mod archives the inventory tracks.
pub const MOD_ARCHIVE_EXTENSION: &str = "jar";

/// Alphabetic characters of `file_name`, lower-cased.
///
/// Digits and punctuation are dropped, so `CoolMod-1.2.0.jar` and
/// `CoolMod-1.5.3.jar` share the fingerprint `coolmodjar`.
pub fn fingerprint(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

/// An archive found during the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    pub file_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct LocalInventory {
    entries: HashMap<String, InventoryEntry>,
}

impl LocalInventory {
    /// Recursively scan `mod_dir` for mod archives.
    ///
    /// When two archives share a fingerprint the later one in traversal order wins.
    pub fn build(mod_dir: &Path) -> SyncResult<Self> {
        let mut inventory = Self::default();
        if !mod_dir.exists() {
            return Ok(inventory);
        }
        inventory.scan_dir(mod_dir)?;
        debug!(
            "Inventory of {:?}: {} archive(s)",
            mod_dir,
            inventory.entries.len()
        );
        Ok(inventory)
    }

    fn scan_dir(&mut self, dir: &Path) -> SyncResult<()> {
        let io_err = |source: std::io::Error| SyncError::Io {
            path: dir.to_path_buf(),
            source,
        };

        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(io_err)?;

            if file_type.is_dir() {
                self.scan_dir(&path)?;
            } else if file_type.is_file() && is_mod_archive(&path) {
                let file_name = entry.file_name().to_string_lossy().to_string();
                self.insert(InventoryEntry { file_name, path });
            }
        }

        Ok(())
    }

    pub fn get(&self, fingerprint: &str) -> Option<&InventoryEntry> {
        self.entries.get(fingerprint)
    }

    /// Record `entry` under its fingerprint, returning whatever it displaced.
    pub fn insert(&mut self, entry: InventoryEntry) -> Option<InventoryEntry> {
        self.entries.insert(fingerprint(&entry.file_name), entry)
    }

    pub fn remove(&mut self, fingerprint: &str) -> Option<InventoryEntry> {
        self.entries.remove(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_mod_archive(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(MOD_ARCHIVE_EXTENSION))
        .unwrap_or(false)
}
