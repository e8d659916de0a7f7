use crate::core::error::SyncError;

/// How a mod's lifecycle ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModOutcome {
    /// The resolved file was already on disk and current.
    Skipped { file_name: String },
    /// The resolved file was downloaded and verified.
    Installed {
        file_name: String,
        /// Older version of the same mod that was removed first.
        replaced: Option<String>,
        attempts: u32,
        /// `false` when the host published no digest to check against.
        verified: bool,
    },
}

#[derive(Debug)]
pub struct ModReport {
    pub mod_name: String,
    pub result: Result<ModOutcome, SyncError>,
}

/// Everything that happened to one host block.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub host: String,
    pub mods: Vec<ModReport>,
}

impl SyncReport {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            mods: Vec::new(),
        }
    }

    pub fn installed(&self) -> usize {
        self.mods
            .iter()
            .filter(|m| matches!(m.result, Ok(ModOutcome::Installed { .. })))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.mods
            .iter()
            .filter(|m| matches!(m.result, Ok(ModOutcome::Skipped { .. })))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.mods.iter().filter(|m| m.result.is_err()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &SyncError)> {
        self.mods.iter().filter_map(|m| match &m.result {
            Ok(_) => None,
            Err(e) => Some((m.mod_name.as_str(), e)),
        })
    }
}
