// ─── mc-mod-getter Core ───
// Resolve → download → verify pipeline for mods hosted on third-party services.
//
// Architecture:
//   core/
//     config      — YAML host blocks → per-adapter configuration
//     hosts/      — Host adapters (Modrinth, CurseForge) + registry
//     inventory   — Fingerprint scan of archives already on disk
//     downloader/ — Streaming HTTP downloads
//     checksum    — sha512 / md5 verification
//     sync/       — Per-mod state machine and host-block reports

pub mod checksum;
pub mod config;
pub mod downloader;
pub mod error;
pub mod hosts;
pub mod http;
pub mod inventory;
pub mod loader;
pub mod sync;
