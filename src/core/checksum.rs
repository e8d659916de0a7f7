// ─── Checksum Verifier ───
// Hashes a file on disk and compares it with the digests a host published.

use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha512};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::core::error::{SyncError, SyncResult};

const READ_CHUNK: usize = 8192;

/// Digest algorithm a host publishes. A property of the host, never user-configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha512,
    Md5,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithm::Sha512 => write!(f, "sha512"),
            HashAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

impl HashAlgorithm {
    /// Lower-case hex digest of the file at `path`, read in fixed-size chunks.
    pub async fn file_digest(self, path: &Path) -> SyncResult<String> {
        match self {
            HashAlgorithm::Sha512 => digest_file::<Sha512>(path).await,
            HashAlgorithm::Md5 => digest_file::<Md5>(path).await,
        }
    }
}

async fn digest_file<D: Digest>(path: &Path) -> SyncResult<String> {
    let io_err = |source: std::io::Error| SyncError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::open(path).await.map_err(io_err)?;
    let mut hasher = D::new();
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).await.map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Check `path` against every expected digest; any match verifies the file.
///
/// An empty `expected` list means the host supplied nothing to compare
/// against. That counts as verified, with a warning.
pub async fn verify(
    path: &Path,
    expected: &[String],
    algorithm: HashAlgorithm,
) -> SyncResult<bool> {
    if expected.is_empty() {
        warn!(
            "No {} digest published for {:?}; integrity cannot be confirmed",
            algorithm, path
        );
        return Ok(true);
    }

    let actual = algorithm.file_digest(path).await?;
    let matched = expected
        .iter()
        .any(|digest| digest.trim().eq_ignore_ascii_case(&actual));

    debug!("{} of {:?}: {} (match: {})", algorithm, path, actual, matched);
    Ok(matched)
}

/// Like [`verify`], but reports the computed digest on mismatch.
pub async fn ensure_verified(
    path: &Path,
    expected: &[String],
    algorithm: HashAlgorithm,
) -> SyncResult<()> {
    if verify(path, expected, algorithm).await? {
        return Ok(());
    }
    let actual = algorithm.file_digest(path).await?;
    Err(SyncError::ChecksumMismatch {
        path: path.to_path_buf(),
        expected: expected.to_vec(),
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sha512_hex(bytes: &[u8]) -> String {
        hex::encode(Sha512::digest(bytes))
    }

    #[tokio::test]
    async fn md5_digest_of_known_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.jar");
        std::fs::write(&path, b"hello").unwrap();

        let digest = HashAlgorithm::Md5.file_digest(&path).await.unwrap();
        assert_eq!(digest, "5d41402abc4b2a76b9719d911017c592");
    }

    #[tokio::test]
    async fn matching_digest_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.jar");
        let body = vec![7u8; 20_000];
        std::fs::write(&path, &body).unwrap();

        let expected = vec!["deadbeef".to_string(), sha512_hex(&body)];
        assert!(verify(&path, &expected, HashAlgorithm::Sha512).await.unwrap());
    }

    #[tokio::test]
    async fn digest_comparison_ignores_hex_case() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.jar");
        std::fs::write(&path, b"hello").unwrap();

        let expected = vec!["5D41402ABC4B2A76B9719D911017C592".to_string()];
        assert!(verify(&path, &expected, HashAlgorithm::Md5).await.unwrap());
    }

    #[tokio::test]
    async fn single_flipped_bit_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.jar");
        let mut body = b"some mod archive bytes".to_vec();
        let expected = vec![sha512_hex(&body)];

        body[3] ^= 0b0000_0100;
        std::fs::write(&path, &body).unwrap();

        assert!(!verify(&path, &expected, HashAlgorithm::Sha512).await.unwrap());
        let err = ensure_verified(&path, &expected, HashAlgorithm::Sha512)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ChecksumMismatch { .. }));
    }

    #[tokio::test]
    async fn empty_expected_list_counts_as_verified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mod.jar");
        std::fs::write(&path, b"anything").unwrap();

        assert!(verify(&path, &[], HashAlgorithm::Md5).await.unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = HashAlgorithm::Sha512
            .file_digest(&dir.path().join("absent.jar"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));
    }
}
