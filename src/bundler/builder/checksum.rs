//! Hashing for archive entry names and finished bundles.

use crate::bundler::{Result, error::ErrorExt};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

/// Bytes of the SHA-256 digest kept in template entry names.
const TEMPLATE_HASH_BYTES: usize = 16;

/// Hash of a template path, used to name its parsed entry.
///
/// Hashes the path, not the content, so the entry name is stable across
/// edits. Returns 32 lowercase hex characters.
pub fn template_path_hash(path: &str) -> String {
    let digest = Sha256::digest(path.as_bytes());
    hex::encode(&digest[..TEMPLATE_HASH_BYTES])
}

/// Calculates the SHA256 checksum of a finished bundle.
///
/// Reads the file in 8KB chunks.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash (64 characters)
/// * `Err` - If the file cannot be read
pub async fn calculate_sha256(file_path: &std::path::Path) -> Result<String> {
    let mut file = tokio::fs::File::open(file_path)
        .await
        .fs_context("opening bundle for hashing", file_path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading bundle for hash calculation", file_path)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_hash_is_short_and_stable() {
        let a = template_path_hash("pages/home");
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a, template_path_hash("pages/home"));
        assert_ne!(a, template_path_hash("pages/home2"));
    }

    #[tokio::test]
    async fn file_checksum_matches_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.zip");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            calculate_sha256(&path).await.unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
