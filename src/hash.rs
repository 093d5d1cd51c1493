//! Content hashing for archive deduplication

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compute the SHA-256 digest of a file, streamed in 8 KiB chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("Failed to open {} for hashing", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_digest_is_stable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello datalake").unwrap();

        let a = sha256_file(file.path()).unwrap();
        let b = sha256_file(file.path()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_different_content_different_digest() {
        let mut one = tempfile::NamedTempFile::new().unwrap();
        one.write_all(b"one").unwrap();
        let mut two = tempfile::NamedTempFile::new().unwrap();
        two.write_all(b"two").unwrap();

        assert_ne!(
            sha256_file(one.path()).unwrap(),
            sha256_file(two.path()).unwrap()
        );
    }
}
