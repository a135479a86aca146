use std::io;
use std::path::Path;

/// Computes the BLAKE3 content fingerprint of a file, hex-encoded.
///
/// Identical bytes always yield the identical digest, independent of
/// filename or metadata. This is the one stage whose failure means the
/// pipeline input itself is unreadable, so the raw I/O error is kept for the
/// caller to escalate.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap_rayon(path)?;
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn file_with(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn identical_bytes_hash_identically() {
        let a = file_with(b"the same content");
        let b = file_with(b"the same content");

        let digest_a = hash_file(a.path()).unwrap();
        let digest_b = hash_file(b.path()).unwrap();
        assert_eq!(digest_a, digest_b);
        assert_eq!(digest_a.len(), 64, "256-bit digest, hex-encoded");
        assert!(digest_a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn single_flipped_byte_changes_the_digest() {
        let a = file_with(b"the same content");
        let b = file_with(b"the same contenu");

        assert_ne!(
            hash_file(a.path()).unwrap(),
            hash_file(b.path()).unwrap()
        );
    }

    #[test]
    fn unreadable_file_surfaces_the_io_error() {
        assert!(hash_file(Path::new("/definitely/not/here.bin")).is_err());
    }
}
