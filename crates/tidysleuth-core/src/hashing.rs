/// Streaming content hashing for duplicate detection.
///
/// MD5 is the default: it is fast, and content identity between files on
/// the same machine is not an adversarial setting. SHA-256 is available for
/// callers that want a collision-resistant digest.
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size for streaming hashes.
pub const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Supported content digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Sha256,
}

impl HashAlgorithm {
    pub fn label(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hash the full contents of `path` and return the lowercase hex digest.
pub fn hash_file(path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    hash_limited(path, algorithm, None)
}

/// Hash at most the first `len` bytes of `path`.
pub fn hash_prefix(path: &Path, algorithm: HashAlgorithm, len: u64) -> io::Result<String> {
    hash_limited(path, algorithm, Some(len))
}

fn hash_limited(path: &Path, algorithm: HashAlgorithm, limit: Option<u64>) -> io::Result<String> {
    let file = File::open(path)?;
    match limit {
        Some(len) => digest_reader(algorithm, file.take(len)),
        None => digest_reader(algorithm, file),
    }
}

fn digest_reader<R: Read>(algorithm: HashAlgorithm, reader: R) -> io::Result<String> {
    match algorithm {
        HashAlgorithm::Md5 => stream::<Md5, R>(reader),
        HashAlgorithm::Sha256 => stream::<Sha256, R>(reader),
    }
}

fn stream<D: Digest, R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}
