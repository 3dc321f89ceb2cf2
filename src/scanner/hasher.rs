//! Streaming content hashing.
//!
//! # Overview
//!
//! [`HashAlgorithm`] is the closed set of digests this build can compute.
//! The set is fixed at compile time, so the list of names and the default
//! are plain constants rather than something looked up per call.
//!
//! [`Hasher`] streams a file through the selected algorithm in fixed-size
//! chunks and returns the final digest as a lowercase hex [`ContentHash`].
//!
//! # Example
//!
//! ```no_run
//! use dedupe::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha256);
//! let hash = hasher.hash_file(Path::new("some/file.bin")).unwrap();
//! println!("{hash}");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use digest::DynDigest;
use serde::{Deserialize, Serialize};

use super::HashError;

/// Default read size when streaming file content (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Smallest chunk size accepted; smaller requests are clamped up.
pub const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// A content-hash algorithm available in this build.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE2b (512-bit)
    Blake2b,
    /// BLAKE2s (256-bit)
    Blake2s,
    /// BLAKE3 (256-bit)
    Blake3,
    /// MD5 (128-bit). Fast, but only collision-resistant against accidents.
    Md5,
    /// SHA-1 (160-bit)
    Sha1,
    /// SHA-224
    Sha224,
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA3-224
    Sha3_224,
    /// SHA3-256
    Sha3_256,
    /// SHA3-384
    Sha3_384,
    /// SHA3-512
    Sha3_512,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Every available algorithm, sorted by name.
    pub const ALL: [HashAlgorithm; 13] = [
        Self::Blake2b,
        Self::Blake2s,
        Self::Blake3,
        Self::Md5,
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Sha512,
    ];

    /// Lowercase name used on the command line and in config files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Blake2b => "blake2b",
            Self::Blake2s => "blake2s",
            Self::Blake3 => "blake3",
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha3_224 => "sha3_224",
            Self::Sha3_256 => "sha3_256",
            Self::Sha3_384 => "sha3_384",
            Self::Sha3_512 => "sha3_512",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex digest this algorithm produces.
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha1 => 40,
            Self::Sha224 | Self::Sha3_224 => 56,
            Self::Blake2s | Self::Blake3 | Self::Sha256 | Self::Sha3_256 => 64,
            Self::Sha384 | Self::Sha3_384 => 96,
            Self::Blake2b | Self::Sha3_512 | Self::Sha512 => 128,
        }
    }

    fn engine(self) -> Engine {
        match self {
            Self::Blake2b => Engine::Digest(Box::new(blake2::Blake2b512::default())),
            Self::Blake2s => Engine::Digest(Box::new(blake2::Blake2s256::default())),
            Self::Blake3 => Engine::Blake3(Box::new(blake3::Hasher::new())),
            Self::Md5 => Engine::Digest(Box::new(md5::Md5::default())),
            Self::Sha1 => Engine::Digest(Box::new(sha1::Sha1::default())),
            Self::Sha224 => Engine::Digest(Box::new(sha2::Sha224::default())),
            Self::Sha256 => Engine::Digest(Box::new(sha2::Sha256::default())),
            Self::Sha384 => Engine::Digest(Box::new(sha2::Sha384::default())),
            Self::Sha3_224 => Engine::Digest(Box::new(sha3::Sha3_224::default())),
            Self::Sha3_256 => Engine::Digest(Box::new(sha3::Sha3_256::default())),
            Self::Sha3_384 => Engine::Digest(Box::new(sha3::Sha3_384::default())),
            Self::Sha3_512 => Engine::Digest(Box::new(sha3::Sha3_512::default())),
            Self::Sha512 => Engine::Digest(Box::new(sha2::Sha512::default())),
        }
    }
}

/// Names of every available algorithm, sorted.
#[must_use]
pub fn available_names() -> Vec<&'static str> {
    HashAlgorithm::ALL.iter().map(|a| a.name()).collect()
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an algorithm name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm '{name}' (expected one of: {})", available_names().join(", "))]
pub struct UnknownAlgorithm {
    /// The rejected name
    pub name: String,
}

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| UnknownAlgorithm {
                name: s.to_string(),
            })
    }
}

/// Hex-encoded digest of a file's full content.
///
/// Two files with equal `ContentHash` values (computed with the same
/// algorithm) are treated as byte-identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already hex-encoded digest.
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The digest as lowercase hex.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `len` hex characters, for compact display.
    #[must_use]
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

enum Engine {
    Blake3(Box<blake3::Hasher>),
    Digest(Box<dyn DynDigest>),
}

impl Engine {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(data);
            }
            Self::Digest(d) => d.update(data),
        }
    }

    fn finalize(self) -> ContentHash {
        match self {
            Self::Blake3(h) => ContentHash(h.finalize().to_hex().to_string()),
            Self::Digest(d) => ContentHash(hex::encode(d.finalize())),
        }
    }
}

enum StreamError {
    Io(io::Error),
    Interrupted,
}

/// Streaming file hasher bound to one algorithm.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher {
    /// Create a hasher for `algorithm` with the default chunk size.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Set the read chunk size. Values below [`MIN_CHUNK_SIZE`] are clamped.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        self
    }

    /// Abort hashing between chunks once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The algorithm this hasher computes.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Bytes read per chunk.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn stream<R: Read>(&self, mut reader: R) -> Result<ContentHash, StreamError> {
        let mut engine = self.algorithm.engine();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            if self.is_shutdown_requested() {
                return Err(StreamError::Interrupted);
            }
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => engine.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::Io(e)),
            }
        }

        Ok(engine.finalize())
    }

    /// Hash everything `reader` yields.
    ///
    /// # Errors
    ///
    /// Returns the underlying read error, or an `Interrupted` error if the
    /// shutdown flag was raised mid-stream.
    pub fn hash_reader<R: Read>(&self, reader: R) -> io::Result<ContentHash> {
        self.stream(reader).map_err(|e| match e {
            StreamError::Io(e) => e,
            StreamError::Interrupted => {
                io::Error::new(io::ErrorKind::Interrupted, "hashing interrupted")
            }
        })
    }

    /// Hash the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// - [`HashError::NotFound`] if the file vanished
    /// - [`HashError::PermissionDenied`] if it cannot be opened
    /// - [`HashError::Interrupted`] if shutdown was requested mid-read
    /// - [`HashError::Io`] for any other read failure
    pub fn hash_file(&self, path: &Path) -> Result<ContentHash, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let hash = self.stream(file).map_err(|e| match e {
            StreamError::Io(e) => HashError::from_io(path, e),
            StreamError::Interrupted => HashError::Interrupted(path.to_path_buf()),
        })?;
        log::trace!("{} {}: {}", self.algorithm, path.display(), hash);
        Ok(hash)
    }
}
