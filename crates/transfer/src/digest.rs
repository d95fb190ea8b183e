use std::io::{self, Read, Write};

use md5::Md5;
use sha1::{Digest, Sha1};

use crate::TransferError;

/// Digest algorithms understood by the drive service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    /// Content identity key used for deduplication.
    Sha1,
    /// Integrity check sent alongside each block.
    Md5,
}

/// Lowercase hex SHA-1 and MD5 of the same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestPair {
    pub sha1: String,
    pub md5: String,
}

impl DigestPair {
    /// Returns the digest for one algorithm.
    pub fn get(&self, algorithm: HashAlgorithm) -> &str {
        match algorithm {
            HashAlgorithm::Sha1 => &self.sha1,
            HashAlgorithm::Md5 => &self.md5,
        }
    }
}

/// Feeds bytes into SHA-1 and MD5 at once.
#[derive(Default, Clone)]
pub struct PairHasher {
    sha1: Sha1,
    md5: Md5,
}

impl PairHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.sha1.update(data);
        self.md5.update(data);
    }

    pub fn finalize(self) -> DigestPair {
        DigestPair {
            sha1: hex::encode(self.sha1.finalize()),
            md5: hex::encode(self.md5.finalize()),
        }
    }
}

impl Write for PairHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Computes both digests of an in-memory buffer.
pub fn digest_bytes(data: &[u8]) -> DigestPair {
    let mut hasher = PairHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Computes both digests of everything `reader` yields.
///
/// A read error is returned as-is; it never degrades into the digest of
/// the bytes read so far.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<DigestPair, TransferError> {
    let mut hasher = PairHasher::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hasher.finalize())
}

/// Computes a single lowercase hex digest of `reader`.
pub fn hex_digest<R: Read>(reader: R, algorithm: HashAlgorithm) -> Result<String, TransferError> {
    match algorithm {
        HashAlgorithm::Sha1 => hex_with::<Sha1, _>(reader),
        HashAlgorithm::Md5 => hex_with::<Md5, _>(reader),
    }
}

fn hex_with<D: Digest + Write, R: Read>(mut reader: R) -> Result<String, TransferError> {
    let mut hasher = D::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
