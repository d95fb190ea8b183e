//! Block splitting and content digests for Mi Cloud uploads.
//!
//! The drive service identifies files and blocks by SHA-1 and checks them
//! with MD5. This crate produces the descriptors the upload pipeline sends
//! to the server, and re-reads individual blocks when they must be
//! transferred.

mod chunked;
mod digest;
mod types;
mod validation;

pub use chunked::{describe_file, read_block_at, split_blocks};
pub use digest::{
    DigestPair, HashAlgorithm, PairHasher, digest_bytes, digest_reader, hex_digest,
};
pub use types::{BlockDescriptor, FileDescriptor};
pub use validation::{upload_file_name, validate_file_size};

/// Fixed block size used by the drive service: 4 MiB.
///
/// Files up to this size are sent as a single block.
pub const CHUNK_SIZE: u64 = 4 * 1024 * 1024;

/// Exclusive upper bound on uploadable file size: 4 GiB.
pub const MAX_FILE_SIZE: u64 = 4 * 1024 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot upload an empty file")]
    EmptyFile,

    #[error("file too large: {size} bytes (limit is 4 GiB)")]
    FileTooLarge { size: u64 },

    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    #[error("failed to read block {ordinal}: {source}")]
    BlockRead {
        ordinal: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("block {ordinal} changed on disk since it was hashed")]
    BlockChanged { ordinal: usize },
}
