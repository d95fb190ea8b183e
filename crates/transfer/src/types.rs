use std::path::PathBuf;

use crate::DigestPair;

/// A local file ready to be offered to the drive service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Local path the bytes are read from.
    pub path: PathBuf,
    /// Name the remote file is created with.
    pub name: String,
    /// Size in bytes, strictly between 0 and [`MAX_FILE_SIZE`](crate::MAX_FILE_SIZE).
    pub size: u64,
    /// Whole-file digests.
    pub digests: DigestPair,
}

impl FileDescriptor {
    pub fn sha1(&self) -> &str {
        &self.digests.sha1
    }

    pub fn md5(&self) -> &str {
        &self.digests.md5
    }
}

/// One fixed-size block of a file.
///
/// Blocks of a file have contiguous ordinals starting at zero, strictly
/// increasing offsets, and every block except the last is exactly the chunk
/// size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// Zero-based position in the file.
    pub ordinal: usize,
    /// Byte offset of the first byte of the block.
    pub offset: u64,
    /// Length in bytes.
    pub size: u64,
    /// Digests of the block bytes.
    pub digests: DigestPair,
}

impl BlockDescriptor {
    pub fn sha1(&self) -> &str {
        &self.digests.sha1
    }

    pub fn md5(&self) -> &str {
        &self.digests.md5
    }

    /// Offset one past the last byte of the block.
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}
