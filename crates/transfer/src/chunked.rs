use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::digest::{DigestPair, HashAlgorithm, PairHasher, digest_bytes, hex_digest};
use crate::types::{BlockDescriptor, FileDescriptor};
use crate::validation::{upload_file_name, validate_file_size};
use crate::{CHUNK_SIZE, TransferError};

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Stats, validates, and hashes `path` in a single pass.
///
/// Returns the file descriptor (whole-file digests) together with the block
/// descriptors. Size preconditions are checked before any byte is read.
///
/// If `chunk_size` is 0, [`CHUNK_SIZE`] (4 MiB) is used.
pub fn describe_file(
    path: &Path,
    chunk_size: u64,
) -> Result<(FileDescriptor, Vec<BlockDescriptor>), TransferError> {
    let name = upload_file_name(path)?;
    let size = std::fs::metadata(path)?.len();
    validate_file_size(size)?;

    let mut file = File::open(path)?;
    let (digests, blocks) = scan_blocks(&mut file, size, chunk_size)?;

    debug!(
        path = %path.display(),
        size,
        blocks = blocks.len(),
        sha1 = %digests.sha1,
        "file described"
    );

    let descriptor = FileDescriptor {
        path: path.to_path_buf(),
        name,
        size,
        digests,
    };
    Ok((descriptor, blocks))
}

/// Splits the first `size` bytes of `path` into block descriptors.
///
/// - `size <= chunk_size`: one block covering the whole file.
/// - otherwise: `ceil(size / chunk_size)` blocks, the last one holding the
///   remainder.
///
/// A block that cannot be read in full fails the whole split.
pub fn split_blocks(
    path: &Path,
    size: u64,
    chunk_size: u64,
) -> Result<Vec<BlockDescriptor>, TransferError> {
    let mut file = File::open(path)?;
    let (_, blocks) = scan_blocks(&mut file, size, chunk_size)?;
    Ok(blocks)
}

fn scan_blocks<R: Read + Seek>(
    source: &mut R,
    size: u64,
    chunk_size: u64,
) -> Result<(DigestPair, Vec<BlockDescriptor>), TransferError> {
    let chunk_size = if chunk_size == 0 { CHUNK_SIZE } else { chunk_size };
    let count = size.div_ceil(chunk_size) as usize;

    let mut whole = PairHasher::new();
    let mut blocks = Vec::with_capacity(count);
    let mut buf = vec![0u8; chunk_size.min(size) as usize];

    for ordinal in 0..count {
        let offset = ordinal as u64 * chunk_size;
        let len = chunk_size.min(size - offset) as usize;

        source
            .seek(SeekFrom::Start(offset))
            .and_then(|_| source.read_exact(&mut buf[..len]))
            .map_err(|err| TransferError::BlockRead {
                ordinal,
                source: err,
            })?;

        let data = &buf[..len];
        whole.update(data);
        blocks.push(BlockDescriptor {
            ordinal,
            offset,
            size: len as u64,
            digests: digest_bytes(data),
        });
    }

    Ok((whole.finalize(), blocks))
}

// ---------------------------------------------------------------------------
// Re-reading
// ---------------------------------------------------------------------------

/// Reads exactly the bytes of `block` from `path` through a fresh handle.
///
/// The bytes are checked against the block's SHA-1 so a file modified after
/// negotiation is never uploaded under stale digests.
pub fn read_block_at(path: &Path, block: &BlockDescriptor) -> Result<Vec<u8>, TransferError> {
    let read = || -> std::io::Result<Vec<u8>> {
        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(block.offset))?;
        let mut data = vec![0u8; block.size as usize];
        file.read_exact(&mut data)?;
        Ok(data)
    };
    let data = read().map_err(|source| TransferError::BlockRead {
        ordinal: block.ordinal,
        source,
    })?;

    let identity = HashAlgorithm::Sha1;
    if hex_digest(&data[..], identity)? != block.digests.get(identity) {
        return Err(TransferError::BlockChanged {
            ordinal: block.ordinal,
        });
    }
    Ok(data)
}
