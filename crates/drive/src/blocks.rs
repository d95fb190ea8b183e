//! Block uploads to the storage node chosen during negotiation.

use std::path::Path;

use futures_util::{StreamExt, TryStreamExt, stream};
use micloud_transfer::{BlockDescriptor, FileDescriptor, read_block_at};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Stage};
use crate::negotiate::{BlockNegotiation, PendingUpload};
use crate::session::HttpSession;
use crate::types::{BLOCK_COMPLETED, BlockUploadResponse, CommitEntry};

/// Characters left unescaped in URL components (RFC 3986 unreserved).
pub(crate) const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// URL a missing block is POSTed to.
pub fn block_upload_url(node_url: &str, file_meta: &str, block_meta: &str) -> String {
    format!(
        "{}/upload_block_chunk?chunk_pos=0&file_meta={}&block_meta={}",
        node_url.trim_end_matches('/'),
        utf8_percent_encode(file_meta, UNRESERVED),
        utf8_percent_encode(block_meta, UNRESERVED),
    )
}

/// Parses a node reply and extracts the block's commit token.
///
/// Every error names `ordinal`.
pub fn parse_block_response(body: &[u8], ordinal: usize) -> Result<CommitEntry, Error> {
    let resp: BlockUploadResponse = serde_json::from_slice(body)
        .map_err(|e| Error::json(Stage::BlockUpload)(e).at_block(ordinal))?;

    if resp.stat != BLOCK_COMPLETED {
        return Err(Error::BlockNotCompleted {
            ordinal,
            stat: resp.stat,
        });
    }

    resp.commit_meta
        .filter(|meta| !meta.is_empty())
        .map(|commit_meta| CommitEntry { commit_meta })
        .ok_or_else(|| Error::missing(Stage::BlockUpload, "commit_meta").at_block(ordinal))
}

impl<S: HttpSession> Client<S> {
    /// Uploads every block the server reported missing.
    ///
    /// Returns one commit entry per block in ordinal order, whether the block
    /// was uploaded now or already stored. Up to
    /// [`UploadOptions::concurrency`](crate::UploadOptions::concurrency)
    /// blocks are in flight; the first failure aborts the rest and names the
    /// block it happened on.
    pub async fn upload_blocks(
        &self,
        file: &FileDescriptor,
        blocks: &[BlockDescriptor],
        pending: &PendingUpload,
    ) -> Result<Vec<CommitEntry>, Error> {
        if pending.blocks.len() != blocks.len() {
            return Err(Error::BlockCountMismatch {
                expected: blocks.len(),
                actual: pending.blocks.len(),
            });
        }

        stream::iter(blocks.iter().zip(&pending.blocks))
            .map(|(block, verdict)| async move {
                self.commit_block(&file.path, block, verdict, pending)
                    .await
                    .map_err(|e| e.at_block(block.ordinal))
            })
            .buffered(self.options.concurrency.max(1))
            .try_collect()
            .await
    }

    async fn commit_block(
        &self,
        path: &Path,
        block: &BlockDescriptor,
        verdict: &BlockNegotiation,
        pending: &PendingUpload,
    ) -> Result<CommitEntry, Error> {
        let block_meta = match verdict {
            BlockNegotiation::Existing { commit_meta } => {
                debug!(ordinal = block.ordinal, "block already stored");
                return Ok(CommitEntry {
                    commit_meta: commit_meta.clone(),
                });
            }
            BlockNegotiation::Missing { block_meta } => block_meta,
        };

        let data = {
            let path = path.to_path_buf();
            let block = block.clone();
            tokio::task::spawn_blocking(move || read_block_at(&path, &block))
                .await
                .map_err(|e| Error::Task(e.to_string()))??
        };

        let url = block_upload_url(&pending.node_url, &pending.file_meta, block_meta);
        let headers = self.browser_headers("application/octet-stream");
        let resp = self.session.post_raw(&url, &headers, data).await?;

        if !resp.is_success() {
            return Err(Error::Status {
                stage: Stage::BlockUpload,
                status: resp.status,
            });
        }

        let entry = parse_block_response(&resp.body, block.ordinal)?;
        debug!(ordinal = block.ordinal, size = block.size, "block uploaded");
        Ok(entry)
    }
}
