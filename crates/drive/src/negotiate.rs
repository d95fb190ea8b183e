//! Create-file negotiation: which blocks does the server still need?

use micloud_transfer::{BlockDescriptor, FileDescriptor};
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Stage};
use crate::session::HttpSession;
use crate::types::{
    BlockInfo, BlockInfos, BlockMetaResponse, Blob, CreateFileData, NegotiateStorage,
    Storage, UploadContent, UploadRequest,
};

/// Path of the create-file endpoint.
pub const CREATE_FILE_PATH: &str = "/drive/user/files/create";

/// Server verdict for one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockNegotiation {
    /// Already stored; the commit token can be used directly.
    Existing { commit_meta: String },
    /// Must be uploaded with this block token.
    Missing { block_meta: String },
}

impl BlockNegotiation {
    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing { .. })
    }
}

/// Upload state handed out by the server when the file is new.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    /// Node the missing blocks are sent to (first of `node_urls`).
    pub node_url: String,
    pub node_urls: Vec<String>,
    pub file_meta: String,
    pub secure_key: String,
    pub content_cache_key: String,
    pub upload_id: String,
    /// One entry per local block, in ordinal order.
    pub blocks: Vec<BlockNegotiation>,
}

impl PendingUpload {
    pub fn missing_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| !b.is_existing()).count()
    }
}

/// Outcome of negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationResult {
    /// The server already stores the whole file.
    Existing { upload_id: String },
    /// Some or all blocks still have to be uploaded.
    Pending(PendingUpload),
}

/// Builds the create-file payload: file digest plus per-block digests.
pub fn build_negotiate_request(file: &FileDescriptor, blocks: &[BlockDescriptor]) -> UploadRequest {
    let block_infos = blocks
        .iter()
        .map(|b| BlockInfo {
            blob: Blob {},
            sha1: b.sha1().to_string(),
            md5: b.md5().to_string(),
            size: b.size,
        })
        .collect();

    UploadRequest {
        content: UploadContent {
            name: file.name.clone(),
            storage: Storage::Negotiate(NegotiateStorage {
                size: file.size,
                sha1: file.sha1().to_string(),
                kss: BlockInfos { block_infos },
                upload_id: String::new(),
                exists: false,
            }),
        },
    }
}

/// Interprets the `data` of a successful create-file response.
///
/// `block_count` is the number of local blocks; the server must describe
/// exactly that many.
pub fn interpret_create_response(
    data: CreateFileData,
    block_count: usize,
) -> Result<NegotiationResult, Error> {
    const STAGE: Stage = Stage::Negotiate;

    let storage = data.storage.ok_or_else(|| Error::missing(STAGE, "storage"))?;

    if storage.exists {
        let upload_id = storage
            .upload_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing(STAGE, "uploadId"))?;
        return Ok(NegotiationResult::Existing { upload_id });
    }

    let kss = storage.kss.ok_or_else(|| Error::missing(STAGE, "kss"))?;

    let node_url = kss
        .node_urls
        .first()
        .filter(|url| !url.is_empty())
        .cloned()
        .ok_or_else(|| Error::missing(STAGE, "node_urls"))?;
    let file_meta = kss
        .file_meta
        .ok_or_else(|| Error::missing(STAGE, "file_meta"))?;
    let block_metas = kss
        .block_metas
        .ok_or_else(|| Error::missing(STAGE, "block_metas"))?;

    if block_metas.len() != block_count {
        return Err(Error::BlockCountMismatch {
            expected: block_count,
            actual: block_metas.len(),
        });
    }

    let blocks = block_metas
        .into_iter()
        .map(block_negotiation)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NegotiationResult::Pending(PendingUpload {
        node_url,
        node_urls: kss.node_urls,
        file_meta,
        secure_key: kss.secure_key.unwrap_or_default(),
        content_cache_key: kss.content_cache_key.unwrap_or_default(),
        upload_id: storage.upload_id.unwrap_or_default(),
        blocks,
    }))
}

fn block_negotiation(meta: BlockMetaResponse) -> Result<BlockNegotiation, Error> {
    if meta.is_existed {
        meta.commit_meta
            .map(|commit_meta| BlockNegotiation::Existing { commit_meta })
            .ok_or_else(|| Error::missing(Stage::Negotiate, "commit_meta"))
    } else {
        meta.block_meta
            .map(|block_meta| BlockNegotiation::Missing { block_meta })
            .ok_or_else(|| Error::missing(Stage::Negotiate, "block_meta"))
    }
}

impl<S: HttpSession> Client<S> {
    /// Offers the file and block digests to the create-file endpoint.
    pub async fn negotiate(
        &self,
        file: &FileDescriptor,
        blocks: &[BlockDescriptor],
    ) -> Result<NegotiationResult, Error> {
        let request = build_negotiate_request(file, blocks);
        let data = serde_json::to_string(&request).map_err(Error::json(Stage::Negotiate))?;

        let created: CreateFileData = self
            .post_envelope(&self.url(CREATE_FILE_PATH), Stage::Negotiate, &data, &[])
            .await?;
        let result = interpret_create_response(created, blocks.len())?;

        match &result {
            NegotiationResult::Existing { .. } => {
                debug!(name = %file.name, "server already stores file");
            }
            NegotiationResult::Pending(pending) => {
                debug!(
                    name = %file.name,
                    node = %pending.node_url,
                    blocks = pending.blocks.len(),
                    missing = pending.missing_blocks(),
                    "negotiated upload"
                );
            }
        }
        Ok(result)
    }
}
