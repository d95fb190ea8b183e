//! Finalization: turn stored blocks into a file inside a folder.

use micloud_transfer::FileDescriptor;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Stage};
use crate::negotiate::PendingUpload;
use crate::session::HttpSession;
use crate::types::{
    CommitEntry, CommitKss, CommitStorage, ExistingStorage, FinalizeData, Storage,
    UploadContent, UploadRequest,
};

/// Path of the finalize endpoint.
pub const FINALIZE_PATH: &str = "/drive/user/files";

/// `stat` reported for a file whose blocks are all stored.
const STAT_OK: &str = "OK";

/// Payload finalizing a file the server already holds in full.
pub fn build_existing_request(name: &str, upload_id: &str) -> UploadRequest {
    UploadRequest {
        content: UploadContent {
            name: name.to_string(),
            storage: Storage::Existing(ExistingStorage {
                upload_id: upload_id.to_string(),
                exists: true,
            }),
        },
    }
}

/// Payload committing uploaded (or deduplicated) blocks.
///
/// `commits` must hold one entry per block in ordinal order.
pub fn build_commit_request(
    file: &FileDescriptor,
    pending: &PendingUpload,
    commits: Vec<CommitEntry>,
) -> UploadRequest {
    UploadRequest {
        content: UploadContent {
            name: file.name.clone(),
            storage: Storage::Commit(CommitStorage {
                size: file.size,
                sha1: file.sha1().to_string(),
                kss: CommitKss {
                    stat: STAT_OK.to_string(),
                    node_urls: pending.node_urls.clone(),
                    secure_key: pending.secure_key.clone(),
                    content_cache_key: pending.content_cache_key.clone(),
                    file_meta: pending.file_meta.clone(),
                    commit_metas: commits,
                },
                upload_id: pending.upload_id.clone(),
                exists: false,
            }),
        },
    }
}

impl<S: HttpSession> Client<S> {
    /// Creates the file entry under `parent_id` and returns its id.
    pub async fn finalize(&self, parent_id: &str, request: &UploadRequest) -> Result<String, Error> {
        let data = serde_json::to_string(request).map_err(Error::json(Stage::Finalize))?;

        let created: FinalizeData = self
            .post_envelope(
                &self.url(FINALIZE_PATH),
                Stage::Finalize,
                &data,
                &[("parentId", parent_id)],
            )
            .await?;

        let id = created
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing(Stage::Finalize, "id"))?;
        debug!(%id, parent = parent_id, "file finalized");
        Ok(id)
    }
}
