//! Upload pipeline: describe, negotiate, upload missing blocks, finalize.

use std::path::Path;

use micloud_transfer::describe_file;
use tracing::info;

use crate::client::Client;
use crate::error::Error;
use crate::finalize::{build_commit_request, build_existing_request};
use crate::negotiate::NegotiationResult;
use crate::session::HttpSession;

impl<S: HttpSession> Client<S> {
    /// Uploads the file at `path` into the folder `parent_id` and returns the
    /// id of the new remote file.
    ///
    /// Size limits are checked before any request is sent. A file the server
    /// already stores is created without transferring any block.
    pub async fn upload_file(&self, path: &Path, parent_id: &str) -> Result<String, Error> {
        let (file, blocks) = {
            let path = path.to_path_buf();
            let chunk_size = self.chunk_size;
            tokio::task::spawn_blocking(move || describe_file(&path, chunk_size))
                .await
                .map_err(|e| Error::Task(e.to_string()))??
        };

        info!(
            name = %file.name,
            size = file.size,
            blocks = blocks.len(),
            "uploading file"
        );

        let request = match self.negotiate(&file, &blocks).await? {
            NegotiationResult::Existing { upload_id } => {
                info!(name = %file.name, "file already stored, skipping block upload");
                build_existing_request(&file.name, &upload_id)
            }
            NegotiationResult::Pending(pending) => {
                let commits = self.upload_blocks(&file, &blocks, &pending).await?;
                build_commit_request(&file, &pending, commits)
            }
        };

        let id = self.finalize(parent_id, &request).await?;
        info!(name = %file.name, %id, "upload complete");
        Ok(id)
    }
}
