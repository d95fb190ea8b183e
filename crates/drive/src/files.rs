//! Reading remote files: metadata, content, download links, folder listings.

use percent_encoding::utf8_percent_encode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::blocks::UNRESERVED;
use crate::client::{Client, parse_envelope};
use crate::error::{Error, Stage};
use crate::session::HttpSession;
use crate::types::{DownloadDescriptor, FileInfoData, FolderData, RemoteFile};

/// Id of the drive's root folder.
pub const ROOT_FOLDER_ID: &str = "0";

const JSONP_CALLBACK: &str = "callback";

/// Removes a `callback(...)` JSONP wrapper, if present.
///
/// Bodies that are not wrapped are returned unchanged.
pub fn strip_jsonp(body: &[u8]) -> &[u8] {
    let body = body.trim_ascii();
    let Some(inner) = body.strip_prefix(JSONP_CALLBACK.as_bytes()) else {
        return body;
    };
    let inner = inner.trim_ascii_start();
    let inner = inner.strip_suffix(b";").unwrap_or(inner).trim_ascii_end();

    match inner.strip_prefix(b"(").and_then(|s| s.strip_suffix(b")")) {
        Some(json) => json.trim_ascii(),
        None => body,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl<S: HttpSession> Client<S> {
    fn file_url(&self, id: &str) -> String {
        self.url(&format!(
            "/drive/user/files/{}",
            utf8_percent_encode(id, UNRESERVED)
        ))
    }

    /// GETs a drive API resource and unwraps the (possibly JSONP) envelope.
    async fn get_envelope<T: DeserializeOwned>(&self, url: &str, stage: Stage) -> Result<T, Error> {
        let resp = self.get_following(url, stage).await?;
        if !resp.is_success() {
            return Err(Error::Status {
                stage,
                status: resp.status,
            });
        }
        parse_envelope(strip_jsonp(&resp.body), stage)
    }

    /// Public download URL of a file.
    pub async fn download_url(&self, id: &str) -> Result<String, Error> {
        let info: FileInfoData = self
            .get_envelope(&self.file_url(id), Stage::Metadata)
            .await?;
        non_empty(info.storage.and_then(|s| s.download_url))
            .ok_or_else(|| Error::missing(Stage::Metadata, "downloadUrl"))
    }

    /// Downloads the content of a file.
    ///
    /// The metadata points at a JSONP descriptor, which in turn names the
    /// storage URL and the `meta` token to POST there.
    pub async fn get_file(&self, id: &str) -> Result<Vec<u8>, Error> {
        let url = format!("{}?jsonpCallback={JSONP_CALLBACK}", self.file_url(id));
        let info: FileInfoData = self.get_envelope(&url, Stage::Metadata).await?;
        let jsonp_url = non_empty(info.storage.and_then(|s| s.jsonp_url))
            .ok_or_else(|| Error::missing(Stage::Metadata, "jsonpUrl"))?;

        let resp = self.get_following(&jsonp_url, Stage::Download).await?;
        if !resp.is_success() {
            return Err(Error::Status {
                stage: Stage::Download,
                status: resp.status,
            });
        }
        let descriptor: DownloadDescriptor =
            serde_json::from_slice(strip_jsonp(&resp.body)).map_err(Error::json(Stage::Download))?;
        let content_url =
            non_empty(descriptor.url).ok_or_else(|| Error::missing(Stage::Download, "url"))?;
        let meta =
            non_empty(descriptor.meta).ok_or_else(|| Error::missing(Stage::Download, "meta"))?;

        let resp = self
            .session
            .post_form(&content_url, &[], &[("meta", meta.as_str())])
            .await?;
        if !resp.is_success() {
            return Err(Error::Status {
                stage: Stage::Download,
                status: resp.status,
            });
        }

        debug!(id, bytes = resp.body.len(), "file downloaded");
        Ok(resp.body)
    }

    /// Entries of a folder; use [`ROOT_FOLDER_ID`] for the root.
    pub async fn list_folder(&self, id: &str) -> Result<Vec<RemoteFile>, Error> {
        let url = self.url(&format!(
            "/drive/user/folders/{}/children",
            utf8_percent_encode(id, UNRESERVED)
        ));
        let folder: FolderData = self.get_envelope(&url, Stage::Listing).await?;
        debug!(folder = id, entries = folder.list.len(), "folder listed");
        Ok(folder.list)
    }
}
