//! Wire types for the drive file API.
//!
//! Request payloads are serialized into the `data` form field. Responses are
//! parsed leniently (most fields optional) so that a missing field surfaces
//! as [`Error::MissingField`](crate::Error::MissingField) from the stage that
//! needs it rather than as a generic JSON error.

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of the `data` field sent to the create-file and finalize endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadRequest {
    pub content: UploadContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadContent {
    pub name: String,
    pub storage: Storage,
}

/// The `storage` object, one shape per request kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Storage {
    /// Offered to the create-file endpoint.
    Negotiate(NegotiateStorage),
    /// Finalizes a file the server already holds.
    Existing(ExistingStorage),
    /// Finalizes a file whose blocks were uploaded or deduplicated.
    Commit(CommitStorage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateStorage {
    pub size: u64,
    pub sha1: String,
    pub kss: BlockInfos,
    pub upload_id: String,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInfos {
    pub block_infos: Vec<BlockInfo>,
}

/// Per-block metadata offered during negotiation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockInfo {
    pub blob: Blob,
    pub sha1: String,
    pub md5: String,
    pub size: u64,
}

/// Always-empty `blob` object: block bytes never travel in metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingStorage {
    pub upload_id: String,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitStorage {
    pub size: u64,
    pub sha1: String,
    pub kss: CommitKss,
    pub upload_id: String,
    pub exists: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitKss {
    pub stat: String,
    pub node_urls: Vec<String>,
    pub secure_key: String,
    #[serde(rename = "contentCacheKey")]
    pub content_cache_key: String,
    pub file_meta: String,
    pub commit_metas: Vec<CommitEntry>,
}

/// Proof that one block is stored server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub commit_meta: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Common `{result, description, data}` wrapper of drive API responses.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub description: String,
    pub data: Option<T>,
}

/// Marker the drive API puts in `result` on success.
pub const RESULT_OK: &str = "ok";

#[derive(Debug, Default, Deserialize)]
pub struct CreateFileData {
    pub storage: Option<CreateStorage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateStorage {
    #[serde(default, deserialize_with = "flag")]
    pub exists: bool,
    #[serde(rename = "uploadId", default, deserialize_with = "opt_string")]
    pub upload_id: Option<String>,
    pub kss: Option<KssResponse>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KssResponse {
    #[serde(default)]
    pub node_urls: Vec<String>,
    pub file_meta: Option<String>,
    pub secure_key: Option<String>,
    #[serde(rename = "contentCacheKey")]
    pub content_cache_key: Option<String>,
    pub block_metas: Option<Vec<BlockMetaResponse>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BlockMetaResponse {
    #[serde(default, deserialize_with = "flag")]
    pub is_existed: bool,
    pub commit_meta: Option<String>,
    pub block_meta: Option<String>,
}

/// Reply of a node to `upload_block_chunk`.
#[derive(Debug, Default, Deserialize)]
pub struct BlockUploadResponse {
    #[serde(default)]
    pub stat: String,
    pub commit_meta: Option<String>,
}

/// `stat` value of a node that stored the whole block.
pub const BLOCK_COMPLETED: &str = "BLOCK_COMPLETED";

#[derive(Debug, Default, Deserialize)]
pub struct FinalizeData {
    #[serde(default, deserialize_with = "opt_string")]
    pub id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FileInfoData {
    pub storage: Option<FileStorage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStorage {
    pub jsonp_url: Option<String>,
    pub download_url: Option<String>,
}

/// Intermediate descriptor pointing at the actual file bytes.
#[derive(Debug, Default, Deserialize)]
pub struct DownloadDescriptor {
    pub url: Option<String>,
    pub meta: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FolderData {
    #[serde(default)]
    pub list: Vec<RemoteFile>,
}

/// Kind of a drive entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Folder,
    #[serde(other)]
    Unknown,
}

/// An entry of a remote folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub sha1: String,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub modify_time: i64,
    /// Server-side revision, absent on some entries.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_string"
    )]
    pub revision: Option<String>,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.kind == FileKind::Folder
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

/// Accepts `true`/`false`, `1`/`0`, or `"true"`/`"1"`.
fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    use serde_json::Value;
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s == "true" || s == "1",
        _ => false,
    })
}

/// Accepts a string or a number; `null` becomes `None`.
fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    use serde_json::Value;
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    opt_string(d)?.ok_or_else(|| serde::de::Error::custom("expected a string or number"))
}
