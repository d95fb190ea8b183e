//! Mi Cloud drive client.
//!
//! Talks to the drive file API through an already authenticated
//! [`HttpSession`]. The interesting part is the upload pipeline:
//!
//! 1. **Describe**: hash the file and split it into 4 MiB blocks
//! 2. **Negotiate**: offer the digests; the server answers which blocks
//!    (or whether the whole file) it already stores
//! 3. **Upload**: stream only the missing blocks to the assigned node
//! 4. **Finalize**: commit the block tokens under a parent folder
//!
//! Reading (metadata, download links, raw bytes, folder listings) lives in
//! [`files`].

pub mod blocks;
pub mod client;
pub mod error;
pub mod files;
pub mod finalize;
pub mod negotiate;
pub mod session;
pub mod types;
pub mod upload;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{Client, DEFAULT_BASE_URL, UploadOptions};
pub use error::{Error, Stage};
pub use files::ROOT_FOLDER_ID;
pub use negotiate::{BlockNegotiation, NegotiationResult, PendingUpload};
pub use session::{HttpResponse, HttpSession, ReqwestSession, SessionFuture};
pub use types::{CommitEntry, FileKind, RemoteFile, UploadRequest};
