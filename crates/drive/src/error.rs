//! Drive client error types.

use std::fmt;

use micloud_transfer::TransferError;

/// Step of a drive operation an error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Negotiate,
    BlockUpload,
    Finalize,
    Metadata,
    Download,
    Listing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Negotiate => "create file",
            Self::BlockUpload => "block upload",
            Self::Finalize => "finalize",
            Self::Metadata => "file metadata",
            Self::Download => "download",
            Self::Listing => "folder listing",
        };
        f.write_str(name)
    }
}

/// Errors produced by the drive client.
///
/// Every variant is fatal for the operation that produced it; nothing is
/// retried and blocks already sent to a node are not cleaned up.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("{stage}: invalid JSON response: {source}")]
    Json {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("{stage} rejected by server: {description}")]
    Rejected { stage: Stage, description: String },

    #[error("{stage}: response missing `{field}`")]
    MissingField { stage: Stage, field: &'static str },

    #[error("{stage}: unexpected HTTP status {status}")]
    Status { stage: Stage, status: u16 },

    #[error("block {ordinal}: {source}")]
    Block {
        ordinal: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("block upload: block {ordinal} not completed (stat: {stat})")]
    BlockNotCompleted { ordinal: usize, stat: String },

    #[error("create file: server described {actual} blocks, expected {expected}")]
    BlockCountMismatch { expected: usize, actual: usize },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("task join error: {0}")]
    Task(String),
}

impl Error {
    pub(crate) fn json(stage: Stage) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Json { stage, source }
    }

    pub(crate) fn missing(stage: Stage, field: &'static str) -> Self {
        Self::MissingField { stage, field }
    }

    /// Attaches a block ordinal unless the error already names one.
    pub(crate) fn at_block(self, ordinal: usize) -> Self {
        match self {
            Self::Block { .. }
            | Self::BlockNotCompleted { .. }
            | Self::Transfer(
                TransferError::BlockRead { .. } | TransferError::BlockChanged { .. },
            ) => self,
            other => Self::Block {
                ordinal,
                source: Box::new(other),
            },
        }
    }

    /// Ordinal of the block this error is about, if any.
    pub fn block_ordinal(&self) -> Option<usize> {
        match self {
            Self::Block { ordinal, .. } | Self::BlockNotCompleted { ordinal, .. } => Some(*ordinal),
            Self::Transfer(
                TransferError::BlockRead { ordinal, .. } | TransferError::BlockChanged { ordinal },
            ) => Some(*ordinal),
            _ => None,
        }
    }
}
