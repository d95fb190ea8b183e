//! Drive API client.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Error, Stage};
use crate::session::{HttpResponse, HttpSession};
use crate::types::{Envelope, RESULT_OK};

/// Production host of the drive web API.
pub const DEFAULT_BASE_URL: &str = "https://i.mi.com";

/// Tuning knobs for uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Maximum number of blocks in flight at once. `1` uploads strictly in
    /// sequence; larger values still commit blocks in ordinal order.
    pub concurrency: usize,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// Drive API client over an authenticated session.
pub struct Client<S> {
    pub(crate) session: S,
    base_url: String,
    referer: String,
    pub(crate) options: UploadOptions,
    pub(crate) chunk_size: u64,
}

impl<S: HttpSession> Client<S> {
    /// Creates a client for the production host.
    pub fn new(session: S) -> Self {
        Self {
            session,
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: format!("{DEFAULT_BASE_URL}/drive"),
            options: UploadOptions::default(),
            chunk_size: micloud_transfer::CHUNK_SIZE,
        }
    }

    /// Points the client at another host.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.base_url = url.trim_end_matches('/').to_string();
        self.referer = format!("{}/drive", self.base_url);
        self
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets a custom block size (for testing with small files).
    #[cfg(test)]
    pub(crate) fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Headers the web client sends with uploads, plus `Content-Type`.
    pub(crate) fn browser_headers<'a>(&'a self, content_type: &'a str) -> [(&'a str, &'a str); 4] {
        [
            ("Content-Type", content_type),
            ("DNT", "1"),
            ("Origin", self.base_url.as_str()),
            ("Referer", self.referer.as_str()),
        ]
    }

    /// GETs `url`, following a single `302 Found`.
    pub(crate) async fn get_following(
        &self,
        url: &str,
        stage: Stage,
    ) -> Result<HttpResponse, Error> {
        let resp = self.session.get(url).await?;
        if !resp.is_found() {
            return Ok(resp);
        }

        let location = resp
            .location
            .ok_or_else(|| Error::missing(stage, "Location"))?;
        debug!(%stage, "following redirect");
        self.session.get(&location).await
    }

    /// Posts `data` (plus extra fields) as a form and unwraps the envelope.
    ///
    /// A JSON envelope is honored whatever the status; an unparseable body
    /// on a non-2xx reply is reported as [`Error::Status`].
    pub(crate) async fn post_envelope<T: DeserializeOwned>(
        &self,
        url: &str,
        stage: Stage,
        data: &str,
        extra: &[(&str, &str)],
    ) -> Result<T, Error> {
        let mut fields = vec![("data", data), ("serviceToken", self.session.service_token())];
        fields.extend_from_slice(extra);

        let headers = self.browser_headers("application/x-www-form-urlencoded");
        let resp = self.session.post_form(url, &headers, &fields).await?;
        match parse_envelope(&resp.body, stage) {
            Err(Error::Json { .. }) if !resp.is_success() => Err(Error::Status {
                stage,
                status: resp.status,
            }),
            other => other,
        }
    }
}

/// Parses a `{result, description, data}` response.
///
/// `result` must be `"ok"`; anything else becomes [`Error::Rejected`] with
/// the server description.
pub(crate) fn parse_envelope<T: DeserializeOwned>(body: &[u8], stage: Stage) -> Result<T, Error> {
    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(Error::json(stage))?;

    if envelope.result != RESULT_OK {
        let description = if envelope.description.is_empty() {
            format!("result `{}`", envelope.result)
        } else {
            envelope.description
        };
        return Err(Error::Rejected { stage, description });
    }

    envelope.data.ok_or_else(|| Error::missing(stage, "data"))
}
