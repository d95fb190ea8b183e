//! Authenticated HTTP session seam.
//!
//! Account login and token refresh happen elsewhere; the drive client only
//! needs something that can send requests with valid credentials attached.
//! [`ReqwestSession`] is the production implementation.

use std::future::Future;
use std::pin::Pin;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue, LOCATION};

use crate::error::Error;

/// Boxed future returned by [`HttpSession`] methods.
pub type SessionFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send + 'a>>;

/// Status, redirect target, and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub location: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            location: None,
            body: body.into(),
        }
    }

    /// A `302 Found` pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            location: Some(location.into()),
            body: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_found(&self) -> bool {
        self.status == 302
    }
}

/// An authenticated session with the drive service.
///
/// Implementations attach the account credentials to every request and must
/// not follow redirects themselves; the client decides when to follow one.
pub trait HttpSession: Send + Sync {
    /// Sends a GET request.
    fn get(&self, url: &str) -> SessionFuture<'_>;

    /// Sends a form-encoded POST with extra headers.
    fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        fields: &[(&str, &str)],
    ) -> SessionFuture<'_>;

    /// Sends a POST with a raw body and extra headers.
    fn post_raw(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> SessionFuture<'_>;

    /// The service token sent in form payloads.
    fn service_token(&self) -> &str;
}

/// [`HttpSession`] backed by `reqwest` with cookie credentials.
pub struct ReqwestSession {
    http: reqwest::Client,
    service_token: String,
}

impl ReqwestSession {
    /// Creates a session for an account that has already signed in.
    pub fn new(user_id: &str, service_token: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("userId={user_id}; serviceToken={service_token}"))
                .map_err(|_| Error::InvalidHeader("cookie".into()))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            http,
            service_token: service_token.to_string(),
        })
    }

    fn send(request: Result<reqwest::RequestBuilder, Error>) -> SessionFuture<'static> {
        Box::pin(async move {
            let resp = request?.send().await?;
            let status = resp.status().as_u16();
            let location = resp
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let body = resp.bytes().await?.to_vec();
            Ok(HttpResponse {
                status,
                location,
                body,
            })
        })
    }
}

impl HttpSession for ReqwestSession {
    fn get(&self, url: &str) -> SessionFuture<'_> {
        Self::send(Ok(self.http.get(url)))
    }

    fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        fields: &[(&str, &str)],
    ) -> SessionFuture<'_> {
        let request = header_map(headers).map(|h| self.http.post(url).headers(h).form(fields));
        Self::send(request)
    }

    fn post_raw(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> SessionFuture<'_> {
        let request = header_map(headers).map(|h| self.http.post(url).headers(h).body(body));
        Self::send(request)
    }

    fn service_token(&self) -> &str {
        &self.service_token
    }
}

fn header_map(pairs: &[(&str, &str)]) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader((*name).to_string()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| Error::InvalidHeader(name.as_str().to_string()))?;
        headers.insert(name, value);
    }
    Ok(headers)
}
