//! Recording [`HttpSession`] for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::Error;
use crate::session::{HttpResponse, HttpSession, SessionFuture};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    PostForm,
    PostRaw,
}

/// A request as seen by [`MockSession`].
#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub fields: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `data` form field parsed as JSON.
    pub fn data_json(&self) -> serde_json::Value {
        serde_json::from_str(self.field("data").expect("request has no data field"))
            .expect("data field is not JSON")
    }

    pub fn query(&self, name: &str) -> Option<String> {
        let (_, query) = self.url.split_once('?')?;
        query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then(|| v.to_string())
        })
    }
}

type Handler = Box<dyn Fn(&Recorded) -> Result<HttpResponse, Error> + Send + Sync>;

/// Session that records requests and answers from a queue or a handler.
pub(crate) struct MockSession {
    token: String,
    queue: Mutex<VecDeque<HttpResponse>>,
    handler: Option<Handler>,
    requests: Mutex<Vec<Recorded>>,
}

impl MockSession {
    /// Answers requests with `responses`, in order.
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            token: "test-token".into(),
            queue: Mutex::new(responses.into()),
            handler: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with `handler`.
    pub fn with_handler(
        handler: impl Fn(&Recorded) -> Result<HttpResponse, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    /// Requests whose URL contains `fragment`.
    pub fn matching(&self, fragment: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(fragment))
            .collect()
    }

    fn respond(&self, request: Recorded) -> SessionFuture<'_> {
        let result = match &self.handler {
            Some(handler) => handler(&request),
            None => self
                .queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| Error::Task(format!("no mock response for {}", request.url))),
        };
        self.requests.lock().unwrap().push(request);
        Box::pin(async move { result })
    }
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl HttpSession for MockSession {
    fn get(&self, url: &str) -> SessionFuture<'_> {
        self.respond(Recorded {
            method: Method::Get,
            url: url.to_string(),
            headers: Vec::new(),
            fields: Vec::new(),
            body: Vec::new(),
        })
    }

    fn post_form(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        fields: &[(&str, &str)],
    ) -> SessionFuture<'_> {
        self.respond(Recorded {
            method: Method::PostForm,
            url: url.to_string(),
            headers: owned(headers),
            fields: owned(fields),
            body: Vec::new(),
        })
    }

    fn post_raw(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> SessionFuture<'_> {
        self.respond(Recorded {
            method: Method::PostRaw,
            url: url.to_string(),
            headers: owned(headers),
            fields: Vec::new(),
            body,
        })
    }

    fn service_token(&self) -> &str {
        &self.token
    }
}

/// A `200 OK` with a JSON body.
pub(crate) fn json(value: serde_json::Value) -> HttpResponse {
    HttpResponse::new(200, value.to_string())
}
