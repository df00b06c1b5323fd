//! Digest-authenticated HTTP client.
//!
//! Wraps GET/POST/PUT against a document server's management and REST APIs,
//! answering 401 digest challenges transparently with a bounded retry cycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use reqwest::header::{self, HeaderMap};
use reqwest::{Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::credentials::CredentialProvider;
use crate::digest::{self, DigestChallenge};
use crate::error::{Result, TransportError};

/// Re-authentication attempts allowed after the initial unauthenticated
/// request; a fifth consecutive 401 is never answered.
const MAX_AUTH_RETRIES: u32 = 3;

/// Routing information for one server API: a base URL plus standing headers
/// attached to every request sent through it.
#[derive(Debug, Clone)]
pub struct RequestParams {
    base_url: Url,
    headers: Vec<(String, String)>,
}

impl RequestParams {
    /// Create routing params from a base URL such as
    /// `http://localhost:8001/admin/v1`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            headers: Vec::new(),
        })
    }

    /// Attach a standing header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a server path against the base URL.
    ///
    /// Paths are appended rather than joined so a base of
    /// `http://host:8002/manage/v2` keeps its prefix for `/databases`.
    fn resolve(&self, path: &str) -> Result<Url> {
        let mut base = self.base_url.to_string();
        while base.ends_with('/') {
            base.pop();
        }
        Ok(Url::parse(&format!("{base}{path}"))?)
    }
}

/// Payload for POST and PUT requests.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(serde_json::Value),

    /// Raw bytes under an explicit content type, passed through untouched.
    Raw {
        content: Vec<u8>,
        content_type: String,
    },

    /// No payload. POST and PUT announce an empty form-urlencoded body.
    Empty,
}

/// Response payload, decoded according to the announced content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed from an `application/json` response.
    Json(serde_json::Value),

    /// Any other content, byte for byte.
    Bytes(Vec<u8>),
}

/// A fully read server response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: StatusCode,

    /// Response headers.
    pub headers: HeaderMap,

    /// Decoded body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// The body as text, whatever shape it arrived in.
    pub fn text(&self) -> String {
        match &self.body {
            ResponseBody::Json(value) => value.to_string(),
            ResponseBody::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// The parsed JSON body, if the server sent one.
    pub fn json(&self) -> Option<&serde_json::Value> {
        match &self.body {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Bytes(_) => None,
        }
    }
}

/// HTTP client that answers digest challenges transparently.
///
/// Cloning is cheap: clones share the underlying connection pool, the
/// credential provider, and the nonce-count sequence, so `nc` stays
/// monotonic even across concurrent callers.
#[derive(Clone)]
pub struct DigestClient {
    http: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
    nonce_count: Arc<AtomicU32>,
}

impl DigestClient {
    /// Create a client around a credential provider.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            nonce_count: Arc::new(AtomicU32::new(1)),
        }
    }

    /// Swap in a pre-configured reqwest client (timeouts, proxies, TLS).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// GET a server path.
    pub async fn get(&self, params: &RequestParams, path: &str) -> Result<HttpResponse> {
        self.request(Method::GET, params, path, RequestBody::Empty).await
    }

    /// POST a payload to a server path.
    pub async fn post(
        &self,
        params: &RequestParams,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse> {
        self.request(Method::POST, params, path, body).await
    }

    /// PUT a payload to a server path.
    pub async fn put(
        &self,
        params: &RequestParams,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse> {
        self.request(Method::PUT, params, path, body).await
    }

    /// Dispatch one request, answering digest challenges as they arrive.
    ///
    /// The first attempt carries no `Authorization` header. Each 401 is
    /// answered by recomputing the digest against that response's own
    /// challenge, since server nonces are scoped to a single challenge. A
    /// fresh client nonce and the next nonce-count are drawn per attempt.
    async fn request(
        &self,
        method: Method,
        params: &RequestParams,
        path: &str,
        body: RequestBody,
    ) -> Result<HttpResponse> {
        let url = params.resolve(path)?;
        let digest_uri = digest_uri(&url);

        let mut authorization: Option<String> = None;
        let mut retries = 0;
        loop {
            let request =
                self.build_request(&method, &url, params, &body, authorization.as_deref())?;
            let response = self.http.execute(request).await?;
            if response.status() != StatusCode::UNAUTHORIZED {
                debug!("{method} {url} -> {}", response.status());
                return read_response(response).await;
            }
            if retries == MAX_AUTH_RETRIES {
                return Err(TransportError::AuthExhausted {
                    url: url.to_string(),
                    attempts: retries,
                });
            }
            retries += 1;

            let challenge = DigestChallenge::parse(challenge_header(response.headers())?)?;
            debug!(
                "Digest challenge from {url} (realm \"{}\"), attempt {retries}",
                challenge.realm
            );
            let password = self.credentials.password().await?;
            let nc = self.nonce_count.fetch_add(1, Ordering::Relaxed);
            authorization = Some(challenge.authorization(
                self.credentials.username(),
                &password,
                method.as_str(),
                &digest_uri,
                nc,
                &digest::cnonce(),
            ));
        }
    }

    fn build_request(
        &self,
        method: &Method,
        url: &Url,
        params: &RequestParams,
        body: &RequestBody,
        authorization: Option<&str>,
    ) -> Result<reqwest::Request> {
        let mut builder = self.http.request(method.clone(), url.clone());

        let mut has_accept = false;
        for (name, value) in &params.headers {
            has_accept = has_accept || name.eq_ignore_ascii_case("accept");
            builder = builder.header(name, value);
        }
        if !has_accept {
            builder = builder.header(header::ACCEPT, "application/json");
        }

        builder = match body {
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Raw {
                content,
                content_type,
            } => builder
                .header(header::CONTENT_TYPE, content_type)
                .body(content.clone()),
            RequestBody::Empty => {
                if *method == Method::POST || *method == Method::PUT {
                    builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                } else {
                    builder
                }
            }
        };

        if let Some(authorization) = authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        Ok(builder.build()?)
    }
}

/// The `uri` digest attribute: path plus query of the resolved URL.
fn digest_uri(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn challenge_header(headers: &HeaderMap) -> Result<&str> {
    headers
        .get(header::WWW_AUTHENTICATE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            TransportError::Protocol("401 response without a WWW-Authenticate header".to_string())
        })
}

async fn read_response(response: reqwest::Response) -> Result<HttpResponse> {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.bytes().await?;

    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    let body = if is_json && !bytes.is_empty() {
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Protocol(format!("invalid json in response body: {e}")))?;
        ResponseBody::Json(value)
    } else {
        ResponseBody::Bytes(bytes.to_vec())
    };
    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
