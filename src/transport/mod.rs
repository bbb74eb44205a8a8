//! Authenticated REST transport with automatic pagination.
//!
//! The client never depends on a fixed schema: request bodies are generic
//! JSON documents and responses are decoded into either a single
//! [`serde_json::Value`] record or a list of records. Backends convert those
//! records into their own typed models.

pub mod error;
pub mod link;

use std::collections::HashSet;
use std::time::Duration;

use http::HeaderMap;
use http::header::HeaderName;
use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::Value;

pub use error::TransportError;
pub use link::next_link;

/// Default timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials attached to every request.
///
/// HTTP basic credentials are always sent. Backends that authenticate with a
/// personal access token header additionally receive the secret under that
/// header name.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: String,
    secret: String,
    token_header: Option<HeaderName>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .field("token_header", &self.token_header)
            .finish()
    }
}

impl Credentials {
    /// Creates basic credentials.
    #[must_use]
    pub fn basic(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
            token_header: None,
        }
    }

    /// Also sends the secret under the given token header.
    #[must_use]
    pub fn with_token_header(mut self, header: HeaderName) -> Self {
        self.token_header = Some(header);
        self
    }

    /// Returns the user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }
}

/// Options used when building the underlying HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound for a single request, including reading the body.
    pub timeout: Duration,
    /// Accepts self-signed TLS certificates (internal CI servers).
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

/// Raw response returned by [`RestClient::request`].
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code (always 200 or 201).
    pub status: u16,
    /// Undecoded response body.
    pub body: String,
    /// Response headers.
    pub headers: HeaderMap,
}

/// Blocking REST client bound to one API base URL.
#[derive(Debug, Clone)]
pub struct RestClient {
    base_url: String,
    credentials: Credentials,
    client: Client,
}

impl RestClient {
    /// Creates a client for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] when the HTTP client cannot be
    /// configured.
    pub fn new(
        base_url: impl Into<String>,
        credentials: Credentials,
        options: ClientOptions,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .user_agent(concat!("git-pr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| TransportError::Client {
                message: error.to_string(),
            })?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            credentials,
            client,
        })
    }

    /// Returns the API base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the configured credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Joins an API path onto the base URL.
    ///
    /// Absolute URLs are returned unchanged so continuation links can be
    /// passed straight through.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issues one request and returns the undecoded response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] when the status is not 200 or 201
    /// and [`TransportError::Network`] when no response was received.
    pub fn request(
        &self,
        method: Method,
        url: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(method.clone(), url)
            .basic_auth(&self.credentials.user, Some(&self.credentials.secret));

        if let Some(header) = &self.credentials.token_header {
            builder = builder.header(header.clone(), &self.credentials.secret);
        }
        if let Some(pairs) = query {
            builder = builder.query(pairs);
        }
        if let Some(document) = body {
            builder = builder.json(document);
        }

        tracing::debug!(%method, url, body = ?body, "rest request");

        let response = builder.send().map_err(|error| TransportError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().map_err(|error| TransportError::Network {
            url: url.to_owned(),
            message: format!("failed to read response body: {error}"),
        })?;

        tracing::debug!(
            %method,
            url,
            status = status.as_u16(),
            link = ?headers.get(http::header::LINK),
            "rest response"
        );

        if !matches!(status.as_u16(), 200 | 201) {
            return Err(TransportError::Status {
                method: method.to_string(),
                url: url.to_owned(),
                status: status.as_u16(),
                status_line: status.to_string(),
                body: text,
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body: text,
            headers,
        })
    }

    /// Issues one request and decodes the body as a single record.
    ///
    /// An empty body decodes to [`Value::Null`].
    ///
    /// # Errors
    ///
    /// Propagates [`RestClient::request`] failures and returns
    /// [`TransportError::Decode`] when the body is not valid JSON.
    pub fn execute(
        &self,
        method: Method,
        url: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let response = self.request(method, url, query, body)?;
        decode_document(url, &response.body)
    }

    /// Issues a request and follows `rel="next"` links, concatenating every
    /// page's records in page order.
    ///
    /// The query is only applied to the first request; continuation links
    /// already carry their own query strings.
    ///
    /// # Errors
    ///
    /// Propagates request failures and returns [`TransportError::Decode`]
    /// when a page is not a JSON array or a `next` link repeats a page.
    pub fn fetch_all(
        &self,
        method: Method,
        url: &str,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Vec<Value>, TransportError> {
        let mut records = Vec::new();
        let mut visited = HashSet::from([url.to_owned()]);
        let mut next = Some(url.to_owned());
        let mut page_query = query;

        while let Some(page_url) = next.take() {
            let response = self.request(method.clone(), &page_url, page_query.take(), None)?;
            match decode_document(&page_url, &response.body)? {
                Value::Array(items) => records.extend(items),
                Value::Null => {}
                other => {
                    return Err(TransportError::Decode {
                        url: page_url,
                        message: format!("expected a list of records, got {}", kind_of(&other)),
                    });
                }
            }
            next = unvisited(&mut visited, next_link(&response.headers))?;
        }

        Ok(records)
    }

    /// Issues a GET and follows a `next` URL carried inside the response
    /// body, concatenating each page's `values` array.
    ///
    /// This is the pagination style used by the Bitbucket 2.0 API.
    ///
    /// # Errors
    ///
    /// Propagates request failures and returns [`TransportError::Decode`]
    /// when a page has no `values` array or its `next` URL repeats a page.
    pub fn fetch_values(
        &self,
        url: &str,
        query: Option<&[(&str, &str)]>,
    ) -> Result<Vec<Value>, TransportError> {
        let mut records = Vec::new();
        let mut visited = HashSet::from([url.to_owned()]);
        let mut next = Some(url.to_owned());
        let mut page_query = query;

        while let Some(page_url) = next.take() {
            let page = self.execute(Method::GET, &page_url, page_query.take(), None)?;
            let Some(values) = page.get("values").and_then(Value::as_array) else {
                return Err(TransportError::Decode {
                    url: page_url,
                    message: "page has no `values` array".to_owned(),
                });
            };
            records.extend(values.iter().cloned());
            let link = page.get("next").and_then(Value::as_str).map(ToOwned::to_owned);
            next = unvisited(&mut visited, link)?;
        }

        Ok(records)
    }
}

/// Passes `link` through unless it names a page already fetched.
fn unvisited(
    visited: &mut HashSet<String>,
    link: Option<String>,
) -> Result<Option<String>, TransportError> {
    match link {
        Some(target) if !visited.insert(target.clone()) => Err(TransportError::Decode {
            url: target,
            message: "pagination link points back to a page already fetched".to_owned(),
        }),
        other => Ok(other),
    }
}

fn decode_document(url: &str, body: &str) -> Result<Value, TransportError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|error| TransportError::Decode {
        url: url.to_owned(),
        message: error.to_string(),
    })
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
