//! HTTP request builder: headers, transport options and payload for one call

mod finite;
mod transport;

pub use transport::{RawResponse, ReqwestTransport, ResponseInfo, Transport, UnboundTransport};

use crate::{BlackoinError, Result};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP methods accepted by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the serialized payload travels as the request body
    pub fn sends_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl FromStr for HttpMethod {
    type Err = BlackoinError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "DELETE" => Ok(Self::Delete),
            other => Err(BlackoinError::UnsupportedMethod {
                method: other.to_string(),
            }),
        }
    }
}

impl AsRef<str> for HttpMethod {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Transport option names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RequestOption {
    /// Full request URL
    Url,
    /// Follow `Location` redirects
    FollowRedirects,
    /// Total request timeout
    Timeout,
    /// Connection establishment timeout
    ConnectTimeout,
    /// Explicit request method
    Method,
    /// `User-Agent` header value
    UserAgent,
    /// Request body
    Body,
    /// Verify the peer's TLS certificate
    VerifyPeer,
    /// Verify the certificate matches the host name
    VerifyHost,
}

/// Transport option value
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Text(String),
    Flag(bool),
    Duration(Duration),
    Method(HttpMethod),
}

impl OptionValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::Duration(duration) => Some(*duration),
            _ => None,
        }
    }

    pub fn as_method(&self) -> Option<HttpMethod> {
        match self {
            Self::Method(method) => Some(*method),
            _ => None,
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<Duration> for OptionValue {
    fn from(value: Duration) -> Self {
        Self::Duration(value)
    }
}

impl From<HttpMethod> for OptionValue {
    fn from(value: HttpMethod) -> Self {
        Self::Method(value)
    }
}

/// Transport options keyed by name
pub type RequestOptions = BTreeMap<RequestOption, OptionValue>;

/// Accumulates the headers, options and payload of a single request and hands
/// them to a [`Transport`].
///
/// `add_*` calls insert or replace one entry; `set_*` calls replace the whole
/// collection.
#[derive(Debug)]
pub struct HttpRequest<T = ReqwestTransport> {
    headers: HeaderMap,
    options: RequestOptions,
    payload: String,
    transport: T,
}

impl HttpRequest<ReqwestTransport> {
    /// Create a request bound to the reqwest transport
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for HttpRequest<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpRequest<UnboundTransport> {
    /// Create a request with no transport; `execute` and `close` fail
    pub fn unbound() -> Self {
        Self::with_transport(UnboundTransport)
    }
}

impl<T: Transport> HttpRequest<T> {
    /// Create a request bound to `transport`
    pub fn with_transport(transport: T) -> Self {
        Self {
            headers: HeaderMap::new(),
            options: RequestOptions::new(),
            payload: String::new(),
            transport,
        }
    }

    /// Insert one header, replacing any previous value under the same name
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| BlackoinError::invalid_header(format!("{name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| BlackoinError::invalid_header(format!("{name}: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Insert one option, replacing any previous value under the same name
    pub fn add_option(&mut self, name: RequestOption, value: impl Into<OptionValue>) -> &mut Self {
        self.options.insert(name, value.into());
        self
    }

    /// Replace every header
    pub fn set_headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.headers = headers;
        self
    }

    /// Replace every option
    pub fn set_options(&mut self, options: RequestOptions) -> &mut Self {
        self.options = options;
        self
    }

    /// Set the request payload.
    ///
    /// A value that serializes to a JSON string is stored verbatim; anything
    /// else is stored as its JSON encoding. Non-finite floats fail with
    /// [`BlackoinError::Serialization`].
    pub fn set_payload<P: Serialize + ?Sized>(&mut self, payload: &P) -> Result<&mut Self> {
        finite::ensure_finite(payload)?;
        self.payload = match serde_json::to_value(payload)? {
            Value::String(text) => text,
            value => serde_json::to_string(&value)?,
        };
        Ok(self)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn option(&self, name: RequestOption) -> Option<&OptionValue> {
        self.options.get(&name)
    }

    /// Serialized payload
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Run the request on the bound transport
    pub async fn execute(&mut self) -> Result<RawResponse> {
        self.transport.execute(&self.headers, &self.options).await
    }

    /// Release the bound transport
    pub fn close(&mut self) -> Result<()> {
        self.transport.close()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
