use super::{HttpMethod, OptionValue, RequestOption, RequestOptions};
use crate::{BlackoinError, Result};
use async_trait::async_trait;
use http::header::{HeaderMap, LOCATION};
use reqwest::redirect::Policy;
use std::time::{Duration, Instant};

/// Redirect hop limit when [`RequestOption::FollowRedirects`] is enabled
const MAX_REDIRECTS: usize = 10;

/// Transfer statistics captured once per executed request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseInfo {
    /// Status code; `None` when no response arrived
    pub http_code: Option<u16>,
    pub total_time: Duration,
    pub effective_url: String,
    pub content_length: Option<u64>,
    /// DNS resolution time, when the transport reports it
    pub namelookup_time: Option<Duration>,
    /// Connection setup time, when the transport reports it
    pub connect_time: Option<Duration>,
    /// Time until the response headers arrived
    pub starttransfer_time: Option<Duration>,
    /// Size of the status line and headers as received
    pub header_size: usize,
    pub redirect_count: u32,
    /// `Location` target of a redirect that was not followed
    pub redirect_url: Option<String>,
}

impl ResponseInfo {
    /// Statistics for a request that never produced a response
    pub fn unanswered(effective_url: impl Into<String>, total_time: Duration) -> Self {
        Self {
            effective_url: effective_url.into(),
            total_time,
            ..Self::default()
        }
    }
}

/// Body and statistics returned by a transport
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub body: String,
    pub info: ResponseInfo,
}

/// Executes a prepared request.
///
/// Implementations read their configuration from [`RequestOptions`] so the
/// request builder stays independent of the HTTP client in use.
#[async_trait]
pub trait Transport: Send {
    /// Perform the request once
    async fn execute(&mut self, headers: &HeaderMap, options: &RequestOptions)
        -> Result<RawResponse>;

    /// Release any resources held by the transport
    fn close(&mut self) -> Result<()>;
}

/// Transport placeholder for requests with no HTTP client bound
#[derive(Debug, Clone, Copy, Default)]
pub struct UnboundTransport;

#[async_trait]
impl Transport for UnboundTransport {
    async fn execute(
        &mut self,
        _headers: &HeaderMap,
        _options: &RequestOptions,
    ) -> Result<RawResponse> {
        Err(BlackoinError::NotImplemented {
            operation: "execute",
        })
    }

    fn close(&mut self) -> Result<()> {
        Err(BlackoinError::NotImplemented { operation: "close" })
    }
}

/// Transport backed by `reqwest`.
///
/// Timeouts, redirect policy, user agent and certificate verification are
/// client-level settings in reqwest, so a client is built from the options on
/// every execution and held until [`close`](Transport::close).
#[derive(Debug, Default)]
pub struct ReqwestTransport {
    client: Option<reqwest::Client>,
    closed: bool,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`close`](Transport::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn build_client(options: &RequestOptions) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();

        if let Some(timeout) = duration(options, RequestOption::Timeout) {
            builder = builder.timeout(timeout);
        }

        if let Some(timeout) = duration(options, RequestOption::ConnectTimeout) {
            builder = builder.connect_timeout(timeout);
        }

        builder = if flag(options, RequestOption::FollowRedirects).unwrap_or(false) {
            builder.redirect(Policy::limited(MAX_REDIRECTS))
        } else {
            builder.redirect(Policy::none())
        };

        if let Some(user_agent) = text(options, RequestOption::UserAgent) {
            builder = builder.user_agent(user_agent);
        }

        let verify_peer = flag(options, RequestOption::VerifyPeer).unwrap_or(true);
        let verify_host = flag(options, RequestOption::VerifyHost).unwrap_or(true);
        if !verify_peer || !verify_host {
            // rustls has no host-only switch: accepting invalid certificates
            // also skips the host name check
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &mut self,
        headers: &HeaderMap,
        options: &RequestOptions,
    ) -> Result<RawResponse> {
        if self.closed {
            return Err(BlackoinError::transport("transport has already been closed"));
        }

        let url = text(options, RequestOption::Url)
            .ok_or_else(|| BlackoinError::transport("request URL option is not set"))?;
        let method = options
            .get(&RequestOption::Method)
            .and_then(OptionValue::as_method)
            .unwrap_or(HttpMethod::Get);

        let client = Self::build_client(options)?;
        let mut request = client.request(method.into(), url).headers(headers.clone());
        if let Some(body) = text(options, RequestOption::Body) {
            request = request.body(body.to_owned());
        }
        self.client = Some(client);

        let started = Instant::now();
        let response = request.send().await?;
        let starttransfer_time = started.elapsed();

        let status = response.status();
        let effective_url = response.url().to_string();
        let content_length = response.content_length();
        let header_size = header_size(response.version(), status, response.headers());
        let redirect_url = if status.is_redirection() {
            response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        } else {
            None
        };

        let body = response
            .text()
            .await
            .map_err(|e| BlackoinError::ResponseBody {
                status_code: status.as_u16(),
                message: e.to_string(),
            })?;

        Ok(RawResponse {
            body,
            info: ResponseInfo {
                http_code: Some(status.as_u16()),
                total_time: started.elapsed(),
                effective_url,
                content_length,
                namelookup_time: None,
                connect_time: None,
                starttransfer_time: Some(starttransfer_time),
                header_size,
                redirect_count: 0,
                redirect_url,
            },
        })
    }

    fn close(&mut self) -> Result<()> {
        self.client = None;
        self.closed = true;
        Ok(())
    }
}

fn text(options: &RequestOptions, name: RequestOption) -> Option<&str> {
    options.get(&name).and_then(OptionValue::as_text)
}

fn flag(options: &RequestOptions, name: RequestOption) -> Option<bool> {
    options.get(&name).and_then(OptionValue::as_flag)
}

fn duration(options: &RequestOptions, name: RequestOption) -> Option<Duration> {
    options.get(&name).and_then(OptionValue::as_duration)
}

/// Bytes of `HTTP/x.y CODE REASON\r\n`, each `Name: value\r\n` and the final `\r\n`
fn header_size(version: reqwest::Version, status: reqwest::StatusCode, headers: &HeaderMap) -> usize {
    let status_line = format!(
        "{:?} {} {}\r\n",
        version,
        status.as_str(),
        status.canonical_reason().unwrap_or("")
    );
    let fields: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + 2 + value.as_bytes().len() + 2)
        .sum();
    status_line.len() + fields + 2
}
