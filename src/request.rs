//! Authenticated request execution and response classification

use crate::config::GatewayConfig;
use crate::envelope::Envelope;
use crate::http::{
    HttpMethod, HttpRequest, RawResponse, ReqwestTransport, RequestOption, RequestOptions,
    ResponseInfo, Transport,
};
use crate::mask;
use crate::{BlackoinError, Result};
use http::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

/// Total time allowed for one request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed to establish the connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = "BlackoinApiSdk/1.0";

/// The only status code treated as success
pub const SUCCESS_STATUS: u16 = 200;

#[derive(Debug)]
enum State {
    Unsent,
    Successful(RawResponse),
    Failed(RawResponse),
}

/// Turns one API call into an authenticated HTTP request and classifies the
/// outcome.
///
/// An executor is single-use: it moves from unsent to sent once, ending up
/// either successful (status exactly 200) or failed. Response accessors
/// return [`BlackoinError::NotInitialized`] before [`send`](Self::send).
#[derive(Debug)]
pub struct RequestExecutor<'a, T = ReqwestTransport> {
    config: &'a GatewayConfig,
    http_request: HttpRequest<T>,
    uri: Option<String>,
    state: State,
}

impl<'a> RequestExecutor<'a> {
    /// Create an executor using the reqwest transport
    pub fn new(config: &'a GatewayConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl<'a, T: Transport> RequestExecutor<'a, T> {
    /// Create an executor on a custom transport
    pub fn with_transport(config: &'a GatewayConfig, transport: T) -> Self {
        Self {
            config,
            http_request: HttpRequest::with_transport(transport),
            uri: None,
            state: State::Unsent,
        }
    }

    /// Send `body` to `path` relative to the configured base URL.
    ///
    /// Returns `Ok` whenever a response arrived, whatever its status; use
    /// [`is_successful`](Self::is_successful) to classify it. A transport
    /// failure marks the executor as failed and is returned as the error.
    pub async fn send<B: Serialize + ?Sized>(
        &mut self,
        path: &str,
        method: impl AsRef<str>,
        body: &B,
    ) -> Result<()> {
        if !matches!(self.state, State::Unsent) {
            return Err(BlackoinError::AlreadySent);
        }

        let method: HttpMethod = method.as_ref().parse()?;
        let uri = format!("{}{}", self.config.base_url(), path);

        let headers = self.build_request_headers()?;
        self.http_request.set_headers(headers);
        self.http_request.set_payload(body)?;

        let options = self.build_request_options(&uri, method);
        self.http_request.set_options(options);

        tracing::debug!(
            %method,
            %uri,
            payload = %masked_payload(self.http_request.payload()),
            "Blackoin API request"
        );
        self.uri = Some(uri);

        self.execute().await
    }

    async fn execute(&mut self) -> Result<()> {
        let started = Instant::now();
        let outcome = {
            let mut request = CloseOnDrop(&mut self.http_request);
            request.execute().await
        };

        match outcome {
            Ok(response) => {
                let status = response.info.http_code;
                tracing::debug!(
                    status = ?status,
                    elapsed_ms = response.info.total_time.as_millis() as u64,
                    "Blackoin API response"
                );

                self.state = if status == Some(SUCCESS_STATUS) {
                    State::Successful(response)
                } else {
                    tracing::warn!(status = ?status, "Blackoin API returned a non-success status");
                    State::Failed(response)
                };
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Blackoin API request did not complete: {e}");
                let uri = self.uri.clone().unwrap_or_default();
                let mut info = ResponseInfo::unanswered(uri, started.elapsed());
                // Status line arrived before the body read failed
                if let BlackoinError::ResponseBody { status_code, .. } = &e {
                    info.http_code = Some(*status_code);
                }
                self.state = State::Failed(RawResponse {
                    body: String::new(),
                    info,
                });
                Err(e)
            }
        }
    }

    fn response(&self) -> Result<&RawResponse> {
        match &self.state {
            State::Unsent => Err(BlackoinError::NotInitialized),
            State::Successful(response) | State::Failed(response) => Ok(response),
        }
    }

    /// Whether the response status was exactly 200
    pub fn is_successful(&self) -> Result<bool> {
        match &self.state {
            State::Unsent => Err(BlackoinError::NotInitialized),
            State::Successful(_) => Ok(true),
            State::Failed(_) => Ok(false),
        }
    }

    /// Whether [`send`](Self::send) has run
    pub fn is_sent(&self) -> bool {
        !matches!(self.state, State::Unsent)
    }

    /// Status code of the response; `None` when the transport failed
    pub fn status_code(&self) -> Result<Option<u16>> {
        Ok(self.response()?.info.http_code)
    }

    /// Transfer statistics of the executed request
    pub fn response_info(&self) -> Result<&ResponseInfo> {
        Ok(&self.response()?.info)
    }

    /// Response body as received
    pub fn raw_response(&self) -> Result<&str> {
        Ok(&self.response()?.body)
    }

    /// Response body decoded as a JSON object; `None` when it is not one
    pub fn response_payload(&self) -> Result<Option<Value>> {
        let payload = serde_json::from_str::<Value>(&self.response()?.body).ok();
        Ok(payload.filter(Value::is_object))
    }

    /// Error text of the response: its `error` field, else its `message`
    /// field, else [`UNMAPPED_ERROR`](crate::error::UNMAPPED_ERROR)
    pub fn error(&self) -> Result<String> {
        Ok(Envelope::from_payload(self.response_payload()?).error_text())
    }

    /// Full URI of the request
    pub fn uri(&self) -> Result<&str> {
        self.uri.as_deref().ok_or(BlackoinError::NotInitialized)
    }

    /// Request state as handed to the transport
    pub fn http_request(&self) -> &HttpRequest<T> {
        &self.http_request
    }

    fn build_request_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = self.config.bearer_token().filter(|t| !t.is_empty()) {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| BlackoinError::invalid_header(format!("authorization: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    fn build_request_options(&self, uri: &str, method: HttpMethod) -> RequestOptions {
        let mut options = RequestOptions::new();
        options.insert(RequestOption::Url, uri.into());
        options.insert(RequestOption::FollowRedirects, false.into());
        options.insert(RequestOption::Timeout, REQUEST_TIMEOUT.into());
        options.insert(RequestOption::ConnectTimeout, CONNECT_TIMEOUT.into());
        options.insert(RequestOption::Method, method.into());
        options.insert(RequestOption::UserAgent, USER_AGENT.into());

        if method.sends_body() {
            options.insert(RequestOption::Body, self.http_request.payload().into());
        }

        // Staging runs on self-signed certificates
        if self.config.is_debug() {
            options.insert(RequestOption::VerifyPeer, false.into());
            options.insert(RequestOption::VerifyHost, false.into());
        }

        options
    }
}

/// Closes the transport when the execution scope ends, including when the
/// request future is dropped mid-flight.
struct CloseOnDrop<'r, T: Transport>(&'r mut HttpRequest<T>);

impl<T: Transport> Deref for CloseOnDrop<'_, T> {
    type Target = HttpRequest<T>;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<T: Transport> DerefMut for CloseOnDrop<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl<T: Transport> Drop for CloseOnDrop<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            tracing::debug!("Transport close failed: {e}");
        }
    }
}

fn masked_payload(payload: &str) -> String {
    match serde_json::from_str::<Value>(payload) {
        Ok(value) => mask::secure_value(&value).to_string(),
        Err(_) => format!("<{} bytes>", payload.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UNMAPPED_ERROR;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    /// What the fake transport saw on its last call
    #[derive(Debug, Default)]
    struct Seen {
        headers: Option<HeaderMap>,
        options: Option<RequestOptions>,
        executions: usize,
        closes: usize,
    }

    /// Transport returning a canned response, or failing when `status` is `None`
    #[derive(Debug)]
    struct FakeTransport {
        status: Option<u16>,
        body: String,
        seen: Arc<Mutex<Seen>>,
    }

    impl FakeTransport {
        fn new(status: Option<u16>, body: &str) -> (Self, Arc<Mutex<Seen>>) {
            let seen = Arc::new(Mutex::new(Seen::default()));
            let transport = Self {
                status,
                body: body.to_string(),
                seen: seen.clone(),
            };
            (transport, seen)
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(
            &mut self,
            headers: &HeaderMap,
            options: &RequestOptions,
        ) -> Result<RawResponse> {
            {
                let mut seen = self.seen.lock().unwrap();
                seen.headers = Some(headers.clone());
                seen.options = Some(options.clone());
                seen.executions += 1;
            }

            match self.status {
                Some(code) => Ok(RawResponse {
                    body: self.body.clone(),
                    info: ResponseInfo {
                        http_code: Some(code),
                        ..ResponseInfo::default()
                    },
                }),
                None => Err(BlackoinError::transport("connection refused")),
            }
        }

        fn close(&mut self) -> Result<()> {
            self.seen.lock().unwrap().closes += 1;
            Ok(())
        }
    }

    fn config() -> GatewayConfig {
        GatewayConfig::new()
    }

    #[tokio::test]
    async fn test_only_200_is_successful() {
        for code in [200u16, 201, 204, 301, 400, 401, 404, 422, 500, 503] {
            let config = config();
            let (transport, _) = FakeTransport::new(Some(code), "{}");
            let mut executor = RequestExecutor::with_transport(&config, transport);
            executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();

            assert_eq!(executor.is_successful().unwrap(), code == 200, "status {code}");
            assert_eq!(executor.status_code().unwrap(), Some(code));
        }
    }

    #[tokio::test]
    async fn test_transport_failure_is_failed_without_status() {
        let config = config();
        let (transport, seen) = FakeTransport::new(None, "");
        let mut executor = RequestExecutor::with_transport(&config, transport);

        let result = executor.send("token", "POST", &json!({})).await;
        assert!(matches!(result, Err(BlackoinError::TransportMessage { .. })));
        assert!(!executor.is_successful().unwrap());
        assert_eq!(executor.status_code().unwrap(), None);
        assert_eq!(executor.error().unwrap(), UNMAPPED_ERROR);
        assert_eq!(seen.lock().unwrap().closes, 1);
    }

    /// Transport whose status line arrives but whose body read fails
    #[derive(Debug)]
    struct TruncatedBody(u16);

    #[async_trait]
    impl Transport for TruncatedBody {
        async fn execute(&mut self, _: &HeaderMap, _: &RequestOptions) -> Result<RawResponse> {
            Err(BlackoinError::ResponseBody {
                status_code: self.0,
                message: "connection closed before message completed".to_string(),
            })
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_body_read_failure_keeps_status() {
        for code in [200u16, 500] {
            let config = config();
            let mut executor = RequestExecutor::with_transport(&config, TruncatedBody(code));

            let result = executor.send("token", HttpMethod::Post, &json!({})).await;
            assert!(matches!(result, Err(BlackoinError::ResponseBody { .. })));
            assert!(!executor.is_successful().unwrap());
            assert_eq!(executor.status_code().unwrap(), Some(code));
            assert_eq!(executor.response_info().unwrap().http_code, Some(code));
        }
    }

    #[tokio::test]
    async fn test_unsupported_method_is_rejected_before_io() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);

        let result = executor.send("token", "PATCH", &json!({})).await;
        assert!(matches!(
            result,
            Err(BlackoinError::UnsupportedMethod { ref method }) if method == "PATCH"
        ));
        assert_eq!(seen.lock().unwrap().executions, 0);
        assert!(!executor.is_sent());
    }

    #[tokio::test]
    async fn test_accessors_before_send_fail() {
        let config = config();
        let executor = RequestExecutor::new(&config);

        assert!(matches!(executor.is_successful(), Err(BlackoinError::NotInitialized)));
        assert!(matches!(executor.status_code(), Err(BlackoinError::NotInitialized)));
        assert!(matches!(executor.error(), Err(BlackoinError::NotInitialized)));
        assert!(matches!(executor.response_payload(), Err(BlackoinError::NotInitialized)));
        assert!(matches!(executor.uri(), Err(BlackoinError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_executor_is_single_use() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);

        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();
        let second = executor.send("token", HttpMethod::Post, &json!({})).await;

        assert!(matches!(second, Err(BlackoinError::AlreadySent)));
        assert_eq!(seen.lock().unwrap().executions, 1);
        assert_eq!(seen.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_headers_without_bearer() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();

        let seen = seen.lock().unwrap();
        let headers = seen.headers.as_ref().unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_empty_bearer_is_not_sent() {
        let config = config().with_bearer_token("");
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen.headers.as_ref().unwrap().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_bearer_header_is_attached() {
        let config = config().with_bearer_token("abc123");
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor
            .send("settings/payment-methods", HttpMethod::Get, &json!([]))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let headers = seen.headers.as_ref().unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer abc123");
        assert!(headers[AUTHORIZATION].is_sensitive());
    }

    #[tokio::test]
    async fn test_post_options() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor
            .send("transaction", HttpMethod::Post, &json!({"amount": 100}))
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        let options = seen.options.as_ref().unwrap();
        assert_eq!(
            options[&RequestOption::Url].as_text(),
            Some("https://app.blackoin.com/api/transaction")
        );
        assert_eq!(options[&RequestOption::FollowRedirects].as_flag(), Some(false));
        assert_eq!(options[&RequestOption::Timeout].as_duration(), Some(REQUEST_TIMEOUT));
        assert_eq!(
            options[&RequestOption::ConnectTimeout].as_duration(),
            Some(CONNECT_TIMEOUT)
        );
        assert_eq!(options[&RequestOption::Method].as_method(), Some(HttpMethod::Post));
        assert_eq!(options[&RequestOption::UserAgent].as_text(), Some(USER_AGENT));
        assert_eq!(options[&RequestOption::Body].as_text(), Some("{\"amount\":100}"));
        assert!(!options.contains_key(&RequestOption::VerifyPeer));
        assert!(!options.contains_key(&RequestOption::VerifyHost));
        drop(seen);

        assert_eq!(
            executor.uri().unwrap(),
            "https://app.blackoin.com/api/transaction"
        );
    }

    #[tokio::test]
    async fn test_get_and_delete_carry_no_body() {
        for method in [HttpMethod::Get, HttpMethod::Delete] {
            let config = config();
            let (transport, seen) = FakeTransport::new(Some(200), "{}");
            let mut executor = RequestExecutor::with_transport(&config, transport);
            executor.send("x", method, &json!({"a": 1})).await.unwrap();

            let seen = seen.lock().unwrap();
            assert!(!seen.options.as_ref().unwrap().contains_key(&RequestOption::Body));
        }
    }

    #[tokio::test]
    async fn test_put_carries_body() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("x", HttpMethod::Put, &json!({"a": 1})).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            seen.options.as_ref().unwrap()[&RequestOption::Body].as_text(),
            Some("{\"a\":1}")
        );
    }

    #[tokio::test]
    async fn test_debug_mode_uses_staging_and_skips_tls_verification() {
        let config = config().with_debug(true);
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();

        let seen = seen.lock().unwrap();
        let options = seen.options.as_ref().unwrap();
        assert_eq!(
            options[&RequestOption::Url].as_text(),
            Some("https://staging.blackoin.com/api/token")
        );
        assert_eq!(options[&RequestOption::VerifyPeer].as_flag(), Some(false));
        assert_eq!(options[&RequestOption::VerifyHost].as_flag(), Some(false));
    }

    async fn failed_with_body(body: &str) -> String {
        let config = config();
        let (transport, _) = FakeTransport::new(Some(400), body);
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();
        executor.error().unwrap()
    }

    #[tokio::test]
    async fn test_error_priority() {
        assert_eq!(failed_with_body(r#"{"error":"X"}"#).await, "X");
        assert_eq!(failed_with_body(r#"{"message":"Y"}"#).await, "Y");
        assert_eq!(failed_with_body(r#"{"error":"X","message":"Y"}"#).await, "X");
        assert_eq!(failed_with_body("{}").await, UNMAPPED_ERROR);
        assert_eq!(failed_with_body("<html>bad gateway</html>").await, UNMAPPED_ERROR);
        assert_eq!(failed_with_body("").await, UNMAPPED_ERROR);
    }

    #[tokio::test]
    async fn test_response_payload_only_decodes_objects() {
        let config = config();
        let (transport, _) = FakeTransport::new(Some(200), "[1,2,3]");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("x", HttpMethod::Get, &json!({})).await.unwrap();
        assert_eq!(executor.response_payload().unwrap(), None);
        assert_eq!(executor.raw_response().unwrap(), "[1,2,3]");

        let config = self::config();
        let (transport, _) = FakeTransport::new(Some(200), r#"{"success":true}"#);
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("x", HttpMethod::Get, &json!({})).await.unwrap();
        assert_eq!(
            executor.response_payload().unwrap(),
            Some(json!({"success": true}))
        );
    }

    #[tokio::test]
    async fn test_transport_is_closed_after_success() {
        let config = config();
        let (transport, seen) = FakeTransport::new(Some(200), "{}");
        let mut executor = RequestExecutor::with_transport(&config, transport);
        executor.send("token", HttpMethod::Post, &json!({})).await.unwrap();
        assert_eq!(seen.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_unbound_transport_is_not_implemented() {
        let config = config();
        let mut executor =
            RequestExecutor::with_transport(&config, crate::http::UnboundTransport);
        let result = executor.send("token", HttpMethod::Post, &json!({})).await;
        assert!(matches!(result, Err(BlackoinError::NotImplemented { .. })));
        assert!(!executor.is_successful().unwrap());
    }
}
