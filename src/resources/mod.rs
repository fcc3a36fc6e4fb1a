//! Endpoint-specific operations built on [`RequestExecutor`]

pub mod auth;
pub mod payments;
pub mod settings;
pub mod withdrawals;

use crate::config::GatewayConfig;
use crate::envelope::Envelope;
use crate::error::Operation;
use crate::http::HttpMethod;
use crate::request::{RequestExecutor, SUCCESS_STATUS};
use crate::{BlackoinError, Result};
use serde::Serialize;
use serde_json::Value;

/// One API endpoint together with the context attached to its errors
#[derive(Debug, Clone, Copy)]
pub(crate) struct Endpoint<'a> {
    pub operation: Operation,
    pub path: &'a str,
    pub method: HttpMethod,
    /// Message for non-200 responses
    pub failure: &'a str,
    /// Message for envelopes flagged `success: false`
    pub rejection: &'a str,
    /// Envelope field carried as the raw error of a rejection
    pub rejection_text: RejectionText,
}

/// Which envelope text a `success: false` rejection reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectionText {
    /// `message`, else the `error` > sentinel chain
    Message,
    /// `error`, else `message`, else the sentinel
    Error,
}

/// Send `body` and return the decoded envelope of a 200 response.
///
/// Any other status becomes [`BlackoinError::RequestFailed`] carrying the
/// response's error text.
pub(crate) async fn fetch_envelope<B: Serialize + ?Sized>(
    config: &GatewayConfig,
    endpoint: &Endpoint<'_>,
    body: &B,
) -> Result<Envelope> {
    let mut executor = RequestExecutor::new(config);
    executor.send(endpoint.path, endpoint.method, body).await?;

    if !executor.is_successful()? {
        let status_code = executor.status_code()?.unwrap_or_default();
        let raw_error = executor.error()?;
        tracing::warn!(
            operation = %endpoint.operation,
            status_code,
            error = %raw_error,
            "Blackoin request failed"
        );
        return Err(BlackoinError::request_failed(
            endpoint.operation,
            endpoint.failure,
            raw_error,
            status_code,
        ));
    }

    Ok(Envelope::from_payload(executor.response_payload()?))
}

/// Send `body` and return the envelope's `data` once both the status code and
/// the `success` flag report success.
pub(crate) async fn fetch_data<B: Serialize + ?Sized>(
    config: &GatewayConfig,
    endpoint: &Endpoint<'_>,
    body: &B,
) -> Result<Value> {
    let envelope = fetch_envelope(config, endpoint, body).await?;
    reject_if_flagged(endpoint, &envelope)?;

    envelope
        .into_data()
        .ok_or_else(|| BlackoinError::malformed(endpoint.operation, "response has no data field"))
}

fn reject_if_flagged(endpoint: &Endpoint<'_>, envelope: &Envelope) -> Result<()> {
    if envelope.is_rejected() {
        let raw_error = match endpoint.rejection_text {
            RejectionText::Message => envelope
                .message()
                .unwrap_or_else(|| envelope.error_text()),
            RejectionText::Error => envelope.error_text(),
        };
        tracing::warn!(
            operation = %endpoint.operation,
            error = %raw_error,
            "Blackoin rejected the request"
        );
        return Err(BlackoinError::upstream_rejected(
            endpoint.operation,
            endpoint.rejection,
            raw_error,
            SUCCESS_STATUS,
        ));
    }
    Ok(())
}
