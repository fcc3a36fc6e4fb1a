//! Account settings: available payment methods

use super::{fetch_envelope, Endpoint, RejectionText};
use crate::config::GatewayConfig;
use crate::error::Operation;
use crate::http::HttpMethod;
use crate::request::SUCCESS_STATUS;
use crate::{BlackoinError, Result};
use serde_json::{json, Value};

/// Message the API returns when the bearer token is missing or expired
pub const UNAUTHENTICATED_MESSAGE: &str = "Unauthenticated.";

const PAYMENT_METHODS: Endpoint<'static> = Endpoint {
    operation: Operation::PaymentMethods,
    path: "settings/payment-methods",
    method: HttpMethod::Get,
    failure: "Could not fetch the payment methods, the request failed",
    rejection: "Failed to fetch the payment methods",
    rejection_text: RejectionText::Message,
};

/// List the payment methods enabled for the account.
///
/// Returns the envelope's `data` as-is, or an empty object when the API sends
/// none. Their hashes feed [`Payment::new`](super::payments::Payment::new) and
/// [`Withdraw::new`](super::withdrawals::Withdraw::new).
#[tracing::instrument(skip_all)]
pub async fn payment_methods(config: &GatewayConfig) -> Result<Value> {
    let envelope = fetch_envelope(config, &PAYMENT_METHODS, &json!([])).await?;

    if envelope.message().as_deref() == Some(UNAUTHENTICATED_MESSAGE) {
        tracing::warn!("Bearer token missing or expired");
        return Err(BlackoinError::Unauthenticated);
    }

    if envelope
        .field("success")
        .is_some_and(|flag| flag.as_bool() != Some(true))
    {
        return Err(BlackoinError::upstream_rejected(
            PAYMENT_METHODS.operation,
            PAYMENT_METHODS.rejection,
            envelope
                .message()
                .unwrap_or_else(|| PAYMENT_METHODS.rejection.to_string()),
            SUCCESS_STATUS,
        ));
    }

    Ok(envelope.into_data().unwrap_or_else(|| json!({})))
}
