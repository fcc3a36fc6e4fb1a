//! PIX and crypto charges and their status

use super::{fetch_data, Endpoint, RejectionText};
use crate::config::GatewayConfig;
use crate::envelope::decode_data;
use crate::error::Operation;
use crate::http::HttpMethod;
use crate::responses::{CryptoPaymentResponse, PaymentStatus, PixPaymentResponse};
use crate::types::{Amount, Client};
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const CREATE_PAYMENT: Endpoint<'static> = Endpoint {
    operation: Operation::CreatePayment,
    path: "transaction",
    method: HttpMethod::Post,
    failure: "The request to create the payment failed",
    rejection: "Blackoin returned a failure while processing the payment",
    rejection_text: RejectionText::Message,
};

const PAYMENT_STATUS: Endpoint<'static> = Endpoint {
    operation: Operation::PaymentStatus,
    path: "transaction/status",
    method: HttpMethod::Post,
    failure: "The request to fetch the payment status failed",
    rejection: "Blackoin returned an error for the payment status",
    rejection_text: RejectionText::Error,
};

/// Charge data common to every payment method
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    amount: Amount,
    /// Hash returned by the payment-methods listing
    payment_method: String,
    client: Client,
}

impl Payment {
    /// Fails with [`InvalidAmount`](crate::BlackoinError::InvalidAmount) for
    /// zero or negative amounts
    pub fn new(amount: i64, payment_method: impl Into<String>, client: Client) -> Result<Self> {
        Ok(Self {
            amount: Amount::new(amount)?,
            payment_method: payment_method.into(),
            client,
        })
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

/// A payment method: how its charge is encoded and how the API's `data`
/// object maps back to a typed result.
pub trait PaymentVariant {
    type Response: DeserializeOwned;

    fn payment(&self) -> &Payment;

    fn request_body(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.payment())?)
    }

    fn map_response(data: Value) -> Result<Self::Response> {
        decode_data(Operation::CreatePayment, data)
    }
}

/// Charge paid through PIX
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixPayment {
    payment: Payment,
}

impl PixPayment {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }

    pub async fn create(&self, config: &GatewayConfig) -> Result<PixPaymentResponse> {
        create_payment(config, self).await
    }
}

impl PaymentVariant for PixPayment {
    type Response = PixPaymentResponse;

    fn payment(&self) -> &Payment {
        &self.payment
    }
}

/// Charge paid to a crypto deposit address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoPayment {
    payment: Payment,
}

impl CryptoPayment {
    pub fn new(payment: Payment) -> Self {
        Self { payment }
    }

    pub async fn create(&self, config: &GatewayConfig) -> Result<CryptoPaymentResponse> {
        create_payment(config, self).await
    }
}

impl PaymentVariant for CryptoPayment {
    type Response = CryptoPaymentResponse;

    fn payment(&self) -> &Payment {
        &self.payment
    }
}

/// Create a charge with `POST transaction`
#[tracing::instrument(skip_all, fields(amount = variant.payment().amount().cents()))]
pub async fn create_payment<V: PaymentVariant>(
    config: &GatewayConfig,
    variant: &V,
) -> Result<V::Response> {
    let body = variant.request_body()?;
    let data = fetch_data(config, &CREATE_PAYMENT, &body).await?;
    V::map_response(data)
}

/// Look up a charge by its reference code with `POST transaction/status`
#[tracing::instrument(skip(config))]
pub async fn payment_status(config: &GatewayConfig, txid: &str) -> Result<PaymentStatus> {
    let body = serde_json::json!({ "reference_code": txid });
    let data = fetch_data(config, &PAYMENT_STATUS, &body).await?;
    decode_data(PAYMENT_STATUS.operation, data)
}
