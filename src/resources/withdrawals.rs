//! PIX and crypto withdraws and their status

use super::{fetch_data, Endpoint, RejectionText};
use crate::config::GatewayConfig;
use crate::envelope::decode_data;
use crate::error::Operation;
use crate::http::HttpMethod;
use crate::responses::{WithdrawResponse, WithdrawStatus};
use crate::types::{Client, Receiver};
use crate::Result;
use serde_json::{json, Value};

const WITHDRAW_STATUS: Endpoint<'static> = Endpoint {
    operation: Operation::WithdrawStatus,
    path: "withdraw/status",
    method: HttpMethod::Post,
    failure: "The request to fetch the withdraw status failed",
    rejection: "Blackoin returned an error for the withdraw status",
    rejection_text: RejectionText::Error,
};

/// Withdraw data common to every destination kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Withdraw {
    /// Amount in cents
    pub amount: i64,
    pub client: Client,
    pub receiver: Receiver,
    /// Hash returned by the payment-methods listing
    pub payment_method_hash: String,
}

impl Withdraw {
    pub fn new(
        amount: i64,
        client: Client,
        receiver: Receiver,
        payment_method_hash: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            client,
            receiver,
            payment_method_hash: payment_method_hash.into(),
        }
    }

    fn receiver_body(&self) -> Value {
        json!({
            "identifier": self.client.identifier,
            "document": self.client.document,
            "name": self.client.name,
            "email": self.client.email,
            "document_type": self.receiver.document_type,
            "document_number": self.receiver.document_number,
        })
    }
}

/// Where withdrawn funds are sent
pub trait WithdrawVariant {
    /// Human-readable destination kind used in error messages
    const KIND: &'static str;

    fn withdraw(&self) -> &Withdraw;

    /// Body key and value describing the destination
    fn destination(&self) -> (&'static str, Value);

    fn request_body(&self) -> Value {
        let withdraw = self.withdraw();
        let (key, destination) = self.destination();

        let mut body = json!({
            "amount": withdraw.amount,
            "hash": withdraw.payment_method_hash,
            "receiver": withdraw.receiver_body(),
        });
        body[key] = destination;
        body
    }

    fn map_response(data: Value) -> Result<WithdrawResponse> {
        decode_data(Operation::CreateWithdraw, data)
    }
}

/// Withdraw to a PIX key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixWithdraw {
    withdraw: Withdraw,
    /// PIX key type, e.g. `cpf`, `email`, `phone`, `random`
    key: String,
    /// PIX key itself
    value: String,
}

impl PixWithdraw {
    pub fn new(withdraw: Withdraw, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            withdraw,
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub async fn create(&self, config: &GatewayConfig) -> Result<WithdrawResponse> {
        create_withdraw(config, self).await
    }
}

impl WithdrawVariant for PixWithdraw {
    const KIND: &'static str = "pix";

    fn withdraw(&self) -> &Withdraw {
        &self.withdraw
    }

    fn destination(&self) -> (&'static str, Value) {
        ("dict", json!({ "key": self.key, "value": self.value }))
    }
}

/// Withdraw to a crypto wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CryptoWithdraw {
    withdraw: Withdraw,
    wallet_address: String,
    /// Currency ticker, e.g. `BTC`, `USDT`
    currency: String,
}

impl CryptoWithdraw {
    pub fn new(
        withdraw: Withdraw,
        wallet_address: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            withdraw,
            wallet_address: wallet_address.into(),
            currency: currency.into(),
        }
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub async fn create(&self, config: &GatewayConfig) -> Result<WithdrawResponse> {
        create_withdraw(config, self).await
    }
}

impl WithdrawVariant for CryptoWithdraw {
    const KIND: &'static str = "crypto";

    fn withdraw(&self) -> &Withdraw {
        &self.withdraw
    }

    fn destination(&self) -> (&'static str, Value) {
        (
            "crypto",
            json!({ "wallet_address": self.wallet_address, "currency": self.currency }),
        )
    }
}

/// Request a withdraw with `POST withdraw`
#[tracing::instrument(skip_all, fields(kind = V::KIND, amount = variant.withdraw().amount))]
pub async fn create_withdraw<V: WithdrawVariant>(
    config: &GatewayConfig,
    variant: &V,
) -> Result<WithdrawResponse> {
    let failure = format!("The request to create the {} withdraw failed", V::KIND);
    let rejection = format!(
        "Blackoin returned a failure while processing the {} withdraw",
        V::KIND
    );
    let endpoint = Endpoint {
        operation: Operation::CreateWithdraw,
        path: "withdraw",
        method: HttpMethod::Post,
        failure: &failure,
        rejection: &rejection,
        rejection_text: RejectionText::Error,
    };

    let data = fetch_data(config, &endpoint, &variant.request_body()).await?;
    V::map_response(data)
}

/// Look up a withdraw by its reference code with `POST withdraw/status`
#[tracing::instrument(skip(config))]
pub async fn withdraw_status(config: &GatewayConfig, txid: &str) -> Result<WithdrawStatus> {
    let body = json!({ "reference_code": txid });
    let data = fetch_data(config, &WITHDRAW_STATUS, &body).await?;
    decode_data(WITHDRAW_STATUS.operation, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdraw() -> Withdraw {
        Withdraw::new(
            5000,
            Client::new()
                .with_identifier("cust-7")
                .with_name("João")
                .with_email("joao@example.com")
                .with_document("12345678901"),
            Receiver::new("cpf", "12345678901"),
            "withdraw-hash",
        )
    }

    #[test]
    fn test_pix_withdraw_body() {
        let pix = PixWithdraw::new(withdraw(), "email", "joao@example.com");
        assert_eq!(
            pix.request_body(),
            json!({
                "amount": 5000,
                "hash": "withdraw-hash",
                "receiver": {
                    "identifier": "cust-7",
                    "document": "12345678901",
                    "name": "João",
                    "email": "joao@example.com",
                    "document_type": "cpf",
                    "document_number": "12345678901"
                },
                "dict": { "key": "email", "value": "joao@example.com" }
            })
        );
    }

    #[test]
    fn test_crypto_withdraw_body() {
        let crypto = CryptoWithdraw::new(withdraw(), "0xabc", "USDT");
        let body = crypto.request_body();

        assert_eq!(
            body["crypto"],
            json!({ "wallet_address": "0xabc", "currency": "USDT" })
        );
        assert!(body.get("dict").is_none());
        assert_eq!(body["receiver"]["document_type"], "cpf");
    }

    #[test]
    fn test_withdraw_response_mapping() {
        let response = PixWithdraw::map_response(json!({"identifier": "wd-1"})).unwrap();
        assert_eq!(response.identifier, "wd-1");
    }
}
