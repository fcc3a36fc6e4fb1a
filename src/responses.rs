//! Typed results returned by the resource operations

use serde::{Deserialize, Serialize};

/// Token issued by `POST token`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    pub token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Created PIX charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixPaymentResponse {
    pub txid: String,
    pub status: String,
    /// PIX "copia e cola" code shown to the payer
    #[serde(rename = "pixCopiaECola")]
    pub pix_copia_e_cola: String,
}

/// Created crypto charge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoPaymentResponse {
    pub txid: String,
    /// Deposit address
    pub address: String,
    pub qrcode_url: String,
    pub status: String,
}

/// Accepted withdraw request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawResponse {
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(rename = "reference_code")]
    pub txid: String,
    pub amount: i64,
    pub status: String,
    #[serde(default)]
    pub payment_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawStatus {
    #[serde(rename = "reference_code")]
    pub txid: String,
    pub amount: i64,
    pub status: String,
    /// Unset until the withdraw is approved
    #[serde(default)]
    pub approved_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pix_payment_field_names() {
        let response: PixPaymentResponse = serde_json::from_value(json!({
            "txid": "tx-1",
            "status": "pending",
            "pixCopiaECola": "00020101021226...",
            "extra": "ignored"
        }))
        .unwrap();

        assert_eq!(response.txid, "tx-1");
        assert_eq!(response.pix_copia_e_cola, "00020101021226...");
    }

    #[test]
    fn test_status_reads_reference_code() {
        let status: PaymentStatus = serde_json::from_value(json!({
            "reference_code": "ref-9",
            "amount": 2500,
            "status": "paid",
            "payment_date": "2024-05-01 10:00:00"
        }))
        .unwrap();
        assert_eq!(status.txid, "ref-9");
        assert_eq!(status.payment_date.as_deref(), Some("2024-05-01 10:00:00"));

        let status: WithdrawStatus = serde_json::from_value(json!({
            "reference_code": "ref-10",
            "amount": 100,
            "status": "pending",
            "approved_date": null
        }))
        .unwrap();
        assert_eq!(status.approved_date, None);
    }
}
