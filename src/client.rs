//! High-level client bundling a [`GatewayConfig`] with every resource operation

use crate::config::GatewayConfig;
use crate::resources::{auth, payments, settings, withdrawals};
use crate::responses::*;
use crate::Result;
use serde_json::Value;

/// Blackoin API client.
///
/// Owns the gateway configuration and forwards to the resource operations.
/// [`authenticate`](Self::authenticate) stores the issued token so later
/// calls carry it.
#[derive(Debug, Clone, Default)]
pub struct BlackoinClient {
    config: GatewayConfig,
}

impl BlackoinClient {
    /// Create a client over `config`
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    /// Create a client from `BLACKOIN_*` environment variables
    pub fn from_env() -> Self {
        Self::new(GatewayConfig::from_env())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GatewayConfig {
        &mut self.config
    }

    /// Request a bearer token and store it for subsequent calls
    pub async fn authenticate(&mut self) -> Result<BearerToken> {
        let token = auth::fetch_bearer_token(&self.config).await?;
        self.config.set_bearer_token(token.token.clone());
        Ok(token)
    }

    /// Request a bearer token without storing it
    pub async fn fetch_bearer_token(&self) -> Result<BearerToken> {
        auth::fetch_bearer_token(&self.config).await
    }

    pub async fn create_pix_payment(
        &self,
        payment: &payments::PixPayment,
    ) -> Result<PixPaymentResponse> {
        payments::create_payment(&self.config, payment).await
    }

    pub async fn create_crypto_payment(
        &self,
        payment: &payments::CryptoPayment,
    ) -> Result<CryptoPaymentResponse> {
        payments::create_payment(&self.config, payment).await
    }

    pub async fn payment_status(&self, txid: &str) -> Result<PaymentStatus> {
        payments::payment_status(&self.config, txid).await
    }

    pub async fn create_pix_withdraw(
        &self,
        withdraw: &withdrawals::PixWithdraw,
    ) -> Result<WithdrawResponse> {
        withdrawals::create_withdraw(&self.config, withdraw).await
    }

    pub async fn create_crypto_withdraw(
        &self,
        withdraw: &withdrawals::CryptoWithdraw,
    ) -> Result<WithdrawResponse> {
        withdrawals::create_withdraw(&self.config, withdraw).await
    }

    pub async fn withdraw_status(&self, txid: &str) -> Result<WithdrawStatus> {
        withdrawals::withdraw_status(&self.config, txid).await
    }

    pub async fn payment_methods(&self) -> Result<Value> {
        settings::payment_methods(&self.config).await
    }
}
