//! Bearer token issuance

use super::{fetch_envelope, Endpoint, RejectionText};
use crate::config::GatewayConfig;
use crate::envelope::decode_data;
use crate::error::Operation;
use crate::http::HttpMethod;
use crate::mask;
use crate::responses::BearerToken;
use crate::Result;
use serde::Serialize;
use serde_json::Value;

const TOKEN: Endpoint<'static> = Endpoint {
    operation: Operation::Token,
    path: "token",
    method: HttpMethod::Post,
    failure: "Could not obtain a token, the request failed",
    rejection: "Blackoin refused to issue a token",
    rejection_text: RejectionText::Error,
};

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

/// Exchange the configured client credentials for a bearer token.
///
/// The token endpoint answers with the token fields at the top level rather
/// than inside an envelope. The returned token is not stored; pass it to
/// [`GatewayConfig::set_bearer_token`].
#[tracing::instrument(skip_all)]
pub async fn fetch_bearer_token(config: &GatewayConfig) -> Result<BearerToken> {
    let (client_id, client_secret) = config.credentials()?;
    let body = TokenRequest {
        client_id,
        client_secret,
    };

    let envelope = fetch_envelope(config, &TOKEN, &body).await?;
    let token: BearerToken = decode_data(TOKEN.operation, envelope.into_value())?;

    tracing::debug!(token = %loggable(&token), "Obtained Blackoin bearer token");
    Ok(token)
}

fn loggable(token: &BearerToken) -> Value {
    mask::secure_serializable(token)
}
