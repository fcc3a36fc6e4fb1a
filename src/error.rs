//! Error types for the Blackoin SDK

use std::fmt;
use thiserror::Error;

/// Result type alias for Blackoin operations
pub type Result<T> = std::result::Result<T, BlackoinError>;

/// Message returned by the error accessor when the upstream body carries neither
/// an `error` nor a `message` field.
pub const UNMAPPED_ERROR: &str = "Erro não mapeado, contate o suporte da Blackoin!";

/// Upstream text the API uses when the account cannot cover a transfer.
pub const NO_BALANCE: &str = "No balance";

/// User-facing replacement for [`NO_BALANCE`].
pub const NO_BALANCE_MESSAGE: &str =
    "Sua conta não possui saldo suficiente para transferir ao usuário.";

/// API operation an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `POST token`
    Token,
    /// `POST transaction`
    CreatePayment,
    /// `POST transaction/status`
    PaymentStatus,
    /// `POST withdraw`
    CreateWithdraw,
    /// `POST withdraw/status`
    WithdrawStatus,
    /// `GET settings/payment-methods`
    PaymentMethods,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Token => "token",
            Self::CreatePayment => "create payment",
            Self::PaymentStatus => "payment status",
            Self::CreateWithdraw => "create withdraw",
            Self::WithdrawStatus => "withdraw status",
            Self::PaymentMethods => "payment methods",
        };
        f.write_str(name)
    }
}

/// Main error type for Blackoin operations
#[derive(Error, Debug)]
pub enum BlackoinError {
    /// Missing or empty credentials, or an unusable base URL
    #[error("Configuration error: {message}")]
    InvalidConfig { message: String },

    /// HTTP method outside GET, POST, PUT and DELETE
    #[error("HTTP method {method} is not supported")]
    UnsupportedMethod { method: String },

    /// Payload could not be represented as JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport call failed without producing a status code
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transport failure not originating from the HTTP client itself
    #[error("Transport error: {message}")]
    TransportMessage { message: String },

    /// The status line arrived but reading the body failed
    #[error("Failed to read response body (status {status_code}): {message}")]
    ResponseBody { status_code: u16, message: String },

    /// Operation invoked on a request with no bound transport
    #[error("Not implemented: {operation}")]
    NotImplemented { operation: &'static str },

    /// Response accessor called before the request was sent
    #[error("Request has not been sent yet")]
    NotInitialized,

    /// A request executor is single-use
    #[error("Request has already been sent")]
    AlreadySent,

    /// Header name or value rejected by the HTTP layer
    #[error("Invalid header: {message}")]
    InvalidHeader { message: String },

    /// Payment amount must be a positive number of cents
    #[error("Invalid amount: {amount} (must be greater than zero)")]
    InvalidAmount { amount: i64 },

    /// The API answered with a status code other than 200
    #[error("{operation} request failed: {message} (status {status_code}): {raw_error}")]
    RequestFailed {
        operation: Operation,
        message: String,
        raw_error: String,
        status_code: u16,
    },

    /// The API answered 200 but flagged the envelope with `success: false`
    #[error("{operation} rejected by upstream: {message}: {raw_error}")]
    UpstreamRejected {
        operation: Operation,
        message: String,
        raw_error: String,
        status_code: u16,
    },

    /// Bearer token missing or expired
    #[error("Bearer token is missing or expired")]
    Unauthenticated,

    /// The response lacked a field the operation needs
    #[error("Malformed {operation} response: {message}")]
    MalformedResponse {
        operation: Operation,
        message: String,
    },
}

impl BlackoinError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a transport error from a plain message
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportMessage {
            message: message.into(),
        }
    }

    /// Create an invalid header error
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create a request failed error
    pub fn request_failed(
        operation: Operation,
        message: impl Into<String>,
        raw_error: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self::RequestFailed {
            operation,
            message: message.into(),
            raw_error: raw_error.into(),
            status_code,
        }
    }

    /// Create an upstream rejection error
    pub fn upstream_rejected(
        operation: Operation,
        message: impl Into<String>,
        raw_error: impl Into<String>,
        status_code: u16,
    ) -> Self {
        Self::UpstreamRejected {
            operation,
            message: message.into(),
            raw_error: raw_error.into(),
            status_code,
        }
    }

    /// Create a malformed response error
    pub fn malformed(operation: Operation, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            operation,
            message: message.into(),
        }
    }

    /// Operation the error belongs to, when it came out of an API call
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::RequestFailed { operation, .. }
            | Self::UpstreamRejected { operation, .. }
            | Self::MalformedResponse { operation, .. } => Some(*operation),
            Self::Unauthenticated => Some(Operation::PaymentMethods),
            _ => None,
        }
    }

    /// HTTP status code of the response that produced this error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status_code, .. }
            | Self::UpstreamRejected { status_code, .. }
            | Self::ResponseBody { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Upstream error text exactly as the API sent it
    pub fn raw_error(&self) -> Option<&str> {
        match self {
            Self::RequestFailed { raw_error, .. } | Self::UpstreamRejected { raw_error, .. } => {
                Some(raw_error)
            }
            _ => None,
        }
    }

    /// Upstream error text with known API messages translated for end users
    pub fn upstream_message(&self) -> Option<&str> {
        self.raw_error().map(localize_upstream_message)
    }
}

/// Translate known upstream error texts; anything else passes through unchanged.
pub fn localize_upstream_message(raw: &str) -> &str {
    if raw == NO_BALANCE {
        return NO_BALANCE_MESSAGE;
    }
    raw
}
