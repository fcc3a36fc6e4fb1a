//! Input models shared by payments and withdraws

use crate::{BlackoinError, Result};
use serde::{Deserialize, Serialize};

/// Customer a payment is charged to or a withdraw is made for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Merchant-side identifier of the customer
    pub identifier: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// CPF/CNPJ or equivalent
    pub document: Option<String>,
}

impl Client {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = Some(document.into());
        self
    }
}

/// Destination account holder of a withdraw
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receiver {
    /// Document kind, e.g. `cpf` or `cnpj`
    pub document_type: String,
    pub document_number: String,
}

impl Receiver {
    pub fn new(document_type: impl Into<String>, document_number: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            document_number: document_number.into(),
        }
    }
}

/// Amount in cents, guaranteed positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Reject zero and negative amounts
    pub fn new(cents: i64) -> Result<Self> {
        if cents <= 0 {
            return Err(BlackoinError::InvalidAmount { amount: cents });
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Amount {
    type Error = BlackoinError;

    fn try_from(cents: i64) -> Result<Self> {
        Self::new(cents)
    }
}
