use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Charge under assessment. Immutable once constructed; the only record rule
/// conditions may read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeContext {
    pub amount: Decimal,
    pub currency: String,
    pub source: PaymentChannel,
    pub email: String,
}

/// Payment channel the charge arrived through. Unrecognized channels collapse
/// into `Other` so rule authors can match "everything else" with one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentChannel {
    Stripe,
    Paypal,
    BankTransfer,
    #[serde(other)]
    Other,
}

impl PaymentChannel {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentChannel::Stripe => "stripe",
            PaymentChannel::Paypal => "paypal",
            PaymentChannel::BankTransfer => "bank_transfer",
            PaymentChannel::Other => "other",
        }
    }

    pub(crate) fn is_known_label(value: &str) -> bool {
        matches!(value, "stripe" | "paypal" | "bank_transfer" | "other")
    }
}

/// Raw charge payload from the controller layer, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeSubmission {
    pub amount: Decimal,
    pub currency: String,
    pub source: PaymentChannel,
    pub email: String,
}

impl ChargeSubmission {
    /// Validate the basic field shapes and produce the immutable context the
    /// scoring engine trusts.
    pub fn into_context(self) -> Result<ChargeContext, ChargeValidationError> {
        if self.amount <= Decimal::ZERO {
            return Err(ChargeValidationError::NonPositiveAmount(self.amount));
        }

        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ChargeValidationError::MalformedCurrency(self.currency));
        }

        let mut parts = self.email.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() {
            return Err(ChargeValidationError::MalformedEmail(self.email));
        }

        Ok(ChargeContext {
            amount: self.amount,
            currency: self.currency,
            source: self.source,
            email: self.email,
        })
    }
}

/// Basic field-shape violations surfaced by the controller boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ChargeValidationError {
    #[error("amount {0} must be positive")]
    NonPositiveAmount(Decimal),
    #[error("currency '{0}' must be a three-letter uppercase code")]
    MalformedCurrency(String),
    #[error("email '{0}' is not a plausible address")]
    MalformedEmail(String),
}
