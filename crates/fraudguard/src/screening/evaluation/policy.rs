use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Scores at or above this value decline the charge. Single tunable constant;
/// the scoring algorithm never references the threshold directly.
pub const DECLINE_THRESHOLD: Decimal = dec!(0.5);

/// Binary screening outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Declined,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accepted => "accepted",
            Decision::Declined => "declined",
        }
    }
}

/// Pure function of the score; no hidden state.
pub fn decide(score: Decimal) -> Decision {
    if score >= DECLINE_THRESHOLD {
        Decision::Declined
    } else {
        Decision::Accepted
    }
}
