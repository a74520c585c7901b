//! Fraud screening core for incoming payment charges.
//!
//! The library evaluates a charge against a configurable set of fraud
//! heuristics, aggregates the triggered rule weights into a risk score,
//! derives an accept/decline decision, and attaches a natural-language
//! explanation obtained from an external language model and deduplicated
//! through an in-process cache.

pub mod config;
pub mod error;
pub mod screening;
pub mod telemetry;
