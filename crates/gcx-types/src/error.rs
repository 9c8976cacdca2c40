use thiserror::Error;

/// Errors produced by type parsing operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid GUID: {0}")]
    InvalidGuid(String),

    #[error("invalid commodity ID: {0}")]
    InvalidCommodity(String),

    #[error("invalid numeric value: {0}")]
    InvalidNumeric(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),

    #[error("unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}
