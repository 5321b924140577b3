// src/error.rs
use std::time::Duration;
use thiserror::Error;

/// Failure of a single history source. Never leaves the aggregator.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("JSON decoding failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected payload shape: {0}")]
    Malformed(String),

    #[error("source timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures of the store backend (login, download ticket, purchase).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response parsing failed: {0}")]
    Plist(#[from] PlistError),

    #[error("login failed: {message}")]
    Auth { message: String },

    #[error("account does not own app: {message}")]
    NotOwned { message: String },

    #[error("account region does not match the store region")]
    RegionMismatch,

    #[error("purchase failed: {message}")]
    Purchase { message: String },

    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

#[derive(Error, Debug)]
pub enum PlistError {
    #[error("xml error: {0}")]
    Xml(String),

    #[error("unexpected element <{0}>")]
    Unexpected(String),

    #[error("document ended early")]
    Truncated,

    #[error("invalid {kind} value: {value}")]
    Value { kind: &'static str, value: String },
}

impl From<quick_xml::Error> for PlistError {
    fn from(e: quick_xml::Error) -> Self {
        PlistError::Xml(e.to_string())
    }
}
