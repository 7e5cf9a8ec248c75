//! Error types for the bilicomments crawler
//!
//! This module defines the domain-specific error types used throughout the application.

use thiserror::Error;

/// Errors that can occur during HTTP fetching operations
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request error (connection refused, body read, redirect loop, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("HTTP status {0}")]
    Status(u16),

    /// Could not connect to the remote host
    #[error("Connection error: {0}")]
    Connect(String),

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Method other than GET or POST
    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// Invalid header value in configuration
    #[error("Invalid header value for {name}: {value}")]
    InvalidHeader { name: &'static str, value: String },
}

impl FetchError {
    /// Classify a reqwest error into the retry log categories
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Http(err)
        }
    }

    /// Short label used in attempt logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "request",
            Self::Status(_) => "http_status",
            Self::Connect(_) => "connection",
            Self::Timeout => "timeout",
            Self::UnsupportedMethod(_) => "unsupported_method",
            Self::InvalidHeader { .. } => "invalid_header",
        }
    }
}

/// Errors raised while walking API JSON responses
#[derive(Error, Debug)]
pub enum ParseError {
    /// Response body could not be read
    #[error("Failed to read response body: {0}")]
    Body(String),

    /// Body is not valid JSON
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A key along the expected path is absent
    #[error("Missing field: {0}")]
    MissingField(String),

    /// An array index along the expected path is out of range
    #[error("Index {index} out of range at {path}")]
    IndexOutOfRange { path: String, index: usize },

    /// A value has an unexpected JSON type
    #[error("Unexpected type at {path}: expected {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    /// The API answered with a non-zero business code
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
}

/// Errors raised while deriving video and comment ids from a card URI
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Neither `video/` nor `bilibili.com/video/` is present
    #[error("No video segment in URI")]
    NoVideoSegment,

    /// The video id slice is empty
    #[error("Empty video id")]
    EmptyVideoId,

    /// Nothing follows the last `=`
    #[error("Empty comment id")]
    EmptyCommentId,
}

/// Errors raised by request signers
#[derive(Error, Debug)]
pub enum SignError {
    /// WBI key is shorter than the mixin table requires
    #[error("WBI keys too short: got {0} characters, need 64")]
    KeyTooShort(usize),

    /// WBI key URL could not be reduced to a key
    #[error("Invalid WBI key URL: {0}")]
    InvalidKeyUrl(String),

    /// Static signer without a token
    #[error("No static token configured")]
    MissingToken,
}

/// Errors raised by output sinks
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying file operation failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// In-memory sink lock was poisoned
    #[error("Output buffer lock poisoned")]
    Poisoned,
}
