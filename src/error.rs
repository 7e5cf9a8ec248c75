//! Unified error handling for the bilicomments crate
//!
//! Domain-specific errors live in [`crate::utils::error`]. This module wraps them
//! into a single [`Error`] for crawler construction and classifies them with
//! [`ErrorCategory`] for log fields.

use thiserror::Error;

pub use crate::utils::error::{ExtractError, FetchError, ParseError, SignError, StorageError};

/// Common trait for all bilicomments error types
pub trait BiliErrorTrait: std::error::Error {
    /// Check if this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Network-related errors (HTTP, timeout, status)
    Network,
    /// JSON shape and URI extraction errors
    Parsing,
    /// Output file errors
    Storage,
    /// Request signing errors
    Signing,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    /// Short lowercase name for log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Signing => "signing",
            Self::Config => "config",
        }
    }
}

impl BiliErrorTrait for FetchError {
    fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::UnsupportedMethod(_) | Self::InvalidHeader { .. }
        )
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedMethod(_) | Self::InvalidHeader { .. } => ErrorCategory::Config,
            _ => ErrorCategory::Network,
        }
    }
}

impl BiliErrorTrait for ParseError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

impl BiliErrorTrait for ExtractError {
    fn is_recoverable(&self) -> bool {
        false
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Parsing
    }
}

/// Unified error type for crawler construction
#[derive(Error, Debug)]
pub enum Error {
    /// Fetch-specific errors
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Every attempt against an endpoint failed
    #[error("No response from {url}")]
    NoResponse { url: String },

    /// Parse-specific errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Signing errors
    #[error("Sign error: {0}")]
    Sign(#[from] SignError),

    /// Output sink errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl BiliErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Fetch(e) => e.is_recoverable(),
            Self::Parse(e) => e.is_recoverable(),
            Self::NoResponse { .. } | Self::Storage(_) => true,
            Self::Sign(_) | Self::Config(_) => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Fetch(e) => e.category(),
            Self::NoResponse { .. } => ErrorCategory::Network,
            Self::Parse(e) => e.category(),
            Self::Sign(_) => ErrorCategory::Signing,
            Self::Storage(_) => ErrorCategory::Storage,
            Self::Config(_) => ErrorCategory::Config,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
