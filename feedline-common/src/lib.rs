//! Common types and utilities shared across feedline crates.
//!
//! This crate defines the shared error taxonomy and the observability helpers used
//! throughout the workspace. It stays dependency-light so every crate, including the
//! feed core, can depend on it without pulling in the HTTP or configuration stack.
//!
//! # Overview
//!
//! - [`FeedlineError`] and [`Result`]: shared error handling
//! - [`observability`]: centralised tracing/logging initialisation
//!
//! # Examples
//!
//! ```rust
//! use feedline_common::{FeedlineError, Result};
//!
//! fn lookup(id: &str) -> Result<&str> {
//!     if id.is_empty() {
//!         return Err(FeedlineError::Parameter("account id is empty".into()));
//!     }
//!     Ok(id)
//! }
//!
//! assert!(lookup("").unwrap_err().is_parameter());
//! assert_eq!(lookup("DIYgod").unwrap(), "DIYgod");
//! ```

pub mod observability;

/// Error types used across the feedline system.
///
/// Any of these terminates the request that produced it; no partial feed is emitted.
#[derive(thiserror::Error, Debug)]
pub enum FeedlineError {
    /// The inbound request could not be turned into a timeline request.
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// The authenticated session could not be bootstrapped.
    #[error("Session error: {0}")]
    Session(String),

    /// A profile or timeline fetch failed, or returned a payload we could not decode.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl FeedlineError {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Self::Parameter(_))
    }

    pub fn is_session(&self) -> bool {
        matches!(self, Self::Session(_))
    }

    pub fn is_retrieval(&self) -> bool {
        matches!(self, Self::Retrieval(_))
    }
}

/// Convenient alias for results that use [`FeedlineError`].
pub type Result<T> = std::result::Result<T, FeedlineError>;
