// SPDX-FileCopyrightText: 2026 Selenggara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Selenggara maintenance tracker.

use thiserror::Error;

/// The primary error type used across all Selenggara crates.
///
/// Client-facing variants (`Validation`, `Conflict`, `NotFound`) carry a
/// message that is safe to show to the caller. `Storage`, `Config` and
/// `Internal` are logged server-side and reported generically.
#[derive(Debug, Error)]
pub enum SelenggaraError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, migration).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A request field is missing or malformed. No mutation was attempted.
    #[error("{message}")]
    Validation {
        /// JSON name of the offending field, when one can be identified.
        field: Option<&'static str>,
        message: String,
    },

    /// A unique value is already used by another record. No mutation was attempted.
    #[error("{message}")]
    Conflict {
        /// JSON name of the colliding field, when one can be identified.
        field: Option<&'static str>,
        message: String,
    },

    /// The referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SelenggaraError {
    /// Validation error tagged with the offending field.
    pub fn invalid_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    /// Validation error not tied to a single field.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Conflict error tagged with the colliding field.
    pub fn conflict_field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: Some(field),
            message: message.into(),
        }
    }

    /// Conflict error not tied to a single field.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            field: None,
            message: message.into(),
        }
    }

    /// Returns the field this error is tagged with, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } | Self::Conflict { field, .. } => *field,
            _ => None,
        }
    }

    /// True for errors caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Conflict { .. } | Self::NotFound(_)
        )
    }
}
