//! Error types for quarry.

use thiserror::Error;

use crate::ast::{NodeKind, OperationNode};

#[derive(Debug, Error)]
pub enum QuarryError {
    /// A string reference did not match `column`, `table.column` or `schema.table.column`.
    #[error("Invalid reference '{reference}': {message}")]
    InvalidReference {
        reference: String,
        message: &'static str,
    },

    #[error("Invalid operator: '{0}'")]
    InvalidOperator(String),

    #[error("Invalid order by direction '{direction}' in '{input}'. Expected: asc or desc")]
    InvalidOrderDirection { input: String, direction: String },

    #[error("Invalid data type: '{0}'")]
    InvalidDataType(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A plugin or transformer returned a node of a different kind than it received.
    #[error("Plugin contract violation: expected a {expected:?} node, got {actual:?}")]
    PluginContract { expected: NodeKind, actual: NodeKind },

    #[error(transparent)]
    NoResult(#[from] NoResultError),

    #[error("Database error while {context}: {source}")]
    Database {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    /// The original failure of a transaction whose rollback failed as well.
    #[error("{source} (rollback failed: {rollback})")]
    Rollback {
        #[source]
        source: Box<QuarryError>,
        rollback: Box<QuarryError>,
    },

    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        feature: &'static str,
    },

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuarryError {
    /// Create an invalid reference error.
    pub fn reference(reference: impl Into<String>, message: &'static str) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            message,
        }
    }

    /// Wrap a driver error with the operation that produced it.
    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }

    pub fn unsupported(dialect: &'static str, feature: &'static str) -> Self {
        Self::Unsupported { dialect, feature }
    }
}

/// Raised by `execute_take_first_or_throw` when a query returned no rows.
#[derive(Debug, Clone, Error)]
#[error("no result")]
pub struct NoResultError {
    /// The query (after plugins) that produced no rows.
    pub query: OperationNode,
}

/// Result type alias for quarry operations.
pub type QuarryResult<T> = Result<T, QuarryError>;
