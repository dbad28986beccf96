//! Table Error Types

use thiserror::Error;

/// Errors while assembling a feature table
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    /// Identifier already present
    #[error("duplicate identifier `{0}`")]
    DuplicateIdentifier(String),

    /// Vector length differs from the table's K
    #[error("`{identifier}` has {got} values, table expects {expected}")]
    WrongLength {
        identifier: String,
        expected: usize,
        got: usize,
    },

    /// Identifier contains the inverse-index list separator
    #[error("`{0}` contains the reserved separator `;`")]
    ReservedSeparator(String),

    /// NaN or infinite value
    #[error("`{0}` contains a non-finite value")]
    NonFiniteValue(String),
}
