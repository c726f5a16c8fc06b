use std::error::Error as StdError;

use thiserror::Error as ThisError;

/// Error type used by every fallible operation of this crate. Errors emitted by the underlying
/// database driver are wrapped in [`Error::Driver`].
#[derive(Debug, ThisError)]
pub enum Error {
    /// The database driver failed to prepare or execute a statement, or failed to fetch a row.
    #[error("The database driver reported an error: {0}")]
    Driver(#[source] Box<dyn StdError + Send + Sync>),
    /// No column mapper factory in the chain accepted the requested type.
    #[error(
        "No column mapper is registered for type '{type_name}'. Register a column mapper (or a \
        column mapper factory) accepting this type with the handle, or implement `Reflect` in a \
        way a registered factory recognizes."
    )]
    NoColumnMapper { type_name: &'static str },
    /// No row mapper factory in the chain accepted the requested type.
    #[error(
        "No row mapper is registered for type '{type_name}'. Either register a row mapper for \
        it, derive `FromRow`, or provide a column mapper so the first column of each row can be \
        mapped."
    )]
    NoRowMapper { type_name: &'static str },
    /// A mapper has been chosen for a type, but produced a value of a different type. This points
    /// to a bug in a custom mapper factory.
    #[error(
        "The mapper chosen for type '{type_name}' produced a value of a different type. Check \
        the `accepts` implementation of your custom mapper factories."
    )]
    MapperTypeMismatch { type_name: &'static str },
    /// Column numbers are one based and must not exceed the number of columns in the row.
    #[error("Column {col} does not exist. The row has {num_cols} columns (numbered from 1).")]
    ColumnOutOfBounds { col: u16, num_cols: u16 },
    /// No column with this name is part of the result set.
    #[error("The result set does not contain a column named '{name}'.")]
    UnknownColumn { name: String },
    /// The database returned `NULL`, yet the target type has no representation for it.
    #[error(
        "Column {col} ('{name}') is NULL, yet it is mapped to '{type_name}' which can not \
        represent NULL. Map to an `Option` instead."
    )]
    UnexpectedNull {
        col: u16,
        name: String,
        type_name: &'static str,
    },
    /// The value in the column is of a kind the target type can not be constructed from.
    #[error(
        "Column {col} ('{name}') holds a value of kind {found}, which can not be mapped to \
        '{type_name}'."
    )]
    IncompatibleValue {
        col: u16,
        name: String,
        type_name: &'static str,
        found: &'static str,
    },
    /// The value is of a compatible kind, but does not fit into the target type.
    #[error("The value of column {col} ('{name}') is out of range for type '{type_name}'.")]
    ValueOutOfRange {
        col: u16,
        name: String,
        type_name: &'static str,
    },
    /// Enums are mapped by the exact name of their variants. Comparison is case sensitive.
    #[error("'{value}' is not the name of a variant of enum '{type_name}'.")]
    UnknownEnumName {
        type_name: &'static str,
        value: String,
    },
    #[error("Enum '{type_name}' has no variant with ordinal {ordinal}.")]
    EnumOrdinalOutOfRange {
        type_name: &'static str,
        ordinal: i64,
    },
    /// The statement has been expected to return exactly one row, yet returned none.
    #[error("The query has been expected to return exactly one row, yet it returned no rows.")]
    NoResults,
    /// The statement has been expected to return exactly one row, yet returned more.
    #[error("The query has been expected to return exactly one row, yet it returned more.")]
    TooManyResults,
    /// A named parameter occurs in the statement text, but has not been bound.
    #[error("The statement uses the named parameter ':{name}', but no value has been bound to it.")]
    MissingNamedParameter { name: String },
    #[error(
        "The statement has {expected} positional parameter placeholders, but {bound} arguments \
        have been bound."
    )]
    ParameterCountMismatch { expected: usize, bound: usize },
    /// Named (`:name`) and positional (`?`) placeholders can not be used in the same statement.
    #[error(
        "The statement mixes named (':name') and positional ('?') parameter placeholders. Use \
        either one or the other."
    )]
    MixedParameterStyles,
    #[error("The statement text ends within an unterminated {construct}.")]
    UnterminatedSql { construct: &'static str },
    /// Emitted by application provided mappers and collectors.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Wraps an error emitted by the database driver.
    pub fn driver(source: impl StdError + Send + Sync + 'static) -> Self {
        Error::Driver(Box::new(source))
    }

    /// Error with a custom message, intended for use in application provided mappers.
    pub fn custom(message: impl Into<String>) -> Self {
        Error::Custom(message.into())
    }
}
