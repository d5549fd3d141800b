use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing \"value\" field")]
    MissingValue,
    #[error("\"value\" must be a string")]
    NonStringValue,
    #[error("value must not be empty")]
    EmptyValue,
    #[error("{field} must be true or false")]
    InvalidBool { field: &'static str },
    #[error("{field} must be a non-negative integer")]
    InvalidInteger { field: &'static str },
    #[error("contains_character must be a single character")]
    InvalidCharacter,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("string already exists: {0}")]
    DuplicateRecord(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("empty query")]
    EmptyQuery,
    #[error("unable to parse natural language query: {0}")]
    UnparseableQuery(String),
    #[error("conflicting filters in parsed query: min_length {min_length} > max_length {max_length}")]
    ConflictingFilters { min_length: usize, max_length: usize },
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CoreError {
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CoreError::Storage(Box::new(err))
    }

    /// True for conditions the caller caused and can correct.
    pub fn is_expected(&self) -> bool {
        !matches!(self, CoreError::Storage(_))
    }
}
