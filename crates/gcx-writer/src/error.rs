use thiserror::Error;

/// Errors from ordering and serializing a book.
#[derive(Debug, Error)]
pub enum WriterError {
    /// A book element whose tag has no ordering priority.
    #[error("structural violation: <{tag}> has no place in the book element order")]
    StructuralViolation { tag: String },

    /// The underlying writer failed; the output is truncated.
    #[error("output incomplete, write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for writer operations.
pub type WriterResult<T> = Result<T, WriterError>;
