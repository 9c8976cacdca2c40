use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML syntax error at byte {position}: {reason}")]
    Syntax { position: usize, reason: String },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("invalid UTF-8 in {0}")]
    InvalidUtf8(String),
}

pub type XmlResult<T> = Result<T, XmlError>;
