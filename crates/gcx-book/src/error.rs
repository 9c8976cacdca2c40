use gcx_types::{BookElementKind, TypeError};
use gcx_writer::WriterError;
use gcx_xml::XmlError;
use thiserror::Error;

/// Fatal errors of book operations.
#[derive(Debug, Error)]
pub enum BookError {
    /// The document does not have the `gnc-v2` / `gnc:book` shape.
    #[error("structural violation: unexpected <{tag}>")]
    StructuralViolation { tag: String },

    /// An edit named an entity the book does not hold.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The file could not be decompressed or parsed.
    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    /// Ordering or serializing the book failed.
    #[error("write error: {0}")]
    Writer(#[from] WriterError),

    /// Reading, writing or renaming the book file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field value could not be parsed.
    #[error("invalid value: {0}")]
    Type(#[from] TypeError),

    /// An entity built by an edit is malformed.
    #[error("invalid entity: {0}")]
    Entity(#[from] EntityError),

    /// The configuration file is unreadable or names a bad currency.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The saved file did not load back to the same book.
    #[error("written output failed verification: {0}")]
    VerificationFailed(String),
}

pub type BookResult<T> = Result<T, BookError>;

/// Why a single entity could not be built. Never fatal: the loader logs it,
/// records it in the load report, and moves on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EntityError {
    /// A required child element is absent.
    #[error("missing required field <{field}>")]
    MissingField { field: String },

    /// A child element holds text that does not parse.
    #[error("bad value in <{field}>: {source}")]
    InvalidField {
        field: String,
        #[source]
        source: TypeError,
    },

    /// The owner type is not allowed for this kind of entity.
    #[error("{kind} has an owner of type {owner}, which it cannot have")]
    InvalidOwner {
        kind: BookElementKind,
        owner: String,
    },

    /// Another entity of the same kind already has this id.
    #[error("duplicate id {id}")]
    DuplicateId { id: String },
}

impl EntityError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::MissingField {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(field: &str, source: TypeError) -> Self {
        Self::InvalidField {
            field: field.to_string(),
            source,
        }
    }
}

pub type EntityResult<T> = Result<T, EntityError>;
