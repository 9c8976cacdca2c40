//! XML binding layer for GnuCash book files.
//!
//! The store never works on raw XML text. This crate turns a file into a
//! generic element tree (tags, ordered attributes, children) and turns a tree
//! back into a stream of structural events for a writer.
//!
//! # Architecture
//!
//! - [`Element`] / [`Node`]: the generic tree, addressed by tag names
//! - [`parse_document`]: bytes → [`Document`] (whitespace between elements dropped)
//! - [`source`]: whole-file reads with gzip auto-detection, and the inverse
//! - [`ContentSink`] + [`emit_element`]: push-style write events

pub mod element;
pub mod error;
pub mod parse;
pub mod sink;
pub mod source;

pub use element::{Attribute, Document, Element, Node};
pub use error::{XmlError, XmlResult};
pub use parse::parse_document;
pub use sink::{emit_element, ContentSink, EventRecorder, RecordedEvent};
pub use source::{decode_source, encode_output, is_gzip, read_source, Encoding};
