//! Write path of the GnuCash XML book store.
//!
//! The reference application is picky about layout, so unmodified content has
//! to come back out byte for byte. Two pieces make that possible:
//!
//! - [`order`]: the fixed priority of every book element type, applied as a
//!   stable sort right before serialization
//! - [`RoundTripWriter`]: a [`gcx_xml::ContentSink`] that reproduces the
//!   reference indentation, self-closing, escaping and trailer rules
//!
//! [`write_layout`] ties them together for a whole document.

pub mod document;
pub mod error;
pub mod format;
pub mod order;
pub mod writer;

pub use document::{layout_to_element, write_document, write_layout, DocumentLayout};
pub use error::{WriterError, WriterResult};
pub use order::{order_elements, priority_of, sort_by_priority};
pub use writer::{RoundTripWriter, WriterState};
