//! GnuCash XML book store.
//!
//! Loads a book file into typed entities, answers lookups and price
//! queries, applies edits, and writes the book back in the reference
//! layout. Unmodified books round-trip byte for byte apart from GUID case
//! and the generation timestamp.
//!
//! # Architecture
//!
//! - [`Book`]: the element tree plus everything derived from it; open/save
//! - [`LoadPipeline`]: classifies book elements and builds the [`EntityIndex`]
//!   in dependency order, skipping malformed entities
//! - [`PriceResolver`]: latest-price lookup with bounded recursive conversion
//! - [`CurrencyTable`]: book-scoped conversion factors, explicitly refreshed
//! - [`Owner`] / [`Owned`]: polymorphic invoice and job owners
//! - [`BookEditor`]: mutations that keep entities and elements in sync
//! - [`BookConfig`]: TOML-loadable settings

pub mod book;
pub mod config;
pub mod counts;
pub mod currency;
pub mod editor;
pub mod entities;
pub mod error;
pub(crate) mod fields;
pub mod index;
pub mod loader;
pub mod owner;
pub mod pricing;
pub mod slots;

pub use book::Book;
pub use config::{BookConfig, CompressionMode};
pub use counts::{CountData, CountMismatch};
pub use currency::CurrencyTable;
pub use editor::{BookEditor, NewPrice};
pub use entities::{ElementRef, Entity, OwnerKind, OwnerRef};
pub use error::{BookError, BookResult, EntityError, EntityResult};
pub use index::{EntityIndex, EntityMap};
pub use loader::{LoadPipeline, LoadReport, LoadStage, LookupMiss, SkippedEntity};
pub use owner::{Owned, Owner};
pub use pricing::{PriceResolver, MAX_RESOLUTION_DEPTH};
