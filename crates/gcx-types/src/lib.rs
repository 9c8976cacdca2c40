//! Foundation types for the GnuCash XML book store (GCX).
//!
//! This crate provides the identity, commodity, numeric, and temporal types
//! shared by every other GCX crate. Nothing here knows about XML; the
//! conversions to and from element text live in the crates that parse and
//! write documents.
//!
//! # Key Types
//!
//! - [`Guid`]: 128-bit entity identifier, always rendered in lower case
//! - [`CmdtyCurrId`]: qualified commodity ID (`namespace:code`)
//! - [`BookElementKind`]: the closed set of top-level book element types
//! - [`SlotValue`]: typed value of an extensible key/value slot
//! - [`numeric`]: GnuCash `n/d` fractions as exact decimals
//! - [`time`]: GnuCash timestamp and calendar-date formats

pub mod cmdty;
pub mod error;
pub mod guid;
pub mod kind;
pub mod numeric;
pub mod slot;
pub mod time;

pub use cmdty::{CmdtyCurrId, CURRENCY_NAMESPACE, ISO4217_NAMESPACE};
pub use error::TypeError;
pub use guid::Guid;
pub use kind::{BookElementKind, HeaderKind};
pub use slot::{Slot, SlotType, SlotValue};

pub use rust_decimal::Decimal;
