use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::guid::Guid;
use crate::time::Timestamp;

/// Value type tag carried in `slot:value type="..."`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotType {
    String,
    Integer,
    Double,
    Numeric,
    Guid,
    GDate,
    Timespec,
    Frame,
}

impl SlotType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Numeric => "numeric",
            Self::Guid => "guid",
            Self::GDate => "gdate",
            Self::Timespec => "timespec",
            Self::Frame => "frame",
        }
    }

    pub fn parse(s: &str) -> Result<Self, TypeError> {
        match s {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "double" => Ok(Self::Double),
            "numeric" => Ok(Self::Numeric),
            "guid" => Ok(Self::Guid),
            "gdate" => Ok(Self::GDate),
            "timespec" => Ok(Self::Timespec),
            "frame" => Ok(Self::Frame),
            other => Err(TypeError::UnknownVariant {
                kind: "slot type",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of a slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SlotValue {
    String(String),
    Integer(i64),
    Double(f64),
    Numeric(Decimal),
    Guid(Guid),
    GDate(NaiveDate),
    Timespec(Timestamp),
    Frame(Vec<Slot>),
    /// A type this store does not interpret (`list`, `binary`, ...); the
    /// element is still written back untouched.
    Other { type_name: String },
}

impl SlotValue {
    /// Type name as written in the `type` attribute.
    pub fn type_name(&self) -> &str {
        match self {
            Self::String(_) => SlotType::String.as_str(),
            Self::Integer(_) => SlotType::Integer.as_str(),
            Self::Double(_) => SlotType::Double.as_str(),
            Self::Numeric(_) => SlotType::Numeric.as_str(),
            Self::Guid(_) => SlotType::Guid.as_str(),
            Self::GDate(_) => SlotType::GDate.as_str(),
            Self::Timespec(_) => SlotType::Timespec.as_str(),
            Self::Frame(_) => SlotType::Frame.as_str(),
            Self::Other { type_name } => type_name,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Guid> {
        match self {
            Self::Guid(g) => Some(*g),
            _ => None,
        }
    }

    pub fn as_frame(&self) -> Option<&[Slot]> {
        match self {
            Self::Frame(slots) => Some(slots),
            _ => None,
        }
    }
}

/// A single key/value slot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub key: String,
    pub value: SlotValue,
}

impl Slot {
    pub fn new(key: impl Into<String>, value: SlotValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}
