use gcx_types::{CmdtyCurrId, Slot};
use gcx_xml::Element;
use serde::Serialize;

use super::ElementRef;
use crate::error::EntityResult;
use crate::fields::{commodity_ref, Fields};
use crate::slots::entity_slots;

/// A currency or security declared with `gnc:commodity`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Commodity {
    pub id: CmdtyCurrId,
    pub name: Option<String>,
    /// Alternate exchange code (ISIN, CUSIP, ...).
    pub xcode: Option<String>,
    pub fraction: Option<i64>,
    pub get_quotes: bool,
    pub quote_source: Option<String>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Commodity {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            id: commodity_ref(el)?,
            name: f.text("cmdty:name"),
            xcode: f.text("cmdty:xcode").filter(|x| !x.trim().is_empty()),
            fraction: f.integer("cmdty:fraction")?,
            get_quotes: f.element("cmdty:get_quotes").is_some(),
            quote_source: f.text("cmdty:quote_source"),
            slots: entity_slots(el, "cmdty:slots"),
            origin,
        })
    }

    pub fn is_currency(&self) -> bool {
        self.id.is_currency()
    }
}
