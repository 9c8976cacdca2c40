use gcx_types::time::Timestamp;
use gcx_types::{CmdtyCurrId, Decimal, Guid};
use gcx_xml::Element;
use serde::Serialize;

use super::{ElementRef, Entity};
use crate::error::EntityResult;
use crate::fields::Fields;

/// A quote: one unit of `commodity` is worth `value` units of `currency` at `time`.
///
/// Only the ID is required. Records with missing sides, date, or value stay
/// in the index but are ignored by price resolution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Price {
    pub id: Guid,
    pub commodity: Option<CmdtyCurrId>,
    pub currency: Option<CmdtyCurrId>,
    pub time: Option<Timestamp>,
    pub source: Option<String>,
    pub price_type: Option<String>,
    pub value: Option<Decimal>,
    pub origin: ElementRef,
}

/// A price record with every field resolution needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quote<'a> {
    pub id: Guid,
    pub from: &'a CmdtyCurrId,
    pub to: &'a CmdtyCurrId,
    pub time: Timestamp,
    pub value: Decimal,
}

impl Price {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        let id = f.required_guid("price:id")?;
        // Sub-field problems make the record unusable, not unloadable.
        let commodity = f.commodity("price:commodity").unwrap_or(None);
        let currency = f.commodity("price:currency").unwrap_or(None);
        let time = f.timestamp("price:time").unwrap_or(None);
        let value = f.numeric("price:value").unwrap_or(None);
        Ok(Self {
            id,
            commodity,
            currency,
            time,
            source: f.text("price:source"),
            price_type: f.text("price:type"),
            value,
            origin,
        })
    }

    /// The complete view, or the name of the first missing field.
    pub fn quote(&self) -> Result<Quote<'_>, &'static str> {
        Ok(Quote {
            id: self.id,
            from: self.commodity.as_ref().ok_or("price:commodity")?,
            to: self.currency.as_ref().ok_or("price:currency")?,
            time: self.time.ok_or("price:time")?,
            value: self.value.ok_or("price:value")?,
        })
    }
}

impl Entity for Price {
    const NAME: &'static str = "price";

    fn guid(&self) -> Guid {
        self.id
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::commodity_element;

    fn price_element(value: Option<&str>) -> Element {
        let mut el = Element::new("price")
            .with_child(
                Element::new("price:id")
                    .with_attr("type", "guid")
                    .with_text("abababababababababababababababab"),
            )
            .with_child(commodity_element("price:commodity", &CmdtyCurrId::security("NYSE", "IBM")))
            .with_child(commodity_element("price:currency", &CmdtyCurrId::currency("USD")))
            .with_child(
                Element::new("price:time")
                    .with_child(Element::new("ts:date").with_text("2023-06-01 00:00:00 +0000")),
            )
            .with_child(Element::new("price:source").with_text("user:price"));
        if let Some(v) = value {
            el.push_child(Element::new("price:value").with_text(v));
        }
        el
    }

    #[test]
    fn complete_price_has_a_quote() {
        let p = Price::from_element(&price_element(Some("13750/100")), ElementRef::Book(0)).unwrap();
        let q = p.quote().unwrap();
        assert_eq!(q.value, Decimal::new(1375, 1));
        assert_eq!(q.to, &CmdtyCurrId::currency("USD"));
    }

    #[test]
    fn missing_value_is_loadable_but_unusable() {
        let p = Price::from_element(&price_element(None), ElementRef::Book(0)).unwrap();
        assert_eq!(p.quote().unwrap_err(), "price:value");
    }

    #[test]
    fn garbage_value_is_treated_as_missing() {
        let p = Price::from_element(&price_element(Some("n/a")), ElementRef::Book(0)).unwrap();
        assert!(p.value.is_none());
    }
}
