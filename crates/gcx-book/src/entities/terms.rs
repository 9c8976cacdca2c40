use gcx_types::{Decimal, Guid};
use gcx_xml::Element;
use serde::Serialize;
use tracing::warn;

use super::{ElementRef, Entity};
use crate::error::EntityResult;
use crate::fields::Fields;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaxTableEntry {
    pub account: Option<Guid>,
    pub amount: Decimal,
    /// `PERCENT` or `VALUE`.
    pub amount_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaxTable {
    pub guid: Guid,
    pub name: String,
    pub refcount: i64,
    pub invisible: bool,
    pub parent: Option<Guid>,
    pub entries: Vec<TaxTableEntry>,
    pub origin: ElementRef,
}

impl TaxTable {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        let guid = f.required_guid("taxtable:guid")?;
        let mut entries = Vec::new();
        if let Some(list) = el.child("taxtable:entries") {
            for entry_el in list.children_named("gnc:GncTaxTableEntry") {
                match read_entry(entry_el) {
                    Ok(entry) => entries.push(entry),
                    Err(err) => warn!(table = %guid, error = %err, "skipping tax table entry"),
                }
            }
        }
        Ok(Self {
            guid,
            name: f.required_text("taxtable:name")?,
            refcount: f.integer("taxtable:refcount")?.unwrap_or(0),
            invisible: f.flag("taxtable:invisible")?.unwrap_or(false),
            parent: f.guid("taxtable:parent")?,
            entries,
            origin,
        })
    }

    /// Sum of percentage rates.
    pub fn total_percent(&self) -> Decimal {
        self.entries
            .iter()
            .filter(|e| e.amount_type == "PERCENT")
            .map(|e| e.amount)
            .sum()
    }
}

fn read_entry(el: &Element) -> EntityResult<TaxTableEntry> {
    let f = Fields::new(el);
    Ok(TaxTableEntry {
        account: f.guid("tte:acct")?,
        amount: f.required_numeric("tte:amount")?,
        amount_type: f.text("tte:type").unwrap_or_else(|| "PERCENT".to_string()),
    })
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum BillTermKind {
    Days {
        due_days: Option<i64>,
        discount_days: Option<i64>,
        discount: Option<Decimal>,
    },
    Proximo {
        due_day: Option<i64>,
        discount_day: Option<i64>,
        discount: Option<Decimal>,
        cutoff_day: Option<i64>,
    },
    Unspecified,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BillTerm {
    pub guid: Guid,
    pub name: String,
    pub description: Option<String>,
    pub refcount: i64,
    pub invisible: bool,
    pub kind: BillTermKind,
    pub origin: ElementRef,
}

impl BillTerm {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        let kind = if let Some(days) = el.child("billterm:days") {
            let d = Fields::new(days);
            BillTermKind::Days {
                due_days: d.integer("bt-days:due-days")?,
                discount_days: d.integer("bt-days:disc-days")?,
                discount: d.numeric("bt-days:discount")?,
            }
        } else if let Some(prox) = el.child("billterm:proximo") {
            let p = Fields::new(prox);
            BillTermKind::Proximo {
                due_day: p.integer("bt-prox:due-day")?,
                discount_day: p.integer("bt-prox:disc-day")?,
                discount: p.numeric("bt-prox:discount")?,
                cutoff_day: p.integer("bt-prox:cutoff-day")?,
            }
        } else {
            BillTermKind::Unspecified
        };
        Ok(Self {
            guid: f.required_guid("billterm:guid")?,
            name: f.required_text("billterm:name")?,
            description: f.text("billterm:desc"),
            refcount: f.integer("billterm:refcount")?.unwrap_or(0),
            invisible: f.flag("billterm:invisible")?.unwrap_or(false),
            kind,
            origin,
        })
    }
}

impl Entity for TaxTable {
    const NAME: &'static str = "tax table";

    fn guid(&self) -> Guid {
        self.guid
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}

impl Entity for BillTerm {
    const NAME: &'static str = "bill term";

    fn guid(&self) -> Guid {
        self.guid
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guid_el(tag: &str, hex: &str) -> Element {
        Element::new(tag).with_attr("type", "guid").with_text(hex)
    }

    fn tte(amount: &str, ty: &str) -> Element {
        Element::new("gnc:GncTaxTableEntry")
            .with_child(guid_el("tte:acct", "abcdabcdabcdabcdabcdabcdabcdabcd"))
            .with_child(Element::new("tte:amount").with_text(amount))
            .with_child(Element::new("tte:type").with_text(ty))
    }

    #[test]
    fn tax_table_entries() {
        let el = Element::new("gnc:GncTaxTable")
            .with_child(guid_el("taxtable:guid", "01010101010101010101010101010101"))
            .with_child(Element::new("taxtable:name").with_text("VAT"))
            .with_child(Element::new("taxtable:refcount").with_text("2"))
            .with_child(Element::new("taxtable:invisible").with_text("0"))
            .with_child(
                Element::new("taxtable:entries")
                    .with_child(tte("19/1", "PERCENT"))
                    .with_child(tte("150/100", "VALUE"))
                    .with_child(Element::new("gnc:GncTaxTableEntry")),
            );
        let t = TaxTable::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(t.entries.len(), 2);
        assert_eq!(t.total_percent(), Decimal::new(19, 0));
        assert_eq!(t.refcount, 2);
    }

    #[test]
    fn bill_term_days() {
        let el = Element::new("gnc:GncBillTerm")
            .with_child(guid_el("billterm:guid", "02020202020202020202020202020202"))
            .with_child(Element::new("billterm:name").with_text("Net 30"))
            .with_child(
                Element::new("billterm:days")
                    .with_child(Element::new("bt-days:due-days").with_text("30"))
                    .with_child(Element::new("bt-days:disc-days").with_text("10"))
                    .with_child(Element::new("bt-days:discount").with_text("2/1")),
            );
        let b = BillTerm::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(
            b.kind,
            BillTermKind::Days {
                due_days: Some(30),
                discount_days: Some(10),
                discount: Some(Decimal::new(2, 0)),
            }
        );
    }

    #[test]
    fn bill_term_without_schedule() {
        let el = Element::new("gnc:GncBillTerm")
            .with_child(guid_el("billterm:guid", "02020202020202020202020202020202"))
            .with_child(Element::new("billterm:name").with_text("Ad hoc"));
        let b = BillTerm::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(b.kind, BillTermKind::Unspecified);
    }
}
