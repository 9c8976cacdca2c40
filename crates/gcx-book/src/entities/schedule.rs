use chrono::NaiveDate;
use gcx_types::{Guid, Slot};
use gcx_xml::Element;
use serde::Serialize;

use super::{ElementRef, Entity};
use crate::error::EntityResult;
use crate::fields::Fields;
use crate::slots::entity_slots;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Budget {
    pub id: Guid,
    pub name: String,
    pub description: Option<String>,
    pub num_periods: Option<i64>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Budget {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            id: f.required_guid("bgt:id")?,
            name: f.text("bgt:name").unwrap_or_default(),
            description: f.text("bgt:description"),
            num_periods: f.integer("bgt:num-periods")?,
            slots: entity_slots(el, "bgt:slots"),
            origin,
        })
    }
}

/// A scheduled transaction. Its template splits live in the template
/// container, below the account named by `template_account`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduledTransaction {
    pub id: Guid,
    pub name: String,
    pub enabled: bool,
    pub start: Option<NaiveDate>,
    pub last: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub template_account: Option<Guid>,
    pub origin: ElementRef,
}

impl ScheduledTransaction {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            id: f.required_guid("sx:id")?,
            name: f.text("sx:name").unwrap_or_default(),
            enabled: f.flag("sx:enabled")?.unwrap_or(true),
            start: f.date("sx:start")?,
            last: f.date("sx:last")?,
            end: f.date("sx:end")?,
            template_account: f.guid("sx:templ-acct")?,
            origin,
        })
    }
}

impl Entity for Budget {
    const NAME: &'static str = "budget";

    fn guid(&self) -> Guid {
        self.id
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}

impl Entity for ScheduledTransaction {
    const NAME: &'static str = "scheduled transaction";

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

    #[test]
    fn scheduled_transaction_dates() {
        let el = Element::new("gnc:schedxaction")
            .with_child(
                Element::new("sx:id")
                    .with_attr("type", "guid")
                    .with_text("0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f"),
            )
            .with_child(Element::new("sx:name").with_text("Rent"))
            .with_child(Element::new("sx:enabled").with_text("y"))
            .with_child(Element::new("sx:start").with_child(Element::new("gdate").with_text("2023-01-01")))
            .with_child(
                Element::new("sx:templ-acct")
                    .with_attr("type", "guid")
                    .with_text("f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0"),
            );
        let sx = ScheduledTransaction::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(sx.name, "Rent");
        assert!(sx.enabled);
        assert_eq!(sx.start, NaiveDate::from_ymd_opt(2023, 1, 1));
        assert!(sx.template_account.is_some());
        assert!(sx.last.is_none());
    }

    #[test]
    fn budget_periods() {
        let el = Element::new("gnc:budget")
            .with_child(
                Element::new("bgt:id")
                    .with_attr("type", "guid")
                    .with_text("1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e"),
            )
            .with_child(Element::new("bgt:name").with_text("2023"))
            .with_child(Element::new("bgt:num-periods").with_text("12"));
        let b = Budget::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(b.num_periods, Some(12));
    }
}
