use gcx_types::time::Timestamp;
use gcx_types::{CmdtyCurrId, Decimal, Guid, Slot};
use gcx_xml::Element;
use serde::Serialize;
use tracing::warn;

use super::{ElementRef, Entity};
use crate::error::EntityResult;
use crate::fields::Fields;
use crate::slots::{entity_slots, find_slot};

/// Slot path linking a posting transaction to its invoice.
pub const INVOICE_SLOT_PATH: &str = "gncInvoice/invoice-guid";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Split {
    pub id: Guid,
    pub memo: Option<String>,
    pub action: Option<String>,
    pub reconciled_state: Option<String>,
    /// Amount in the transaction currency.
    pub value: Decimal,
    /// Amount in the account commodity.
    pub quantity: Decimal,
    pub account: Guid,
    pub lot: Option<Guid>,
    pub slots: Vec<Slot>,
}

impl Split {
    pub fn from_element(el: &Element) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            id: f.required_guid("split:id")?,
            memo: f.text("split:memo"),
            action: f.text("split:action"),
            reconciled_state: f.text("split:reconciled-state"),
            value: f.required_numeric("split:value")?,
            quantity: f.required_numeric("split:quantity")?,
            account: f.required_guid("split:account")?,
            lot: f.guid("split:lot")?,
            slots: entity_slots(el, "split:slots"),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transaction {
    pub id: Guid,
    pub currency: CmdtyCurrId,
    pub num: Option<String>,
    pub date_posted: Timestamp,
    pub date_entered: Option<Timestamp>,
    pub description: String,
    pub slots: Vec<Slot>,
    pub splits: Vec<Split>,
    /// Invoice this transaction posts, from the `gncInvoice` slot frame.
    pub invoice: Option<Guid>,
    pub origin: ElementRef,
}

impl Transaction {
    /// Build the transaction. A malformed split is dropped with a warning;
    /// the rest of the transaction survives.
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        let id = f.required_guid("trn:id")?;
        let currency = f
            .commodity("trn:currency")?
            .ok_or_else(|| crate::error::EntityError::missing("trn:currency"))?;

        let mut splits = Vec::new();
        if let Some(list) = el.child("trn:splits") {
            for (pos, split_el) in list.children_named("trn:split").enumerate() {
                match Split::from_element(split_el) {
                    Ok(split) => splits.push(split),
                    Err(err) => warn!(txn = %id, pos, error = %err, "skipping malformed split"),
                }
            }
        }

        let slots = entity_slots(el, "trn:slots");
        let invoice = find_slot(&slots, INVOICE_SLOT_PATH).and_then(|v| v.as_guid());

        Ok(Self {
            id,
            currency,
            num: f.text("trn:num"),
            date_posted: f.required_timestamp("trn:date-posted")?,
            date_entered: f.timestamp("trn:date-entered")?,
            description: f.text("trn:description").unwrap_or_default(),
            slots,
            splits,
            invoice,
            origin,
        })
    }

    pub fn split(&self, id: &Guid) -> Option<&Split> {
        self.splits.iter().find(|s| &s.id == id)
    }

    /// Sum of split values; zero for a balanced transaction.
    pub fn imbalance(&self) -> Decimal {
        self.splits.iter().map(|s| s.value).sum()
    }
}

impl Entity for Transaction {
    const NAME: &'static str = "transaction";

    fn guid(&self) -> Guid {
        self.id
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}
