use gcx_types::time::Timestamp;
use gcx_types::{CmdtyCurrId, Decimal, Guid, Slot};
use gcx_xml::Element;
use serde::Serialize;

use super::{ElementRef, Entity, OwnerRef};
use crate::error::{EntityError, EntityResult};
use crate::fields::Fields;
use crate::slots::entity_slots;

/// An invoice, bill, or expense voucher. Which one depends on the owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Invoice {
    pub guid: Guid,
    /// User-visible invoice number.
    pub id: String,
    pub owner: OwnerRef,
    pub opened: Option<Timestamp>,
    pub posted: Option<Timestamp>,
    pub billing_id: Option<String>,
    pub notes: Option<String>,
    pub active: bool,
    pub post_txn: Option<Guid>,
    pub post_lot: Option<Guid>,
    pub post_account: Option<Guid>,
    pub currency: Option<CmdtyCurrId>,
    pub terms: Option<Guid>,
    pub slots: Vec<Slot>,
    /// Entries linked during load, in document order.
    pub entries: Vec<Guid>,
    pub origin: ElementRef,
}

impl Invoice {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            guid: f.required_guid("invoice:guid")?,
            id: f.required_text("invoice:id")?,
            owner: f
                .owner("invoice:owner")?
                .ok_or_else(|| EntityError::missing("invoice:owner"))?,
            opened: f.timestamp("invoice:opened")?,
            posted: f.timestamp("invoice:posted")?,
            billing_id: f.text("invoice:billing_id"),
            notes: f.text("invoice:notes"),
            active: f.flag("invoice:active")?.unwrap_or(true),
            post_txn: f.guid("invoice:posttxn")?,
            post_lot: f.guid("invoice:postlot")?,
            post_account: f.guid("invoice:postacc")?,
            currency: f.commodity("invoice:currency")?,
            terms: f.guid("invoice:terms")?,
            slots: entity_slots(el, "invoice:slots"),
            entries: Vec::new(),
            origin,
        })
    }

    pub fn is_posted(&self) -> bool {
        self.post_txn.is_some()
    }
}

impl Entity for Invoice {
    const NAME: &'static str = "invoice";

    fn guid(&self) -> Guid {
        self.guid
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}

/// Which half of an entry's terms applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EntryRole {
    /// Customer invoices use the `i-*` fields.
    Invoice,
    /// Vendor bills and employee vouchers use the `b-*` fields.
    Bill,
}

/// Pricing and tax terms of one side of an entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EntryTerms {
    pub account: Option<Guid>,
    pub price: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub discount_type: Option<String>,
    pub discount_how: Option<String>,
    pub taxable: bool,
    pub tax_included: bool,
    pub tax_table: Option<Guid>,
}

impl EntryTerms {
    fn read(f: &Fields<'_>, prefix: &str) -> EntityResult<Option<Self>> {
        let tag = |name: &str| format!("entry:{prefix}-{name}");
        let terms = Self {
            account: f.guid(&tag("acct"))?,
            price: f.numeric(&tag("price"))?,
            discount: f.numeric(&tag("discount"))?,
            discount_type: f.text(&tag("disc-type")),
            discount_how: f.text(&tag("disc-how")),
            taxable: f.flag(&tag("taxable"))?.unwrap_or(false),
            tax_included: f.flag(&tag("taxincluded"))?.unwrap_or(false),
            tax_table: f.guid(&tag("taxtable"))?,
        };
        let present = terms.account.is_some() || terms.price.is_some();
        Ok(present.then_some(terms))
    }
}

/// One line of an invoice or bill.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Entry {
    pub guid: Guid,
    pub date: Option<Timestamp>,
    pub entered: Option<Timestamp>,
    pub description: Option<String>,
    pub action: Option<String>,
    pub notes: Option<String>,
    pub quantity: Decimal,
    pub invoice: Option<Guid>,
    pub bill: Option<Guid>,
    pub invoice_terms: Option<EntryTerms>,
    pub bill_terms: Option<EntryTerms>,
    pub billable: bool,
    pub bill_payment: Option<String>,
    pub origin: ElementRef,
}

impl Entry {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            guid: f.required_guid("entry:guid")?,
            date: f.timestamp("entry:date")?,
            entered: f.timestamp("entry:entered")?,
            description: f.text("entry:description"),
            action: f.text("entry:action"),
            notes: f.text("entry:notes"),
            quantity: f.numeric("entry:qty")?.unwrap_or(Decimal::ZERO),
            invoice: f.guid("entry:invoice")?,
            bill: f.guid("entry:bill")?,
            invoice_terms: EntryTerms::read(&f, "i")?,
            bill_terms: EntryTerms::read(&f, "b")?,
            billable: f.flag("entry:billable")?.unwrap_or(false),
            bill_payment: f.text("entry:b-pay"),
            origin,
        })
    }

    /// The invoice or bill this entry belongs to.
    pub fn parent_document(&self) -> Option<Guid> {
        self.invoice.or(self.bill)
    }

    pub fn terms_for(&self, role: EntryRole) -> Option<&EntryTerms> {
        match role {
            EntryRole::Invoice => self.invoice_terms.as_ref(),
            EntryRole::Bill => self.bill_terms.as_ref(),
        }
    }

    /// Quantity times the role's unit price, before discount and tax.
    pub fn subtotal(&self, role: EntryRole) -> Option<Decimal> {
        let price = self.terms_for(role)?.price?;
        self.quantity.checked_mul(price)
    }
}

impl Entity for Entry {
    const NAME: &'static str = "entry";

    fn guid(&self) -> Guid {
        self.guid
    }

    fn origin(&self) -> ElementRef {
        self.origin
    }
}
