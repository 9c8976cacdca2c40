//! In-place mutation of a loaded book.
//!
//! Every operation updates the typed entity and its backing element together
//! and marks the book modified. Unknown IDs are rejected with
//! [`BookError::NotFound`] before anything changes.

use gcx_types::kind::PRICE_TAG;
use gcx_types::numeric::format_numeric;
use gcx_types::time::{format_timestamp, Timestamp};
use gcx_types::{BookElementKind, CmdtyCurrId, Decimal, Guid};
use gcx_xml::{Element, Node};
use tracing::{debug, info};

use crate::book::Book;
use crate::counts::{count_type, increment};
use crate::entities::{ElementRef, Price};
use crate::error::{BookError, BookResult};
use crate::fields::commodity_element;
use crate::slots::{entity_slots, set_string_slot};

/// A new price record.
#[derive(Clone, Debug, PartialEq)]
pub struct NewPrice {
    pub commodity: CmdtyCurrId,
    pub currency: CmdtyCurrId,
    pub time: Timestamp,
    pub value: Decimal,
    pub source: Option<String>,
    pub price_type: Option<String>,
}

pub struct BookEditor<'a> {
    book: &'a mut Book,
}

impl<'a> BookEditor<'a> {
    pub(crate) fn new(book: &'a mut Book) -> Self {
        Self { book }
    }

    // ---------------------------------------------------------------
    // Accounts
    // ---------------------------------------------------------------

    pub fn set_account_name(&mut self, id: &Guid, name: &str) -> BookResult<()> {
        let origin = self.account_origin(id)?;
        set_field(self.element(origin)?, "act:name", name, &["act:id"]);
        if let Some(account) = self.book.index.accounts.get_mut(id) {
            account.name = name.to_string();
        }
        self.touch("account renamed", id);
        Ok(())
    }

    pub fn set_account_description(&mut self, id: &Guid, description: &str) -> BookResult<()> {
        let origin = self.account_origin(id)?;
        set_field(
            self.element(origin)?,
            "act:description",
            description,
            &["act:slots", "act:parent"],
        );
        if let Some(account) = self.book.index.accounts.get_mut(id) {
            account.description = Some(description.to_string()).filter(|d| !d.is_empty());
        }
        self.touch("account description set", id);
        Ok(())
    }

    pub fn set_account_slot(&mut self, id: &Guid, path: &str, value: &str) -> BookResult<()> {
        let origin = self.account_origin(id)?;
        let el = self.element(origin)?;
        let slots = set_slot(el, "act:slots", &["act:parent"], path, value);
        if let Some(account) = self.book.index.accounts.get_mut(id) {
            account.slots = slots;
        }
        self.touch("account slot set", id);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Transactions
    // ---------------------------------------------------------------

    pub fn set_transaction_description(&mut self, id: &Guid, description: &str) -> BookResult<()> {
        let origin = self.transaction_origin(id)?;
        set_field(
            self.element(origin)?,
            "trn:description",
            description,
            &["trn:slots", "trn:splits"],
        );
        if let Some(txn) = self.book.index.transactions.get_mut(id) {
            txn.description = description.to_string();
        }
        self.touch("transaction description set", id);
        Ok(())
    }

    pub fn set_transaction_slot(&mut self, id: &Guid, path: &str, value: &str) -> BookResult<()> {
        let origin = self.transaction_origin(id)?;
        let el = self.element(origin)?;
        let slots = set_slot(el, "trn:slots", &["trn:splits"], path, value);
        if let Some(txn) = self.book.index.transactions.get_mut(id) {
            txn.slots = slots;
        }
        self.touch("transaction slot set", id);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Invoices
    // ---------------------------------------------------------------

    pub fn set_invoice_notes(&mut self, id: &Guid, notes: &str) -> BookResult<()> {
        let origin = self.invoice_origin(id)?;
        set_field(
            self.element(origin)?,
            "invoice:notes",
            notes,
            &[
                "invoice:active",
                "invoice:posttxn",
                "invoice:postlot",
                "invoice:postacc",
                "invoice:currency",
                "invoice:slots",
            ],
        );
        if let Some(invoice) = self.book.index.invoices.get_mut(id) {
            invoice.notes = Some(notes.to_string()).filter(|n| !n.is_empty());
        }
        self.touch("invoice notes set", id);
        Ok(())
    }

    pub fn set_invoice_slot(&mut self, id: &Guid, path: &str, value: &str) -> BookResult<()> {
        let origin = self.invoice_origin(id)?;
        let el = self.element(origin)?;
        let slots = set_slot(el, "invoice:slots", &[], path, value);
        if let Some(invoice) = self.book.index.invoices.get_mut(id) {
            invoice.slots = slots;
        }
        self.touch("invoice slot set", id);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Prices
    // ---------------------------------------------------------------

    /// Append a price to the price database, creating the database when the
    /// book has none. The currency table is marked stale.
    pub fn add_price(&mut self, price: NewPrice) -> BookResult<Guid> {
        let id = Guid::new_random();
        let mut el = Element::new(PRICE_TAG)
            .with_child(
                Element::new("price:id")
                    .with_attr("type", "guid")
                    .with_text(id.to_hex()),
            )
            .with_child(commodity_element("price:commodity", &price.commodity))
            .with_child(commodity_element("price:currency", &price.currency))
            .with_child(
                Element::new("price:time")
                    .with_child(Element::new("ts:date").with_text(format_timestamp(&price.time))),
            );
        if let Some(source) = &price.source {
            el.push_child(Element::new("price:source").with_text(source.as_str()));
        }
        if let Some(ty) = &price.price_type {
            el.push_child(Element::new("price:type").with_text(ty.as_str()));
        }
        el.push_child(Element::new("price:value").with_text(format_numeric(price.value)));

        let db_pos = self.price_db_position();
        let origin = ElementRef::Nested {
            parent: db_pos,
            pos: self.book.elements[db_pos].elements().count(),
        };
        let entity = Price::from_element(&el, origin)?;
        self.book.index.prices.insert(entity)?;
        self.book.elements[db_pos].push_child(el);

        if let Some(ty) = count_type(BookElementKind::Price) {
            increment(&mut self.book.header, ty);
        }
        self.book.currency.invalidate();
        self.touch("price added", &id);
        Ok(id)
    }

    pub fn set_price_value(&mut self, id: &Guid, value: Decimal) -> BookResult<()> {
        let origin = self.book.index.prices.get(id).map(|p| p.origin).ok_or_else(|| not_found("price", id))?;
        set_field(self.element(origin)?, "price:value", &format_numeric(value), &[]);
        if let Some(price) = self.book.index.prices.get_mut(id) {
            price.value = Some(value);
        }
        self.book.currency.invalidate();
        self.touch("price value set", id);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    fn account_origin(&self, id: &Guid) -> BookResult<ElementRef> {
        self.book
            .index
            .accounts
            .get(id)
            .map(|a| a.origin)
            .ok_or_else(|| not_found("account", id))
    }

    fn transaction_origin(&self, id: &Guid) -> BookResult<ElementRef> {
        self.book
            .index
            .transactions
            .get(id)
            .map(|t| t.origin)
            .ok_or_else(|| not_found("transaction", id))
    }

    fn invoice_origin(&self, id: &Guid) -> BookResult<ElementRef> {
        self.book
            .index
            .invoices
            .get(id)
            .map(|i| i.origin)
            .ok_or_else(|| not_found("invoice", id))
    }

    fn element(&mut self, origin: ElementRef) -> BookResult<&mut Element> {
        self.book.element_mut(origin).ok_or_else(|| BookError::NotFound {
            kind: "element",
            id: format!("{origin:?}"),
        })
    }

    fn price_db_position(&mut self) -> usize {
        let tag = BookElementKind::PriceDb.tag();
        if let Some(pos) = self.book.elements.iter().position(|el| el.name == tag) {
            return pos;
        }
        debug!("creating price database");
        self.book
            .elements
            .push(Element::new(tag).with_attr("version", "1"));
        self.book.elements.len() - 1
    }

    fn touch(&mut self, what: &str, id: &Guid) {
        self.book.modified = true;
        info!(id = %id, "{what}");
    }
}

fn not_found(kind: &'static str, id: &Guid) -> BookError {
    BookError::NotFound {
        kind,
        id: id.to_hex(),
    }
}

/// Set the text of child `tag`, inserting it before the first of `before`
/// (or at the end) when it does not exist yet.
fn set_field(el: &mut Element, tag: &str, text: &str, before: &[&str]) {
    if let Some(child) = el.child_mut(tag) {
        child.set_text(text);
        return;
    }
    insert_child(el, Element::new(tag).with_text(text), before);
}

fn insert_child(el: &mut Element, child: Element, before: &[&str]) {
    let at = el.children.iter().position(|node| match node {
        Node::Element(e) => before.contains(&e.name.as_str()),
        Node::Text(_) => false,
    });
    match at {
        Some(i) => el.children.insert(i, Node::Element(child)),
        None => el.children.push(Node::Element(child)),
    }
}

/// Write a string slot into the `slots_tag` container, creating it if needed,
/// and return the re-read slot list.
fn set_slot(el: &mut Element, slots_tag: &str, before: &[&str], path: &str, value: &str) -> Vec<gcx_types::Slot> {
    if el.child(slots_tag).is_none() {
        insert_child(el, Element::new(slots_tag), before);
    }
    if let Some(container) = el.child_mut(slots_tag) {
        set_string_slot(container, path, value);
    }
    entity_slots(el, slots_tag)
}
