//! Load pipeline: book elements in, populated [`EntityIndex`] out.
//!
//! Every element is classified before anything is built, so an unknown
//! top-level tag aborts the load without side effects. Entities are then
//! built stage by stage in dependency order. A malformed entity is logged,
//! recorded in the [`LoadReport`], and skipped.

use gcx_types::kind::PRICE_TAG;
use gcx_types::{BookElementKind, Guid};
use gcx_xml::Element;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::counts::{compare, CountData, CountMismatch};
use crate::entities::{
    Account, BillTerm, Budget, Commodity, Customer, ElementRef, Employee, Entity, Entry, Invoice,
    Job, OwnerKind, OwnerRef, Price, ScheduledTransaction, TaxTable, Transaction, Vendor,
};
use crate::error::{BookError, BookResult, EntityError, EntityResult};
use crate::index::EntityIndex;

/// Load stages. Later stages may refer to entities of earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LoadStage {
    Commodities,
    Accounts,
    Invoices,
    Entries,
    Transactions,
    Parties,
    Jobs,
    Terms,
    Prices,
    Schedules,
}

impl LoadStage {
    pub const ORDER: [LoadStage; 10] = [
        Self::Commodities,
        Self::Accounts,
        Self::Invoices,
        Self::Entries,
        Self::Transactions,
        Self::Parties,
        Self::Jobs,
        Self::Terms,
        Self::Prices,
        Self::Schedules,
    ];

    /// Element kinds handled by this stage.
    pub fn kinds(&self) -> &'static [BookElementKind] {
        use BookElementKind as K;
        match self {
            Self::Commodities => &[K::Commodity],
            Self::Accounts => &[K::Account],
            Self::Invoices => &[K::Invoice],
            Self::Entries => &[K::Entry],
            Self::Transactions => &[K::Transaction],
            Self::Parties => &[K::Customer, K::Vendor, K::Employee],
            Self::Jobs => &[K::Job],
            Self::Terms => &[K::TaxTable, K::BillTerm],
            Self::Prices => &[K::PriceDb, K::Price],
            Self::Schedules => &[K::Budget, K::SchedXaction, K::TemplateTransactions],
        }
    }
}

/// An entity that could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedEntity {
    pub kind: BookElementKind,
    pub origin: ElementRef,
    pub reason: String,
}

/// An ID reference that does not resolve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LookupMiss {
    /// Type of the referring entity.
    pub from: &'static str,
    pub id: Guid,
    /// Referring field.
    pub field: &'static str,
    pub target: Guid,
}

/// Everything noteworthy that happened while loading, none of it fatal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub skipped: Vec<SkippedEntity>,
    pub lookup_misses: Vec<LookupMiss>,
    pub count_mismatches: Vec<CountMismatch>,
    /// Price records lacking a side, date, or value.
    pub unusable_prices: usize,
    pub commodities_without_xcode: usize,
    /// The commodity maps differ by more than currencies without an x-code.
    pub commodity_map_divergent: bool,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self.lookup_misses.is_empty()
            && self.count_mismatches.is_empty()
            && self.unusable_prices == 0
            && !self.commodity_map_divergent
    }
}

/// Classify `elements`, failing on the first unknown tag.
pub fn classify(elements: &[Element]) -> BookResult<Vec<BookElementKind>> {
    elements
        .iter()
        .map(|el| {
            BookElementKind::from_tag(&el.name).ok_or_else(|| BookError::StructuralViolation {
                tag: el.name.clone(),
            })
        })
        .collect()
}

pub struct LoadPipeline<'a> {
    elements: &'a [Element],
    index: EntityIndex,
    report: LoadReport,
}

impl<'a> LoadPipeline<'a> {
    pub fn new(elements: &'a [Element]) -> Self {
        Self {
            elements,
            index: EntityIndex::new(),
            report: LoadReport::default(),
        }
    }

    /// Build the index. `declared` are the book's count-data records.
    pub fn run(mut self, declared: &CountData) -> BookResult<(EntityIndex, LoadReport)> {
        let kinds = classify(self.elements)?;

        for stage in LoadStage::ORDER {
            let wanted = stage.kinds();
            let mut handled = 0usize;
            for (pos, kind) in kinds.iter().enumerate() {
                if !wanted.contains(kind) {
                    continue;
                }
                self.load_element(pos, *kind);
                handled += 1;
            }
            debug!(stage = ?stage, elements = handled, "load stage done");
        }

        self.check_references();
        self.check_commodity_maps();
        self.report.unusable_prices = self.index.prices.iter().filter(|p| p.quote().is_err()).count();
        self.report.count_mismatches = compare(declared, &self.index);

        info!(
            commodities = self.index.commodities.len(),
            accounts = self.index.accounts.len(),
            transactions = self.index.transactions.len(),
            prices = self.index.prices.len(),
            invoices = self.index.invoices.len(),
            skipped = self.report.skipped.len(),
            lookup_misses = self.report.lookup_misses.len(),
            "book loaded"
        );
        Ok((self.index, self.report))
    }

    // ---------------------------------------------------------------
    // Entity construction
    // ---------------------------------------------------------------

    fn load_element(&mut self, pos: usize, kind: BookElementKind) {
        let elements = self.elements;
        let el = &elements[pos];
        let origin = ElementRef::Book(pos);
        use BookElementKind as K;
        match kind {
            K::Commodity => {
                if let Some(c) = self.build(kind, origin, Commodity::from_element(el, origin)) {
                    let result = self.index.insert_commodity(c);
                    self.note(kind, origin, result);
                }
            }
            K::Account => {
                if let Some(a) = self.build(kind, origin, Account::from_element(el, origin)) {
                    let result = self.index.accounts.insert(a);
                    self.note(kind, origin, result);
                }
            }
            K::Invoice => {
                if let Some(i) = self.build(kind, origin, Invoice::from_element(el, origin)) {
                    let result = self.index.invoices.insert(i);
                    self.note(kind, origin, result);
                }
            }
            K::Entry => {
                if let Some(e) = self.build(kind, origin, Entry::from_element(el, origin)) {
                    self.admit_entry(kind, origin, e);
                }
            }
            K::Transaction => {
                if let Some(t) = self.build(kind, origin, Transaction::from_element(el, origin)) {
                    let result = self.index.insert_transaction(t);
                    self.note(kind, origin, result);
                }
            }
            K::Customer => {
                if let Some(c) = self.build(kind, origin, Customer::from_element(el, origin)) {
                    let result = self.index.customers.insert(c);
                    self.note(kind, origin, result);
                }
            }
            K::Vendor => {
                if let Some(v) = self.build(kind, origin, Vendor::from_element(el, origin)) {
                    let result = self.index.vendors.insert(v);
                    self.note(kind, origin, result);
                }
            }
            K::Employee => {
                if let Some(e) = self.build(kind, origin, Employee::from_element(el, origin)) {
                    let result = self.index.employees.insert(e);
                    self.note(kind, origin, result);
                }
            }
            K::Job => {
                if let Some(j) = self.build(kind, origin, Job::from_element(el, origin)) {
                    let result = self.index.jobs.insert(j);
                    self.note(kind, origin, result);
                }
            }
            K::TaxTable => {
                if let Some(t) = self.build(kind, origin, TaxTable::from_element(el, origin)) {
                    let result = self.index.tax_tables.insert(t);
                    self.note(kind, origin, result);
                }
            }
            K::BillTerm => {
                if let Some(b) = self.build(kind, origin, BillTerm::from_element(el, origin)) {
                    let result = self.index.bill_terms.insert(b);
                    self.note(kind, origin, result);
                }
            }
            K::Budget => {
                if let Some(b) = self.build(kind, origin, Budget::from_element(el, origin)) {
                    let result = self.index.budgets.insert(b);
                    self.note(kind, origin, result);
                }
            }
            K::SchedXaction => {
                let built = ScheduledTransaction::from_element(el, origin);
                if let Some(sx) = self.build(kind, origin, built) {
                    let result = self.index.scheduled.insert(sx);
                    self.note(kind, origin, result);
                }
            }
            K::Price => self.admit_price(el, origin),
            K::PriceDb => {
                for (child_pos, child) in el.elements().enumerate() {
                    let nested = ElementRef::Nested {
                        parent: pos,
                        pos: child_pos,
                    };
                    if child.name == PRICE_TAG {
                        self.admit_price(child, nested);
                    } else {
                        debug!(tag = %child.name, "ignoring non-price child of the price database");
                    }
                }
            }
            K::TemplateTransactions => self.load_templates(el, pos),
        }
    }

    fn admit_price(&mut self, el: &Element, origin: ElementRef) {
        if let Some(p) = self.build(BookElementKind::Price, origin, Price::from_element(el, origin)) {
            let result = self.index.prices.insert(p);
            self.note(BookElementKind::Price, origin, result);
        }
    }

    /// Insert an entry and attach it to the invoice or bill it belongs to.
    fn admit_entry(&mut self, kind: BookElementKind, origin: ElementRef, entry: Entry) {
        let id = entry.guid;
        let parent = entry.parent_document();
        let result = self.index.entries.insert(entry);
        if !self.note(kind, origin, result) {
            return;
        }
        let Some(doc) = parent else {
            return;
        };
        match self.index.invoices.get_mut(&doc) {
            Some(invoice) => invoice.entries.push(id),
            None => self.miss(Entry::NAME, id, "entry:invoice", doc),
        }
    }

    fn load_templates(&mut self, el: &Element, pos: usize) {
        let kind = BookElementKind::TemplateTransactions;
        for (child_pos, child) in el.elements().enumerate() {
            let origin = ElementRef::Nested {
                parent: pos,
                pos: child_pos,
            };
            match child.name.as_str() {
                "gnc:account" => {
                    if let Some(a) = self.build(kind, origin, Account::from_element(child, origin)) {
                        let result = self.index.template_accounts.insert(a);
                        self.note(kind, origin, result);
                    }
                }
                "gnc:transaction" => {
                    let built = Transaction::from_element(child, origin);
                    if let Some(t) = self.build(kind, origin, built) {
                        let result = self.index.template_transactions.insert(t);
                        self.note(kind, origin, result);
                    }
                }
                other => debug!(tag = other, "ignoring template container child"),
            }
        }
    }

    fn build<T>(&mut self, kind: BookElementKind, origin: ElementRef, built: EntityResult<T>) -> Option<T> {
        match built {
            Ok(entity) => Some(entity),
            Err(err) => {
                self.skip(kind, origin, err);
                None
            }
        }
    }

    /// Record a failed insertion. Returns whether the insertion succeeded.
    fn note(&mut self, kind: BookElementKind, origin: ElementRef, result: Result<(), EntityError>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                self.skip(kind, origin, err);
                false
            }
        }
    }

    fn skip(&mut self, kind: BookElementKind, origin: ElementRef, err: EntityError) {
        warn!(kind = %kind, origin = ?origin, error = %err, "skipping entity");
        self.report.skipped.push(SkippedEntity {
            kind,
            origin,
            reason: err.to_string(),
        });
    }

    fn miss(&mut self, from: &'static str, id: Guid, field: &'static str, target: Guid) {
        warn!(from, id = %id, field, target = %target, "reference does not resolve");
        self.report.lookup_misses.push(LookupMiss {
            from,
            id,
            field,
            target,
        });
    }

    // ---------------------------------------------------------------
    // Post-load checks
    // ---------------------------------------------------------------

    fn check_references(&mut self) {
        let mut misses = Vec::new();
        let idx = &self.index;

        for account in &idx.accounts {
            if let Some(parent) = account.parent {
                if !idx.accounts.contains(&parent) {
                    misses.push((Account::NAME, account.id, "act:parent", parent));
                }
            }
        }
        for txn in &idx.transactions {
            for split in &txn.splits {
                if !idx.accounts.contains(&split.account) {
                    misses.push(("split", split.id, "split:account", split.account));
                }
            }
            if let Some(invoice) = txn.invoice {
                if !idx.invoices.contains(&invoice) {
                    misses.push((Transaction::NAME, txn.id, "trn:slots", invoice));
                }
            }
        }
        for invoice in &idx.invoices {
            if !owner_exists(idx, &invoice.owner) {
                misses.push((Invoice::NAME, invoice.guid, "invoice:owner", invoice.owner.id));
            }
            if let Some(txn) = invoice.post_txn {
                if !idx.transactions.contains(&txn) {
                    misses.push((Invoice::NAME, invoice.guid, "invoice:posttxn", txn));
                }
            }
            if let Some(account) = invoice.post_account {
                if !idx.accounts.contains(&account) {
                    misses.push((Invoice::NAME, invoice.guid, "invoice:postacc", account));
                }
            }
        }
        for job in &idx.jobs {
            if !owner_exists(idx, &job.owner) {
                misses.push((Job::NAME, job.guid, "job:owner", job.owner.id));
            }
        }

        for (from, id, field, target) in misses {
            self.miss(from, id, field, target);
        }
    }

    fn check_commodity_maps(&mut self) {
        let by_id = self.index.commodities.len();
        let by_xcode = self.index.commodities_by_xcode.len();
        let without: Vec<&Commodity> = self
            .index
            .commodities
            .values()
            .filter(|c| c.xcode.is_none())
            .collect();
        self.report.commodities_without_xcode = without.len();
        if by_id == by_xcode {
            return;
        }
        let explained = by_id - without.len() == by_xcode && without.iter().all(|c| c.is_currency());
        if explained {
            debug!(by_id, by_xcode, "commodity maps differ by currencies without an x-code");
        } else {
            warn!(by_id, by_xcode, "commodity maps differ in size");
            self.report.commodity_map_divergent = true;
        }
    }
}

fn owner_exists(idx: &EntityIndex, owner: &OwnerRef) -> bool {
    match owner.kind {
        OwnerKind::Customer => idx.customers.contains(&owner.id),
        OwnerKind::Vendor => idx.vendors.contains(&owner.id),
        OwnerKind::Employee => idx.employees.contains(&owner.id),
        OwnerKind::Job => idx.jobs.contains(&owner.id),
    }
}
