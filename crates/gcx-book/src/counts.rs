//! Declared per-type counts (`gnc:count-data`).
//!
//! Counts are informational. Loading compares them against what was indexed
//! and reports differences; nothing is rejected because of them.

use std::collections::BTreeMap;

use gcx_types::kind::PRICE_TAG;
use gcx_types::{BookElementKind, HeaderKind};
use gcx_xml::{Element, Node};
use serde::Serialize;
use tracing::warn;

use crate::index::EntityIndex;

pub const COUNT_TYPE_ATTR: &str = "cd:type";

/// Declared counts keyed by `cd:type`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CountData {
    counts: BTreeMap<String, u64>,
}

impl CountData {
    /// Collect every `gnc:count-data` element among `elements`. Unreadable
    /// records are logged and ignored.
    pub fn from_elements<'a, I>(elements: I) -> Self
    where
        I: IntoIterator<Item = &'a Element>,
    {
        let mut counts = BTreeMap::new();
        for el in elements {
            if el.name != HeaderKind::CountData.tag() {
                continue;
            }
            let Some(ty) = el.attr(COUNT_TYPE_ATTR) else {
                warn!("count-data without cd:type");
                continue;
            };
            match el.text().trim().parse::<u64>() {
                Ok(n) => {
                    counts.entry(ty.to_string()).or_insert(n);
                }
                Err(_) => warn!(cd_type = ty, value = el.text(), "unreadable count-data"),
            }
        }
        Self { counts }
    }

    pub fn get(&self, ty: &str) -> Option<u64> {
        self.counts.get(ty).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// Count-data type name for entities of `kind`, if the file declares counts
/// for that kind at all.
pub fn count_type(kind: BookElementKind) -> Option<&'static str> {
    use BookElementKind::*;
    match kind {
        Commodity => Some("commodity"),
        Account => Some("account"),
        Transaction => Some("transaction"),
        SchedXaction => Some("schedxaction"),
        Budget => Some("budget"),
        Price => Some(PRICE_TAG),
        Job | TaxTable | Invoice | Customer | Employee | Entry | BillTerm | Vendor => Some(kind.tag()),
        PriceDb | TemplateTransactions => None,
    }
}

/// Number of indexed entities per count-data type.
pub fn indexed_counts(index: &EntityIndex) -> BTreeMap<&'static str, usize> {
    use BookElementKind::*;
    let mut out = BTreeMap::new();
    let mut put = |kind: BookElementKind, n: usize| {
        if let Some(ty) = count_type(kind) {
            out.insert(ty, n);
        }
    };
    put(Commodity, index.commodities.len());
    put(Account, index.accounts.len());
    put(Transaction, index.transactions.len());
    put(SchedXaction, index.scheduled.len());
    put(Budget, index.budgets.len());
    put(Price, index.prices.len());
    put(Job, index.jobs.len());
    put(TaxTable, index.tax_tables.len());
    put(Invoice, index.invoices.len());
    put(Customer, index.customers.len());
    put(Employee, index.employees.len());
    put(Entry, index.entries.len());
    put(BillTerm, index.bill_terms.len());
    put(Vendor, index.vendors.len());
    out
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CountMismatch {
    pub cd_type: String,
    pub declared: u64,
    pub indexed: usize,
}

/// Declared counts that disagree with the index. Types the index does not
/// track (`book`) are not compared.
pub fn compare(declared: &CountData, index: &EntityIndex) -> Vec<CountMismatch> {
    let indexed = indexed_counts(index);
    let mut mismatches = Vec::new();
    for (ty, n) in declared.iter() {
        let Some(&have) = indexed.get(ty) else {
            continue;
        };
        if have as u64 != n {
            warn!(cd_type = ty, declared = n, indexed = have, "count-data mismatch");
            mismatches.push(CountMismatch {
                cd_type: ty.to_string(),
                declared: n,
                indexed: have,
            });
        }
    }
    mismatches
}

/// Add one to the declared count for `ty` in a book header. A missing record
/// is created after the last existing count-data, or at the end.
pub fn increment(header: &mut Vec<Element>, ty: &str) {
    let tag = HeaderKind::CountData.tag();
    if let Some(el) = header
        .iter_mut()
        .find(|el| el.name == tag && el.attr(COUNT_TYPE_ATTR) == Some(ty))
    {
        let next = el.text().trim().parse::<u64>().unwrap_or(0) + 1;
        el.children = vec![Node::Text(next.to_string())];
        return;
    }
    let record = Element::new(tag).with_attr(COUNT_TYPE_ATTR, ty).with_text("1");
    match header.iter().rposition(|el| el.name == tag) {
        Some(last) => header.insert(last + 1, record),
        None => header.push(record),
    }
}
