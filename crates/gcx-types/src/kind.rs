use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag of the document root.
pub const ROOT_TAG: &str = "gnc-v2";
/// Tag of the single book below the root.
pub const BOOK_TAG: &str = "gnc:book";
/// Tag of a price record inside the price database.
pub const PRICE_TAG: &str = "price";

/// The closed set of top-level book element types.
///
/// Every child of `gnc:book` that is not part of the book header must map to
/// one of these; anything else is a structural violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BookElementKind {
    Commodity,
    PriceDb,
    Account,
    Budget,
    Transaction,
    TemplateTransactions,
    SchedXaction,
    Job,
    TaxTable,
    Invoice,
    Customer,
    Employee,
    Entry,
    BillTerm,
    Vendor,
    Price,
}

impl BookElementKind {
    pub const ALL: [BookElementKind; 16] = [
        Self::Commodity,
        Self::PriceDb,
        Self::Account,
        Self::Budget,
        Self::Transaction,
        Self::TemplateTransactions,
        Self::SchedXaction,
        Self::Job,
        Self::TaxTable,
        Self::Invoice,
        Self::Customer,
        Self::Employee,
        Self::Entry,
        Self::BillTerm,
        Self::Vendor,
        Self::Price,
    ];

    /// Element tag in the file.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Commodity => "gnc:commodity",
            Self::PriceDb => "gnc:pricedb",
            Self::Account => "gnc:account",
            Self::Budget => "gnc:budget",
            Self::Transaction => "gnc:transaction",
            Self::TemplateTransactions => "gnc:template-transactions",
            Self::SchedXaction => "gnc:schedxaction",
            Self::Job => "gnc:GncJob",
            Self::TaxTable => "gnc:GncTaxTable",
            Self::Invoice => "gnc:GncInvoice",
            Self::Customer => "gnc:GncCustomer",
            Self::Employee => "gnc:GncEmployee",
            Self::Entry => "gnc:GncEntry",
            Self::BillTerm => "gnc:GncBillTerm",
            Self::Vendor => "gnc:GncVendor",
            Self::Price => PRICE_TAG,
        }
    }

    /// Classify a tag. Returns `None` for anything outside the closed set.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for BookElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Book children that precede the element list: identity, slots, and the
/// informational per-type counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderKind {
    BookId,
    BookSlots,
    CountData,
}

impl HeaderKind {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::BookId => "book:id",
            Self::BookSlots => "book:slots",
            Self::CountData => "gnc:count-data",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "book:id" => Some(Self::BookId),
            "book:slots" => Some(Self::BookSlots),
            "gnc:count-data" => Some(Self::CountData),
            _ => None,
        }
    }
}
