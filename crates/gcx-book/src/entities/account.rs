use std::fmt;

use gcx_types::{CmdtyCurrId, Guid, Slot};
use gcx_xml::Element;
use serde::Serialize;

use super::{ElementRef, Entity};
use crate::error::EntityResult;
use crate::fields::Fields;
use crate::slots::entity_slots;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AccountType {
    Root,
    Bank,
    Cash,
    Credit,
    Asset,
    Liability,
    Stock,
    Mutual,
    Currency,
    Income,
    Expense,
    Equity,
    Receivable,
    Payable,
    Trading,
    Other(String),
}

impl AccountType {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "ROOT" => Self::Root,
            "BANK" => Self::Bank,
            "CASH" => Self::Cash,
            "CREDIT" => Self::Credit,
            "ASSET" => Self::Asset,
            "LIABILITY" => Self::Liability,
            "STOCK" => Self::Stock,
            "MUTUAL" => Self::Mutual,
            "CURRENCY" => Self::Currency,
            "INCOME" => Self::Income,
            "EXPENSE" => Self::Expense,
            "EQUITY" => Self::Equity,
            "RECEIVABLE" => Self::Receivable,
            "PAYABLE" => Self::Payable,
            "TRADING" => Self::Trading,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Root => "ROOT",
            Self::Bank => "BANK",
            Self::Cash => "CASH",
            Self::Credit => "CREDIT",
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Stock => "STOCK",
            Self::Mutual => "MUTUAL",
            Self::Currency => "CURRENCY",
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
            Self::Equity => "EQUITY",
            Self::Receivable => "RECEIVABLE",
            Self::Payable => "PAYABLE",
            Self::Trading => "TRADING",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Account {
    pub id: Guid,
    pub name: String,
    pub account_type: AccountType,
    pub commodity: Option<CmdtyCurrId>,
    pub commodity_scu: Option<i64>,
    pub code: Option<String>,
    pub description: Option<String>,
    /// `None` for the root account (and for accounts whose parent is lost).
    pub parent: Option<Guid>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Account {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            id: f.required_guid("act:id")?,
            name: f.required_text("act:name")?,
            account_type: AccountType::parse(&f.required_text("act:type")?),
            commodity: f.commodity("act:commodity")?,
            commodity_scu: f.integer("act:commodity-scu")?,
            code: f.text("act:code"),
            description: f.text("act:description"),
            parent: f.guid("act:parent")?,
            slots: entity_slots(el, "act:slots"),
            origin,
        })
    }

    pub fn is_root(&self) -> bool {
        self.account_type == AccountType::Root
    }
}

impl Entity for Account {
    const NAME: &'static str = "account";

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
    use crate::error::EntityError;
    use crate::fields::commodity_element;

    const ID: &str = "1111111111111111111111111111AAAA";

    fn checking() -> Element {
        Element::new("gnc:account")
            .with_attr("version", "2.0.0")
            .with_child(Element::new("act:name").with_text("Checking"))
            .with_child(Element::new("act:id").with_attr("type", "guid").with_text(ID))
            .with_child(Element::new("act:type").with_text("BANK"))
            .with_child(commodity_element("act:commodity", &CmdtyCurrId::currency("EUR")))
            .with_child(Element::new("act:commodity-scu").with_text("100"))
            .with_child(
                Element::new("act:parent")
                    .with_attr("type", "guid")
                    .with_text("00000000000000000000000000000001"),
            )
    }

    #[test]
    fn parses_account() {
        let a = Account::from_element(&checking(), ElementRef::Book(2)).unwrap();
        assert_eq!(a.name, "Checking");
        assert_eq!(a.id, Guid::parse(ID).unwrap());
        assert_eq!(a.account_type, AccountType::Bank);
        assert_eq!(a.commodity, Some(CmdtyCurrId::currency("EUR")));
        assert_eq!(a.commodity_scu, Some(100));
        assert!(a.parent.is_some());
        assert_eq!(a.guid(), a.id);
    }

    #[test]
    fn unknown_type_is_kept() {
        assert_eq!(AccountType::parse("SAVINGS"), AccountType::Other("SAVINGS".into()));
        assert_eq!(AccountType::parse("SAVINGS").as_str(), "SAVINGS");
    }

    #[test]
    fn missing_name_is_an_entity_error() {
        let mut el = checking();
        el.remove_children_named("act:name");
        assert!(matches!(
            Account::from_element(&el, ElementRef::Book(0)),
            Err(EntityError::MissingField { field }) if field == "act:name"
        ));
    }

    #[test]
    fn bad_parent_guid_is_an_entity_error() {
        let mut el = checking();
        el.set_child_text("act:parent", "not-a-guid");
        assert!(matches!(
            Account::from_element(&el, ElementRef::Book(0)),
            Err(EntityError::InvalidField { .. })
        ));
    }
}
