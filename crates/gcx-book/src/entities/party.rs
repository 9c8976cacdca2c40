use gcx_types::{CmdtyCurrId, Decimal, Guid, Slot};
use gcx_xml::Element;
use serde::Serialize;

use super::{ElementRef, Entity, OwnerRef};
use crate::error::{EntityError, EntityResult};
use crate::fields::Fields;
use crate::slots::entity_slots;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub name: Option<String>,
    pub lines: Vec<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub email: Option<String>,
}

impl Address {
    fn read(el: Option<&Element>) -> Self {
        let Some(el) = el else {
            return Self::default();
        };
        let f = Fields::new(el);
        Self {
            name: f.text("addr:name"),
            lines: ["addr:addr1", "addr:addr2", "addr:addr3", "addr:addr4"]
                .iter()
                .filter_map(|tag| f.text(tag))
                .filter(|line| !line.is_empty())
                .collect(),
            phone: f.text("addr:phone"),
            fax: f.text("addr:fax"),
            email: f.text("addr:email"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Customer {
    pub guid: Guid,
    pub id: String,
    pub name: String,
    pub address: Address,
    pub ship_address: Address,
    pub notes: Option<String>,
    pub terms: Option<Guid>,
    pub tax_included: Option<String>,
    pub active: bool,
    pub discount: Option<Decimal>,
    pub credit: Option<Decimal>,
    pub currency: Option<CmdtyCurrId>,
    pub use_tax_table: bool,
    pub tax_table: Option<Guid>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Customer {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            guid: f.required_guid("cust:guid")?,
            id: f.required_text("cust:id")?,
            name: f.required_text("cust:name")?,
            address: Address::read(f.element("cust:addr")),
            ship_address: Address::read(f.element("cust:shipaddr")),
            notes: f.text("cust:notes"),
            terms: f.guid("cust:terms")?,
            tax_included: f.text("cust:taxincluded"),
            active: f.flag("cust:active")?.unwrap_or(true),
            discount: f.numeric("cust:discount")?,
            credit: f.numeric("cust:credit")?,
            currency: f.commodity("cust:currency")?,
            use_tax_table: f.flag("cust:use-tt")?.unwrap_or(false),
            tax_table: f.guid("cust:taxtable")?,
            slots: entity_slots(el, "cust:slots"),
            origin,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Vendor {
    pub guid: Guid,
    pub id: String,
    pub name: String,
    pub address: Address,
    pub notes: Option<String>,
    pub terms: Option<Guid>,
    pub tax_included: Option<String>,
    pub active: bool,
    pub currency: Option<CmdtyCurrId>,
    pub use_tax_table: bool,
    pub tax_table: Option<Guid>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Vendor {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            guid: f.required_guid("vendor:guid")?,
            id: f.required_text("vendor:id")?,
            name: f.required_text("vendor:name")?,
            address: Address::read(f.element("vendor:addr")),
            notes: f.text("vendor:notes"),
            terms: f.guid("vendor:terms")?,
            tax_included: f.text("vendor:taxincluded"),
            active: f.flag("vendor:active")?.unwrap_or(true),
            currency: f.commodity("vendor:currency")?,
            use_tax_table: f.flag("vendor:use-tt")?.unwrap_or(false),
            tax_table: f.guid("vendor:taxtable")?,
            slots: entity_slots(el, "vendor:slots"),
            origin,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Employee {
    pub guid: Guid,
    pub id: String,
    pub username: String,
    pub address: Address,
    pub language: Option<String>,
    pub active: bool,
    pub workday: Option<Decimal>,
    pub rate: Option<Decimal>,
    pub currency: Option<CmdtyCurrId>,
    pub credit_account: Option<Guid>,
    pub slots: Vec<Slot>,
    pub origin: ElementRef,
}

impl Employee {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        Ok(Self {
            guid: f.required_guid("employee:guid")?,
            id: f.required_text("employee:id")?,
            username: f.text("employee:username").unwrap_or_default(),
            address: Address::read(f.element("employee:addr")),
            language: f.text("employee:language"),
            active: f.flag("employee:active")?.unwrap_or(true),
            workday: f.numeric("employee:workday")?,
            rate: f.numeric("employee:rate")?,
            currency: f.commodity("employee:currency")?,
            credit_account: f.guid("employee:ccard")?,
            slots: entity_slots(el, "employee:slots"),
            origin,
        })
    }

    /// Employees have no separate display name; the address name is used
    /// when set.
    pub fn display_name(&self) -> &str {
        self.address.name.as_deref().unwrap_or(&self.username)
    }
}

/// A job groups invoices of one customer or bills of one vendor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Job {
    pub guid: Guid,
    pub id: String,
    pub name: String,
    pub reference: Option<String>,
    pub owner: OwnerRef,
    pub active: bool,
    pub origin: ElementRef,
}

impl Job {
    pub fn from_element(el: &Element, origin: ElementRef) -> EntityResult<Self> {
        let f = Fields::new(el);
        let owner = f
            .owner("job:owner")?
            .ok_or_else(|| EntityError::missing("job:owner"))?;
        if !matches!(owner.kind, super::OwnerKind::Customer | super::OwnerKind::Vendor) {
            return Err(EntityError::InvalidOwner {
                kind: gcx_types::BookElementKind::Job,
                owner: owner.kind.to_string(),
            });
        }
        Ok(Self {
            guid: f.required_guid("job:guid")?,
            id: f.required_text("job:id")?,
            name: f.text("job:name").unwrap_or_default(),
            reference: f.text("job:reference"),
            owner,
            active: f.flag("job:active")?.unwrap_or(true),
            origin,
        })
    }
}

macro_rules! impl_entity {
    ($ty:ty, $name:literal) => {
        impl Entity for $ty {
            const NAME: &'static str = $name;

            fn guid(&self) -> Guid {
                self.guid
            }

            fn origin(&self) -> ElementRef {
                self.origin
            }
        }
    };
}

impl_entity!(Customer, "customer");
impl_entity!(Vendor, "vendor");
impl_entity!(Employee, "employee");
impl_entity!(Job, "job");

#[cfg(test)]
mod tests {
    use super::*;

    fn guid_el(tag: &str, hex: &str) -> Element {
        Element::new(tag).with_attr("type", "guid").with_text(hex)
    }

    fn owner_el(tag: &str, kind: &str, hex: &str) -> Element {
        Element::new(tag)
            .with_child(Element::new("owner:type").with_text(kind))
            .with_child(guid_el("owner:id", hex))
    }

    #[test]
    fn customer_with_address() {
        let el = Element::new("gnc:GncCustomer")
            .with_child(guid_el("cust:guid", "12121212121212121212121212121212"))
            .with_child(Element::new("cust:name").with_text("ACME"))
            .with_child(Element::new("cust:id").with_text("000001"))
            .with_child(
                Element::new("cust:addr")
                    .with_child(Element::new("addr:name").with_text("ACME Corp."))
                    .with_child(Element::new("addr:addr1").with_text("1 Main St"))
                    .with_child(Element::new("addr:addr2"))
                    .with_child(Element::new("addr:email").with_text("ap@acme.test")),
            )
            .with_child(Element::new("cust:active").with_text("1"))
            .with_child(Element::new("cust:discount").with_text("0/1"));
        let c = Customer::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(c.name, "ACME");
        assert_eq!(c.address.lines, vec!["1 Main St".to_string()]);
        assert_eq!(c.address.email.as_deref(), Some("ap@acme.test"));
        assert_eq!(c.discount, Some(Decimal::ZERO));
        assert!(c.ship_address.lines.is_empty());
    }

    #[test]
    fn job_owned_by_vendor() {
        let el = Element::new("gnc:GncJob")
            .with_child(guid_el("job:guid", "34343434343434343434343434343434"))
            .with_child(Element::new("job:id").with_text("000002"))
            .with_child(Element::new("job:name").with_text("Roof"))
            .with_child(owner_el("job:owner", "gncVendor", "56565656565656565656565656565656"));
        let j = Job::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(j.owner.kind, super::super::OwnerKind::Vendor);
        assert!(j.active);
    }

    #[test]
    fn job_owned_by_employee_is_rejected() {
        let el = Element::new("gnc:GncJob")
            .with_child(guid_el("job:guid", "34343434343434343434343434343434"))
            .with_child(Element::new("job:id").with_text("000002"))
            .with_child(owner_el("job:owner", "gncEmployee", "56565656565656565656565656565656"));
        assert!(matches!(
            Job::from_element(&el, ElementRef::Book(0)),
            Err(EntityError::InvalidOwner { .. })
        ));
    }

    #[test]
    fn employee_display_name_falls_back_to_username() {
        let el = Element::new("gnc:GncEmployee")
            .with_child(guid_el("employee:guid", "78787878787878787878787878787878"))
            .with_child(Element::new("employee:username").with_text("jdoe"))
            .with_child(Element::new("employee:id").with_text("E1"))
            .with_child(Element::new("employee:rate").with_text("4500/100"));
        let e = Employee::from_element(&el, ElementRef::Book(0)).unwrap();
        assert_eq!(e.display_name(), "jdoe");
        assert_eq!(e.rate, Some(Decimal::new(45, 0)));
    }
}
