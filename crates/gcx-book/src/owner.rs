//! Polymorphic owners of invoices and jobs.

use gcx_types::{Decimal, Guid};
use tracing::warn;

use crate::entities::{Customer, Employee, EntryRole, Invoice, Job, OwnerKind, OwnerRef, Vendor};
use crate::index::EntityIndex;

/// A resolved owner.
#[derive(Clone, Copy, Debug)]
pub enum Owner<'a> {
    Customer(&'a Customer),
    Vendor(&'a Vendor),
    Employee(&'a Employee),
    Job(&'a Job),
}

impl<'a> Owner<'a> {
    pub fn kind(&self) -> OwnerKind {
        match self {
            Self::Customer(_) => OwnerKind::Customer,
            Self::Vendor(_) => OwnerKind::Vendor,
            Self::Employee(_) => OwnerKind::Employee,
            Self::Job(_) => OwnerKind::Job,
        }
    }

    pub fn guid(&self) -> Guid {
        match self {
            Self::Customer(c) => c.guid,
            Self::Vendor(v) => v.guid,
            Self::Employee(e) => e.guid,
            Self::Job(j) => j.guid,
        }
    }

    pub fn name(&self) -> &'a str {
        match *self {
            Self::Customer(c) => &c.name,
            Self::Vendor(v) => &v.name,
            Self::Employee(e) => e.display_name(),
            Self::Job(j) => &j.name,
        }
    }

    /// The party that is actually billed: a job stands in for its customer
    /// or vendor, everyone else bills themselves.
    pub fn billed_party(self, index: &'a EntityIndex) -> Option<Owner<'a>> {
        match self {
            Self::Job(job) => {
                let owner = index.resolve_owner(&job.owner)?;
                match owner {
                    Self::Customer(_) | Self::Vendor(_) => Some(owner),
                    // Loading rejects such jobs, so this only guards hand-built indices.
                    Self::Employee(_) | Self::Job(_) => {
                        warn!(job = %job.guid, owner = %owner.kind(), "job has an invalid owner");
                        None
                    }
                }
            }
            other => Some(other),
        }
    }

    /// Which half of an entry's terms applies to documents of this owner.
    pub fn entry_role(self, index: &'a EntityIndex) -> Option<EntryRole> {
        match self.billed_party(index)? {
            Self::Customer(_) => Some(EntryRole::Invoice),
            Self::Vendor(_) | Self::Employee(_) => Some(EntryRole::Bill),
            Self::Job(_) => None,
        }
    }
}

/// Entities that carry an owner reference.
pub trait Owned {
    fn owner_ref(&self) -> &OwnerRef;

    /// The owner as written, possibly a job.
    fn direct_owner<'a>(&self, index: &'a EntityIndex) -> Option<Owner<'a>> {
        index.resolve_owner(self.owner_ref())
    }

    /// The owner after resolving through a job.
    fn billed_party<'a>(&self, index: &'a EntityIndex) -> Option<Owner<'a>> {
        self.direct_owner(index)?.billed_party(index)
    }
}

impl Owned for Invoice {
    fn owner_ref(&self) -> &OwnerRef {
        &self.owner
    }
}

impl Owned for Job {
    fn owner_ref(&self) -> &OwnerRef {
        &self.owner
    }
}

impl EntityIndex {
    /// Resolve an owner reference. A miss is logged and returns `None`.
    pub fn resolve_owner(&self, owner: &OwnerRef) -> Option<Owner<'_>> {
        let found = match owner.kind {
            OwnerKind::Customer => self.customers.get(&owner.id).map(Owner::Customer),
            OwnerKind::Vendor => self.vendors.get(&owner.id).map(Owner::Vendor),
            OwnerKind::Employee => self.employees.get(&owner.id).map(Owner::Employee),
            OwnerKind::Job => self.jobs.get(&owner.id).map(Owner::Job),
        };
        if found.is_none() {
            warn!(kind = %owner.kind, id = %owner.id, "owner not found");
        }
        found
    }

    /// Sum of entry subtotals for an invoice, using the terms of the
    /// owner's role. Entries without a price for that role count as zero.
    pub fn invoice_amount(&self, invoice: &Invoice) -> Option<Decimal> {
        let role = invoice.direct_owner(self)?.entry_role(self)?;
        let mut total = Decimal::ZERO;
        for id in &invoice.entries {
            let Some(entry) = self.entries.get(id) else {
                warn!(invoice = %invoice.guid, entry = %id, "entry not found");
                continue;
            };
            total = total.checked_add(entry.subtotal(role).unwrap_or(Decimal::ZERO))?;
        }
        Some(total)
    }

    /// Invoices whose billed party is `party`.
    pub fn invoices_of(&self, party: &Guid) -> Vec<&Invoice> {
        self.invoices
            .iter()
            .filter(|inv| {
                inv.billed_party(self)
                    .is_some_and(|owner| &owner.guid() == party)
            })
            .collect()
    }
}
