//! In-memory entity maps.
//!
//! Every GUID-identified entity type gets an [`EntityMap`]: point lookups by
//! ID plus iteration in document order. Commodities are keyed by qualified ID
//! and additionally by exchange code.

use std::collections::{BTreeMap, HashMap};

use gcx_types::{CmdtyCurrId, Decimal, Guid};
use tracing::warn;

use crate::entities::{
    Account, BillTerm, Budget, Commodity, Customer, Employee, Entity, Entry, Invoice, Job, Price,
    ScheduledTransaction, Split, TaxTable, Transaction, Vendor,
};
use crate::error::EntityError;

/// ID-keyed entities in insertion order.
#[derive(Clone, Debug)]
pub struct EntityMap<T> {
    items: Vec<T>,
    by_id: HashMap<Guid, usize>,
}

impl<T> Default for EntityMap<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T: Entity> EntityMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. IDs are unique per type; a duplicate is rejected and
    /// the first entity stays.
    pub fn insert(&mut self, item: T) -> Result<(), EntityError> {
        let id = item.guid();
        if self.by_id.contains_key(&id) {
            return Err(EntityError::DuplicateId { id: id.to_hex() });
        }
        self.by_id.insert(id, self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, id: &Guid) -> Option<&T> {
        self.by_id.get(id).map(|&i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &Guid) -> Option<&mut T> {
        match self.by_id.get(id) {
            Some(&i) => self.items.get_mut(i),
            None => None,
        }
    }

    pub fn contains(&self, id: &Guid) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }
}

impl<'a, T> IntoIterator for &'a EntityMap<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// All entities of a book.
#[derive(Clone, Debug, Default)]
pub struct EntityIndex {
    pub commodities: BTreeMap<CmdtyCurrId, Commodity>,
    pub commodities_by_xcode: HashMap<String, CmdtyCurrId>,
    pub accounts: EntityMap<Account>,
    pub transactions: EntityMap<Transaction>,
    pub prices: EntityMap<Price>,
    pub invoices: EntityMap<Invoice>,
    pub entries: EntityMap<Entry>,
    pub customers: EntityMap<Customer>,
    pub vendors: EntityMap<Vendor>,
    pub employees: EntityMap<Employee>,
    pub jobs: EntityMap<Job>,
    pub tax_tables: EntityMap<TaxTable>,
    pub bill_terms: EntityMap<BillTerm>,
    pub budgets: EntityMap<Budget>,
    pub scheduled: EntityMap<ScheduledTransaction>,
    pub template_accounts: EntityMap<Account>,
    pub template_transactions: EntityMap<Transaction>,
    split_owner: HashMap<Guid, Guid>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    // ---------------------------------------------------------------
    // Commodities
    // ---------------------------------------------------------------

    pub fn commodity(&self, id: &CmdtyCurrId) -> Option<&Commodity> {
        self.commodities.get(id)
    }

    pub fn commodity_by_xcode(&self, xcode: &str) -> Option<&Commodity> {
        self.commodities_by_xcode
            .get(xcode)
            .and_then(|id| self.commodities.get(id))
    }

    /// Insert a commodity into both maps. A repeated qualified ID or x-code
    /// keeps the first mapping.
    pub fn insert_commodity(&mut self, commodity: Commodity) -> Result<(), EntityError> {
        if self.commodities.contains_key(&commodity.id) {
            return Err(EntityError::DuplicateId {
                id: commodity.id.to_string(),
            });
        }
        if let Some(xcode) = &commodity.xcode {
            match self.commodities_by_xcode.get(xcode) {
                Some(existing) => warn!(
                    xcode = %xcode,
                    kept = %existing,
                    ignored = %commodity.id,
                    "duplicate exchange code"
                ),
                None => {
                    self.commodities_by_xcode
                        .insert(xcode.clone(), commodity.id.clone());
                }
            }
        }
        self.commodities.insert(commodity.id.clone(), commodity);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Transactions and splits
    // ---------------------------------------------------------------

    pub fn insert_transaction(&mut self, txn: Transaction) -> Result<(), EntityError> {
        let id = txn.id;
        let split_ids: Vec<Guid> = txn.splits.iter().map(|s| s.id).collect();
        self.transactions.insert(txn)?;
        for split in split_ids {
            if self.split_owner.insert(split, id).is_some() {
                warn!(split = %split, txn = %id, "split ID used by more than one transaction");
            }
        }
        Ok(())
    }

    /// A split and the transaction that contains it.
    pub fn split(&self, id: &Guid) -> Option<(&Transaction, &Split)> {
        let txn = self.transactions.get(self.split_owner.get(id)?)?;
        Some((txn, txn.split(id)?))
    }

    /// Every split posted to `account`, in transaction order.
    pub fn splits_of(&self, account: &Guid) -> Vec<(&Transaction, &Split)> {
        self.transactions
            .iter()
            .flat_map(|t| t.splits.iter().map(move |s| (t, s)))
            .filter(|(_, s)| &s.account == account)
            .collect()
    }

    // ---------------------------------------------------------------
    // Account tree
    // ---------------------------------------------------------------

    /// The root account: the first `ROOT` account, else the first account
    /// without a parent.
    pub fn root_account(&self) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.is_root())
            .or_else(|| self.accounts.iter().find(|a| a.parent.is_none()))
    }

    /// Parent of `account`. A parent ID that does not resolve is logged and
    /// the account is treated as top level.
    pub fn parent(&self, account: &Account) -> Option<&Account> {
        let parent_id = account.parent?;
        let parent = self.accounts.get(&parent_id);
        if parent.is_none() {
            warn!(account = %account.id, parent = %parent_id, "parent account not found");
        }
        parent
    }

    pub fn children(&self, id: &Guid) -> Vec<&Account> {
        self.accounts
            .iter()
            .filter(|a| a.parent.as_ref() == Some(id))
            .collect()
    }

    /// Accounts directly below the root.
    pub fn top_level_accounts(&self) -> Vec<&Account> {
        match self.root_account() {
            Some(root) => self.children(&root.id),
            None => Vec::new(),
        }
    }

    /// Colon-separated path from the top level, root excluded.
    pub fn full_name(&self, id: &Guid) -> Option<String> {
        let mut names = Vec::new();
        let mut current = self.accounts.get(id)?;
        // A cycle in parent links cannot be longer than the account count.
        for _ in 0..=self.accounts.len() {
            if !current.is_root() {
                names.push(current.name.as_str());
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        names.reverse();
        Some(names.join(":"))
    }

    /// Sum of split quantities posted to the account, in its own commodity.
    pub fn balance(&self, id: &Guid) -> Decimal {
        self.splits_of(id).iter().map(|(_, s)| s.quantity).sum()
    }

    /// Balance of the account and everything below it. Sub-account balances
    /// are added as-is, so mixed commodities are not converted.
    pub fn subtree_balance(&self, id: &Guid) -> Decimal {
        let mut total = self.balance(id);
        let mut stack: Vec<Guid> = self.children(id).iter().map(|a| a.id).collect();
        let mut steps = 0;
        while let Some(next) = stack.pop() {
            steps += 1;
            if steps > self.accounts.len() {
                warn!(account = %id, "account tree contains a cycle");
                break;
            }
            total += self.balance(&next);
            stack.extend(self.children(&next).iter().map(|a| a.id));
        }
        total
    }

    /// Most common currency among top-level accounts. Ties go to the
    /// currency seen first.
    pub fn dominant_top_level_currency(&self) -> Option<CmdtyCurrId> {
        let mut counts: Vec<(CmdtyCurrId, usize)> = Vec::new();
        for account in self.top_level_accounts() {
            let Some(cmdty) = account.commodity.as_ref().filter(|c| c.is_currency()) else {
                continue;
            };
            match counts.iter_mut().find(|(c, _)| c == cmdty) {
                Some((_, n)) => *n += 1,
                None => counts.push((cmdty.clone(), 1)),
            }
        }
        let best = counts.iter().map(|(_, n)| *n).max()?;
        counts.into_iter().find(|(_, n)| *n == best).map(|(c, _)| c)
    }
}
