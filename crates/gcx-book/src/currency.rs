use std::collections::BTreeMap;

use gcx_types::{CmdtyCurrId, Decimal};
use tracing::{debug, info};

use crate::pricing::PriceResolver;

/// Book-scoped conversion factors into the base currency.
///
/// Populated once after load. Adding or changing prices marks the table
/// stale; it is never recomputed behind the caller's back.
#[derive(Clone, Debug, Default)]
pub struct CurrencyTable {
    base: Option<CmdtyCurrId>,
    factors: BTreeMap<CmdtyCurrId, Decimal>,
    stale: bool,
}

impl CurrencyTable {
    pub fn new(base: Option<CmdtyCurrId>) -> Self {
        Self {
            base,
            factors: BTreeMap::new(),
            stale: false,
        }
    }

    pub fn base(&self) -> Option<&CmdtyCurrId> {
        self.base.as_ref()
    }

    /// Resolve and store a factor for every quoted commodity.
    pub fn populate(&mut self, resolver: &PriceResolver<'_>) {
        self.factors.clear();
        for cmdty in resolver.quoted_commodities() {
            if Some(cmdty) == self.base.as_ref() {
                continue;
            }
            match resolver.resolve(cmdty, self.base.as_ref()) {
                Some(factor) => {
                    self.factors.insert(cmdty.clone(), factor);
                }
                None => debug!(commodity = %cmdty, "no conversion into base currency"),
            }
        }
        self.stale = false;
        info!(
            base = ?self.base,
            factors = self.factors.len(),
            "currency table populated"
        );
    }

    /// Mark the stored factors as out of date.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Value of one unit of `cmdty` in the base currency.
    pub fn factor(&self, cmdty: &CmdtyCurrId) -> Option<Decimal> {
        if Some(cmdty) == self.base.as_ref() {
            return Some(Decimal::ONE);
        }
        self.factors.get(cmdty).copied()
    }

    /// Convert `amount` of `from` into `to` through the base currency.
    pub fn convert(&self, amount: Decimal, from: &CmdtyCurrId, to: &CmdtyCurrId) -> Option<Decimal> {
        if from == to {
            return Some(amount);
        }
        let in_base = amount.checked_mul(self.factor(from)?)?;
        in_base.checked_div(self.factor(to)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CmdtyCurrId, &Decimal)> {
        self.factors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ElementRef, Price};
    use gcx_types::time::parse_timestamp;
    use gcx_types::Guid;
    use rust_decimal_macros::dec;

    fn price(n: u8, from: CmdtyCurrId, to: &str, value: Decimal) -> Price {
        Price {
            id: Guid::from_bytes([n; 16]),
            commodity: Some(from),
            currency: Some(CmdtyCurrId::currency(to)),
            time: Some(parse_timestamp("2023-01-01 00:00:00 +0000").unwrap()),
            source: None,
            price_type: None,
            value: Some(value),
            origin: ElementRef::Book(n as usize),
        }
    }

    fn table() -> CurrencyTable {
        let eur = CmdtyCurrId::currency("EUR");
        let prices = vec![
            price(1, CmdtyCurrId::currency("USD"), "EUR", dec!(0.9)),
            price(2, CmdtyCurrId::security("NYSE", "IBM"), "USD", dec!(140)),
            price(3, CmdtyCurrId::currency("EUR"), "USD", dec!(1.1)),
        ];
        let resolver = PriceResolver::new(&prices, Some(&eur));
        let mut t = CurrencyTable::new(Some(eur.clone()));
        t.populate(&resolver);
        t
    }

    #[test]
    fn populate_resolves_every_quoted_commodity() {
        let t = table();
        assert_eq!(t.len(), 2);
        assert_eq!(t.factor(&CmdtyCurrId::currency("USD")), Some(dec!(0.9)));
        assert_eq!(t.factor(&CmdtyCurrId::security("NYSE", "IBM")), Some(dec!(126.0)));
        assert_eq!(t.factor(&CmdtyCurrId::currency("EUR")), Some(Decimal::ONE));
        assert!(!t.is_stale());
    }

    #[test]
    fn convert_goes_through_base() {
        let t = table();
        let usd = CmdtyCurrId::currency("USD");
        let ibm = CmdtyCurrId::security("NYSE", "IBM");
        assert_eq!(t.convert(dec!(2), &ibm, &usd), Some(dec!(280)));
        assert_eq!(t.convert(dec!(5), &usd, &usd), Some(dec!(5)));
        assert_eq!(t.convert(dec!(5), &CmdtyCurrId::currency("JPY"), &usd), None);
    }

    #[test]
    fn invalidate_only_marks() {
        let mut t = table();
        t.invalidate();
        assert!(t.is_stale());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn table_without_base_converts_nothing() {
        let t = CurrencyTable::new(None);
        assert!(t.factor(&CmdtyCurrId::currency("EUR")).is_none());
    }
}
