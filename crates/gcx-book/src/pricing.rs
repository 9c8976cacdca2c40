//! Conversion factors between commodities and currencies.
//!
//! For a `(from, to)` query the resolver looks at the quotes whose "from"
//! side is `from`, keeps the latest one per "to" side, and tries them most
//! recent first. A quote that lands on the target gives the factor directly;
//! otherwise its "to" side is resolved recursively and the factors are
//! multiplied. Recursion stops after [`MAX_RESOLUTION_DEPTH`] hops, never
//! passes through a commodity twice, and does not retry a commodity that
//! already failed with at least as many hops left.

use std::collections::HashMap;

use gcx_types::{CmdtyCurrId, Decimal};
use tracing::{debug, warn};

use crate::entities::price::Quote;
use crate::entities::Price;

/// Maximum number of recursive hops below the initial lookup.
pub const MAX_RESOLUTION_DEPTH: usize = 5;

pub struct PriceResolver<'a> {
    quotes: HashMap<&'a CmdtyCurrId, Vec<Quote<'a>>>,
    default_currency: Option<&'a CmdtyCurrId>,
}

impl<'a> PriceResolver<'a> {
    /// Index usable quotes by their "from" side. Incomplete records are
    /// skipped with a warning.
    pub fn new<I>(prices: I, default_currency: Option<&'a CmdtyCurrId>) -> Self
    where
        I: IntoIterator<Item = &'a Price>,
    {
        let mut quotes: HashMap<&'a CmdtyCurrId, Vec<Quote<'a>>> = HashMap::new();
        for price in prices {
            match price.quote() {
                Ok(quote) => quotes.entry(quote.from).or_default().push(quote),
                Err(field) => warn!(price = %price.id, missing = field, "skipping incomplete price"),
            }
        }
        Self {
            quotes,
            default_currency,
        }
    }

    pub fn default_currency(&self) -> Option<&'a CmdtyCurrId> {
        self.default_currency
    }

    /// Distinct "from" sides of all usable quotes.
    pub fn quoted_commodities(&self) -> Vec<&'a CmdtyCurrId> {
        let mut all: Vec<&'a CmdtyCurrId> = self.quotes.keys().copied().collect();
        all.sort();
        all
    }

    /// Factor converting one unit of `from` into `to` (the default currency
    /// when `to` is `None`). `None` means no price is known.
    pub fn resolve(&self, from: &CmdtyCurrId, to: Option<&CmdtyCurrId>) -> Option<Decimal> {
        let Some(target) = to.or(self.default_currency) else {
            warn!(from = %from, "no target currency for price lookup");
            return None;
        };
        if from == target {
            warn!(currency = %from, "price lookup from a currency to itself, skipping");
            return None;
        }
        let factor = self.resolve_at(from, target, 0, &mut Search::default());
        debug!(from = %from, to = %target, factor = ?factor, "resolved price");
        factor
    }

    /// The most recent quote per "to" side, newest first. Ties keep the
    /// record seen first.
    pub fn latest_quotes(&self, from: &CmdtyCurrId) -> Vec<Quote<'a>> {
        let Some(all) = self.quotes.get(from) else {
            return Vec::new();
        };
        let mut latest: Vec<Quote<'a>> = Vec::new();
        for quote in all {
            match latest.iter_mut().find(|q| q.to == quote.to) {
                Some(current) if quote.time > current.time => *current = *quote,
                Some(_) => {}
                None => latest.push(*quote),
            }
        }
        // Stable: equal times keep first-seen order.
        latest.sort_by(|a, b| b.time.cmp(&a.time));
        latest
    }

    fn resolve_at<'b>(
        &self,
        from: &'b CmdtyCurrId,
        target: &CmdtyCurrId,
        depth: usize,
        search: &mut Search<'b>,
    ) -> Option<Decimal>
    where
        'a: 'b,
    {
        if search.failed.get(from).is_some_and(|&at| at <= depth) {
            return None;
        }
        search.visits += 1;
        search.path.push(from);
        let found = self.try_quotes(from, target, depth, search);
        search.path.pop();
        if found.is_none() {
            let at = search.failed.entry(from).or_insert(depth);
            *at = (*at).min(depth);
        }
        found
    }

    fn try_quotes<'b>(
        &self,
        from: &'b CmdtyCurrId,
        target: &CmdtyCurrId,
        depth: usize,
        search: &mut Search<'b>,
    ) -> Option<Decimal>
    where
        'a: 'b,
    {
        for quote in self.latest_quotes(from) {
            if quote.to == target {
                return Some(quote.value);
            }
            if quote.to == from {
                warn!(price = %quote.id, commodity = %from, "price quoted in its own commodity");
                continue;
            }
            if search.path.contains(&quote.to) {
                continue;
            }
            if depth >= MAX_RESOLUTION_DEPTH {
                warn!(
                    from = %from,
                    via = %quote.to,
                    to = %target,
                    depth,
                    "price resolution depth exceeded"
                );
                continue;
            }
            let Some(rest) = self.resolve_at(quote.to, target, depth + 1, search) else {
                continue;
            };
            match quote.value.checked_mul(rest) {
                Some(factor) => return Some(factor),
                None => warn!(price = %quote.id, "price factor overflow"),
            }
        }
        None
    }
}

/// State of one `resolve` call. A commodity already on the path is not
/// entered again, and one that failed at some depth is not retried at that
/// depth or deeper.
#[derive(Default)]
struct Search<'b> {
    path: Vec<&'b CmdtyCurrId>,
    failed: HashMap<&'b CmdtyCurrId, usize>,
    visits: usize,
}
