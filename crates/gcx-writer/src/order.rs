use gcx_types::BookElementKind;
use gcx_xml::Element;

use crate::error::{WriterError, WriterResult};

/// Sort key of a book element tag. Lower values are written first.
pub fn priority_of(tag: &str) -> WriterResult<u8> {
    let kind = BookElementKind::from_tag(tag).ok_or_else(|| WriterError::StructuralViolation {
        tag: tag.to_string(),
    })?;
    Ok(priority(kind))
}

fn priority(kind: BookElementKind) -> u8 {
    match kind {
        BookElementKind::Commodity => 0,
        BookElementKind::PriceDb => 1,
        BookElementKind::Account => 2,
        BookElementKind::Budget => 3,
        BookElementKind::Transaction => 4,
        BookElementKind::TemplateTransactions => 5,
        BookElementKind::SchedXaction => 6,
        BookElementKind::Job => 7,
        BookElementKind::TaxTable => 8,
        BookElementKind::Invoice => 9,
        BookElementKind::Customer => 10,
        BookElementKind::Employee => 11,
        BookElementKind::Entry => 12,
        BookElementKind::BillTerm => 13,
        BookElementKind::Vendor => 14,
        BookElementKind::Price => 15,
    }
}

/// Stable sort by priority alone. Every tag is classified before anything
/// moves, so an unknown tag leaves `items` untouched.
pub fn sort_by_priority<T, F>(items: &mut [T], tag_of: F) -> WriterResult<()>
where
    F: Fn(&T) -> &str,
{
    let keys = items
        .iter()
        .map(|item| priority_of(tag_of(item)))
        .collect::<WriterResult<Vec<u8>>>()?;
    let mut keyed: Vec<(u8, usize)> = keys.into_iter().zip(0..).collect();
    keyed.sort_by_key(|(key, _)| *key);
    let order: Vec<usize> = keyed.into_iter().map(|(_, pos)| pos).collect();
    apply_permutation(items, order);
    Ok(())
}

/// Book elements in write order, without reordering the backing storage.
pub fn order_elements(elements: &[Element]) -> WriterResult<Vec<&Element>> {
    let mut refs: Vec<&Element> = elements.iter().collect();
    sort_by_priority(&mut refs, |e| e.name.as_str())?;
    Ok(refs)
}

/// Rearrange `items` so that position `i` holds the item previously at `order[i]`.
fn apply_permutation<T>(items: &mut [T], mut order: Vec<usize>) {
    for start in 0..items.len() {
        let mut current = start;
        while order[current] != start {
            let next = order[current];
            items.swap(current, next);
            order[current] = current;
            current = next;
        }
        order[current] = current;
    }
}
