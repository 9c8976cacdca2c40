//! Slot lists: `<x:slots><slot><slot:key/><slot:value type=".."/></slot>...</x:slots>`.

use std::collections::HashSet;

use gcx_types::numeric::parse_numeric;
use gcx_types::time::{parse_date, parse_timestamp};
use gcx_types::{Guid, Slot, SlotType, SlotValue};
use gcx_xml::Element;
use tracing::warn;

use crate::error::{EntityError, EntityResult};

pub const SLOT_TAG: &str = "slot";
pub const SLOT_KEY_TAG: &str = "slot:key";
pub const SLOT_VALUE_TAG: &str = "slot:value";

/// Separator of nested keys inside frames.
pub const PATH_SEPARATOR: char = '/';

/// Parse every `slot` child of a slots container.
///
/// Unparsable slots are dropped with a warning; a repeated key keeps the first
/// value.
pub fn parse_slots(container: &Element) -> Vec<Slot> {
    let mut seen = HashSet::new();
    let mut slots = Vec::new();
    for el in container.children_named(SLOT_TAG) {
        match parse_slot(el) {
            Ok(slot) => {
                if seen.insert(slot.key.clone()) {
                    slots.push(slot);
                } else {
                    warn!(key = %slot.key, "duplicate slot key, keeping the first value");
                }
            }
            Err(err) => warn!(error = %err, "skipping unreadable slot"),
        }
    }
    slots
}

/// Slots of an entity: the `slots_tag` child of `entity`, if any.
pub fn entity_slots(entity: &Element, slots_tag: &str) -> Vec<Slot> {
    entity.child(slots_tag).map(parse_slots).unwrap_or_default()
}

fn parse_slot(el: &Element) -> EntityResult<Slot> {
    let key = el
        .child_text(SLOT_KEY_TAG)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| EntityError::missing(SLOT_KEY_TAG))?;
    let value_el = el
        .child(SLOT_VALUE_TAG)
        .ok_or_else(|| EntityError::missing(SLOT_VALUE_TAG))?;
    Ok(Slot::new(key, parse_value(value_el)?))
}

fn parse_value(el: &Element) -> EntityResult<SlotValue> {
    let raw_type = el.attr("type").unwrap_or(SlotType::String.as_str());
    let Ok(ty) = SlotType::parse(raw_type) else {
        return Ok(SlotValue::Other {
            type_name: raw_type.to_string(),
        });
    };
    let text = el.text();
    let invalid = |e| EntityError::invalid(SLOT_VALUE_TAG, e);
    Ok(match ty {
        SlotType::String => SlotValue::String(text.to_string()),
        SlotType::Integer => SlotValue::Integer(text.trim().parse().map_err(|_| {
            invalid(gcx_types::TypeError::InvalidNumeric(text.to_string()))
        })?),
        SlotType::Double => SlotValue::Double(text.trim().parse().map_err(|_| {
            invalid(gcx_types::TypeError::InvalidNumeric(text.to_string()))
        })?),
        SlotType::Numeric => SlotValue::Numeric(parse_numeric(text).map_err(invalid)?),
        SlotType::Guid => SlotValue::Guid(Guid::parse(text).map_err(invalid)?),
        SlotType::GDate => {
            let raw = el.child_text("gdate").ok_or_else(|| EntityError::missing("gdate"))?;
            SlotValue::GDate(parse_date(raw).map_err(invalid)?)
        }
        SlotType::Timespec => {
            let raw = el
                .child_text("ts:date")
                .ok_or_else(|| EntityError::missing("ts:date"))?;
            SlotValue::Timespec(parse_timestamp(raw).map_err(invalid)?)
        }
        SlotType::Frame => SlotValue::Frame(parse_slots(el)),
    })
}

/// Look up `a/b/c` through nested frames.
pub fn find_slot<'a>(slots: &'a [Slot], path: &str) -> Option<&'a SlotValue> {
    let mut current = slots;
    let mut parts = path.split(PATH_SEPARATOR).peekable();
    while let Some(part) = parts.next() {
        let slot = current.iter().find(|s| s.key == part)?;
        if parts.peek().is_none() {
            return Some(&slot.value);
        }
        current = slot.value.as_frame()?;
    }
    None
}

/// Set a string slot at `path` inside a slots container element, creating
/// intermediate frames and the slot itself as needed.
pub fn set_string_slot(container: &mut Element, path: &str, value: &str) {
    let (head, rest) = match path.split_once(PATH_SEPARATOR) {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    let existing = container
        .elements()
        .position(|el| el.name == SLOT_TAG && el.child_text(SLOT_KEY_TAG) == Some(head));
    let slot = match existing {
        Some(pos) => container.element_at_mut(pos),
        None => {
            container.push_child(
                Element::new(SLOT_TAG)
                    .with_child(Element::new(SLOT_KEY_TAG).with_text(head))
                    .with_child(Element::new(SLOT_VALUE_TAG)),
            );
            container.elements_mut().last()
        }
    };
    let Some(slot) = slot else {
        return;
    };
    if slot.child(SLOT_VALUE_TAG).is_none() {
        slot.push_child(Element::new(SLOT_VALUE_TAG));
    }
    let Some(value_el) = slot.child_mut(SLOT_VALUE_TAG) else {
        return;
    };

    match rest {
        Some(rest) => {
            if value_el.attr("type") != Some(SlotType::Frame.as_str()) {
                value_el.children.clear();
                value_el.set_attr("type", SlotType::Frame.as_str());
            }
            set_string_slot(value_el, rest, value);
        }
        None => {
            value_el.set_attr("type", SlotType::String.as_str());
            value_el.set_text(value);
        }
    }
}
