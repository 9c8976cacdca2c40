//! Formatting rules of the reference writer, one predicate each.

use std::borrow::Cow;

use gcx_xml::Attribute;

/// Nesting columns at which indentation starts.
pub const INDENT_THRESHOLD: usize = 4;
/// Threshold inside `gnc:template-transactions`, which is printed shifted left.
pub const TEMPLATE_INDENT_THRESHOLD: usize = 6;
/// Columns added per nesting level.
pub const INDENT_STEP: usize = 2;

pub const TEMPLATE_TRANSACTIONS_TAG: &str = "gnc:template-transactions";

/// Leading spaces for an element opened or closed at `depth` columns.
pub fn indent_width(depth: usize, in_template: bool) -> usize {
    let threshold = if in_template {
        TEMPLATE_INDENT_THRESHOLD
    } else {
        INDENT_THRESHOLD
    };
    depth.saturating_sub(threshold)
}

/// Elements that are written as `<x></x>` even when empty.
pub fn needs_explicit_close(name: &str, attributes: &[Attribute]) -> bool {
    match name {
        "trn:description" => true,
        "slot:value" => attribute(attributes, "type") == Some("string"),
        _ => false,
    }
}

/// Text of elements typed `guid` is lower-cased and never escaped.
pub fn is_guid_field(attributes: &[Attribute]) -> bool {
    attribute(attributes, "type") == Some("guid")
}

/// Whether attributes of this element go one per line.
pub fn attributes_on_own_lines(depth: usize) -> bool {
    depth == 0
}

pub fn escape_text(text: &str) -> Cow<'_, str> {
    escape(text)
}

pub fn escape_attr(value: &str) -> Cow<'_, str> {
    escape(value)
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn attribute<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|a| a.name == name)
        .map(|a| a.value.as_str())
}
