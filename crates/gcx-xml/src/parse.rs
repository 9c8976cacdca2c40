use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::element::{Attribute, Document, Element, Node};
use crate::error::{XmlError, XmlResult};

/// Parse a complete document into an element tree.
///
/// Character data is unescaped. Whitespace-only text inside an element that
/// also has child elements is layout, not content, and is dropped; text in
/// leaf elements is kept verbatim.
pub fn parse_document(data: &[u8]) -> XmlResult<Document> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| XmlError::Syntax {
                position: reader.buffer_position(),
                reason: e.to_string(),
            })?;

        match event {
            Event::Start(start) => {
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let name = utf8(end.name().as_ref(), "end tag")?;
                let mut element = stack.pop().ok_or_else(|| {
                    XmlError::Malformed(format!("unexpected closing tag </{name}>"))
                })?;
                if element.name != name {
                    return Err(XmlError::Malformed(format!(
                        "closing tag </{name}> does not match <{}>",
                        element.name
                    )));
                }
                drop_layout_whitespace(&mut element);
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value = text.unescape().map_err(|e| XmlError::Syntax {
                    position: reader.buffer_position(),
                    reason: e.to_string(),
                })?;
                push_text(&mut stack, &value);
            }
            Event::CData(cdata) => {
                let value = utf8(&cdata.into_inner(), "CDATA section")?;
                push_text(&mut stack, &value);
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(XmlError::Malformed(format!("unclosed element <{}>", open.name)));
    }
    let root = root.ok_or_else(|| XmlError::Malformed("document has no root element".into()))?;
    debug!(root = %root.name, elements = root.subtree_len(), "parsed document");
    Ok(Document { root })
}

fn open_element(start: &BytesStart<'_>) -> XmlResult<Element> {
    let mut element = Element::new(utf8(start.name().as_ref(), "start tag")?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| XmlError::Malformed(format!("bad attribute: {e}")))?;
        let name = utf8(attr.key.as_ref(), "attribute name")?;
        let value = attr
            .unescape_value()
            .map_err(|e| XmlError::Malformed(format!("bad attribute value: {e}")))?;
        element.attributes.push(Attribute::new(name, value.into_owned()));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> XmlResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(XmlError::Malformed(format!(
            "second root element <{}>",
            element.name
        ))),
    }
}

fn push_text(stack: &mut [Element], text: &str) {
    // Text outside the root (line breaks after the declaration) is ignored.
    let Some(parent) = stack.last_mut() else {
        return;
    };
    match parent.children.last_mut() {
        Some(Node::Text(existing)) => existing.push_str(text),
        _ => parent.children.push(Node::Text(text.to_string())),
    }
}

fn drop_layout_whitespace(element: &mut Element) {
    let has_elements = element
        .children
        .iter()
        .any(|node| matches!(node, Node::Element(_)));
    if has_elements {
        element
            .children
            .retain(|node| !matches!(node, Node::Text(t) if t.trim().is_empty()));
    }
}

fn utf8(bytes: &[u8], what: &str) -> XmlResult<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| XmlError::InvalidUtf8(what.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<gnc-v2
     xmlns:gnc="http://www.gnucash.org/XML/gnc">
<gnc:book version="2.0.0">
<book:id type="guid">ABCDEF0123456789abcdef0123456789</book:id>
<gnc:transaction version="2.0.0">
  <trn:description>Fish &amp; Chips</trn:description>
  <trn:num></trn:num>
  <cmdty:get_quotes/>
  <slot:value type="string">  padded  </slot:value>
</gnc:transaction>
</gnc:book>
</gnc-v2>

<!-- Local variables: -->
"#;

    #[test]
    fn parses_structure_and_attributes() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root.name, "gnc-v2");
        assert_eq!(
            doc.root.attr("xmlns:gnc"),
            Some("http://www.gnucash.org/XML/gnc")
        );
        let book = doc.root.child("gnc:book").unwrap();
        assert_eq!(book.attr("version"), Some("2.0.0"));
        assert_eq!(book.elements().count(), 2);
    }

    #[test]
    fn layout_whitespace_is_dropped() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let txn = doc.root.path(&["gnc:book", "gnc:transaction"]).unwrap();
        assert!(txn.children.iter().all(|n| matches!(n, Node::Element(_))));
    }

    #[test]
    fn leaf_text_is_unescaped_and_kept_verbatim() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let txn = doc.root.path(&["gnc:book", "gnc:transaction"]).unwrap();
        assert_eq!(txn.child_text("trn:description"), Some("Fish & Chips"));
        assert_eq!(txn.child_text("slot:value"), Some("  padded  "));
    }

    #[test]
    fn empty_elements_have_no_children() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let txn = doc.root.path(&["gnc:book", "gnc:transaction"]).unwrap();
        assert!(txn.child("trn:num").unwrap().children.is_empty());
        assert!(txn.child("cmdty:get_quotes").unwrap().children.is_empty());
    }

    #[test]
    fn guid_case_is_not_touched_by_the_parser() {
        let doc = parse_document(SAMPLE.as_bytes()).unwrap();
        let id = doc.root.path_text(&["gnc:book", "book:id"]).unwrap();
        assert_eq!(id, "ABCDEF0123456789abcdef0123456789");
    }

    #[test]
    fn mismatched_tags_are_rejected() {
        let err = parse_document(b"<a><b></a>").unwrap_err();
        assert!(matches!(err, XmlError::Malformed(_) | XmlError::Syntax { .. }));
    }

    #[test]
    fn unclosed_root_is_rejected() {
        let err = parse_document(b"<a><b/>").unwrap_err();
        assert!(matches!(err, XmlError::Malformed(_) | XmlError::Syntax { .. }));
    }

    #[test]
    fn empty_input_has_no_root() {
        assert!(matches!(
            parse_document(b"").unwrap_err(),
            XmlError::Malformed(_)
        ));
    }

    #[test]
    fn cdata_is_text() {
        let doc = parse_document(b"<a><![CDATA[x < y]]></a>").unwrap();
        assert_eq!(doc.root.text(), "x < y");
    }
}
