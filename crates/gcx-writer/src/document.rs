use gcx_types::kind::BOOK_TAG;
use gcx_xml::{emit_element, Attribute, ContentSink, Element, Node};
use tracing::debug;

use crate::error::WriterResult;
use crate::order::order_elements;

/// Borrowed view of everything a book document consists of.
///
/// The root carries elements before and after the single book (usually one
/// `gnc:count-data` before it). The book header (`book:id`, `book:slots`,
/// count-data) is written in its original order ahead of the sorted book
/// elements.
#[derive(Clone, Copy, Debug)]
pub struct DocumentLayout<'a> {
    pub root_name: &'a str,
    pub root_attributes: &'a [Attribute],
    pub preamble: &'a [Element],
    pub book_attributes: &'a [Attribute],
    pub header: &'a [Element],
    pub elements: &'a [Element],
    pub trailer: &'a [Element],
}

/// Push a complete book document into `sink`, book elements in canonical order.
///
/// Ordering happens before the first event, so a structural violation leaves
/// the sink untouched.
pub fn write_layout<S: ContentSink + ?Sized>(
    layout: &DocumentLayout<'_>,
    sink: &mut S,
) -> WriterResult<()> {
    let ordered = order_elements(layout.elements)?;
    debug!(elements = ordered.len(), "writing book document");

    sink.start_document();
    sink.start_element(layout.root_name, layout.root_attributes);
    for element in layout.preamble {
        emit_element(element, sink);
    }
    sink.start_element(BOOK_TAG, layout.book_attributes);
    for element in layout.header {
        emit_element(element, sink);
    }
    for element in ordered {
        emit_element(element, sink);
    }
    sink.end_element(BOOK_TAG);
    for element in layout.trailer {
        emit_element(element, sink);
    }
    sink.end_element(layout.root_name);
    sink.end_document();
    Ok(())
}

/// Push an arbitrary tree as a document, without reordering.
pub fn write_document<S: ContentSink + ?Sized>(root: &Element, sink: &mut S) {
    sink.start_document();
    emit_element(root, sink);
    sink.end_document();
}

/// Re-nest `layout` into a single root element, book elements sorted.
pub fn layout_to_element(layout: &DocumentLayout<'_>) -> WriterResult<Element> {
    let mut book = Element::new(BOOK_TAG);
    book.attributes = layout.book_attributes.to_vec();
    book.children.extend(layout.header.iter().cloned().map(Node::Element));
    for element in order_elements(layout.elements)? {
        book.push_child(element.clone());
    }

    let mut root = Element::new(layout.root_name);
    root.attributes = layout.root_attributes.to_vec();
    root.children
        .extend(layout.preamble.iter().cloned().map(Node::Element));
    root.push_child(book);
    root.children
        .extend(layout.trailer.iter().cloned().map(Node::Element));
    Ok(root)
}
