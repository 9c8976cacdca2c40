use crate::element::{Attribute, Element, Node};

/// Push-style receiver of structural write events.
///
/// Callbacks return nothing: a sink that performs I/O has to deal with its own
/// failures, and the producer keeps pushing events regardless.
pub trait ContentSink {
    fn start_document(&mut self);
    fn start_element(&mut self, name: &str, attributes: &[Attribute]);
    fn characters(&mut self, text: &str);
    fn end_element(&mut self, name: &str);
    fn end_document(&mut self);
}

/// Walk an element subtree in document order, pushing events into `sink`.
pub fn emit_element<S: ContentSink + ?Sized>(element: &Element, sink: &mut S) {
    sink.start_element(&element.name, &element.attributes);
    for node in &element.children {
        match node {
            Node::Element(child) => emit_element(child, sink),
            Node::Text(text) => sink.characters(text),
        }
    }
    sink.end_element(&element.name);
}

/// One event captured by [`EventRecorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    StartDocument,
    Start {
        name: String,
        attributes: Vec<Attribute>,
    },
    Text(String),
    End(String),
    EndDocument,
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<RecordedEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the opened elements, in order.
    pub fn opened(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Start { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ContentSink for EventRecorder {
    fn start_document(&mut self) {
        self.events.push(RecordedEvent::StartDocument);
    }

    fn start_element(&mut self, name: &str, attributes: &[Attribute]) {
        self.events.push(RecordedEvent::Start {
            name: name.to_string(),
            attributes: attributes.to_vec(),
        });
    }

    fn characters(&mut self, text: &str) {
        self.events.push(RecordedEvent::Text(text.to_string()));
    }

    fn end_element(&mut self, name: &str) {
        self.events.push(RecordedEvent::End(name.to_string()));
    }

    fn end_document(&mut self) {
        self.events.push(RecordedEvent::EndDocument);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walker_emits_document_order() {
        let el = Element::new("gnc:account")
            .with_attr("version", "2.0.0")
            .with_child(Element::new("act:name").with_text("Cash"))
            .with_child(Element::new("act:parent").with_attr("type", "guid"));

        let mut rec = EventRecorder::new();
        emit_element(&el, &mut rec);

        assert_eq!(
            rec.events,
            vec![
                RecordedEvent::Start {
                    name: "gnc:account".into(),
                    attributes: vec![Attribute::new("version", "2.0.0")],
                },
                RecordedEvent::Start {
                    name: "act:name".into(),
                    attributes: vec![],
                },
                RecordedEvent::Text("Cash".into()),
                RecordedEvent::End("act:name".into()),
                RecordedEvent::Start {
                    name: "act:parent".into(),
                    attributes: vec![Attribute::new("type", "guid")],
                },
                RecordedEvent::End("act:parent".into()),
                RecordedEvent::End("gnc:account".into()),
            ]
        );
        assert_eq!(rec.opened(), vec!["gnc:account", "act:name", "act:parent"]);
    }

    #[test]
    fn walker_accepts_trait_objects() {
        let mut rec = EventRecorder::new();
        let sink: &mut dyn ContentSink = &mut rec;
        emit_element(&Element::new("x"), sink);
        assert_eq!(rec.events.len(), 2);
    }
}
