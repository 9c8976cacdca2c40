use std::io::{self, Write};

use chrono::Utc;
use gcx_xml::{Attribute, ContentSink};
use tracing::error;

use crate::error::{WriterError, WriterResult};
use crate::format::{
    attributes_on_own_lines, escape_attr, escape_text, indent_width, is_guid_field,
    needs_explicit_close, INDENT_STEP, TEMPLATE_TRANSACTIONS_TAG,
};

const DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n";
const GENERATED_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// What the writer emitted last. Decides how the next token is joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing but the declaration so far.
    Fresh,
    /// `<tag attrs` is written and the `>` is still pending.
    JustOpened,
    /// A closing tag (or `/>`) was written.
    JustClosed,
    /// Character data was written inside the current element.
    JustWroteText,
}

#[derive(Debug)]
struct OpenElement {
    guid: bool,
    explicit_close: bool,
}

/// Streaming serializer reproducing the reference book layout.
///
/// I/O failures inside the callbacks are logged and swallowed. The first one
/// is kept; after it nothing more is written. [`RoundTripWriter::finish`] is
/// the only place the failure becomes visible.
pub struct RoundTripWriter<W: Write> {
    out: W,
    state: WriterState,
    depth: usize,
    in_template: bool,
    open: Vec<OpenElement>,
    generated_at: String,
    failure: Option<io::Error>,
}

impl<W: Write> RoundTripWriter<W> {
    /// Writer whose trailer carries the current time.
    pub fn new(out: W) -> Self {
        let now = Utc::now().format(GENERATED_FORMAT).to_string();
        Self::with_generated_at(out, now)
    }

    /// Writer with a fixed trailer timestamp.
    pub fn with_generated_at(out: W, generated_at: impl Into<String>) -> Self {
        Self {
            out,
            state: WriterState::Fresh,
            depth: 0,
            in_template: false,
            open: Vec::new(),
            generated_at: generated_at.into(),
            failure: None,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Current nesting in columns.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The first swallowed I/O failure, if any.
    pub fn failure(&self) -> Option<&io::Error> {
        self.failure.as_ref()
    }

    /// Flush and hand back the output, or the latched failure.
    pub fn finish(mut self) -> WriterResult<W> {
        if let Some(err) = self.failure.take() {
            return Err(WriterError::Io(err));
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write(&mut self, s: &str) {
        if self.failure.is_some() {
            return;
        }
        if let Err(err) = self.out.write_all(s.as_bytes()) {
            error!(error = %err, depth = self.depth, "write failed, output is incomplete");
            self.failure = Some(err);
        }
    }

    fn write_indent(&mut self) {
        let width = indent_width(self.depth, self.in_template);
        if width > 0 {
            self.write(&" ".repeat(width));
        }
    }
}

impl<W: Write> ContentSink for RoundTripWriter<W> {
    fn start_document(&mut self) {
        self.write(DECLARATION);
    }

    fn start_element(&mut self, name: &str, attributes: &[Attribute]) {
        match self.state {
            WriterState::JustOpened => {
                self.write(">\n");
                self.write_indent();
            }
            WriterState::JustClosed => {
                self.write("\n");
                self.write_indent();
            }
            WriterState::JustWroteText | WriterState::Fresh => {}
        }

        self.write("<");
        self.write(name);
        let own_lines = attributes_on_own_lines(self.depth);
        for attr in attributes {
            self.write(if own_lines { "\n     " } else { " " });
            self.write(&attr.name);
            self.write("=\"");
            self.write(&escape_attr(&attr.value));
            self.write("\"");
        }

        self.open.push(OpenElement {
            guid: is_guid_field(attributes),
            explicit_close: needs_explicit_close(name, attributes),
        });
        self.depth += INDENT_STEP;
        self.state = WriterState::JustOpened;
        if name == TEMPLATE_TRANSACTIONS_TAG {
            self.in_template = true;
        }
    }

    fn characters(&mut self, text: &str) {
        match self.state {
            WriterState::JustOpened => self.write(">"),
            // Stray text between elements is layout, never content.
            WriterState::JustClosed | WriterState::Fresh => return,
            WriterState::JustWroteText => {}
        }
        let guid = self.open.last().is_some_and(|e| e.guid);
        if guid {
            self.write(&text.to_lowercase());
        } else {
            self.write(&escape_text(text));
        }
        self.state = WriterState::JustWroteText;
    }

    fn end_element(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(INDENT_STEP);
        let explicit_close = self.open.pop().is_some_and(|e| e.explicit_close);

        match self.state {
            WriterState::JustClosed => {
                self.write("\n");
                self.write_indent();
                self.write("</");
                self.write(name);
                self.write(">");
            }
            WriterState::JustOpened if explicit_close => {
                self.write("></");
                self.write(name);
                self.write(">");
            }
            WriterState::JustOpened => self.write("/>"),
            WriterState::JustWroteText | WriterState::Fresh => {
                self.write("</");
                self.write(name);
                self.write(">");
            }
        }

        self.state = WriterState::JustClosed;
        if name == TEMPLATE_TRANSACTIONS_TAG {
            self.in_template = false;
        }
    }

    fn end_document(&mut self) {
        let trailer = format!(
            "\n\n<!-- Generated {} -->\n\
             <!-- Local variables: -->\n\
             <!-- mode: xml        -->\n\
             <!-- End:             -->\n",
            self.generated_at
        );
        self.write(&trailer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcx_xml::{emit_element, Element};

    fn render(f: impl FnOnce(&mut RoundTripWriter<Vec<u8>>)) -> String {
        let mut w = RoundTripWriter::with_generated_at(Vec::new(), "T");
        f(&mut w);
        String::from_utf8(w.finish().unwrap()).unwrap()
    }

    fn nest(depth_levels: usize, leaf: Element) -> Element {
        (0..depth_levels).fold(leaf, |inner, i| Element::new(format!("n{i}")).with_child(inner))
    }

    #[test]
    fn leaf_text_is_written_inline() {
        let out = render(|w| emit_element(&Element::new("act:name").with_text("Cash"), w));
        assert_eq!(out, "<act:name>Cash</act:name>");
    }

    #[test]
    fn empty_element_self_closes() {
        let out = render(|w| emit_element(&Element::new("cmdty:get_quotes"), w));
        assert_eq!(out, "<cmdty:get_quotes/>");
    }

    #[test]
    fn empty_string_slot_has_explicit_pair() {
        // Below the root, where attributes stay on the tag line.
        let el = Element::new("r").with_child(Element::new("slot:value").with_attr("type", "string"));
        let out = render(|w| emit_element(&el, w));
        assert_eq!(out, "<r>\n<slot:value type=\"string\"></slot:value>\n</r>");
    }

    #[test]
    fn empty_description_has_explicit_pair() {
        let out = render(|w| emit_element(&Element::new("trn:description"), w));
        assert_eq!(out, "<trn:description></trn:description>");
    }

    #[test]
    fn guid_text_is_lowercased_and_not_escaped() {
        let el = Element::new("r").with_child(
            Element::new("act:id")
                .with_attr("type", "guid")
                .with_text("ABCDEF0123456789ABCDEF0123456789"),
        );
        let out = render(|w| emit_element(&el, w));
        assert_eq!(
            out,
            "<r>\n<act:id type=\"guid\">abcdef0123456789abcdef0123456789</act:id>\n</r>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let el = Element::new("trn:description").with_text("Fish & \"Chips\" <3>");
        let out = render(|w| emit_element(&el, w));
        assert_eq!(
            out,
            "<trn:description>Fish &amp; &quot;Chips&quot; &lt;3&gt;</trn:description>"
        );
    }

    #[test]
    fn children_go_on_new_lines_with_indent() {
        // Outer is opened at depth 4, its children at depth 6.
        let el = nest(
            2,
            Element::new("gnc:commodity")
                .with_child(Element::new("cmdty:space").with_text("ISO4217"))
                .with_child(Element::new("cmdty:id").with_text("EUR")),
        );
        let out = render(|w| emit_element(&el, w));
        assert_eq!(
            out,
            "<n1>\n<n0>\n<gnc:commodity>\n  <cmdty:space>ISO4217</cmdty:space>\n  <cmdty:id>EUR</cmdty:id>\n</gnc:commodity>\n</n0>\n</n1>"
        );
    }

    #[test]
    fn template_subtree_uses_smaller_indent() {
        // `trn:id` is opened at depth 8 in both documents.
        let leaf = Element::new("trn:id").with_attr("type", "guid").with_text("AA");
        let plain = nest(2, Element::new("gnc:transaction").with_child(leaf.clone()));
        let plain = Element::new("n9").with_child(plain);
        let templ = nest(
            1,
            Element::new("gnc:template-transactions")
                .with_child(Element::new("gnc:transaction").with_child(leaf)),
        );
        let templ = Element::new("n9").with_child(templ);

        let plain_out = render(|w| emit_element(&plain, w));
        let templ_out = render(|w| emit_element(&templ, w));
        assert!(plain_out.contains("\n    <trn:id type=\"guid\">aa</trn:id>"));
        assert!(templ_out.contains("\n  <trn:id type=\"guid\">aa</trn:id>"));
        assert!(!templ_out.contains("\n    <trn:id"));
    }

    #[test]
    fn template_flag_is_cleared_after_close() {
        let mut w = RoundTripWriter::with_generated_at(Vec::new(), "T");
        w.start_element("gnc:template-transactions", &[]);
        assert!(w.in_template);
        w.end_element("gnc:template-transactions");
        assert!(!w.in_template);
        assert_eq!(w.depth(), 0);
    }

    #[test]
    fn root_attributes_go_on_their_own_lines() {
        let root = Element::new("gnc-v2")
            .with_attr("xmlns:gnc", "http://www.gnucash.org/XML/gnc")
            .with_attr("xmlns:act", "http://www.gnucash.org/XML/act")
            .with_child(Element::new("gnc:book").with_attr("version", "2.0.0"));
        let out = render(|w| {
            w.start_document();
            emit_element(&root, w);
            w.end_document();
        });
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
             <gnc-v2\n     xmlns:gnc=\"http://www.gnucash.org/XML/gnc\"\n     xmlns:act=\"http://www.gnucash.org/XML/act\">\n\
             <gnc:book version=\"2.0.0\"/>\n\
             </gnc-v2>\n\n\
             <!-- Generated T -->\n\
             <!-- Local variables: -->\n\
             <!-- mode: xml        -->\n\
             <!-- End:             -->\n"
        );
    }

    #[test]
    fn state_machine_transitions() {
        let mut w = RoundTripWriter::with_generated_at(Vec::new(), "T");
        assert_eq!(w.state(), WriterState::Fresh);
        w.start_element("a", &[]);
        assert_eq!(w.state(), WriterState::JustOpened);
        w.characters("x");
        assert_eq!(w.state(), WriterState::JustWroteText);
        w.end_element("a");
        assert_eq!(w.state(), WriterState::JustClosed);
        w.characters("\n  ");
        assert_eq!(w.state(), WriterState::JustClosed);
    }

    struct FailAfter {
        budget: usize,
        written: Vec<u8>,
    }

    impl Write for FailAfter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.budget {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_failure_is_swallowed_then_reported_by_finish() {
        let mut w = RoundTripWriter::with_generated_at(
            FailAfter {
                budget: 8,
                written: Vec::new(),
            },
            "T",
        );
        let el = Element::new("act:name").with_text("a long account name");
        emit_element(&el, &mut w);
        assert!(w.failure().is_some());
        assert!(matches!(w.finish(), Err(WriterError::Io(_))));
    }

    #[test]
    fn nothing_is_written_after_a_failure() {
        let mut w = RoundTripWriter::with_generated_at(
            FailAfter {
                budget: 3,
                written: Vec::new(),
            },
            "T",
        );
        w.start_element("abcdef", &[]);
        w.end_element("abcdef");
        assert_eq!(w.out.written, b"<");
    }
}
