use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use gcx_types::kind::{BOOK_TAG, ROOT_TAG};
use gcx_types::{CmdtyCurrId, Decimal, Guid, HeaderKind};
use gcx_writer::{write_layout, DocumentLayout, RoundTripWriter};
use gcx_xml::{decode_source, encode_output, parse_document, read_source, Attribute, Document, Element, Encoding, Node};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::BookConfig;
use crate::counts::CountData;
use crate::currency::CurrencyTable;
use crate::editor::BookEditor;
use crate::entities::ElementRef;
use crate::error::{BookError, BookResult};
use crate::index::EntityIndex;
use crate::loader::{LoadPipeline, LoadReport};
use crate::pricing::PriceResolver;

/// A loaded book.
///
/// The element tree is kept exactly as parsed; entities point into it. Saving
/// serializes the tree, so anything the entities do not model survives a
/// load/save cycle untouched.
#[derive(Debug)]
pub struct Book {
    root_name: String,
    root_attributes: Vec<Attribute>,
    preamble: Vec<Element>,
    book_attributes: Vec<Attribute>,
    pub(crate) header: Vec<Element>,
    pub(crate) elements: Vec<Element>,
    trailer: Vec<Element>,
    pub(crate) index: EntityIndex,
    report: LoadReport,
    pub(crate) currency: CurrencyTable,
    config: BookConfig,
    encoding: Encoding,
    pub(crate) modified: bool,
}

impl Book {
    // ---------------------------------------------------------------
    // Loading
    // ---------------------------------------------------------------

    pub fn open(path: &Path) -> BookResult<Self> {
        Self::open_with(path, BookConfig::default())
    }

    pub fn open_with(path: &Path, config: BookConfig) -> BookResult<Self> {
        let (data, encoding) = read_source(path)?;
        debug!(path = %path.display(), encoding = ?encoding, bytes = data.len(), "read book file");
        let document = parse_document(&data)?;
        Self::from_document(document, config, encoding)
    }

    /// Load from file contents, plain or gzip.
    pub fn from_bytes(data: Vec<u8>, config: BookConfig) -> BookResult<Self> {
        let (data, encoding) = decode_source(data)?;
        let document = parse_document(&data)?;
        Self::from_document(document, config, encoding)
    }

    pub fn from_document(document: Document, config: BookConfig, encoding: Encoding) -> BookResult<Self> {
        let root = document.root;
        if root.name != ROOT_TAG {
            return Err(BookError::StructuralViolation { tag: root.name });
        }

        let mut preamble = Vec::new();
        let mut trailer = Vec::new();
        let mut book = None;
        for node in root.children {
            let Node::Element(el) = node else {
                continue;
            };
            if el.name != BOOK_TAG {
                match book {
                    None => preamble.push(el),
                    Some(_) => trailer.push(el),
                }
            } else if book.is_some() {
                return Err(BookError::StructuralViolation { tag: el.name });
            } else {
                book = Some(el);
            }
        }
        let book = book.ok_or_else(|| BookError::StructuralViolation {
            tag: BOOK_TAG.to_string(),
        })?;

        let mut header = Vec::new();
        let mut elements = Vec::new();
        for node in book.children {
            let Node::Element(el) = node else {
                continue;
            };
            match HeaderKind::from_tag(&el.name) {
                Some(_) => header.push(el),
                None => elements.push(el),
            }
        }

        let declared = CountData::from_elements(&header);
        let (index, report) = LoadPipeline::new(&elements).run(&declared)?;

        let base = default_currency(&config, &index)?;
        let mut currency = CurrencyTable::new(base.clone());
        {
            let resolver = PriceResolver::new(index.prices.iter(), base.as_ref());
            currency.populate(&resolver);
        }

        info!(
            elements = elements.len(),
            default_currency = ?base,
            clean = report.is_clean(),
            "book opened"
        );
        Ok(Self {
            root_name: root.name,
            root_attributes: root.attributes,
            preamble,
            book_attributes: book.attributes,
            header,
            elements,
            trailer,
            index,
            report,
            currency,
            config,
            encoding,
            modified: false,
        })
    }

    // ---------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------

    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The book's `book:id`.
    pub fn id(&self) -> Option<Guid> {
        let el = self
            .header
            .iter()
            .find(|el| el.name == HeaderKind::BookId.tag())?;
        Guid::parse(el.text()).ok()
    }

    /// Declared counts: the file-level `book` count plus the book header.
    pub fn declared_counts(&self) -> CountData {
        CountData::from_elements(self.preamble.iter().chain(&self.header))
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, at: ElementRef) -> Option<&Element> {
        match at {
            ElementRef::Book(i) => self.elements.get(i),
            ElementRef::Nested { parent, pos } => self.elements.get(parent)?.element_at(pos),
        }
    }

    pub fn element_mut(&mut self, at: ElementRef) -> Option<&mut Element> {
        match at {
            ElementRef::Book(i) => self.elements.get_mut(i),
            ElementRef::Nested { parent, pos } => self.elements.get_mut(parent)?.element_at_mut(pos),
        }
    }

    // ---------------------------------------------------------------
    // Prices and currencies
    // ---------------------------------------------------------------

    pub fn default_currency(&self) -> Option<&CmdtyCurrId> {
        self.currency.base()
    }

    pub fn currency_table(&self) -> &CurrencyTable {
        &self.currency
    }

    /// A resolver over the current price records.
    pub fn resolver(&self) -> PriceResolver<'_> {
        PriceResolver::new(self.index.prices.iter(), self.currency.base())
    }

    pub fn resolve_price(&self, from: &CmdtyCurrId, to: Option<&CmdtyCurrId>) -> Option<Decimal> {
        self.resolver().resolve(from, to)
    }

    /// Recompute the currency table from the current prices.
    pub fn refresh_currency_table(&mut self) {
        let base = self.currency.base().cloned();
        let mut table = CurrencyTable::new(base.clone());
        {
            let resolver = PriceResolver::new(self.index.prices.iter(), base.as_ref());
            table.populate(&resolver);
        }
        self.currency = table;
    }

    /// Account balance converted into the default currency through the
    /// currency table.
    pub fn balance_in_default_currency(&self, account: &Guid) -> Option<Decimal> {
        let acct = self.index.accounts.get(account)?;
        let cmdty = acct.commodity.as_ref()?;
        let base = self.currency.base()?;
        self.currency.convert(self.index.balance(account), cmdty, base)
    }

    pub fn edit(&mut self) -> BookEditor<'_> {
        BookEditor::new(self)
    }

    // ---------------------------------------------------------------
    // Writing
    // ---------------------------------------------------------------

    pub fn layout(&self) -> DocumentLayout<'_> {
        DocumentLayout {
            root_name: &self.root_name,
            root_attributes: &self.root_attributes,
            preamble: &self.preamble,
            book_attributes: &self.book_attributes,
            header: &self.header,
            elements: &self.elements,
            trailer: &self.trailer,
        }
    }

    /// Serialize through `writer` and return its output.
    pub fn write_to<W: Write>(&self, mut writer: RoundTripWriter<W>) -> BookResult<W> {
        write_layout(&self.layout(), &mut writer)?;
        Ok(writer.finish()?)
    }

    /// The uncompressed document.
    pub fn to_bytes(&self) -> BookResult<Vec<u8>> {
        self.write_to(RoundTripWriter::new(Vec::new()))
    }

    /// Render, check, and atomically replace `path`.
    pub fn save(&mut self, path: &Path) -> BookResult<()> {
        let rendered = self.to_bytes()?;
        if self.config.verify_after_write {
            self.verify(&rendered)?;
        }
        let encoding = self.config.compression.encoding(self.encoding);
        let data = encode_output(rendered, encoding)?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| BookError::Io(e.error))?;

        self.modified = false;
        info!(path = %path.display(), bytes = data.len(), encoding = ?encoding, "book saved");
        Ok(())
    }

    /// Re-parse rendered output and check that every book element is there.
    fn verify(&self, rendered: &[u8]) -> BookResult<()> {
        let document = parse_document(rendered)?;
        let book = document
            .root
            .child(BOOK_TAG)
            .ok_or_else(|| BookError::VerificationFailed("no book in output".into()))?;

        let written = census(book.elements().filter(|el| HeaderKind::from_tag(&el.name).is_none()));
        let expected = census(self.elements.iter());
        if written != expected {
            warn!(?expected, ?written, "rendered book differs from memory");
            return Err(BookError::VerificationFailed(
                "book elements lost or altered in output".into(),
            ));
        }
        Ok(())
    }
}

/// Element count and total subtree size per tag.
fn census<'e>(elements: impl Iterator<Item = &'e Element>) -> BTreeMap<&'e str, (usize, usize)> {
    let mut tags: BTreeMap<&'e str, (usize, usize)> = BTreeMap::new();
    for el in elements {
        let entry = tags.entry(el.name.as_str()).or_default();
        entry.0 += 1;
        entry.1 += el.subtree_len();
    }
    tags
}

/// Config override, else the most common top-level currency, else the root
/// account's currency, else the first currency commodity.
fn default_currency(config: &BookConfig, index: &EntityIndex) -> BookResult<Option<CmdtyCurrId>> {
    if let Some(configured) = config.default_currency_id()? {
        return Ok(Some(configured));
    }
    let guessed = index
        .dominant_top_level_currency()
        .or_else(|| {
            index
                .root_account()
                .and_then(|root| root.commodity.clone())
                .filter(CmdtyCurrId::is_currency)
        })
        .or_else(|| index.commodities.keys().find(|id| id.is_currency()).cloned());
    Ok(guessed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<gnc-v2
     xmlns:gnc="http://www.gnucash.org/XML/gnc"
     xmlns:act="http://www.gnucash.org/XML/act"
     xmlns:book="http://www.gnucash.org/XML/book"
     xmlns:cmdty="http://www.gnucash.org/XML/cmdty">
<gnc:count-data cd:type="book">1</gnc:count-data>
<gnc:book version="2.0.0">
<book:id type="guid">AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA</book:id>
<gnc:count-data cd:type="account">1</gnc:count-data>
<gnc:account version="2.0.0">
  <act:name>Root Account</act:name>
  <act:id type="guid">11111111111111111111111111111111</act:id>
  <act:type>ROOT</act:type>
  <act:commodity>
    <cmdty:space>ISO4217</cmdty:space>
    <cmdty:id>CHF</cmdty:id>
  </act:commodity>
</gnc:account>
<gnc:commodity version="2.0.0">
  <cmdty:space>ISO4217</cmdty:space>
  <cmdty:id>CHF</cmdty:id>
</gnc:commodity>
</gnc:book>
</gnc-v2>
"#;

    fn minimal() -> Book {
        Book::from_bytes(MINIMAL.as_bytes().to_vec(), BookConfig::default()).unwrap()
    }

    #[test]
    fn splits_header_from_elements() {
        let book = minimal();
        assert_eq!(book.header.len(), 2);
        assert_eq!(book.elements.len(), 2);
        assert_eq!(book.preamble.len(), 1);
        assert_eq!(book.id(), Some(Guid::from_bytes([0xaa; 16])));
        assert!(book.report().is_clean());
        assert!(!book.is_modified());
    }

    #[test]
    fn declared_counts_include_the_file_level_book_count() {
        let book = minimal();
        let counts = book.declared_counts();
        assert_eq!(counts.get("book"), Some(1));
        assert_eq!(counts.get("account"), Some(1));
        assert_eq!(counts.len(), 2);
    }

    #[test]
    fn root_account_currency_is_the_fallback_default() {
        let book = minimal();
        assert_eq!(book.default_currency(), Some(&CmdtyCurrId::currency("CHF")));
    }

    #[test]
    fn configured_currency_wins() {
        let config = BookConfig {
            default_currency: Some("EUR".into()),
            ..BookConfig::default()
        };
        let book = Book::from_bytes(MINIMAL.as_bytes().to_vec(), config).unwrap();
        assert_eq!(book.default_currency(), Some(&CmdtyCurrId::currency("EUR")));
    }

    #[test]
    fn wrong_root_is_structural() {
        let xml = MINIMAL.replace("gnc-v2", "gnc-v3");
        match Book::from_bytes(xml.into_bytes(), BookConfig::default()) {
            Err(BookError::StructuralViolation { tag }) => assert_eq!(tag, "gnc-v3"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn second_book_is_structural() {
        let xml = MINIMAL.replace(
            "</gnc-v2>",
            "<gnc:book version=\"2.0.0\"></gnc:book>\n</gnc-v2>",
        );
        assert!(matches!(
            Book::from_bytes(xml.into_bytes(), BookConfig::default()),
            Err(BookError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn missing_book_is_structural() {
        let xml = "<gnc-v2><gnc:count-data cd:type=\"book\">0</gnc:count-data></gnc-v2>";
        assert!(matches!(
            Book::from_bytes(xml.as_bytes().to_vec(), BookConfig::default()),
            Err(BookError::StructuralViolation { .. })
        ));
    }

    #[test]
    fn output_sorts_commodities_first() {
        let book = minimal();
        let out = String::from_utf8(book.to_bytes().unwrap()).unwrap();
        let commodity = out.find("<gnc:commodity").unwrap();
        let account = out.find("<gnc:account").unwrap();
        assert!(commodity < account);
        assert!(out.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn verify_accepts_own_output() {
        let book = minimal();
        let out = book.to_bytes().unwrap();
        book.verify(&out).unwrap();
    }

    #[test]
    fn verify_rejects_lost_elements() {
        let book = minimal();
        let out = String::from_utf8(book.to_bytes().unwrap()).unwrap();
        let start = out.find("<gnc:commodity").unwrap();
        let end = out.find("</gnc:commodity>").unwrap() + "</gnc:commodity>".len();
        let truncated = format!("{}{}", &out[..start], &out[end..]);
        assert!(matches!(
            book.verify(truncated.as_bytes()),
            Err(BookError::VerificationFailed(_))
        ));
    }

    #[test]
    fn save_writes_plain_and_clears_modified() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.gnucash");
        let mut book = minimal();
        book.modified = true;
        book.save(&path).unwrap();
        assert!(!book.is_modified());
        let reopened = Book::open(&path).unwrap();
        assert_eq!(reopened.encoding(), Encoding::Plain);
        assert_eq!(reopened.index().accounts.len(), 1);
    }
}
