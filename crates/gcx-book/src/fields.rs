//! Typed field extraction from entity elements.

use gcx_types::numeric::parse_numeric;
use gcx_types::time::{parse_date, parse_timestamp, Timestamp};
use gcx_types::{CmdtyCurrId, Decimal, Guid};
use gcx_xml::Element;

use crate::entities::{OwnerKind, OwnerRef};
use crate::error::{EntityError, EntityResult};

/// Read-only accessor over the children of one entity element.
///
/// Optional accessors return `Ok(None)` for an absent field but an error for
/// a present field whose text does not parse.
#[derive(Clone, Copy)]
pub(crate) struct Fields<'a> {
    el: &'a Element,
}

impl<'a> Fields<'a> {
    pub fn new(el: &'a Element) -> Self {
        Self { el }
    }

    pub fn element(&self, tag: &str) -> Option<&'a Element> {
        self.el.child(tag)
    }

    pub fn text(&self, tag: &str) -> Option<String> {
        self.el.child_text(tag).map(str::to_string)
    }

    pub fn required_text(&self, tag: &str) -> EntityResult<String> {
        let text = self.text(tag).ok_or_else(|| EntityError::missing(tag))?;
        if text.trim().is_empty() {
            return Err(EntityError::missing(tag));
        }
        Ok(text)
    }

    pub fn guid(&self, tag: &str) -> EntityResult<Option<Guid>> {
        self.parsed(tag, Guid::parse)
    }

    pub fn required_guid(&self, tag: &str) -> EntityResult<Guid> {
        self.guid(tag)?.ok_or_else(|| EntityError::missing(tag))
    }

    pub fn numeric(&self, tag: &str) -> EntityResult<Option<Decimal>> {
        self.parsed(tag, parse_numeric)
    }

    pub fn required_numeric(&self, tag: &str) -> EntityResult<Decimal> {
        self.numeric(tag)?.ok_or_else(|| EntityError::missing(tag))
    }

    pub fn integer(&self, tag: &str) -> EntityResult<Option<i64>> {
        self.parsed(tag, |s| {
            s.trim()
                .parse::<i64>()
                .map_err(|_| gcx_types::TypeError::InvalidNumeric(s.to_string()))
        })
    }

    /// Flags are written as `1`/`0`, occasionally `Y`/`N` or `true`/`false`.
    pub fn flag(&self, tag: &str) -> EntityResult<Option<bool>> {
        self.parsed(tag, |s| match s.trim() {
            "1" | "Y" | "y" | "true" | "TRUE" => Ok(true),
            "0" | "N" | "n" | "false" | "FALSE" => Ok(false),
            other => Err(gcx_types::TypeError::UnknownVariant {
                kind: "flag",
                value: other.to_string(),
            }),
        })
    }

    /// `<tag><ts:date>...</ts:date></tag>`
    pub fn timestamp(&self, tag: &str) -> EntityResult<Option<Timestamp>> {
        let Some(el) = self.el.child(tag) else {
            return Ok(None);
        };
        let raw = el.child_text("ts:date").ok_or_else(|| EntityError::missing("ts:date"))?;
        parse_timestamp(raw)
            .map(Some)
            .map_err(|e| EntityError::invalid(tag, e))
    }

    pub fn required_timestamp(&self, tag: &str) -> EntityResult<Timestamp> {
        self.timestamp(tag)?.ok_or_else(|| EntityError::missing(tag))
    }

    /// `<tag><gdate>...</gdate></tag>`
    pub fn date(&self, tag: &str) -> EntityResult<Option<chrono::NaiveDate>> {
        let Some(el) = self.el.child(tag) else {
            return Ok(None);
        };
        let raw = el.child_text("gdate").ok_or_else(|| EntityError::missing("gdate"))?;
        parse_date(raw)
            .map(Some)
            .map_err(|e| EntityError::invalid(tag, e))
    }

    /// `<tag><cmdty:space>..</cmdty:space><cmdty:id>..</cmdty:id></tag>`
    pub fn commodity(&self, tag: &str) -> EntityResult<Option<CmdtyCurrId>> {
        match self.el.child(tag) {
            Some(el) => commodity_ref(el).map(Some).map_err(|e| match e {
                EntityError::InvalidField { source, .. } => EntityError::invalid(tag, source),
                other => other,
            }),
            None => Ok(None),
        }
    }

    /// `<tag><owner:type>gncCustomer</owner:type><owner:id type="guid">..</owner:id></tag>`
    pub fn owner(&self, tag: &str) -> EntityResult<Option<OwnerRef>> {
        let Some(el) = self.el.child(tag) else {
            return Ok(None);
        };
        let inner = Fields::new(el);
        let raw_kind = inner.required_text("owner:type")?;
        let kind = OwnerKind::from_file(&raw_kind).map_err(|e| EntityError::invalid(tag, e))?;
        let id = inner.required_guid("owner:id")?;
        Ok(Some(OwnerRef { kind, id }))
    }

    fn parsed<T, E, F>(&self, tag: &str, parse: F) -> EntityResult<Option<T>>
    where
        F: FnOnce(&str) -> Result<T, E>,
        E: Into<gcx_types::TypeError>,
    {
        match self.el.child_text(tag) {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(raw)
                .map(Some)
                .map_err(|e| EntityError::invalid(tag, e.into())),
        }
    }
}

/// Parse a `cmdty:space` / `cmdty:id` pair out of `el`.
pub(crate) fn commodity_ref(el: &Element) -> EntityResult<CmdtyCurrId> {
    let space = el
        .child_text("cmdty:space")
        .ok_or_else(|| EntityError::missing("cmdty:space"))?;
    let id = el
        .child_text("cmdty:id")
        .ok_or_else(|| EntityError::missing("cmdty:id"))?;
    CmdtyCurrId::from_parts(space, id).map_err(|e| EntityError::invalid("cmdty:id", e))
}

/// Build the `cmdty:space` / `cmdty:id` children for `tag`.
pub(crate) fn commodity_element(tag: &str, id: &CmdtyCurrId) -> Element {
    Element::new(tag)
        .with_child(Element::new("cmdty:space").with_text(id.file_namespace()))
        .with_child(Element::new("cmdty:id").with_text(id.code()))
}
