use std::path::Path;
use std::str::FromStr;

use gcx_types::CmdtyCurrId;
use gcx_xml::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{BookError, BookResult};

/// How a saved book is stored on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// Same as the file the book was loaded from.
    #[default]
    Auto,
    Gzip,
    Plain,
}

impl CompressionMode {
    pub fn encoding(&self, source: Encoding) -> Encoding {
        match self {
            Self::Auto => source,
            Self::Gzip => Encoding::Gzip,
            Self::Plain => Encoding::Plain,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Overrides the guessed book currency (`EUR`, `CURRENCY:EUR`).
    pub default_currency: Option<String>,
    pub compression: CompressionMode,
    /// Re-parse rendered output before replacing the target file.
    pub verify_after_write: bool,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            default_currency: None,
            compression: CompressionMode::Auto,
            verify_after_write: true,
        }
    }
}

impl BookConfig {
    pub fn from_toml_str(s: &str) -> BookResult<Self> {
        toml::from_str(s).map_err(|e| BookError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> BookResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The configured default currency, parsed.
    pub fn default_currency_id(&self) -> BookResult<Option<CmdtyCurrId>> {
        self.default_currency
            .as_deref()
            .map(|raw| {
                CmdtyCurrId::from_str(raw)
                    .map_err(|e| BookError::Config(format!("default_currency: {e}")))
            })
            .transpose()
    }
}
