use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Namespace reserved for ISO-4217 currencies in qualified IDs.
pub const CURRENCY_NAMESPACE: &str = "CURRENCY";

/// Namespace token GnuCash writes into `cmdty:space` for currencies.
pub const ISO4217_NAMESPACE: &str = "ISO4217";

/// Qualified commodity ID: a `(namespace, code)` pair.
///
/// Currencies form their own variant so that `ISO4217:EUR` and
/// `CURRENCY:EUR` compare equal. Everything else (stocks, funds, the
/// `template` namespace of scheduled transactions) is a security.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CmdtyCurrId {
    /// ISO-4217 currency, identified by its code.
    Currency(String),
    /// Any non-currency commodity.
    Security { namespace: String, code: String },
}

impl CmdtyCurrId {
    /// Currency shorthand.
    pub fn currency(code: impl Into<String>) -> Self {
        Self::Currency(code.into())
    }

    /// Security shorthand.
    pub fn security(namespace: impl Into<String>, code: impl Into<String>) -> Self {
        Self::Security {
            namespace: namespace.into(),
            code: code.into(),
        }
    }

    /// Build from the `cmdty:space` / `cmdty:id` pair of a file.
    pub fn from_parts(namespace: &str, code: &str) -> Result<Self, TypeError> {
        let namespace = namespace.trim();
        let code = code.trim();
        if namespace.is_empty() || code.is_empty() {
            return Err(TypeError::InvalidCommodity(format!("{namespace}:{code}")));
        }
        if namespace == ISO4217_NAMESPACE || namespace == CURRENCY_NAMESPACE {
            Ok(Self::Currency(code.to_string()))
        } else {
            Ok(Self::security(namespace, code))
        }
    }

    /// Namespace used in qualified display form.
    pub fn namespace(&self) -> &str {
        match self {
            Self::Currency(_) => CURRENCY_NAMESPACE,
            Self::Security { namespace, .. } => namespace,
        }
    }

    /// Namespace token to write into `cmdty:space`.
    pub fn file_namespace(&self) -> &str {
        match self {
            Self::Currency(_) => ISO4217_NAMESPACE,
            Self::Security { namespace, .. } => namespace,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Self::Currency(code) => code,
            Self::Security { code, .. } => code,
        }
    }

    pub fn is_currency(&self) -> bool {
        matches!(self, Self::Currency(_))
    }
}

impl FromStr for CmdtyCurrId {
    type Err = TypeError;

    /// Accepts `NAMESPACE:CODE`; a bare code is read as a currency.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((namespace, code)) => Self::from_parts(namespace, code),
            None if !s.trim().is_empty() => Ok(Self::Currency(s.trim().to_string())),
            None => Err(TypeError::InvalidCommodity(s.to_string())),
        }
    }
}

impl fmt::Debug for CmdtyCurrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CmdtyCurrId({self})")
    }
}

impl fmt::Display for CmdtyCurrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso4217_space_is_a_currency() {
        let id = CmdtyCurrId::from_parts("ISO4217", "EUR").unwrap();
        assert_eq!(id, CmdtyCurrId::currency("EUR"));
        assert!(id.is_currency());
        assert_eq!(id.to_string(), "CURRENCY:EUR");
        assert_eq!(id.file_namespace(), "ISO4217");
    }

    #[test]
    fn currency_namespace_aliases_iso4217() {
        let a: CmdtyCurrId = "CURRENCY:USD".parse().unwrap();
        let b: CmdtyCurrId = "ISO4217:USD".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn securities_keep_their_namespace() {
        let id: CmdtyCurrId = "EUREX:MBG".parse().unwrap();
        assert!(!id.is_currency());
        assert_eq!(id.namespace(), "EUREX");
        assert_eq!(id.code(), "MBG");
        assert_eq!(id.file_namespace(), "EUREX");
    }

    #[test]
    fn bare_code_is_a_currency() {
        let id: CmdtyCurrId = "JPY".parse().unwrap();
        assert_eq!(id, CmdtyCurrId::currency("JPY"));
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(CmdtyCurrId::from_parts("", "EUR").is_err());
        assert!(CmdtyCurrId::from_parts("NASDAQ", " ").is_err());
        assert!("".parse::<CmdtyCurrId>().is_err());
    }

    #[test]
    fn parts_are_trimmed() {
        let id = CmdtyCurrId::from_parts(" NYSE ", "\nIBM ").unwrap();
        assert_eq!(id, CmdtyCurrId::security("NYSE", "IBM"));
    }
}
