//! GnuCash numeric values.
//!
//! Monetary amounts are stored in the file as fractions `numerator/denominator`
//! (`1250/100`). They are read into exact [`Decimal`] values; floating point is
//! never involved.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::TypeError;

/// Parse a GnuCash fraction (`n/d`) or a plain decimal literal.
pub fn parse_numeric(s: &str) -> Result<Decimal, TypeError> {
    let s = s.trim();
    let invalid = || TypeError::InvalidNumeric(s.to_string());
    match s.split_once('/') {
        Some((num, den)) => {
            let num = Decimal::from_str(num.trim()).map_err(|_| invalid())?;
            let den = Decimal::from_str(den.trim()).map_err(|_| invalid())?;
            if den.is_zero() {
                return Err(invalid());
            }
            num.checked_div(den).ok_or_else(invalid)
        }
        None => Decimal::from_str(s).map_err(|_| invalid()),
    }
}

/// Render a decimal as a fraction whose denominator is `10^scale`.
///
/// `22.50` becomes `2250/100`, `7` becomes `7/1`.
pub fn format_numeric(value: Decimal) -> String {
    let denominator = 10i128.pow(value.scale());
    format!("{}/{}", value.mantissa(), denominator)
}
