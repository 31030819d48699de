//! Currency amount formatting.

use std::fmt;

/// Currencies rendered with a glyph and two decimals, keyed by lowercase ISO code.
///
/// Every other currency is shown as `{minor units} {CODE}`.
pub const CURRENCY_GLYPHS: &[(&str, &str)] = &[("usd", "$"), ("eur", "€")];

/// An amount in a currency's smallest unit, as Stripe reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money<'a> {
    pub currency: &'a str,
    pub minor_units: i64,
}

impl<'a> Money<'a> {
    pub fn new(currency: &'a str, minor_units: i64) -> Self {
        Self {
            currency,
            minor_units,
        }
    }

    fn glyph(&self) -> Option<&'static str> {
        CURRENCY_GLYPHS
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(self.currency))
            .map(|(_, glyph)| *glyph)
    }
}

impl fmt::Display for Money<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.glyph() {
            Some(glyph) => write!(f, "{}{:.2}", glyph, self.minor_units as f64 / 100.0),
            None => write!(
                f,
                "{} {}",
                self.minor_units,
                self.currency.to_ascii_uppercase()
            ),
        }
    }
}

/// Format an amount given in minor units.
pub fn format_amount(currency: &str, minor_units: i64) -> String {
    Money::new(currency, minor_units).to_string()
}
