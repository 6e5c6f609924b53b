use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of fractional digits used when presenting converted totals.
pub const DISPLAY_SCALE: u32 = 2;

/// Currencies a statement may report cash flow in.
/// RUR is the primary currency; USD is converted into it via the reference rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Rur,
    Usd,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Rur => "RUR",
            Currency::Usd => "USD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Rur => "₽",
            Currency::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RUR" => Ok(Currency::Rur),
            "USD" => Ok(Currency::Usd),
            other => Err(ParseCurrencyError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCurrencyError {
    Unsupported(String),
}

impl fmt::Display for ParseCurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCurrencyError::Unsupported(code) => write!(f, "unsupported currency: {}", code),
        }
    }
}

impl std::error::Error for ParseCurrencyError {}

/// Round a value for presentation. Accumulation must stay unrounded;
/// only the final figure shown to the user goes through here.
/// Midpoints round to even.
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp(DISPLAY_SCALE)
}

/// Convert a secondary-currency amount into the primary currency.
pub fn to_primary(primary: Decimal, secondary: Decimal, rate: Decimal) -> Decimal {
    primary + secondary * rate
}
