use serde::{Deserialize, Serialize};

use crate::{ResultEngine, ValidationError};

/// Currency code a room keeps its ledger in (e.g. `MAD`, `EUR`).
///
/// Rooms are mono-currency: every expense copies the room currency when it is
/// created, so amounts of one room can always be added together.
///
/// ## Minor units
///
/// Amounts are stored as integer **minor units** (see `MoneyCents`). Every
/// supported code uses 2 fraction digits, so `10.50 MAD` ⇄ `1050`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    pub const DEFAULT_CODE: &'static str = "MAD";

    /// Validates and normalizes a currency code: 2 to 6 ASCII letters,
    /// stored uppercase.
    pub fn parse(code: &str) -> ResultEngine<Self> {
        let trimmed = code.trim();
        if !(2..=6).contains(&trimmed.len()) || !trimmed.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::field(
                "currency",
                format!("expected 2 to 6 letters, got {trimmed:?}"),
            )
            .into());
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Canonical currency code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(&self) -> u8 {
        2
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self(Self::DEFAULT_CODE.to_string())
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<String> for Currency {
    type Error = crate::EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_to_uppercase() {
        assert_eq!(Currency::parse(" mad ").unwrap().code(), "MAD");
        assert_eq!(Currency::parse("eur").unwrap().code(), "EUR");
    }

    #[test]
    fn parse_rejects_bad_codes() {
        assert!(Currency::parse("E").is_err());
        assert!(Currency::parse("EURO123").is_err());
        assert!(Currency::parse("E1").is_err());
    }
}
