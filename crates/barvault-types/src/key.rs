//! Series identity.

use serde::{Deserialize, Serialize};

use crate::{SeriesKeyError, Timeframe};

/// Identifies one archived series: a symbol at a timeframe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    symbol: String,
    timeframe: Timeframe,
}

impl SeriesKey {
    /// Creates a key, rejecting symbols that cannot name a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the symbol is empty, starts with a dot, or contains
    /// path separators, whitespace or control characters.
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe) -> Result<Self, SeriesKeyError> {
        let symbol = symbol.into();
        let reason = if symbol.is_empty() {
            Some("symbol is empty")
        } else if symbol.starts_with('.') {
            Some("symbol starts with '.'")
        } else if symbol
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':') || c.is_whitespace() || c.is_control())
        {
            Some("symbol contains a path separator, whitespace or control character")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(SeriesKeyError::InvalidSymbol { symbol, reason }),
            None => Ok(Self { symbol, timeframe }),
        }
    }

    /// Creates a key from a symbol and a timeframe registry key.
    ///
    /// # Errors
    ///
    /// Returns an error if the timeframe is unknown or the symbol is invalid.
    pub fn parse(symbol: &str, timeframe: &str) -> Result<Self, SeriesKeyError> {
        let timeframe = timeframe.parse::<Timeframe>()?;
        Self::new(symbol, timeframe)
    }

    /// Returns the symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Returns the timeframe.
    #[must_use]
    pub const fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Returns the file stem shared by the canonical and mirror files.
    #[must_use]
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.symbol, self.timeframe)
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.symbol, self.timeframe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UnknownTimeframe;

    #[test]
    fn test_parse_key() {
        let key = SeriesKey::parse("WINZ24", "m5").unwrap();
        assert_eq!(key.symbol(), "WINZ24");
        assert_eq!(key.timeframe(), Timeframe::Minute5);
        assert_eq!(key.file_stem(), "WINZ24_M5");
        assert_eq!(key.to_string(), "WINZ24/M5");
    }

    #[test]
    fn test_unknown_timeframe() {
        let err = SeriesKey::parse("EURUSD", "tick").unwrap_err();
        assert_eq!(
            err,
            SeriesKeyError::Timeframe(UnknownTimeframe("tick".to_string()))
        );
    }

    #[test]
    fn test_invalid_symbols() {
        for symbol in ["", "../etc", "EUR/USD", "EUR USD", ".hidden"] {
            assert!(
                matches!(
                    SeriesKey::new(symbol, Timeframe::Hour1),
                    Err(SeriesKeyError::InvalidSymbol { .. })
                ),
                "{symbol:?} should be rejected"
            );
        }
        assert!(SeriesKey::new("EURUSD.a", Timeframe::Hour1).is_ok());
    }
}
