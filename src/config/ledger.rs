//! Ledger configuration loading from config.toml
//!
//! The file names the currency every amount is expressed in and, optionally, a list
//! of members to create on first run.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Currency used for amounts and display
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// Members to seed when missing
    #[serde(default)]
    pub members: Vec<MemberConfig>,
}

/// Currency settings
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CurrencyConfig {
    /// ISO code stored with every expense (e.g., "INR")
    pub code: String,
    /// Symbol used when formatting amounts (e.g., "₹")
    pub symbol: String,
    /// Number of minor-unit digits (2 for cents/paise, 0 for yen)
    pub minor_unit_digits: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: "INR".to_string(),
            symbol: "₹".to_string(),
            minor_unit_digits: 2,
        }
    }
}

/// A member to create on startup
#[derive(Debug, Deserialize, Clone)]
pub struct MemberConfig {
    /// Display name, also used to detect already-seeded members
    pub display_name: String,
}

/// Loads ledger configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The minor-unit exponent is too large to represent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text.
pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    // i64 minor units cannot hold more than 18 decimal digits
    if config.currency.minor_unit_digits > 18 {
        return Err(Error::Config {
            message: format!(
                "minor_unit_digits must be at most 18, got {}",
                config.currency.minor_unit_digits
            ),
        });
    }

    Ok(config)
}

/// Loads configuration from the default location (./config.toml), falling back to
/// defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if !path.exists() {
        tracing::warn!("config.toml not found, using default currency settings");
        return Ok(Config::default());
    }
    load_config(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_ledger_config() {
        let toml_str = r#"
            [currency]
            code = "EUR"
            symbol = "€"
            minor_unit_digits = 2

            [[members]]
            display_name = "Priya"

            [[members]]
            display_name = "Rahul"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.currency.code, "EUR");
        assert_eq!(config.currency.symbol, "€");
        assert_eq!(config.members.len(), 2);
        assert_eq!(config.members[1].display_name, "Rahul");
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = parse_config("").unwrap();
        assert_eq!(config.currency, CurrencyConfig::default());
        assert!(config.members.is_empty());
    }

    #[test]
    fn test_rejects_oversized_exponent() {
        let toml_str = r#"
            [currency]
            code = "XXX"
            symbol = "X"
            minor_unit_digits = 30
        "#;
        assert!(matches!(
            parse_config(toml_str),
            Err(Error::Config { message: _ })
        ));
    }
}
