//! Deployment configuration
//!
//! Describes the token to mint and the signer accounts to fund before the
//! savings ledger is deployed. Amounts are decimal strings in whole units
//! (`"1000000"`, `"0.5"`) and are scaled to base units on use.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::numeric::{Amount, ETHER_DECIMALS};

use crate::errors::ConfigError;

/// Token minted to the deployer at deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    /// Whole tokens minted to the deployer.
    pub initial_supply: Decimal,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "Coval".to_string(),
            symbol: "COV".to_string(),
            decimals: 18,
            initial_supply: Decimal::new(1_000_000, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    pub token: TokenConfig,
    /// Signer labels in order; the first one deploys both contracts.
    pub accounts: Vec<String>,
    /// Whole ether credited to every signer at genesis.
    pub prefund_ether: Decimal,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            accounts: vec!["owner".to_string(), "account1".to_string()],
            prefund_ether: Decimal::new(10_000, 0),
        }
    }
}

impl DeploymentConfig {
    /// Parse a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accounts.is_empty() {
            return Err(ConfigError::NoAccounts);
        }
        let mut seen = HashSet::new();
        for label in &self.accounts {
            if !seen.insert(label.as_str()) {
                return Err(ConfigError::DuplicateAccount(label.clone()));
            }
        }
        self.initial_supply_units()?;
        self.prefund_units()?;
        Ok(())
    }

    pub fn deployer_label(&self) -> Option<&str> {
        self.accounts.first().map(String::as_str)
    }

    /// Initial token supply in base units.
    pub fn initial_supply_units(&self) -> Result<Amount, ConfigError> {
        Amount::from_decimal(self.token.initial_supply, self.token.decimals).map_err(|source| {
            ConfigError::Amount {
                field: "token.initial_supply",
                source,
            }
        })
    }

    /// Per-signer genesis ether in wei.
    pub fn prefund_units(&self) -> Result<Amount, ConfigError> {
        Amount::from_decimal(self.prefund_ether, ETHER_DECIMALS).map_err(|source| ConfigError::Amount {
            field: "prefund_ether",
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::errors::NumericError;
    use types::numeric::parse_ether;

    #[test]
    fn test_default_config() {
        let config = DeploymentConfig::default();
        config.validate().unwrap();
        assert_eq!(config.deployer_label(), Some("owner"));
        assert_eq!(config.token.symbol, "COV");
        assert_eq!(config.initial_supply_units().unwrap(), parse_ether("1000000").unwrap());
        assert_eq!(config.prefund_units().unwrap(), parse_ether("10000").unwrap());
    }

    #[test]
    fn test_from_json_partial() {
        let config = DeploymentConfig::from_json_str(
            r#"{"token": {"symbol": "SAV", "decimals": 6, "initial_supply": "2.5"}, "accounts": ["alice"]}"#,
        )
        .unwrap();
        assert_eq!(config.token.name, "Coval");
        assert_eq!(config.token.symbol, "SAV");
        assert_eq!(config.initial_supply_units().unwrap(), Amount::new(2_500_000));
        assert_eq!(config.accounts, vec!["alice".to_string()]);
        assert_eq!(config.prefund_ether, Decimal::new(10_000, 0));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = DeploymentConfig::from_json_str("{\"accounts\": 7}");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let result = DeploymentConfig::from_json_str(r#"{"accounts": ["owner", "bob", "owner"]}"#);
        assert!(matches!(result, Err(ConfigError::DuplicateAccount(label)) if label == "owner"));
    }

    #[test]
    fn test_no_accounts_rejected() {
        let result = DeploymentConfig::from_json_str(r#"{"accounts": []}"#);
        assert!(matches!(result, Err(ConfigError::NoAccounts)));
    }

    #[test]
    fn test_supply_with_too_many_decimals() {
        let config = DeploymentConfig {
            token: TokenConfig {
                decimals: 2,
                initial_supply: Decimal::new(1_001, 3),
                ..TokenConfig::default()
            },
            ..DeploymentConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Amount { field, source }) => {
                assert_eq!(field, "token.initial_supply");
                assert!(matches!(source, NumericError::TooManyDecimals { .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_negative_prefund_rejected() {
        let config = DeploymentConfig {
            prefund_ether: Decimal::new(-1, 0),
            ..DeploymentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Amount { field: "prefund_ether", .. })
        ));
    }
}
