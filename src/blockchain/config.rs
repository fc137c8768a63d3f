//! Ledger parameters

use serde::Deserialize;
use std::env;
use thiserror::Error;

use super::block::MAX_DIFFICULTY;
use super::transaction::Amount;

pub const DIFFICULTY_ENV: &str = "LEDGER_DIFFICULTY";
pub const MINING_REWARD_ENV: &str = "LEDGER_MINING_REWARD";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Difficulty {0} exceeds the {} hex digits of a block hash", MAX_DIFFICULTY)]
    DifficultyTooHigh(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex digits required of a mined block hash
    #[serde(
        default = "default_difficulty",
        deserialize_with = "deserialize_difficulty"
    )]
    pub difficulty: usize,

    /// Amount credited to the miner of each block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: Amount,
}

fn default_difficulty() -> usize {
    2
}

fn default_mining_reward() -> Amount {
    100
}

fn deserialize_difficulty<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let difficulty = usize::deserialize(deserializer)?;
    check_difficulty(difficulty).map_err(serde::de::Error::custom)
}

fn check_difficulty(difficulty: usize) -> Result<usize, ConfigError> {
    if difficulty > MAX_DIFFICULTY {
        return Err(ConfigError::DifficultyTooHigh(difficulty));
    }
    Ok(difficulty)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `LEDGER_DIFFICULTY` and `LEDGER_MINING_REWARD`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Checks that mining with these parameters can terminate
    ///
    /// # Returns
    ///
    /// `DifficultyTooHigh` when more leading zeros are required than a
    /// SHA-256 hex digest has
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_difficulty(self.difficulty).map(|_| ())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(DIFFICULTY_ENV) {
            config.difficulty = check_difficulty(parse(DIFFICULTY_ENV, value)?)?;
        }
        if let Some(value) = lookup(MINING_REWARD_ENV) {
            config.mining_reward = parse(MINING_REWARD_ENV, value)?;
        }

        Ok(config)
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, 100);
    }

    #[test]
    fn test_overrides() {
        let config = LedgerConfig::from_lookup(lookup_from(&[
            (DIFFICULTY_ENV, "3"),
            (MINING_REWARD_ENV, " 50 "),
        ]))
        .unwrap();

        assert_eq!(config.difficulty, 3);
        assert_eq!(config.mining_reward, 50);
    }

    #[test]
    fn test_invalid_value() {
        let err = LedgerConfig::from_lookup(lookup_from(&[(MINING_REWARD_ENV, "-5")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                name: MINING_REWARD_ENV,
                value: "-5".to_string()
            }
        );
    }

    #[test]
    fn test_difficulty_above_hash_length_is_rejected() {
        let err = LedgerConfig::from_lookup(lookup_from(&[(DIFFICULTY_ENV, "65")])).unwrap_err();
        assert_eq!(err, ConfigError::DifficultyTooHigh(65));

        let config = LedgerConfig {
            difficulty: 65,
            mining_reward: 100,
        };
        assert_eq!(config.validate(), Err(ConfigError::DifficultyTooHigh(65)));

        assert!(serde_json::from_str::<LedgerConfig>(r#"{"difficulty": 65}"#).is_err());
    }

    #[test]
    fn test_difficulty_at_hash_length_is_accepted() {
        let config =
            LedgerConfig::from_lookup(lookup_from(&[(DIFFICULTY_ENV, "64")])).unwrap();
        assert_eq!(config.difficulty, MAX_DIFFICULTY);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: LedgerConfig = serde_json::from_str(r#"{"difficulty": 4}"#).unwrap();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 100);
    }
}
