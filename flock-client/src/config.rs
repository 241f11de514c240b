use flock_common::snowflake::{ProcessId, WorkerId};
use flock_store::transaction::DEFAULT_MAX_ATTEMPTS;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const ENV_PREFIX: &str = "FLOCK_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub worker_id: WorkerId,
    #[serde(default)]
    pub process_id: ProcessId,
    #[serde(default = "default_transaction_max_attempts")]
    pub transaction_max_attempts: u32,
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: usize,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Whether a failed toggle restores the state from before its optimistic
    /// update.
    #[serde(default = "default_true")]
    pub revert_on_failure: bool,
}

fn default_transaction_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_feed_page_size() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            worker_id: WorkerId::default(),
            process_id: ProcessId::default(),
            transaction_max_attempts: default_transaction_max_attempts(),
            feed_page_size: default_feed_page_size(),
            notifications_enabled: true,
            revert_on_failure: true,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if e.not_found() {
                debug!("No .env file found");
            } else {
                return Err(e.into());
            }
        }

        envy::prefixed(ENV_PREFIX)
            .from_env()
            .map_err(ConfigError::from)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{ClientConfig, ConfigError};

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let config = ClientConfig::from_vars(vars(&[("UNRELATED", "1")])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.transaction_max_attempts, 5);
        assert!(config.revert_on_failure);
    }

    #[test]
    fn prefixed_variables_are_read() {
        let config = ClientConfig::from_vars(vars(&[
            ("FLOCK_WORKER_ID", "3"),
            ("FLOCK_PROCESS_ID", "4"),
            ("FLOCK_FEED_PAGE_SIZE", "10"),
            ("FLOCK_NOTIFICATIONS_ENABLED", "false"),
            ("FLOCK_REVERT_ON_FAILURE", "false"),
        ]))
        .unwrap();

        assert_eq!(config.worker_id.get(), 3);
        assert_eq!(config.process_id.get(), 4);
        assert_eq!(config.feed_page_size, 10);
        assert!(!config.notifications_enabled);
        assert!(!config.revert_on_failure);
    }

    #[test]
    fn machine_ids_are_validated() {
        let result = ClientConfig::from_vars(vars(&[("FLOCK_WORKER_ID", "32")]));
        assert!(matches!(result, Err(ConfigError::Envy(_))));
    }
}
