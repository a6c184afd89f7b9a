use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::crypto::{DhKeyPair, DH_PRIVATE_KEY_LEN};
use crate::session::{self, CounterLayout};

/// Tunables of the key schedule.
///
/// # Examples
///
/// ```
/// use otrkeys::config::KeyScheduleConfig;
/// use otrkeys::session::CounterLayout;
///
/// let cfg = KeyScheduleConfig::default().counter_layout(CounterLayout::TopHalf);
/// let pair = cfg.generate_key_pair().unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct KeyScheduleConfig {
    pub counter_layout: CounterLayout,
    /// Length in bytes of freshly generated private exponents.
    pub private_key_len: usize,
}

impl KeyScheduleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<KeyScheduleConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    #[inline(always)]
    pub fn counter_layout(mut self, layout: CounterLayout) -> Self {
        self.counter_layout = layout;
        self
    }

    #[inline(always)]
    pub fn private_key_len(mut self, len: usize) -> Self {
        self.private_key_len = len;
        self
    }

    /// Fails with `InvalidKeyLength` when `private_key_len` is too short.
    #[inline(always)]
    pub fn generate_key_pair(&self) -> session::Result<DhKeyPair> {
        DhKeyPair::generate_with_len(self.private_key_len)
    }
}

impl Default for KeyScheduleConfig {
    fn default() -> Self {
        Self {
            counter_layout: CounterLayout::Full,
            private_key_len: DH_PRIVATE_KEY_LEN,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse the configuration file: {0}")]
    ParseError(#[from] toml::de::Error),
}
