//! Agent configuration.

use core::fmt::{self, Write as _};

use heapless::String;
use serde::Deserialize;

use crate::network::application::http::client::MAX_HOSTNAME_LEN;

/// Capacity of a request path.
pub const PATH_LEN: usize = 48;

/// Longest accepted API version segment.
pub const MAX_API_VERSION_LEN: usize = 16;

const CHECK_ENDPOINT: &str = "devs/checkforupdate";
const BLOCK_ENDPOINT: &str = "devs/getfwdata";

/// Why a configuration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Hostname is empty or longer than the client can store.
    InvalidHostname,
    /// Port 0.
    InvalidPort,
    /// API version is empty, too long or contains a `/`.
    InvalidApiVersion,
    /// Poll period of zero.
    InvalidPollPeriod,
    /// Failed-attempt budget of zero.
    InvalidRetryBudget,
    /// The JSON blob could not be decoded.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHostname => f.write_str("invalid hostname"),
            ConfigError::InvalidPort => f.write_str("invalid port"),
            ConfigError::InvalidApiVersion => f.write_str("invalid api version"),
            ConfigError::InvalidPollPeriod => f.write_str("poll period must be non-zero"),
            ConfigError::InvalidRetryBudget => f.write_str("failed-attempt budget must be non-zero"),
            ConfigError::Parse => f.write_str("malformed configuration"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ConfigError::InvalidHostname => defmt::write!(f, "InvalidHostname"),
            ConfigError::InvalidPort => defmt::write!(f, "InvalidPort"),
            ConfigError::InvalidApiVersion => defmt::write!(f, "InvalidApiVersion"),
            ConfigError::InvalidPollPeriod => defmt::write!(f, "InvalidPollPeriod"),
            ConfigError::InvalidRetryBudget => defmt::write!(f, "InvalidRetryBudget"),
            ConfigError::Parse => defmt::write!(f, "Parse"),
        }
    }
}

/// Agent configuration.
///
/// Every field has a default, so a provisioning blob only needs to carry
/// what differs:
///
/// ```rust
/// use libota::ota::Config;
///
/// let config = Config::from_json(br#"{"hostname":"ota.example.com","poll_period_ms":60000}"#).unwrap();
/// assert_eq!(config.hostname, "ota.example.com");
/// assert_eq!(config.port, 443);
/// assert_eq!(config.max_failed_attempts, 8);
/// assert_eq!(config.check_path().unwrap().as_str(), "/v1/devs/checkforupdate");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config<'a> {
    /// Update service host.
    pub hostname: &'a str,
    /// Update service port.
    pub port: u16,
    /// Leading path segment of every endpoint.
    pub api_version: &'a str,
    /// Time between update checks.
    pub poll_period_ms: u32,
    /// Pause after every block attempt; 0 disables it.
    pub interblock_delay_ms: u32,
    /// Pause between a validated image and the reboot.
    pub reboot_grace_ms: u32,
    /// Failed block attempts tolerated over a whole download.
    pub max_failed_attempts: u32,
    /// Download an available update without further confirmation.
    pub auto_update: bool,
}

impl Default for Config<'_> {
    fn default() -> Self {
        Self {
            hostname: "api.otaupdate.net",
            port: 443,
            api_version: "v1",
            poll_period_ms: 5 * 60 * 1000,
            interblock_delay_ms: 0,
            reboot_grace_ms: 10_000,
            max_failed_attempts: 8,
            auto_update: true,
        }
    }
}

impl<'a> Config<'a> {
    /// Decodes and validates a JSON configuration blob. Strings are
    /// borrowed from `json`, so they must not contain escape sequences.
    pub fn from_json(json: &'a [u8]) -> Result<Self, ConfigError> {
        let (config, _) = serde_json_core::from_slice::<Config<'a>>(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field for a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hostname.is_empty() || self.hostname.len() > MAX_HOSTNAME_LEN {
            return Err(ConfigError::InvalidHostname);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.api_version.is_empty()
            || self.api_version.len() > MAX_API_VERSION_LEN
            || self.api_version.contains('/')
        {
            return Err(ConfigError::InvalidApiVersion);
        }
        if self.poll_period_ms == 0 {
            return Err(ConfigError::InvalidPollPeriod);
        }
        if self.max_failed_attempts == 0 {
            return Err(ConfigError::InvalidRetryBudget);
        }
        Ok(())
    }

    /// Path of the check-in endpoint.
    pub fn check_path(&self) -> Result<String<PATH_LEN>, ConfigError> {
        self.endpoint(CHECK_ENDPOINT)
    }

    /// Path of the block-fetch endpoint.
    pub fn block_path(&self) -> Result<String<PATH_LEN>, ConfigError> {
        self.endpoint(BLOCK_ENDPOINT)
    }

    fn endpoint(&self, name: &str) -> Result<String<PATH_LEN>, ConfigError> {
        let mut path = String::new();
        write!(path, "/{}/{}", self.api_version, name).map_err(|_| ConfigError::InvalidApiVersion)?;
        Ok(path)
    }
}
