//! Dispatcher configuration.
//!
//! [`LlmSettings`] is the raw, all-optional shape collected from config
//! files, the environment and command-line flags. [`DispatcherConfig`] is
//! the resolved value a dispatcher is constructed with; it is never mutated
//! afterwards.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f64 = 0.6;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Partial dispatcher settings from one source.
///
/// Deserializes from the `[llm]` table of `config.toml`. The API key is
/// never read from files; it only arrives through the environment or an
/// explicit flag.
#[derive(Debug, Default, Deserialize)]
pub struct LlmSettings {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_retries")]
    pub max_retries: Option<u32>,
    #[serde(default, deserialize_with = "lenient_delay_ms")]
    pub retry_delay_ms: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub mock: Option<bool>,
}

/// Retry count from any finite number: floored, negatives become zero.
pub fn retries_from_number(n: f64) -> Option<u32> {
    n.is_finite().then(|| n.floor().clamp(0.0, u32::MAX as f64) as u32)
}

/// Retry delay in milliseconds from any finite number: floored, negatives
/// become zero.
pub fn delay_ms_from_number(n: f64) -> Option<u64> {
    n.is_finite().then(|| n.floor().clamp(0.0, u64::MAX as f64) as u64)
}

fn lenient_retries<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.and_then(retries_from_number))
}

fn lenient_delay_ms<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<f64>::deserialize(d)?.and_then(delay_ms_from_number))
}

impl LlmSettings {
    /// Layer `over` on top of `self`; every field `over` sets wins.
    pub fn overlay(self, over: LlmSettings) -> LlmSettings {
        LlmSettings {
            model: over.model.or(self.model),
            temperature: over.temperature.or(self.temperature),
            max_retries: over.max_retries.or(self.max_retries),
            retry_delay_ms: over.retry_delay_ms.or(self.retry_delay_ms),
            base_url: over.base_url.or(self.base_url),
            api_key: over.api_key.or(self.api_key),
            mock: over.mock.or(self.mock),
        }
    }
}

/// Resolved, immutable dispatcher configuration.
#[derive(Debug)]
pub struct DispatcherConfig {
    pub model: String,
    pub temperature: f64,
    pub max_retries: u32,
    pub retry_delay: Duration,
    /// Provider base URL without a trailing slash.
    pub base_url: String,
    pub credential: Option<SecretString>,
    /// Serve every call from the offline mock provider.
    pub mock: bool,
}

impl DispatcherConfig {
    /// Fill every unset field from the built-in defaults.
    ///
    /// Mock mode is on when forced, or when no credential is available and
    /// mock was not explicitly disabled.
    pub fn resolve(settings: LlmSettings) -> Self {
        let mock = settings.mock.unwrap_or(settings.api_key.is_none());
        let base_url = settings
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            model: settings.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: settings.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_retries: settings.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(
                settings.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ),
            base_url,
            credential: settings.api_key,
            mock,
        }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self::resolve(LlmSettings::default())
    }
}
