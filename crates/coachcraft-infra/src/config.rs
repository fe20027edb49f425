//! Dispatcher settings loader.
//!
//! Settings come from four places, highest priority first:
//!
//! 1. explicit values (command-line flags)
//! 2. the `[llm]` table of `{data_dir}/config.toml`
//! 3. environment variables (`LLM_MODEL`, `OPENAI_API_KEY`, ...)
//! 4. built-in defaults
//!
//! Environment access goes through a lookup function so callers (and tests)
//! decide where variables come from.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use coachcraft_types::config::{
    DispatcherConfig, LlmSettings, delay_ms_from_number, retries_from_number,
};
use coachcraft_types::error::SettingsError;

/// Shape of `config.toml`. Unknown tables are ignored.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    llm: LlmSettings,
}

/// Look a variable up in the process environment.
///
/// Unset and non-Unicode values both read as absent.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `COACHCRAFT_DATA_DIR` environment variable
/// 2. `~/.coachcraft`
/// 3. `.coachcraft` in the working directory
pub fn resolve_data_dir(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup("COACHCRAFT_DATA_DIR").filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".coachcraft");
    }

    PathBuf::from(".coachcraft")
}

/// Read and parse the `[llm]` table of `path`.
pub async fn read_llm_settings(path: &Path) -> Result<LlmSettings, SettingsError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

    toml::from_str::<ConfigFile>(&content)
        .map(|file| file.llm)
        .map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
}

/// Load settings from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns empty settings.
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns empty settings.
pub async fn load_llm_settings(data_dir: &Path) -> LlmSettings {
    let config_path = data_dir.join("config.toml");

    if !tokio::fs::try_exists(&config_path).await.unwrap_or(false) {
        tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
        return LlmSettings::default();
    }

    match read_llm_settings(&config_path).await {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("{err}, using defaults");
            LlmSettings::default()
        }
    }
}

/// Collect settings from environment variables.
///
/// Empty values count as unset. Numbers that do not parse are ignored;
/// retry counts and delays are floored and clamped at zero.
pub fn settings_from_env(lookup: impl Fn(&str) -> Option<String>) -> LlmSettings {
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let number = |key: &str| {
        var(key)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite())
    };

    LlmSettings {
        model: var("LLM_MODEL").or_else(|| var("OPENAI_MODEL")),
        temperature: number("LLM_TEMPERATURE"),
        max_retries: number("LLM_MAX_RETRIES").and_then(retries_from_number),
        retry_delay_ms: number("LLM_RETRY_DELAY_MS").and_then(delay_ms_from_number),
        base_url: var("OPENAI_BASE_URL"),
        api_key: var("OPENAI_API_KEY").map(SecretString::from),
        mock: var("MOCK_LLM").and_then(|v| (v == "true").then_some(true)),
    }
}

/// Merge every source and resolve the final dispatcher configuration.
pub async fn resolve_dispatcher_config(
    data_dir: &Path,
    explicit: LlmSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> DispatcherConfig {
    let settings = settings_from_env(lookup)
        .overlay(load_llm_settings(data_dir).await)
        .overlay(explicit);
    let config = DispatcherConfig::resolve(settings);

    tracing::debug!(
        model = %config.model,
        temperature = config.temperature,
        max_retries = config.max_retries,
        retry_delay_ms = config.retry_delay.as_millis() as u64,
        base_url = %config.base_url,
        mock = config.mock,
        "Resolved dispatcher configuration"
    );
    config
}
