//! Configuration management for UGC.
//!
//! Parses `ugc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! Identifier and language values given as strings support environment
//! variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `item.app_id`
//! - `item.workshop_id`
//! - `item.language`
//!
//! ## Example
//!
//! ```toml
//! [item]
//! app_id = 480
//! workshop_id = "${UGC_WORKSHOP_ID:-}"
//!
//! [polling]
//! interval_ms = 250
//! backoff = "exponential"
//! update_timeout_secs = 600
//! ```

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override application id.
    pub app_id: Option<u32>,
    /// Override workshop item id.
    pub workshop_id: Option<u64>,
    /// Override update language.
    pub language: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "ugc.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Item identity (ids as parsed from TOML).
    item: ItemConfigRaw,
    /// Job polling configuration.
    pub polling: PollingConfig,
    /// Simulated platform behaviour.
    pub simulation: SimulationConfig,

    /// Resolved item configuration (set after loading).
    #[serde(skip)]
    pub item_resolved: ItemConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Identifier as written in TOML: a number, or a string that may reference
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

/// Raw item configuration as parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ItemConfigRaw {
    app_id: Option<RawId>,
    workshop_id: Option<RawId>,
    language: Option<String>,
}

/// Resolved item configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ItemConfig {
    /// Application the item belongs to.
    pub app_id: Option<u32>,
    /// Existing item to update.
    pub workshop_id: Option<u64>,
    /// Language of the title and description.
    pub language: Option<String>,
}

/// Delay growth between polls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

/// Job polling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between progress queries.
    pub interval_ms: u64,
    /// How the delay grows.
    pub backoff: BackoffKind,
    /// Upper bound for exponential backoff.
    pub max_interval_ms: u64,
    /// Maximum wait for item creation and dependency jobs.
    pub creation_timeout_secs: u64,
    /// Maximum wait for the submitted update.
    pub update_timeout_secs: u64,
    /// Maximum wait for the submit result once the update is terminal.
    pub outcome_grace_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 100,
            backoff: BackoffKind::Fixed,
            max_interval_ms: 2000,
            creation_timeout_secs: 120,
            update_timeout_secs: 3600,
            outcome_grace_ms: 5000,
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    #[must_use]
    pub fn creation_timeout(&self) -> Duration {
        Duration::from_secs(self.creation_timeout_secs)
    }

    #[must_use]
    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    #[must_use]
    pub fn outcome_grace(&self) -> Duration {
        Duration::from_millis(self.outcome_grace_ms)
    }
}

/// Simulated platform behaviour, used with the simulated backend.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Pumps before creation and dependency jobs complete.
    pub completion_pumps: Option<u64>,
    /// Progress statuses reported by an update job, in order.
    pub progress: Option<Vec<String>>,
    /// Report that the user must accept the legal agreement.
    pub needs_user_agreement: bool,
    /// Identifier issued to created items.
    pub issued_item_id: Option<u64>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`item.workshop_id`").
        field: String,
        /// Error message (e.g., "${`UGC_WORKSHOP_ID`} not set").
        message: String,
    },
}

/// Resolve a raw identifier, expanding environment variables in strings.
///
/// Empty strings resolve to `None`.
fn resolve_id(raw: Option<&RawId>, field: &str) -> Result<Option<u64>, ConfigError> {
    let text = match raw {
        None => return Ok(None),
        Some(RawId::Number(value)) => return Ok(Some(*value)),
        Some(RawId::Text(text)) => expand::expand_env(text, field)?,
    };
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse().map(Some).map_err(|_| {
        ConfigError::Validation(format!("{field} must be a non-negative integer, got {text:?}"))
    })
}

/// Require a duration field to be greater than zero.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `ugc.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to
    /// take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(app_id) = settings.app_id {
            self.item_resolved.app_id = Some(app_id);
        }
        if let Some(workshop_id) = settings.workshop_id {
            self.item_resolved.workshop_id = Some(workshop_id);
        }
        if let Some(language) = &settings.language {
            self.item_resolved.language = Some(language.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    fn discover_from(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.resolve_item()?;
        config.config_path = Some(path.to_path_buf());

        // Validate configuration after loading and resolution
        config.validate()?;

        Ok(config)
    }

    /// Expand and parse the raw item section.
    fn resolve_item(&mut self) -> Result<(), ConfigError> {
        let app_id = resolve_id(self.item.app_id.as_ref(), "item.app_id")?
            .map(|value| {
                u32::try_from(value).map_err(|_| {
                    ConfigError::Validation(format!("item.app_id {value} is out of range"))
                })
            })
            .transpose()?;
        let workshop_id = resolve_id(self.item.workshop_id.as_ref(), "item.workshop_id")?;
        let language = self
            .item
            .language
            .as_deref()
            .map(|language| expand::expand_env(language, "item.language"))
            .transpose()?;

        self.item_resolved = ItemConfig {
            app_id,
            workshop_id,
            language,
        };
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_polling()?;
        self.validate_simulation()?;
        Ok(())
    }

    fn validate_polling(&self) -> Result<(), ConfigError> {
        let polling = &self.polling;
        require_positive(polling.interval_ms, "polling.interval_ms")?;
        require_positive(polling.creation_timeout_secs, "polling.creation_timeout_secs")?;
        require_positive(polling.update_timeout_secs, "polling.update_timeout_secs")?;

        if polling.backoff == BackoffKind::Exponential
            && polling.max_interval_ms < polling.interval_ms
        {
            return Err(ConfigError::Validation(
                "polling.max_interval_ms cannot be less than polling.interval_ms".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_simulation(&self) -> Result<(), ConfigError> {
        if self.simulation.issued_item_id == Some(0) {
            return Err(ConfigError::Validation(
                "simulation.issued_item_id cannot be 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(toml: &str) -> Result<Config, ConfigError> {
        let mut config: Config = toml::from_str(toml)?;
        config.resolve_item()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.item_resolved, ItemConfig::default());
        assert_eq!(config.polling.interval(), Duration::from_millis(100));
        assert_eq!(config.polling.backoff, BackoffKind::Fixed);
        assert_eq!(config.polling.max_interval(), Duration::from_secs(2));
        assert_eq!(config.polling.creation_timeout(), Duration::from_secs(120));
        assert_eq!(config.polling.update_timeout(), Duration::from_secs(3600));
        assert_eq!(config.polling.outcome_grace(), Duration::from_secs(5));
        assert!(!config.simulation.needs_user_agreement);
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = parse("").unwrap();
        assert_eq!(config.item_resolved, ItemConfig::default());
        assert_eq!(config.polling, PollingConfig::default());
    }

    #[test]
    fn test_parse_item_numbers() {
        let config = parse(
            r#"
[item]
app_id = 480
workshop_id = 123456789
language = "french"
"#,
        )
        .unwrap();

        assert_eq!(
            config.item_resolved,
            ItemConfig {
                app_id: Some(480),
                workshop_id: Some(123_456_789),
                language: Some("french".to_owned()),
            }
        );
    }

    #[test]
    fn test_parse_item_strings() {
        let config = parse(
            r#"
[item]
app_id = "480"
workshop_id = "${UGC_TEST_UNSET_WORKSHOP_ID:-}"
"#,
        )
        .unwrap();

        assert_eq!(config.item_resolved.app_id, Some(480));
        assert_eq!(config.item_resolved.workshop_id, None);
    }

    #[test]
    fn test_item_id_not_a_number() {
        let err = parse(
            r#"
[item]
workshop_id = "abc"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("item.workshop_id"));
    }

    #[test]
    fn test_app_id_out_of_range() {
        let err = parse(
            r"
[item]
app_id = 5000000000
",
        )
        .unwrap_err();

        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_missing_env_var_in_id() {
        let err = parse(
            r#"
[item]
app_id = "${UGC_TEST_DEFINITELY_UNSET_APP_ID}"
"#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "item.app_id"));
    }

    #[test]
    fn test_parse_polling_config() {
        let config = parse(
            r#"
[polling]
interval_ms = 250
backoff = "exponential"
max_interval_ms = 4000
creation_timeout_secs = 30
update_timeout_secs = 600
outcome_grace_ms = 1000
"#,
        )
        .unwrap();

        assert_eq!(
            config.polling,
            PollingConfig {
                interval_ms: 250,
                backoff: BackoffKind::Exponential,
                max_interval_ms: 4000,
                creation_timeout_secs: 30,
                update_timeout_secs: 600,
                outcome_grace_ms: 1000,
            }
        );
    }

    #[test]
    fn test_unknown_backoff_rejected() {
        let result = parse(
            r#"
[polling]
backoff = "linear"
"#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = parse(
            r"
[polling]
interval_ms = 0
",
        )
        .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Configuration error: polling.interval_ms must be greater than 0"
        );
    }

    #[test]
    fn test_exponential_max_below_interval_rejected() {
        let err = parse(
            r#"
[polling]
interval_ms = 500
backoff = "exponential"
max_interval_ms = 100
"#,
        )
        .unwrap_err();

        assert!(err.to_string().contains("max_interval_ms"));
    }

    #[test]
    fn test_parse_simulation_config() {
        let config = parse(
            r#"
[simulation]
completion_pumps = 3
progress = ["preparing_config", "uploading_content"]
needs_user_agreement = true
issued_item_id = 77
"#,
        )
        .unwrap();

        assert_eq!(
            config.simulation,
            SimulationConfig {
                completion_pumps: Some(3),
                progress: Some(vec![
                    "preparing_config".to_owned(),
                    "uploading_content".to_owned()
                ]),
                needs_user_agreement: true,
                issued_item_id: Some(77),
            }
        );
    }

    #[test]
    fn test_cli_settings_override_file() {
        let mut config = parse(
            r#"
[item]
app_id = 480
workshop_id = 1
language = "german"
"#,
        )
        .unwrap();

        config.apply_cli_settings(&CliSettings {
            app_id: None,
            workshop_id: Some(2),
            language: Some("french".to_owned()),
        });

        assert_eq!(
            config.item_resolved,
            ItemConfig {
                app_id: Some(480),
                workshop_id: Some(2),
                language: Some("french".to_owned()),
            }
        );
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[item]\napp_id = 42\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.item_resolved.app_id, Some(42));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        let err = Config::load(Some(&path), None).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(p) if p == path));
    }

    #[test]
    fn test_discover_in_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        let found = Config::discover_from(&nested);

        assert_eq!(found, Some(dir.path().join(CONFIG_FILENAME)));
    }
}
