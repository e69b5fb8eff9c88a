use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::delivery::approve::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::ConfigError;
use crate::strategy::{StrategyConfig, DEFAULT_TTL_SECONDS};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MagicLinkSettings {
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub magic_link: MagicLinkOptions,
    #[serde(default)]
    pub approve: ApproveSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Users known to the bundled directory, one table per user
    #[serde(default)]
    pub users: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicLinkOptions {
    /// ApproveAPI key, also the token signing secret
    pub api_key: String,
    pub callback_url: String,
    pub contact_field: String,
    pub prompt_message: String,
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveSettings {
    pub base_url: String,
    /// Timeout for a single prompt request
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECONDS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: "http://localhost:3000,http://localhost:8080".to_string(),
        }
    }
}

impl Default for MagicLinkOptions {
    fn default() -> Self {
        Self {
            api_key: String::new(), // Required, no usable default
            callback_url: "http://localhost:8080/auth/magic/callback".to_string(),
            contact_field: "email".to_string(),
            prompt_message: "Would you like to log in?".to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl Default for ApproveSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_seconds: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl MagicLinkSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_env_file();

        let (mut settings, notes) = Self::load_base_settings()?;
        Self::apply_env_overrides(&mut settings);

        settings.init_logger()?;
        for note in notes {
            log::info!("{note}");
        }

        Ok(settings)
    }

    /// Start `env_logger` with the configured level (`RUST_LOG` already folded in)
    fn init_logger(&self) -> Result<(), log::SetLoggerError> {
        env_logger::Builder::new()
            .parse_filters(&self.logging.level)
            .try_init()
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `MAGICLINK_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// The logger is not running yet, so what was loaded comes back as notes.
    fn load_base_settings() -> Result<(Self, Vec<String>), Box<dyn std::error::Error>> {
        let mut settings = Self::default();
        let mut notes = Vec::new();

        let default_config_path = Path::new("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(default_config_path)?;
            notes.push(format!(
                "Loaded base settings from {}",
                default_config_path.display()
            ));
        }

        if let Ok(secrets_dir) = std::env::var("MAGICLINK_SECRETS_DIR") {
            let secrets_path = Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                notes.push(format!("Overriding settings from {}", secrets_path.display()));
            } else {
                notes.push(format!(
                    "MAGICLINK_SECRETS_DIR set but no Settings.toml found at: {}",
                    secrets_path.display()
                ));
            }
        }

        Ok((settings, notes))
    }

    /// Parse a single settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_magic_link_env_overrides(&mut settings.magic_link);
        Self::apply_approve_env_overrides(&mut settings.approve);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
        if let Ok(cors_origins) = std::env::var("CORS_ORIGINS") {
            app_settings.cors_origins = cors_origins;
        }
    }

    /// Apply environment overrides for the strategy options
    pub fn apply_magic_link_env_overrides(options: &mut MagicLinkOptions) {
        Self::apply_string_env_override("APPROVE_API_KEY", &mut options.api_key);
        Self::apply_string_env_override("MAGIC_LINK_CALLBACK_URL", &mut options.callback_url);
        Self::apply_string_env_override("MAGIC_LINK_CONTACT_FIELD", &mut options.contact_field);
        Self::apply_string_env_override("MAGIC_LINK_PROMPT_MESSAGE", &mut options.prompt_message);
        Self::apply_numeric_env_override("MAGIC_LINK_TTL_SECONDS", &mut options.ttl_seconds);
    }

    fn apply_approve_env_overrides(approve: &mut ApproveSettings) {
        Self::apply_string_env_override("APPROVE_BASE_URL", &mut approve.base_url);
        Self::apply_numeric_env_override(
            "APPROVE_TIMEOUT_SECONDS",
            &mut approve.request_timeout_seconds,
        );
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Empty environment values are ignored
    fn apply_string_env_override(env_var: &str, target: &mut String) {
        if let Ok(value) = std::env::var(env_var) {
            if !value.is_empty() {
                *target = value;
            }
        }
    }

    fn apply_numeric_env_override(env_var: &str, target: &mut u64) {
        if let Ok(value_str) = std::env::var(env_var) {
            if let Ok(value) = value_str.parse::<u64>() {
                *target = value;
            }
        }
    }

    /// Load environment variables from .env file
    fn load_env_file() {
        if let Ok(contents) = std::fs::read_to_string(".env") {
            for (key, value) in contents.lines().filter_map(parse_env_line) {
                std::env::set_var(key, value);
            }
        }
    }

    /// Validated strategy configuration
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a required option is missing or invalid.
    pub fn strategy_config(&self) -> Result<StrategyConfig, ConfigError> {
        StrategyConfig::builder()
            .api_key(&self.magic_link.api_key)
            .callback_url(&self.magic_link.callback_url)
            .contact_field(&self.magic_link.contact_field)
            .prompt_message(&self.magic_link.prompt_message)
            .ttl_seconds(self.magic_link.ttl_seconds)
            .build()
    }

    #[must_use]
    pub fn approve_timeout(&self) -> Duration {
        Duration::from_secs(self.approve.request_timeout_seconds)
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }

    /// Get CORS origins as a vector of strings
    #[must_use]
    pub fn get_cors_origins(&self) -> Vec<String> {
        self.application
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// `KEY=value` with an optional `export ` prefix and matching surrounding quotes
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, unquote(value.trim())))
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clean_env_vars() {
        for var in [
            "APPROVE_API_KEY",
            "MAGIC_LINK_CALLBACK_URL",
            "MAGIC_LINK_CONTACT_FIELD",
            "MAGIC_LINK_PROMPT_MESSAGE",
            "MAGIC_LINK_TTL_SECONDS",
            "APPROVE_BASE_URL",
            "APPROVE_TIMEOUT_SECONDS",
        ] {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults() {
        let settings = MagicLinkSettings::default();
        assert_eq!(settings.magic_link.ttl_seconds, 600);
        assert_eq!(settings.magic_link.contact_field, "email");
        assert_eq!(settings.approve.base_url, "https://approve.sh");
        assert_eq!(settings.approve_timeout(), Duration::from_secs(10));
        assert_eq!(settings.get_bind_address(), "0.0.0.0:8080");
        assert!(settings.users.is_empty());
    }

    #[test]
    fn test_default_settings_need_an_api_key() {
        let settings = MagicLinkSettings::default();
        assert_eq!(
            settings.strategy_config(),
            Err(ConfigError::MissingRequired("an ApproveAPI key"))
        );
    }

    #[test]
    #[serial]
    fn test_magic_link_env_overrides() {
        clean_env_vars();
        let mut options = MagicLinkOptions::default();

        std::env::set_var("APPROVE_API_KEY", "env-key");
        std::env::set_var("MAGIC_LINK_TTL_SECONDS", "120");
        std::env::set_var("MAGIC_LINK_CONTACT_FIELD", "");

        MagicLinkSettings::apply_magic_link_env_overrides(&mut options);

        assert_eq!(options.api_key, "env-key");
        assert_eq!(options.ttl_seconds, 120);
        assert_eq!(options.contact_field, "email"); // Empty value ignored

        clean_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_numeric_override_is_ignored() {
        clean_env_vars();
        let mut settings = MagicLinkSettings::default();

        std::env::set_var("APPROVE_TIMEOUT_SECONDS", "soon");
        MagicLinkSettings::apply_env_overrides(&mut settings);

        assert_eq!(settings.approve.request_timeout_seconds, 10);
        clean_env_vars();
    }

    #[test]
    fn test_env_lines_strip_quotes() {
        assert_eq!(
            parse_env_line(r#"APPROVE_API_KEY="k""#),
            Some(("APPROVE_API_KEY", "k"))
        );
        assert_eq!(
            parse_env_line("export MAGIC_LINK_PROMPT_MESSAGE='Log in?'"),
            Some(("MAGIC_LINK_PROMPT_MESSAGE", "Log in?"))
        );
        assert_eq!(parse_env_line(" PORT = 9090 "), Some(("PORT", "9090")));
        assert_eq!(
            parse_env_line(r#"HOST="unbalanced"#),
            Some(("HOST", r#""unbalanced"#))
        );
        assert_eq!(parse_env_line("# APPROVE_API_KEY=k"), None);
        assert_eq!(parse_env_line("no separator"), None);
        assert_eq!(parse_env_line("=value"), None);
    }

    #[test]
    #[serial]
    fn test_rust_log_sets_logging_level() {
        clean_env_vars();
        let mut settings = MagicLinkSettings::default();
        assert_eq!(settings.logging.level, "info");

        std::env::set_var("RUST_LOG", "magiclink=debug");
        MagicLinkSettings::apply_env_overrides(&mut settings);
        std::env::remove_var("RUST_LOG");

        assert_eq!(settings.logging.level, "magiclink=debug");
    }

    #[test]
    fn test_from_file_with_users() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[application]
host = "127.0.0.1"
port = 9090
cors_origins = "https://app.example.com, "

[magic_link]
api_key = "file-key"
callback_url = "https://app.example.com/cb?ref=mail"
contact_field = "email"
prompt_message = "Log in to Example?"

[[users]]
id = 1
email = "alice@example.com"

[[users]]
id = 2
email = "bob@example.com"
"#
        )
        .unwrap();

        let settings = MagicLinkSettings::from_file(file.path()).unwrap();

        assert_eq!(settings.get_bind_address(), "127.0.0.1:9090");
        assert_eq!(settings.get_cors_origins(), vec!["https://app.example.com"]);
        assert_eq!(settings.magic_link.ttl_seconds, 600);
        assert_eq!(settings.users.len(), 2);
        assert_eq!(settings.users[1]["email"], "bob@example.com");

        let config = settings.strategy_config().unwrap();
        assert_eq!(config.callback_url(), "https://app.example.com/cb?ref=mail");
        assert_eq!(config.api_key(), "file-key");
    }
}
