//! Configuration management for PV.
//!
//! Parses `pv.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `watcher.url`
//! - `watcher.on_reload`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Lowest poll interval a watcher may be configured with, in milliseconds.
pub const MIN_INTERVAL_MS: u64 = 1000;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override preview file.
    pub preview_file: Option<PathBuf>,
    /// Override the scrape interval advertised to watchers.
    pub scrape_interval_ms: Option<u64>,
    /// Override preview file watching.
    pub watch_enabled: Option<bool>,
    /// Override reload script injection into the served preview.
    pub inject_reload_script: Option<bool>,
    /// Override the status URL polled by the watcher.
    pub watcher_url: Option<String>,
    /// Override the watcher's initial poll interval.
    pub interval_ms: Option<u64>,
    /// Override the reload command.
    pub on_reload: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "pv.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Preview server configuration.
    pub server: ServerConfig,
    /// Preview configuration (paths are relative strings from TOML).
    preview: PreviewConfigRaw,
    /// Watcher configuration.
    pub watcher: WatcherConfig,

    /// Resolved preview configuration (set after loading).
    #[serde(skip)]
    pub preview_resolved: PreviewConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Preview server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 1234,
        }
    }
}

/// Raw preview configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PreviewConfigRaw {
    file: Option<String>,
    scrape_interval_ms: Option<u64>,
    watch: Option<bool>,
    inject_reload_script: Option<bool>,
}

/// Resolved preview configuration with absolute paths.
#[derive(Debug)]
pub struct PreviewConfig {
    /// Rendered preview file served to browsers.
    pub file: PathBuf,
    /// Poll interval advertised to watchers, in milliseconds.
    pub scrape_interval_ms: u64,
    /// Whether file changes mark the preview as updated.
    pub watch: bool,
    /// Whether the served preview polls for updates and reloads itself.
    pub inject_reload_script: bool,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("preview.html"),
            scrape_interval_ms: 2000,
            watch: true,
            inject_reload_script: true,
        }
    }
}

/// Watcher configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Status endpoint to poll.
    pub url: String,
    /// Poll interval used until the server requests another, in milliseconds.
    pub interval_ms: u64,
    /// Floor for every poll interval, in milliseconds.
    pub min_interval_ms: u64,
    /// Shell command run when a newer preview is found.
    pub on_reload: Option<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:1234/preview-state-info".to_owned(),
            interval_ms: MIN_INTERVAL_MS,
            min_interval_ms: MIN_INTERVAL_MS,
            on_reload: None,
        }
    }
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
        /// Config field path (e.g., "`watcher.url`").
        field: String,
        /// Error message (e.g., "${`PREVIEW_PORT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `pv.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values. The result is
    /// validated last.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
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
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(file) = &settings.preview_file {
            self.preview_resolved.file.clone_from(file);
        }
        if let Some(scrape_interval_ms) = settings.scrape_interval_ms {
            self.preview_resolved.scrape_interval_ms = scrape_interval_ms;
        }
        if let Some(watch) = settings.watch_enabled {
            self.preview_resolved.watch = watch;
        }
        if let Some(inject) = settings.inject_reload_script {
            self.preview_resolved.inject_reload_script = inject;
        }
        if let Some(url) = &settings.watcher_url {
            self.watcher.url.clone_from(url);
        }
        if let Some(interval_ms) = settings.interval_ms {
            self.watcher.interval_ms = interval_ms;
        }
        if let Some(on_reload) = &settings.on_reload {
            self.watcher.on_reload = Some(on_reload.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
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

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            preview: PreviewConfigRaw::default(),
            watcher: WatcherConfig::default(),
            preview_resolved: PreviewConfig {
                file: base.join("preview.html"),
                ..PreviewConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_preview()?;
        self.validate_watcher()?;
        Ok(())
    }

    /// Validate server configuration.
    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Validate preview configuration.
    fn validate_preview(&self) -> Result<(), ConfigError> {
        if self.preview_resolved.scrape_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "preview.scrape_interval_ms must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Validate watcher configuration.
    fn validate_watcher(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.watcher.url, "watcher.url")?;
        require_http_url(&self.watcher.url, "watcher.url")?;

        if self.watcher.interval_ms == 0 {
            return Err(ConfigError::Validation(
                "watcher.interval_ms must be greater than 0".to_owned(),
            ));
        }
        if self.watcher.min_interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::Validation(format!(
                "watcher.min_interval_ms cannot be below {MIN_INTERVAL_MS}"
            )));
        }
        if let Some(ref command) = self.watcher.on_reload {
            require_non_empty(command.trim(), "watcher.on_reload")?;
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;
        self.watcher.url = expand::expand_env(&self.watcher.url, "watcher.url")?;

        if let Some(ref command) = self.watcher.on_reload {
            self.watcher.on_reload = Some(expand::expand_env(command, "watcher.on_reload")?);
        }

        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = PreviewConfig::default();
        self.preview_resolved = PreviewConfig {
            file: config_dir.join(self.preview.file.as_deref().unwrap_or("preview.html")),
            scrape_interval_ms: self
                .preview
                .scrape_interval_ms
                .unwrap_or(defaults.scrape_interval_ms),
            watch: self.preview.watch.unwrap_or(defaults.watch),
            inject_reload_script: self
                .preview
                .inject_reload_script
                .unwrap_or(defaults.inject_reload_script),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 1234);
        assert_eq!(
            config.preview_resolved.file,
            PathBuf::from("/test/preview.html")
        );
        assert_eq!(config.preview_resolved.scrape_interval_ms, 2000);
        assert!(config.preview_resolved.watch);
        assert!(config.preview_resolved.inject_reload_script);
        assert_eq!(
            config.watcher.url,
            "http://127.0.0.1:1234/preview-state-info"
        );
        assert_eq!(config.watcher.interval_ms, 1000);
        assert_eq!(config.watcher.min_interval_ms, 1000);
        assert!(config.watcher.on_reload.is_none());
        assert!(config.config_path.is_none());
    }

    #[test]
    fn test_parse_server_config() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_parse_watcher_config() {
        let toml = r#"
[watcher]
url = "http://localhost:4000/check-preview-updates"
interval_ms = 3000
min_interval_ms = 2000
on_reload = "make open"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.watcher.url,
            "http://localhost:4000/check-preview-updates"
        );
        assert_eq!(config.watcher.interval_ms, 3000);
        assert_eq!(config.watcher.min_interval_ms, 2000);
        assert_eq!(config.watcher.on_reload, Some("make open".to_owned()));
    }

    #[test]
    fn test_parse_partial_watcher_config_keeps_defaults() {
        let toml = r"
[watcher]
interval_ms = 5000
";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.watcher.interval_ms, 5000);
        assert_eq!(config.watcher.min_interval_ms, MIN_INTERVAL_MS);
        assert_eq!(
            config.watcher.url,
            "http://127.0.0.1:1234/preview-state-info"
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[preview]
file = "build/index.html"
scrape_interval_ms = 500
watch = false
inject_reload_script = false
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.preview_resolved.file,
            PathBuf::from("/project/build/index.html")
        );
        assert_eq!(config.preview_resolved.scrape_interval_ms, 500);
        assert!(!config.preview_resolved.watch);
        assert!(!config.preview_resolved.inject_reload_script);
    }

    #[test]
    fn test_resolve_paths_defaults() {
        let mut config: Config = toml::from_str("").unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(
            config.preview_resolved.file,
            PathBuf::from("/project/preview.html")
        );
        assert_eq!(config.preview_resolved.scrape_interval_ms, 2000);
        assert!(config.preview_resolved.watch);
        assert!(config.preview_resolved.inject_reload_script);
    }

    #[test]
    fn test_apply_cli_settings_server() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            host: Some("0.0.0.0".to_owned()),
            port: Some(9000),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.watcher.interval_ms, 1000); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_preview() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            preview_file: Some(PathBuf::from("/custom/out.html")),
            scrape_interval_ms: Some(4000),
            watch_enabled: Some(false),
            inject_reload_script: Some(false),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.preview_resolved.file,
            PathBuf::from("/custom/out.html")
        );
        assert_eq!(config.preview_resolved.scrape_interval_ms, 4000);
        assert!(!config.preview_resolved.watch);
        assert!(!config.preview_resolved.inject_reload_script);
    }

    #[test]
    fn test_apply_cli_settings_watcher() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = CliSettings {
            watcher_url: Some("http://127.0.0.1:5000/check-preview-updates".to_owned()),
            interval_ms: Some(2500),
            on_reload: Some("notify-send reload".to_owned()),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(
            config.watcher.url,
            "http://127.0.0.1:5000/check-preview-updates"
        );
        assert_eq!(config.watcher.interval_ms, 2500);
        assert_eq!(
            config.watcher.on_reload,
            Some("notify-send reload".to_owned())
        );
        assert_eq!(config.server.port, 1234); // Unchanged
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/pv.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_from_file_resolves_relative_to_config_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("pv.toml");
        std::fs::write(
            &config_path,
            r#"
[server]
port = 4321

[preview]
file = "out/preview.html"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path), None).unwrap();

        assert_eq!(config.server.port, 4321);
        assert_eq!(
            config.preview_resolved.file,
            temp_dir.path().join("out/preview.html")
        );
        assert_eq!(config.config_path, Some(config_path));
    }

    #[test]
    fn test_load_expands_env_vars() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("PV_TEST_LOAD_PORT", "4444");
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("pv.toml");
        std::fs::write(
            &config_path,
            r#"
[watcher]
url = "http://127.0.0.1:${PV_TEST_LOAD_PORT}/preview-state-info"
on_reload = "${PV_TEST_LOAD_UNSET_CMD:-echo reloaded}"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&config_path), None).unwrap();

        assert_eq!(
            config.watcher.url,
            "http://127.0.0.1:4444/preview-state-info"
        );
        assert_eq!(config.watcher.on_reload, Some("echo reloaded".to_owned()));
        unsafe {
            std::env::remove_var("PV_TEST_LOAD_PORT");
        }
    }

    #[test]
    fn test_load_validates_after_cli_settings() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("pv.toml");
        std::fs::write(&config_path, "").unwrap();
        let overrides = CliSettings {
            watcher_url: Some("localhost:1234".to_owned()),
            ..Default::default()
        };

        let err = Config::load(Some(&config_path), Some(&overrides)).unwrap_err();

        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("watcher.url"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join("pv.toml");
        std::fs::write(&config_path, "[server\nport = ").unwrap();

        let err = Config::load(Some(&config_path), None).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    /// Assert that validation fails with an error containing all expected substrings.
    fn assert_validation_error(config: &Config, expected: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for part in expected {
            assert!(msg.contains(part), "Expected {part:?} in {msg:?}");
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        let config = Config::default_with_base(Path::new("/test"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_server_host_empty() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.host = String::new();
        assert_validation_error(&config, &["server.host", "empty"]);
    }

    #[test]
    fn test_validate_server_port_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.server.port = 0;
        assert_validation_error(&config, &["server.port"]);
    }

    #[test]
    fn test_validate_scrape_interval_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.preview_resolved.scrape_interval_ms = 0;
        assert_validation_error(&config, &["scrape_interval_ms"]);
    }

    #[test]
    fn test_validate_watcher_url_invalid_scheme() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.url = "ftp://127.0.0.1/preview-state-info".to_owned();
        assert_validation_error(&config, &["watcher.url", "http"]);
    }

    #[test]
    fn test_validate_watcher_url_https() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.url = "https://preview.example.com/preview-state-info".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_interval_zero() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.interval_ms = 0;
        assert_validation_error(&config, &["watcher.interval_ms"]);
    }

    #[test]
    fn test_validate_min_interval_below_floor() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.min_interval_ms = 200;
        assert_validation_error(&config, &["min_interval_ms", "1000"]);
    }

    #[test]
    fn test_validate_min_interval_raised() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.min_interval_ms = 3000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_blank_reload_command() {
        let mut config = Config::default_with_base(Path::new("/test"));
        config.watcher.on_reload = Some("   ".to_owned());
        assert_validation_error(&config, &["watcher.on_reload", "empty"]);
    }
}
