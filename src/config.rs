use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Environment variable that overrides `api.base_url`.
pub const BASE_URL_ENV: &str = "CHRONOSCOPE_API_URL";

pub const CONFIG_FILE_NAME: &str = "config.ron";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub audio: AudioConfig,
    pub logging: LoggingConfig,
    /// Optional JSON theme file with dark/light variants.
    pub theme_file: Option<String>,
    /// Which variant of `theme_file` to use: "dark" or "light".
    pub theme_mode: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            audio: AudioConfig::default(),
            logging: LoggingConfig::default(),
            theme_file: None,
            theme_mode: "dark".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the ChronoScope backend, e.g. "http://localhost:8000".
    pub base_url: String,
    /// No timeout when unset; a hung request stays pending.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AudioConfig {
    /// External player program; the narration URL is appended to `args`.
    pub player: String,
    pub args: Vec<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            player: "ffplay".to_string(),
            args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub log_directory: Option<String>,
    /// Per-module overrides, e.g. {"chronoscope_tui::api": "debug"}.
    pub module_levels: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_directory: None,
            module_levels: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive string for `tracing_subscriber::EnvFilter`.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        modules
            .into_iter()
            .fold(self.level.clone(), |mut acc, (module, level)| {
                acc.push_str(&format!(",{}={}", module, level));
                acc
            })
    }
}

impl AppConfig {
    /// Load `config.ron` from the first location that has one, then apply
    /// environment overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        config.apply_base_url_override(std::env::var(BASE_URL_ENV).ok());
        config
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join("chronoscope").join(CONFIG_FILE_NAME));
        }

        candidates
    }

    fn load_file() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => match Self::from_ron(&content) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        tracing::error!("Failed to parse config at {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to read config at {}: {}", path.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn from_ron(content: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(content)
    }

    pub fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            tracing::info!("Backend URL overridden by {}: {}", BASE_URL_ENV, url);
            self.api.base_url = url;
        }
    }

    pub fn log_directory(&self) -> &str {
        self.logging.log_directory.as_deref().unwrap_or("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.api.request_timeout_secs, None);
        assert_eq!(config.audio.player, "ffplay");
        assert_eq!(config.log_directory(), "logs");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let content = r#"(
    // Staging backend
    api: (base_url: "https://chronoscope.example.org"),
    logging: (level: "debug"),
)"#;
        let config = AppConfig::from_ron(content).unwrap();
        assert_eq!(config.api.base_url, "https://chronoscope.example.org");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.audio.args.first().map(String::as_str), Some("-nodisp"));
        assert_eq!(config.theme_mode, "dark");
    }

    #[test]
    fn invalid_ron_is_an_error() {
        assert!(AppConfig::from_ron("(api: [").is_err());
    }

    #[test]
    fn env_override_wins_unless_blank() {
        let mut config = AppConfig::default();
        config.apply_base_url_override(Some("   ".to_string()));
        assert_eq!(config.api.base_url, "http://localhost:8000");

        config.apply_base_url_override(Some("http://10.0.0.5:9000".to_string()));
        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");

        config.apply_base_url_override(None);
        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
    }

    #[test]
    fn filter_directives_include_module_levels() {
        let mut logging = LoggingConfig::default();
        logging
            .module_levels
            .insert("chronoscope_tui::api".to_string(), "debug".to_string());
        logging
            .module_levels
            .insert("reqwest".to_string(), "warn".to_string());
        assert_eq!(
            logging.filter_directives(),
            "info,chronoscope_tui::api=debug,reqwest=warn"
        );
    }
}
