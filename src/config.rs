// Configuration loading and parsing (config/board.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub ws_port: u16,
    pub feed: FeedConfig,
    pub catalog_path: String,
}

/// Live-feed access settings. The poll interval applies to the
/// auto-refresh loop once a fixture is bound.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// board.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire board.toml file.
#[derive(Debug, Clone, Deserialize)]
struct BoardFile {
    websocket: WebsocketSection,
    feed: FeedConfig,
    catalog: CatalogSection,
}

#[derive(Debug, Clone, Deserialize)]
struct WebsocketSection {
    port: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct CatalogSection {
    path: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/board.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy
/// defaults. Prefer `load_config()` which handles default initialization.
pub(crate) fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let board_path = base_dir.join("config").join("board.toml");
    let board_text = read_file(&board_path)?;
    let board_file: BoardFile =
        toml::from_str(&board_text).map_err(|e| ConfigError::ParseError {
            path: board_path.clone(),
            source: e,
        })?;

    let config = Config {
        ws_port: board_file.websocket.port,
        feed: board_file.feed,
        catalog_path: board_file.catalog.path,
    };

    validate(&config)?;
    Ok(config)
}

/// Ensure config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                // File already exists in config/, skip it.
            }
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Convenience wrapper: loads config relative to the current working
/// directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.ws_port == 0 {
        return Err(ConfigError::ValidationError {
            field: "websocket.port".into(),
            message: "port must be non-zero".into(),
        });
    }
    if config.feed.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "feed.base_url".into(),
            message: "base URL must not be empty".into(),
        });
    }
    if config.feed.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "feed.poll_interval_secs".into(),
            message: "poll interval must be at least one second".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD_TOML: &str = r#"
        [websocket]
        port = 9200

        [feed]
        base_url = "https://feed.example.com/v3"
        api_key = "secret"

        [catalog]
        path = "data/catalog.json"
    "#;

    #[test]
    fn board_file_parses_with_poll_interval_default() {
        let board: BoardFile = toml::from_str(BOARD_TOML).unwrap();
        assert_eq!(board.websocket.port, 9200);
        assert_eq!(board.feed.api_key, "secret");
        assert_eq!(board.feed.poll_interval_secs, 10);
        assert_eq!(board.catalog.path, "data/catalog.json");
    }

    #[test]
    fn explicit_poll_interval_wins() {
        let toml_text = BOARD_TOML.replace("api_key = \"secret\"", "poll_interval_secs = 30");
        let board: BoardFile = toml::from_str(&toml_text).unwrap();
        assert_eq!(board.feed.poll_interval_secs, 30);
        assert_eq!(board.feed.api_key, "");
    }

    #[test]
    fn validation_rejects_zero_port_and_empty_base_url() {
        let base = Config {
            ws_port: 9200,
            feed: FeedConfig {
                base_url: "https://feed.example.com".into(),
                api_key: String::new(),
                poll_interval_secs: 10,
            },
            catalog_path: "catalog.json".into(),
        };

        let mut bad_port = base.clone();
        bad_port.ws_port = 0;
        assert!(matches!(
            validate(&bad_port),
            Err(ConfigError::ValidationError { .. })
        ));

        let mut bad_url = base.clone();
        bad_url.feed.base_url = "  ".into();
        assert!(matches!(
            validate(&bad_url),
            Err(ConfigError::ValidationError { .. })
        ));

        let mut bad_interval = base;
        bad_interval.feed.poll_interval_secs = 0;
        assert!(matches!(
            validate(&bad_interval),
            Err(ConfigError::ValidationError { .. })
        ));
    }
}
