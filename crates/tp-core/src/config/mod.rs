//! Configuration management for tilepath

pub mod serde_utils;
mod server;

pub use server::{GameConfig, ServerConfig, MAX_PLAYER_LIMIT};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tilepath")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let result = load_config::<ServerConfig>(&path);
        assert!(matches!(result, Err(ConfigError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "bind_address = \"127.0.0.1:4000\"\n\n[game]\nplayer_limit = 3\nhand_size = 5\nturn_timeout = 3\ncountdown = 0.5\n",
        )
        .unwrap();

        let loaded: ServerConfig = load_config(&path).unwrap();
        assert_eq!(loaded.bind_address, "127.0.0.1:4000");
        assert_eq!(loaded.game.player_limit, 3);
        assert_eq!(loaded.game.hand_size, 5);
        assert_eq!(loaded.game.turn_timeout, Duration::from_secs(3));
        assert_eq!(loaded.game.countdown, Duration::from_millis(500));
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[game]\nhand_size = 3\n").unwrap();

        let loaded: ServerConfig = load_config(&path).unwrap();
        assert_eq!(loaded.game.hand_size, 3);
        assert_eq!(loaded.bind_address, ServerConfig::default().bind_address);
        assert_eq!(loaded.game.player_limit, MAX_PLAYER_LIMIT);
    }

    #[test]
    fn test_garbage_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bind_address = [").unwrap();

        assert!(matches!(
            load_config::<ServerConfig>(&path),
            Err(ConfigError::Parse(_))
        ));
    }
}
