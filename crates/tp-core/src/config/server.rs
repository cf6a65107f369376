//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;

/// Hard upper bound on players in one game
pub const MAX_PLAYER_LIMIT: usize = 4;

/// Configuration for the game server process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the game listener to
    pub bind_address: String,

    /// Game rules fixed for the lifetime of the process
    pub game: GameConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:30020".to_string(),
            game: GameConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Check the configuration for values the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_address is empty".to_string()));
        }
        self.game.validate()
    }
}

/// Per-game constants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Maximum number of participants sampled into one game
    pub player_limit: usize,

    /// Number of tiles each participant holds
    pub hand_size: usize,

    /// How long the active player has before a move is made for them
    #[serde(with = "duration_secs")]
    pub turn_timeout: Duration,

    /// Delay between enough players being present and the game starting
    #[serde(with = "duration_secs")]
    pub countdown: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_limit: MAX_PLAYER_LIMIT,
            hand_size: 4,
            turn_timeout: Duration::from_secs(10),
            countdown: Duration::ZERO,
        }
    }
}

impl GameConfig {
    /// Check the game rules are playable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(2..=MAX_PLAYER_LIMIT).contains(&self.player_limit) {
            return Err(ConfigError::Invalid(format!(
                "player_limit must be between 2 and {}, got {}",
                MAX_PLAYER_LIMIT, self.player_limit
            )));
        }
        if self.hand_size == 0 {
            return Err(ConfigError::Invalid("hand_size must be at least 1".to_string()));
        }
        if self.turn_timeout.is_zero() {
            return Err(ConfigError::Invalid("turn_timeout must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.game.player_limit, 4);
        assert_eq!(config.game.hand_size, 4);
        assert!(config.game.countdown.is_zero());
    }

    #[test]
    fn test_player_limit_bounds() {
        let mut game = GameConfig::default();

        game.player_limit = 1;
        assert!(matches!(game.validate(), Err(ConfigError::Invalid(_))));

        game.player_limit = 5;
        assert!(matches!(game.validate(), Err(ConfigError::Invalid(_))));

        game.player_limit = 2;
        assert!(game.validate().is_ok());
    }

    #[test]
    fn test_zero_hand_and_timeout_rejected() {
        let game = GameConfig {
            hand_size: 0,
            ..GameConfig::default()
        };
        assert!(game.validate().is_err());

        let game = GameConfig {
            turn_timeout: Duration::ZERO,
            ..GameConfig::default()
        };
        assert!(game.validate().is_err());
    }
}
