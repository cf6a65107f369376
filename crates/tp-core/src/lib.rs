//! tp-core: Board engine, configuration and shared types for tilepath
//!
//! This crate provides the tile catalogue, the board engine the server drives
//! through the [`traits::BoardEngine`] seam, and the configuration structures
//! shared by the server binary and its tests.

pub mod board;
pub mod config;
pub mod error;
pub mod tiles;
pub mod traits;
pub mod types;

pub use board::{Board, BOARD_HEIGHT, BOARD_WIDTH};
pub use error::ConfigError;
pub use traits::BoardEngine;
pub use types::{MovementOutcome, Placement, TokenMove, TokenPosition};
