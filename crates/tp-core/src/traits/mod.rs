//! Core trait definitions

mod board;

pub use board::BoardEngine;
