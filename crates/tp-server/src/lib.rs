//! tp-server: Session server for the tilepath board game
//!
//! Clients connect over TCP, wait in a shared pool and are sampled into
//! games of up to four players. The crate is split into the session state
//! machine ([`session`]), the lock that serializes events into it
//! ([`coordinator`]), the turn timer ([`clock`]) and the TCP front end
//! ([`server`]).

pub mod clock;
pub mod coordinator;
pub mod server;
pub mod session;
pub mod state;

pub use coordinator::GameCoordinator;
pub use state::ServerState;
