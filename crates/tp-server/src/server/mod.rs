//! TCP front end

mod handler;
mod listener;

pub use handler::handle_connection;
pub use listener::GameServer;
