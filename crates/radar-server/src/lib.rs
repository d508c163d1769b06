//! Radar traffic server: airport pool, loaders and per-connection sessions.

pub mod config;
pub mod error;
pub mod loader;
pub mod server;
pub mod session;
pub mod state;

pub use config::Config;
pub use error::{LoadError, SessionError};
pub use loader::{AirportDefinition, AirportLoader, CatalogLoader, JsonAirportLoader};
pub use session::{handle_connection, Session};
pub use state::{AirportPool, AirportSlot, ServerState};
