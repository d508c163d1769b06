//! Radar CLI - command line tools for the radar traffic server.
//!
//! - radar_probe: headless controller that attaches to one airport

pub mod controller;

pub use controller::{traffic_line, AutoController};
