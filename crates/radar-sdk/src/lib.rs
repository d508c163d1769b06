//! Radar SDK - client library for the radar traffic server
//!
//! Provides the network half of a radar client: handshake, tick requests and
//! controller instructions.

pub mod client;
pub mod commands;

pub use client::RadarClient;
pub use commands::{modified, Instruction};
