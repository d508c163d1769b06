//! Error types shared by the navigation model and the traffic engine.

use thiserror::Error;

use crate::navigation::RouteKind;

/// Data-integrity errors raised while building airports.
///
/// These are construction-time errors: an airport that raises one is never
/// published to a session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("GPS coordinates out of range: lat {latitude}, lon {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("VOR frequency {0} MHz outside 108.00-117.95")]
    InvalidFrequency(f64),

    #[error("invalid runway {number} with length {length_m} m")]
    InvalidRunway { number: u8, length_m: u32 },

    #[error("airport area bounds are degenerate")]
    InvalidBounds,

    #[error("runway {0} already defined")]
    DuplicateRunway(u8),

    #[error("route {0} already defined")]
    DuplicateRoute(String),

    #[error("waypoint {0} already defined")]
    DuplicateWaypoint(String),

    #[error("waypoint {waypoint} not found at {airport}")]
    WaypointNotFound { airport: String, waypoint: String },

    #[error("route {route} not found at {airport}")]
    RouteNotFound { airport: String, route: String },
}

/// Route-state errors raised while advancing a single aircraft.
///
/// The traffic engine logs these and moves on to the next aircraft.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("{call_sign} has no remaining waypoint")]
    EmptyRoute { call_sign: String },

    #[error(transparent)]
    Navigation(#[from] NavError),

    #[error("airport {0} is not loaded")]
    UnknownAirport(String),

    #[error("cannot spawn departure: {0}")]
    Generate(#[from] GenerateError),
}

/// Errors raised by the aircraft generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("no destination airport other than {owner} is connected")]
    NoDestination { owner: String },

    #[error("airport {icao} has no {kind} routes")]
    NoRoutes { icao: String, kind: RouteKind },
}
