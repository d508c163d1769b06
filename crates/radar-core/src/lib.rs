//! Core model and simulation engine for the radar traffic server.

pub mod error;
pub mod generator;
pub mod models;
pub mod navigation;
pub mod projection;
pub mod protocol;
pub mod rules;
pub mod traffic;

pub use error::{GenerateError, NavError, SimError};
pub use generator::generate_aircraft;
pub use models::{Aircraft, AircraftType, Airline};
pub use navigation::{
    Airport, AreaBounds, GpsCoordinate, Route, RouteKind, Runway, ScreenSize, SimPosition,
    Waypoint, WaypointKind,
};
pub use projection::{Projector, RadarProjection};
pub use protocol::{
    Action, Opcode, ProtocolError, Request, Response, SessionState, TickPhase, Transition,
};
pub use rules::TrafficRules;
pub use traffic::{
    AirportDirectory, HandOff, Octant, RunwayOccupancy, TickContext, TickReport, TrafficEngine,
};
