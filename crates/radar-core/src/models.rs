//! Aircraft model shared by the server and radar clients.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::navigation::{Route, RouteKind, SimPosition};

/// Aircraft types the generator can spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AircraftType {
    A320,
    A330,
    A340,
    B737,
    B747,
    B767,
    B777,
    C172,
    C152,
}

impl AircraftType {
    pub const ALL: [AircraftType; 9] = [
        AircraftType::A320,
        AircraftType::A330,
        AircraftType::A340,
        AircraftType::B737,
        AircraftType::B747,
        AircraftType::B767,
        AircraftType::B777,
        AircraftType::C172,
        AircraftType::C152,
    ];
}

impl fmt::Display for AircraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Airline ICAO prefixes used for commercial call signs.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Airline {
    AAL,
    BAW,
    CSA,
    DLH,
    SVK,
    UAL,
}

impl Airline {
    pub const ALL: [Airline; 6] = [
        Airline::AAL,
        Airline::BAW,
        Airline::CSA,
        Airline::DLH,
        Airline::SVK,
        Airline::UAL,
    ];
}

impl fmt::Display for Airline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A simulated aircraft.
///
/// The active route is always one of the aircraft's own SID/STAR routes; it is
/// selected by `active` rather than stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aircraft {
    pub aircraft_type: AircraftType,
    pub call_sign: String,
    pub departure: String,
    pub arrival: String,
    pub sid_route: Route,
    pub star_route: Route,
    pub active: RouteKind,
    pub position: SimPosition,
    pub final_flight_level: i32,
    pub actual_flight_level: i32,
    pub final_air_speed: i32,
    pub actual_air_speed: i32,
    /// Decimated polyline of recently visited positions.
    #[serde(default)]
    pub trail: Vec<SimPosition>,
    #[serde(default)]
    pub heading_indicator: SimPosition,
    #[serde(default)]
    pub cleared_for_departure: bool,
    #[serde(default)]
    pub going_around: bool,
    /// Presentation only; the server never reads it.
    #[serde(default)]
    pub selected: bool,
}

impl Aircraft {
    /// A departure parked at the origin, flying its SID once cleared.
    pub fn new(
        aircraft_type: AircraftType,
        call_sign: impl Into<String>,
        departure: impl Into<String>,
        arrival: impl Into<String>,
        sid_route: Route,
        star_route: Route,
    ) -> Self {
        Self {
            aircraft_type,
            call_sign: call_sign.into(),
            departure: departure.into(),
            arrival: arrival.into(),
            sid_route,
            star_route,
            active: RouteKind::Sid,
            position: SimPosition::default(),
            final_flight_level: 0,
            actual_flight_level: 0,
            final_air_speed: 0,
            actual_air_speed: 0,
            trail: Vec::new(),
            heading_indicator: SimPosition::default(),
            cleared_for_departure: false,
            going_around: false,
            selected: false,
        }
    }

    pub fn route(&self, kind: RouteKind) -> &Route {
        match kind {
            RouteKind::Sid => &self.sid_route,
            RouteKind::Star => &self.star_route,
        }
    }

    pub fn active_route(&self) -> &Route {
        self.route(self.active)
    }

    pub fn active_route_mut(&mut self) -> &mut Route {
        match self.active {
            RouteKind::Sid => &mut self.sid_route,
            RouteKind::Star => &mut self.star_route,
        }
    }

    /// On the arrival procedure with at most the final fix left.
    pub fn is_landing(&self) -> bool {
        self.active == RouteKind::Star && self.star_route.remaining() <= 1
    }

    pub fn route_summary(&self, kind: RouteKind) -> String {
        self.route(kind).summary()
    }

    /// True when `other` refers to the same aircraft (call sign and type).
    pub fn matches(&self, other: &Aircraft) -> bool {
        self.call_sign == other.call_sign && self.aircraft_type == other.aircraft_type
    }

    /// Copy the controller-editable fields from a client's modified copy.
    pub fn apply_modification(&mut self, modified: &Aircraft) {
        self.final_air_speed = modified.final_air_speed;
        self.final_flight_level = modified.final_flight_level;
        self.active_route_mut().points = modified.active_route().points.clone();
        self.cleared_for_departure = modified.cleared_for_departure;
    }
}

impl fmt::Display for Aircraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} -> {} | {}",
            self.call_sign,
            self.aircraft_type,
            self.departure.to_uppercase(),
            self.arrival.to_uppercase(),
            self.active
        )
    }
}
