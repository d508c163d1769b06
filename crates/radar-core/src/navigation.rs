//! Navigational data model: GPS coordinates, waypoints, runways, routes and airports.
//!
//! Geometry is stored twice: the real GPS position and the projected position in
//! simulation space. The projected values are filled in by a [`crate::Projector`]
//! once per airport load and are what the traffic engine works with.

use std::collections::VecDeque;
use std::fmt;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::NavError;

const VOR_MIN_MHZ: f64 = 108.0;
const VOR_MAX_MHZ: f64 = 117.95;

const RUNWAY_MIN_LENGTH_M: u32 = 500;
const RUNWAY_MAX_LENGTH_M: u32 = 6000;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinate {
    latitude: f64,
    longitude: f64,
}

impl GpsCoordinate {
    /// Both bounds are exclusive: latitude in (-90, 90), longitude in (-180, 180).
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, NavError> {
        let lat_ok = latitude > -90.0 && latitude < 90.0;
        let lon_ok = longitude > -180.0 && longitude < 180.0;
        if !lat_ok || !lon_ok {
            return Err(NavError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.latitude > 0.0 { 'N' } else { 'S' };
        let ew = if self.longitude > 0.0 { 'E' } else { 'W' };
        write!(f, "{}{} {}{}", self.latitude, ns, self.longitude, ew)
    }
}

/// A point in simulation space.
///
/// Simulation space is the projected plane the radar client draws on: `x` grows
/// to the east and `y` grows to the south. Runway, landing and separation checks
/// all operate on these coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimPosition {
    pub x: f64,
    pub y: f64,
}

impl SimPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Drop the fractional part of both axes.
    pub fn truncated(self) -> Self {
        Self {
            x: self.x.trunc(),
            y: self.y.trunc(),
        }
    }

    /// True when both axes are within `half_extent` of `center` (inclusive).
    pub fn within_box(&self, center: SimPosition, half_extent: f64) -> bool {
        self.x >= center.x - half_extent
            && self.x <= center.x + half_extent
            && self.y >= center.y - half_extent
            && self.y <= center.y + half_extent
    }
}

/// Radar display size reported by a client; defines the projection scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl ScreenSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// GPS borders of an airport's controlled area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AreaBounds {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl AreaBounds {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Result<Self, NavError> {
        if !(top > bottom && right > left) {
            return Err(NavError::InvalidBounds);
        }
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

/// Waypoint flavour. VOR beacons carry their frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WaypointKind {
    Plain,
    Vor { frequency_mhz: f64 },
}

/// Named navigation fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub gps: GpsCoordinate,
    pub kind: WaypointKind,
    /// Projected position, zero until the airport is projected.
    #[serde(default)]
    pub position: SimPosition,
}

impl Waypoint {
    pub fn plain(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, NavError> {
        Ok(Self {
            name: name.into(),
            gps: GpsCoordinate::new(latitude, longitude)?,
            kind: WaypointKind::Plain,
            position: SimPosition::default(),
        })
    }

    pub fn vor(
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
        frequency_mhz: f64,
    ) -> Result<Self, NavError> {
        if !(VOR_MIN_MHZ..=VOR_MAX_MHZ).contains(&frequency_mhz) {
            return Err(NavError::InvalidFrequency(frequency_mhz));
        }
        Ok(Self {
            name: name.into(),
            gps: GpsCoordinate::new(latitude, longitude)?,
            kind: WaypointKind::Vor { frequency_mhz },
            position: SimPosition::default(),
        })
    }

    pub fn frequency_mhz(&self) -> Option<f64> {
        match self.kind {
            WaypointKind::Plain => None,
            WaypointKind::Vor { frequency_mhz } => Some(frequency_mhz),
        }
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A runway identified by its magnetic heading number (1..=36).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Runway {
    pub number: u8,
    pub length_m: u32,
    pub midpoint: GpsCoordinate,
    #[serde(default)]
    pub start: SimPosition,
    #[serde(default)]
    pub end: SimPosition,
}

impl Runway {
    pub fn new(number: u8, length_m: u32, latitude: f64, longitude: f64) -> Result<Self, NavError> {
        let number_ok = number > 0 && number <= 36;
        let length_ok = (RUNWAY_MIN_LENGTH_M..=RUNWAY_MAX_LENGTH_M).contains(&length_m);
        if !number_ok || !length_ok {
            return Err(NavError::InvalidRunway { number, length_m });
        }
        Ok(Self {
            number,
            length_m,
            midpoint: GpsCoordinate::new(latitude, longitude)?,
            start: SimPosition::default(),
            end: SimPosition::default(),
        })
    }
}

/// Standard departure or arrival procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RouteKind {
    Sid,
    Star,
}

impl fmt::Display for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKind::Sid => f.write_str("SID"),
            RouteKind::Star => f.write_str("STAR"),
        }
    }
}

/// A named procedure and the waypoints still left to fly.
///
/// Aircraft own their copy of a route and consume it from the front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub runway: u8,
    pub name: String,
    pub kind: RouteKind,
    pub points: VecDeque<String>,
}

impl Route {
    pub fn new<I, S>(runway: u8, name: impl Into<String>, kind: RouteKind, points: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            runway,
            name: name.into(),
            kind,
            points: points.into_iter().map(Into::into).collect(),
        }
    }

    pub fn next_point(&self) -> Option<&str> {
        self.points.front().map(String::as_str)
    }

    pub fn pop_point(&mut self) -> Option<String> {
        self.points.pop_front()
    }

    pub fn remaining(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Remove the first occurrence of `name`, wherever it sits in the route.
    pub fn remove_point(&mut self, name: &str) -> bool {
        match self.points.iter().position(|p| p == name) {
            Some(idx) => self.points.remove(idx).is_some(),
            None => false,
        }
    }

    /// Points joined with arrows, e.g. `SIRAV -> MAPEK`.
    pub fn summary(&self) -> String {
        self.points
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Static and projected data for one airport, plus its runway occupancy fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub icao: String,
    pub name: String,
    pub gps: GpsCoordinate,
    pub bounds: AreaBounds,
    runways: Vec<Runway>,
    routes: Vec<Route>,
    waypoints: Vec<Waypoint>,
    /// Projected airport reference point.
    #[serde(default)]
    pub center: SimPosition,
    /// Screen size the geometry was projected for.
    #[serde(default)]
    pub area_size: ScreenSize,
    #[serde(default)]
    pub runway_blocked: bool,
    /// Call sign of the aircraft on the runway, empty when none.
    #[serde(default)]
    pub blocking_call_sign: String,
}

impl Airport {
    pub fn new(
        icao: impl Into<String>,
        name: impl Into<String>,
        gps: GpsCoordinate,
        bounds: AreaBounds,
    ) -> Self {
        Self {
            icao: icao.into().to_uppercase(),
            name: name.into(),
            gps,
            bounds,
            runways: Vec::new(),
            routes: Vec::new(),
            waypoints: Vec::new(),
            center: SimPosition::default(),
            area_size: ScreenSize::default(),
            runway_blocked: false,
            blocking_call_sign: String::new(),
        }
    }

    pub fn add_runway(&mut self, runway: Runway) -> Result<(), NavError> {
        if self.runways.iter().any(|r| r.number == runway.number) {
            return Err(NavError::DuplicateRunway(runway.number));
        }
        self.runways.push(runway);
        Ok(())
    }

    pub fn add_route(&mut self, route: Route) -> Result<(), NavError> {
        if self.routes.iter().any(|r| r.name == route.name) {
            return Err(NavError::DuplicateRoute(route.name));
        }
        self.routes.push(route);
        Ok(())
    }

    pub fn add_waypoint(&mut self, waypoint: Waypoint) -> Result<(), NavError> {
        if self.waypoints.iter().any(|w| w.name == waypoint.name) {
            return Err(NavError::DuplicateWaypoint(waypoint.name));
        }
        self.waypoints.push(waypoint);
        Ok(())
    }

    pub fn runways(&self) -> &[Runway] {
        &self.runways
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub(crate) fn runways_mut(&mut self) -> &mut [Runway] {
        &mut self.runways
    }

    pub(crate) fn waypoints_mut(&mut self) -> &mut [Waypoint] {
        &mut self.waypoints
    }

    pub fn waypoint(&self, name: &str) -> Result<&Waypoint, NavError> {
        self.waypoints
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| NavError::WaypointNotFound {
                airport: self.icao.clone(),
                waypoint: name.to_string(),
            })
    }

    pub fn route(&self, name: &str) -> Result<&Route, NavError> {
        self.routes
            .iter()
            .find(|r| r.name == name)
            .ok_or_else(|| NavError::RouteNotFound {
                airport: self.icao.clone(),
                route: name.to_string(),
            })
    }

    pub fn routes_of(&self, kind: RouteKind) -> Vec<&Route> {
        self.routes.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn route_names(&self, kind: RouteKind) -> Vec<String> {
        self.routes_of(kind).into_iter().map(|r| r.name.clone()).collect()
    }

    /// The fix named after the airport itself, where departures are spawned.
    pub fn reference_waypoint(&self) -> Result<&Waypoint, NavError> {
        self.waypoint(&self.icao)
    }

    /// Uniformly random waypoint, skipping `exclude` when given.
    pub fn random_waypoint<R: Rng + ?Sized>(
        &self,
        exclude: Option<&str>,
        rng: &mut R,
    ) -> Option<&Waypoint> {
        let candidates: Vec<&Waypoint> = self
            .waypoints
            .iter()
            .filter(|w| Some(w.name.as_str()) != exclude)
            .collect();
        candidates.choose(rng).copied()
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.icao, self.name)
    }
}
