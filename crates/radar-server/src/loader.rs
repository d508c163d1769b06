//! Airport definitions and the loaders that turn them into projected airports.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use radar_core::{
    Airport, AreaBounds, GpsCoordinate, NavError, Projector, RadarProjection, Route, RouteKind,
    Runway, ScreenSize, Waypoint,
};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Source of airport data for sessions.
pub trait AirportLoader: Send + Sync {
    /// ICAO codes this loader can produce.
    fn list_available(&self) -> Result<BTreeSet<String>, LoadError>;

    /// Build `icao` and project it for a client of the given screen size.
    fn load(&self, icao: &str, screen: ScreenSize) -> Result<Airport, LoadError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayDefinition {
    pub number: u8,
    pub length_m: u32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaypointDefinition {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Present for VOR beacons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vor_mhz: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub name: String,
    pub kind: RouteKind,
    pub runway: u8,
    pub points: Vec<String>,
}

/// On-disk form of one airport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AirportDefinition {
    pub icao: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bounds: AreaBounds,
    #[serde(default)]
    pub runways: Vec<RunwayDefinition>,
    #[serde(default)]
    pub waypoints: Vec<WaypointDefinition>,
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
}

impl AirportDefinition {
    /// Validate and assemble the unprojected airport.
    pub fn build(&self) -> Result<Airport, NavError> {
        let gps = GpsCoordinate::new(self.latitude, self.longitude)?;
        let bounds = AreaBounds::new(
            self.bounds.top,
            self.bounds.right,
            self.bounds.bottom,
            self.bounds.left,
        )?;
        let mut airport = Airport::new(&self.icao, &self.name, gps, bounds);

        for rwy in &self.runways {
            airport.add_runway(Runway::new(rwy.number, rwy.length_m, rwy.latitude, rwy.longitude)?)?;
        }
        for wpt in &self.waypoints {
            let waypoint = match wpt.vor_mhz {
                Some(mhz) => Waypoint::vor(&wpt.name, wpt.latitude, wpt.longitude, mhz)?,
                None => Waypoint::plain(&wpt.name, wpt.latitude, wpt.longitude)?,
            };
            airport.add_waypoint(waypoint)?;
        }
        for route in &self.routes {
            for point in &route.points {
                airport.waypoint(point)?;
            }
            airport.add_route(Route::new(
                route.runway,
                &route.name,
                route.kind,
                route.points.iter().cloned(),
            ))?;
        }
        Ok(airport)
    }

    /// Build and project for `screen`.
    pub fn project(&self, screen: ScreenSize) -> Result<Airport, NavError> {
        let mut airport = self.build()?;
        RadarProjection::for_airport(&airport, screen).project_airport(&mut airport);
        Ok(airport)
    }
}

/// Loads `<ICAO>.json` files from a directory.
#[derive(Debug, Clone)]
pub struct JsonAirportLoader {
    dir: PathBuf,
}

impl JsonAirportLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, icao: &str) -> PathBuf {
        self.dir.join(format!("{}.json", icao.to_uppercase()))
    }

    pub fn read_definition(&self, icao: &str) -> Result<AirportDefinition, LoadError> {
        let path = self.path_for(icao);
        if !path.is_file() {
            return Err(LoadError::NotFound(icao.to_uppercase()));
        }
        let raw = fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| LoadError::Parse { path, source })
    }
}

impl AirportLoader for JsonAirportLoader {
    fn list_available(&self) -> Result<BTreeSet<String>, LoadError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| LoadError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut codes = BTreeSet::new();
        for entry in entries {
            let path = entry
                .map_err(|source| LoadError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                codes.insert(stem.to_uppercase());
            }
        }
        Ok(codes)
    }

    fn load(&self, icao: &str, screen: ScreenSize) -> Result<Airport, LoadError> {
        let definition = self.read_definition(icao)?;
        Ok(definition.project(screen)?)
    }
}

/// In-memory airport definitions keyed by ICAO code.
#[derive(Debug, Clone, Default)]
pub struct CatalogLoader {
    definitions: BTreeMap<String, AirportDefinition>,
}

impl CatalogLoader {
    pub fn new(definitions: impl IntoIterator<Item = AirportDefinition>) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.icao.to_uppercase(), d))
                .collect(),
        }
    }

    pub fn insert(&mut self, definition: AirportDefinition) {
        self.definitions
            .insert(definition.icao.to_uppercase(), definition);
    }
}

impl AirportLoader for CatalogLoader {
    fn list_available(&self) -> Result<BTreeSet<String>, LoadError> {
        Ok(self.definitions.keys().cloned().collect())
    }

    fn load(&self, icao: &str, screen: ScreenSize) -> Result<Airport, LoadError> {
        let definition = self
            .definitions
            .get(&icao.to_uppercase())
            .ok_or_else(|| LoadError::NotFound(icao.to_uppercase()))?;
        Ok(definition.project(screen)?)
    }
}
