//! GPS to simulation-space projection.
//!
//! The projection is sized to the radar screen a client reports, so every
//! session projects its own airport once at attach time. Projected values are
//! truncated to whole units; the traffic engine relies on waypoints and the
//! airport reference point sitting on integer coordinates.

use crate::navigation::{Airport, AreaBounds, GpsCoordinate, Runway, ScreenSize, SimPosition};

const BORDER_SCALE: f64 = 10.0;
const COEFFICIENT_SCALE: f64 = 100.0;
const GPS_SCALE: f64 = 10.0;
const LAT_SCALE: f64 = 10.0;
const LON_SCALE: f64 = 6.0;
const LAT_CORRECTION: f64 = 50.0;
const LON_CORRECTION: f64 = 100.0;
/// Metres of runway per simulation unit, inverted.
const RUNWAY_LENGTH_COEF: f64 = 0.01;

/// Anything able to place an airport's geometry in simulation space.
pub trait Projector {
    fn project(&self, gps: &GpsCoordinate) -> SimPosition;

    fn runway_ends(&self, runway: &Runway) -> (SimPosition, SimPosition);

    fn screen(&self) -> ScreenSize;

    /// Fill in every projected field of `airport`.
    fn project_airport(&self, airport: &mut Airport) {
        airport.area_size = self.screen();
        airport.center = self.project(&airport.gps);
        for runway in airport.runways_mut() {
            let (start, end) = self.runway_ends(runway);
            runway.start = start;
            runway.end = end;
        }
        for waypoint in airport.waypoints_mut() {
            waypoint.position = self.project(&waypoint.gps);
        }
    }
}

/// The radar screen projection used by the desktop client.
#[derive(Debug, Clone, Copy)]
pub struct RadarProjection {
    screen: ScreenSize,
    scaled_top: f64,
    scaled_right: f64,
    lat_coefficient: f64,
    lon_coefficient: f64,
}

impl RadarProjection {
    pub fn new(bounds: &AreaBounds, screen: ScreenSize) -> Self {
        Self {
            screen,
            scaled_top: bounds.top * BORDER_SCALE,
            scaled_right: bounds.right * BORDER_SCALE,
            lat_coefficient: (bounds.right - bounds.left) * COEFFICIENT_SCALE,
            lon_coefficient: (bounds.top - bounds.bottom) * COEFFICIENT_SCALE,
        }
    }

    pub fn for_airport(airport: &Airport, screen: ScreenSize) -> Self {
        Self::new(&airport.bounds, screen)
    }

    /// Vertical screen coordinate of a latitude.
    pub fn y_of(&self, latitude: f64) -> f64 {
        let height = f64::from(self.screen.height);
        ((self.scaled_top - latitude * GPS_SCALE) * height / self.lat_coefficient) * LAT_SCALE
            + LAT_CORRECTION
    }

    /// Horizontal screen coordinate of a longitude.
    pub fn x_of(&self, longitude: f64) -> f64 {
        let width = f64::from(self.screen.width);
        width
            - LON_CORRECTION
            - ((self.scaled_right - longitude * GPS_SCALE) * width / self.lon_coefficient)
                * LON_SCALE
    }
}

fn runway_angle_deg(number: u8) -> f64 {
    let heading = f64::from(number) * 10.0;
    360.0 - if heading >= 180.0 { heading } else { heading + 180.0 }
}

impl Projector for RadarProjection {
    fn project(&self, gps: &GpsCoordinate) -> SimPosition {
        SimPosition::new(self.x_of(gps.longitude()), self.y_of(gps.latitude())).truncated()
    }

    fn runway_ends(&self, runway: &Runway) -> (SimPosition, SimPosition) {
        let mid = self.project(&runway.midpoint);
        let half_length = f64::from(runway.length_m) * RUNWAY_LENGTH_COEF / 2.0;
        let adjacent = half_length * runway_angle_deg(runway.number).to_radians().cos();
        let opposite = (half_length.powi(2) - adjacent.powi(2)).max(0.0).sqrt();

        let start = SimPosition::new(mid.x - opposite, mid.y - adjacent).truncated();
        let end = SimPosition::new(mid.x + opposite, mid.y + adjacent).truncated();
        (start, end)
    }

    fn screen(&self) -> ScreenSize {
        self.screen
    }
}
