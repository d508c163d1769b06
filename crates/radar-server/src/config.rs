//! Server configuration from environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// Minimum time between two operating-loop ticks of one session.
    pub refresh_interval: Duration,
    pub max_departures: usize,
    pub airport_dir: PathBuf,
    /// Accepted width and height range for SCREEN_SIZE, inclusive.
    pub min_screen: u32,
    pub max_screen: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: env::var("RADAR_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4444),
            refresh_interval: Duration::from_millis(
                env::var("RADAR_REFRESH_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            ),
            max_departures: env::var("RADAR_MAX_DEPARTURES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            airport_dir: env::var("RADAR_AIRPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/airports")),
            min_screen: env::var("RADAR_MIN_SCREEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(200),
            max_screen: env::var("RADAR_MAX_SCREEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(4096),
        }
    }

    pub fn screen_in_bounds(&self, width: u32, height: u32) -> bool {
        let range = self.min_screen..=self.max_screen;
        range.contains(&width) && range.contains(&height)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4444,
            refresh_interval: Duration::from_millis(500),
            max_departures: 5,
            airport_dir: PathBuf::from("data/airports"),
            min_screen: 200,
            max_screen: 4096,
        }
    }
}
