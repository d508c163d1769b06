//! Traffic rules and thresholds for the simulation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunables for the traffic engine, in simulation units and flight levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficRules {
    /// Half-width of the box around the airport center that counts as the runway
    pub runway_box: f64,
    /// Aircraft at or below this flight level inside the box occupy the runway
    pub runway_ceiling_fl: i32,
    /// Half-width of the box an arrival must be inside to land
    pub landing_box: f64,
    /// Landing clearance is only given below this airspeed
    pub max_landing_speed: i32,
    /// Aircraft only climb above this airspeed
    pub min_climb_speed: i32,
    /// Distance of the heading indicator ahead of the aircraft
    pub heading_line_length: f64,
    /// Largest random speed change per tick
    pub max_speed_step: i32,
    /// Largest random flight level change per tick
    pub max_level_step: i32,
    /// Maximum aircraft a session holds before it stops spawning
    pub max_departures: usize,
    /// Scale of the randomized spawn gate per tracked aircraft
    pub spawn_gate_factor: u32,
    /// Minimum time between two trail points
    pub trail_interval: Duration,
    /// Trail points kept per aircraft
    pub trail_length: usize,
    /// Random offset applied when an aircraft is placed on its arrival route
    pub handoff_jitter: i32,
}

impl Default for TrafficRules {
    fn default() -> Self {
        Self {
            runway_box: 50.0,
            runway_ceiling_fl: 50,
            landing_box: 50.0,
            max_landing_speed: 180,
            min_climb_speed: 100,
            heading_line_length: 30.0,
            max_speed_step: 5,
            max_level_step: 5,
            max_departures: 5,
            spawn_gate_factor: 30,
            trail_interval: Duration::from_secs(3),
            trail_length: 20,
            handoff_jitter: 5,
        }
    }
}
