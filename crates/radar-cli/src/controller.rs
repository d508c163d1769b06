//! Headless controller policy used by the probe.

use radar_core::Aircraft;
use radar_sdk::{modified, Instruction};

/// Picks at most one instruction per tick, since the server applies only the
/// first modified aircraft it receives.
#[derive(Debug, Clone)]
pub struct AutoController {
    /// Clear parked departures as soon as they appear.
    pub auto_clear: bool,
    /// Speed assigned to arrivals on final that are still too fast to land.
    pub approach_speed: i32,
    /// Arrivals at or above this requested speed are slowed down.
    pub max_landing_speed: i32,
}

impl Default for AutoController {
    fn default() -> Self {
        Self {
            auto_clear: true,
            approach_speed: 160,
            max_landing_speed: 180,
        }
    }
}

impl AutoController {
    pub fn next_modification(&self, traffic: &[Aircraft]) -> Option<Aircraft> {
        if self.auto_clear {
            if let Some(parked) = traffic.iter().find(|a| !a.cleared_for_departure) {
                return Some(modified(parked, &[Instruction::ClearForDeparture]));
            }
        }
        traffic
            .iter()
            .find(|a| a.is_landing() && a.final_air_speed >= self.max_landing_speed)
            .map(|a| modified(a, &[Instruction::Speed(self.approach_speed)]))
    }
}

/// One status line per aircraft.
pub fn traffic_line(aircraft: &Aircraft) -> String {
    let mut line = format!(
        "{} | FL{:03}/{:03} | {:3}/{:3} kt | ({:.0}, {:.0}) | {}",
        aircraft,
        aircraft.actual_flight_level,
        aircraft.final_flight_level,
        aircraft.actual_air_speed,
        aircraft.final_air_speed,
        aircraft.position.x,
        aircraft.position.y,
        aircraft.active_route().summary(),
    );
    if aircraft.going_around {
        line.push_str(" | GO-AROUND");
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_core::{AircraftType, Route, RouteKind};

    fn aircraft(call_sign: &str) -> Aircraft {
        let mut acft = Aircraft::new(
            AircraftType::A320,
            call_sign,
            "LZIB",
            "LKPR",
            Route::new(22, "SIRAV1A", RouteKind::Sid, ["TOVUP", "SIRAV"]),
            Route::new(6, "LOMKI1P", RouteKind::Star, ["LOMKI", "VLM", "LKPR"]),
        );
        acft.final_air_speed = 250;
        acft.final_flight_level = 120;
        acft
    }

    #[test]
    fn test_parked_departure_is_cleared_first() {
        let mut flying = aircraft("CSA100");
        flying.cleared_for_departure = true;
        let parked = aircraft("CSA200");

        let controller = AutoController::default();
        let change = controller
            .next_modification(&[flying, parked])
            .unwrap();
        assert_eq!(change.call_sign, "CSA200");
        assert!(change.cleared_for_departure);
        assert_eq!(change.final_air_speed, 250);
    }

    #[test]
    fn test_fast_arrival_is_slowed() {
        let mut arrival = aircraft("CSA300");
        arrival.cleared_for_departure = true;
        arrival.active = RouteKind::Star;
        arrival.star_route = Route::new(6, "LOMKI1P", RouteKind::Star, ["LKPR"]);

        let controller = AutoController::default();
        let change = controller.next_modification(&[arrival.clone()]).unwrap();
        assert_eq!(change.final_air_speed, 160);

        arrival.final_air_speed = 160;
        assert!(controller.next_modification(&[arrival]).is_none());
    }

    #[test]
    fn test_manual_mode_leaves_departures_parked() {
        let controller = AutoController {
            auto_clear: false,
            ..AutoController::default()
        };
        assert!(controller.next_modification(&[aircraft("CSA100")]).is_none());
    }

    #[test]
    fn test_traffic_line() {
        let mut acft = aircraft("CSA100");
        acft.actual_flight_level = 45;
        acft.actual_air_speed = 180;
        acft.position = radar_core::SimPosition::new(512.4, 233.9);
        assert_eq!(
            traffic_line(&acft),
            "CSA100 | A320 | LZIB -> LKPR | SID | FL045/120 | 180/250 kt | (512, 234) | TOVUP -> SIRAV"
        );
    }
}
