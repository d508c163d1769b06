//! Controller instructions and the modified-aircraft copies they produce.

use radar_core::Aircraft;

/// An instruction a controller gives to one aircraft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    ClearForDeparture,
    Speed(i32),
    FlightLevel(i32),
    /// Skip ahead to a waypoint of the active route, or fly to it first when
    /// it is not on the route.
    DirectTo(String),
    /// Replace the remaining points of the active route.
    Route(Vec<String>),
}

impl Instruction {
    pub fn apply_to(&self, aircraft: &mut Aircraft) {
        match self {
            Instruction::ClearForDeparture => aircraft.cleared_for_departure = true,
            Instruction::Speed(speed) => aircraft.final_air_speed = *speed,
            Instruction::FlightLevel(level) => aircraft.final_flight_level = *level,
            Instruction::DirectTo(name) => {
                let route = aircraft.active_route_mut();
                match route.points.iter().position(|p| p == name) {
                    Some(idx) => {
                        route.points.drain(..idx);
                    }
                    None => route.points.push_front(name.clone()),
                }
            }
            Instruction::Route(points) => {
                aircraft.active_route_mut().points = points.iter().cloned().collect();
            }
        }
    }
}

/// Copy of `aircraft` with `instructions` applied, ready for `send_modified`.
pub fn modified(aircraft: &Aircraft, instructions: &[Instruction]) -> Aircraft {
    let mut copy = aircraft.clone();
    for instruction in instructions {
        instruction.apply_to(&mut copy);
    }
    copy
}
