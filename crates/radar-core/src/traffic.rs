//! Per-tick traffic engine: spawning, dead-reckoning movement, runway
//! occupancy, landing clearance, go-arounds and route completion.
//!
//! The engine works on one session's aircraft list at a time. It never locks
//! anything itself; callers hand it the list and the runway state of the
//! airport they own, and receive a [`TickReport`] describing what happened.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::generator::generate_aircraft;
use crate::models::Aircraft;
use crate::navigation::{Airport, RouteKind, SimPosition};
use crate::rules::TrafficRules;

/// Read access to every airport currently attached to a session.
pub trait AirportDirectory {
    fn airport(&self, icao: &str) -> Option<Arc<Airport>>;

    fn airports(&self) -> Vec<Arc<Airport>>;
}

impl AirportDirectory for BTreeMap<String, Arc<Airport>> {
    fn airport(&self, icao: &str) -> Option<Arc<Airport>> {
        self.get(icao).cloned()
    }

    fn airports(&self) -> Vec<Arc<Airport>> {
        self.values().cloned().collect()
    }
}

impl AirportDirectory for HashMap<String, Arc<Airport>> {
    fn airport(&self, icao: &str) -> Option<Arc<Airport>> {
        self.get(icao).cloned()
    }

    fn airports(&self) -> Vec<Arc<Airport>> {
        self.values().cloned().collect()
    }
}

/// Mutable runway state of one airport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayOccupancy {
    pub blocked: bool,
    /// Empty when no specific aircraft holds the runway.
    pub call_sign: String,
}

impl RunwayOccupancy {
    pub fn release(&mut self) {
        self.blocked = false;
        self.call_sign.clear();
    }

    pub fn occupy(&mut self, call_sign: &str) {
        self.blocked = true;
        self.call_sign = call_sign.to_string();
    }

    pub fn is_held_by_other(&self, call_sign: &str) -> bool {
        self.blocked && self.call_sign != call_sign
    }
}

/// Compass octant of the next waypoint as seen from the aircraft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Octant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl Octant {
    /// Classify `target` relative to `from` with strict per-axis comparisons.
    ///
    /// Anything not matched by an earlier arm, including a target straight to the
    /// north and a target at the aircraft's own position, falls back to `NW`.
    pub fn classify(from: SimPosition, target: SimPosition) -> Self {
        if from.x < target.x && from.y > target.y {
            Octant::NE
        } else if from.x < target.x && from.y == target.y {
            Octant::E
        } else if from.x < target.x && from.y < target.y {
            Octant::SE
        } else if from.x == target.x && from.y < target.y {
            Octant::S
        } else if from.x > target.x && from.y < target.y {
            Octant::SW
        } else if from.x > target.x && from.y == target.y {
            Octant::W
        } else {
            Octant::NW
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Octant::NE | Octant::SE | Octant::SW | Octant::NW)
    }
}

/// Move `distance` units from `from` toward `target` along `octant`.
///
/// Diagonal octants shrink the right triangle between the two points; cardinal
/// octants step along one axis from the truncated position.
pub fn advance_position(
    from: SimPosition,
    target: SimPosition,
    octant: Octant,
    distance: f64,
) -> SimPosition {
    if !octant.is_diagonal() {
        let x = from.x.trunc();
        let y = from.y.trunc();
        return match octant {
            Octant::N => SimPosition::new(x, y - distance),
            Octant::E => SimPosition::new(x + distance, y),
            Octant::S => SimPosition::new(x, y + distance),
            _ => SimPosition::new(x - distance, y),
        };
    }

    let opposite = match octant {
        Octant::NE | Octant::NW => from.y - target.y,
        _ => target.y - from.y,
    };
    let adjacent = match octant {
        Octant::NE | Octant::SE => target.x - from.x,
        _ => from.x - target.x,
    };
    let hypotenuse = (opposite.powi(2) + adjacent.powi(2)).sqrt();
    if hypotenuse == 0.0 {
        return target;
    }

    let remaining = hypotenuse - distance;
    let new_opposite = remaining * opposite / hypotenuse;
    let new_adjacent = (remaining.powi(2) - new_opposite.powi(2)).max(0.0).sqrt();

    let x = match octant {
        Octant::NE | Octant::SE => target.x - new_adjacent,
        _ => target.x + new_adjacent,
    };
    let y = match octant {
        Octant::NE | Octant::NW => target.y + new_opposite,
        _ => target.y - new_opposite,
    };
    SimPosition::new(x, y)
}

/// Proximity test for the waypoint the aircraft was flying to, scaled by
/// twice the step distance.
pub fn waypoint_passed(
    position: SimPosition,
    target: SimPosition,
    octant: Octant,
    step: f64,
) -> bool {
    let margin = step * 2.0;
    let reached_east = position.x >= target.x - margin;
    let reached_west = position.x <= target.x + margin;
    let reached_south = position.y >= target.y - margin;
    let reached_north = position.y <= target.y + margin;
    match octant {
        Octant::NE => reached_east && reached_north,
        Octant::SE => reached_east && reached_south,
        Octant::SW => reached_west && reached_south,
        Octant::NW => reached_west && reached_north,
        Octant::N => reached_north,
        Octant::E => reached_east,
        Octant::S => reached_south,
        Octant::W => reached_west,
    }
}

/// Move one random step toward the requested airspeed.
///
/// At or above the target the aircraft always slows down, so speed hovers
/// around the requested value instead of settling on it.
pub fn adjust_speed<R: Rng + ?Sized>(aircraft: &mut Aircraft, max_step: i32, rng: &mut R) {
    let step = rng.random_range(1..=max_step.max(1));
    if aircraft.actual_air_speed < aircraft.final_air_speed {
        aircraft.actual_air_speed += step;
    } else {
        aircraft.actual_air_speed = (aircraft.actual_air_speed - step).max(0);
    }
}

/// Move one random step toward the requested flight level.
///
/// Climbing needs more than `min_climb_speed`; descending happens whenever the
/// aircraft is above its target.
pub fn adjust_flight_level<R: Rng + ?Sized>(
    aircraft: &mut Aircraft,
    max_step: i32,
    min_climb_speed: i32,
    rng: &mut R,
) {
    let level = aircraft.actual_flight_level;
    if level < aircraft.final_flight_level && aircraft.actual_air_speed > min_climb_speed {
        aircraft.actual_flight_level += rng.random_range(1..=max_step.max(1));
    } else if level > aircraft.final_flight_level {
        aircraft.actual_flight_level -= rng.random_range(1..=max_step.max(1));
    }
}

/// Per-tick inputs decided by the caller's clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickContext {
    /// Append the new position to each aircraft's trail on this tick.
    pub record_trail: bool,
}

/// An aircraft that finished its departure and now belongs to another airport.
#[derive(Debug, Clone, PartialEq)]
pub struct HandOff {
    pub destination: String,
    pub aircraft: Aircraft,
}

/// What happened during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub handoffs: Vec<HandOff>,
    pub landed: Vec<String>,
    /// Removed because their destination has no active session.
    pub dropped: Vec<String>,
    pub cleared_to_land: Vec<String>,
    pub go_arounds: Vec<String>,
    pub errors: Vec<SimError>,
}

enum Movement {
    Flying,
    RouteComplete,
}

enum Completion {
    Removed,
    Stays,
}

/// Traffic engine bound to the airport a session owns.
pub struct TrafficEngine<'a, D: AirportDirectory + ?Sized> {
    airport: &'a Airport,
    directory: &'a D,
    rules: &'a TrafficRules,
}

impl<'a, D: AirportDirectory + ?Sized> TrafficEngine<'a, D> {
    pub fn new(airport: &'a Airport, directory: &'a D, rules: &'a TrafficRules) -> Self {
        Self {
            airport,
            directory,
            rules,
        }
    }

    /// No aircraft sits in the runway box at or below the runway ceiling.
    pub fn runway_clear(&self, traffic: &[Aircraft]) -> bool {
        !traffic.iter().any(|a| {
            a.position.within_box(self.airport.center, self.rules.runway_box)
                && a.actual_flight_level <= self.rules.runway_ceiling_fl
        })
    }

    pub fn within_landing_distance(&self, aircraft: &Aircraft) -> bool {
        aircraft
            .position
            .within_box(self.airport.center, self.rules.landing_box)
    }

    pub fn cleared_to_land(&self, aircraft: &Aircraft, traffic: &[Aircraft]) -> bool {
        self.runway_clear(traffic)
            && aircraft.actual_air_speed < self.rules.max_landing_speed
            && aircraft.is_landing()
            && self.within_landing_distance(aircraft)
    }

    /// Randomized gate; the more aircraft already tracked the less likely it opens.
    fn spawn_gate<R: Rng + ?Sized>(&self, tracked: usize, rng: &mut R) -> bool {
        let tracked = u32::try_from(tracked).unwrap_or(u32::MAX - 1);
        let span = (tracked + 1).saturating_mul(self.rules.spawn_gate_factor.max(1));
        let k = rng.random_range(1..=span);
        rng.random_ratio(1, k)
    }

    /// Possibly create a new departure at the airport's reference waypoint.
    ///
    /// Returns the new call sign when one was spawned.
    pub fn maybe_spawn<R: Rng + ?Sized>(
        &self,
        traffic: &mut Vec<Aircraft>,
        runway: &mut RunwayOccupancy,
        rng: &mut R,
    ) -> Result<Option<String>, SimError> {
        if traffic.len() >= self.rules.max_departures
            || !self.runway_clear(traffic)
            || !self.spawn_gate(traffic.len(), rng)
        {
            return Ok(None);
        }

        let origin = self.airport.reference_waypoint()?.position;
        let candidates = self.directory.airports();
        let commercial = rng.random_bool(0.5);
        let mut aircraft = generate_aircraft(
            rng,
            commercial,
            self.airport,
            candidates.iter().map(Arc::as_ref),
        )?;
        aircraft.position = origin;

        let call_sign = aircraft.call_sign.clone();
        traffic.push(aircraft);
        runway.blocked = true;
        Ok(Some(call_sign))
    }

    /// Advance every aircraft by one tick.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        traffic: &mut Vec<Aircraft>,
        runway: &mut RunwayOccupancy,
        ctx: TickContext,
        rng: &mut R,
    ) -> TickReport {
        let mut report = TickReport::default();
        let mut idx = 0;

        while idx < traffic.len() {
            if self.runway_clear(traffic) {
                runway.release();
            }
            if !traffic[idx].cleared_for_departure {
                idx += 1;
                continue;
            }

            match self.move_aircraft(&mut traffic[idx], ctx) {
                Ok(Movement::Flying) => {}
                Ok(Movement::RouteComplete) => {
                    match self.complete_route(traffic, idx, runway, &mut report, rng) {
                        Ok(Completion::Removed) => continue,
                        Ok(Completion::Stays) => {}
                        Err(err) => {
                            report.errors.push(err);
                            idx += 1;
                            continue;
                        }
                    }
                }
                Err(err) => {
                    report.errors.push(err);
                    idx += 1;
                    continue;
                }
            }

            adjust_speed(&mut traffic[idx], self.rules.max_speed_step, rng);
            adjust_flight_level(
                &mut traffic[idx],
                self.rules.max_level_step,
                self.rules.min_climb_speed,
                rng,
            );

            let aircraft = &traffic[idx];
            if self.cleared_to_land(aircraft, traffic) {
                runway.occupy(&aircraft.call_sign);
                report.cleared_to_land.push(aircraft.call_sign.clone());
            } else if aircraft.is_landing()
                && self.within_landing_distance(aircraft)
                && runway.is_held_by_other(&aircraft.call_sign)
            {
                let exclude = self.airport.icao.as_str();
                if let Some(waypoint) = self.airport.random_waypoint(Some(exclude), rng) {
                    let name = waypoint.name.clone();
                    let aircraft = &mut traffic[idx];
                    aircraft.active_route_mut().points.push_back(name);
                    aircraft.going_around = true;
                    report.go_arounds.push(aircraft.call_sign.clone());
                }
            }

            idx += 1;
        }

        report
    }

    /// Look up a waypoint of `aircraft`'s active route in the right airport.
    fn resolve(&self, aircraft: &Aircraft, name: &str) -> Result<SimPosition, SimError> {
        let on_own_airport =
            aircraft.active == RouteKind::Sid || aircraft.arrival == self.airport.icao;
        if on_own_airport {
            return Ok(self.airport.waypoint(name)?.position);
        }
        let destination = self
            .directory
            .airport(&aircraft.arrival)
            .ok_or_else(|| SimError::UnknownAirport(aircraft.arrival.clone()))?;
        let position = destination.waypoint(name)?.position;
        Ok(position)
    }

    fn move_aircraft(&self, aircraft: &mut Aircraft, ctx: TickContext) -> Result<Movement, SimError> {
        let Some(next) = aircraft.active_route().next_point() else {
            return Ok(Movement::RouteComplete);
        };
        let target = self.resolve(aircraft, next)?;

        let octant = Octant::classify(aircraft.position, target);
        let step = f64::from((aircraft.actual_air_speed / 100).max(0));
        aircraft.position = advance_position(aircraft.position, target, octant, step);

        let heading_octant = Octant::classify(aircraft.position, target);
        aircraft.heading_indicator = advance_position(
            aircraft.position,
            target,
            heading_octant,
            self.rules.heading_line_length,
        )
        .truncated();

        if ctx.record_trail {
            aircraft.trail.push(aircraft.position.truncated());
            if aircraft.trail.len() > self.rules.trail_length {
                let excess = aircraft.trail.len() - self.rules.trail_length;
                aircraft.trail.drain(..excess);
            }
        }

        if waypoint_passed(aircraft.position, target, octant, step) {
            aircraft.active_route_mut().pop_point();
        }
        Ok(Movement::Flying)
    }

    /// Handle an aircraft whose active route has no points left.
    fn complete_route<R: Rng + ?Sized>(
        &self,
        traffic: &mut Vec<Aircraft>,
        idx: usize,
        runway: &mut RunwayOccupancy,
        report: &mut TickReport,
        rng: &mut R,
    ) -> Result<Completion, SimError> {
        let own_icao = self.airport.icao.as_str();
        let aircraft = &mut traffic[idx];
        let departing_here = aircraft.active == RouteKind::Sid && aircraft.departure == own_icao;

        if !departing_here {
            aircraft.trail.clear();
            let call_sign = aircraft.call_sign.clone();
            traffic.remove(idx);
            runway.occupy(&call_sign);
            report.landed.push(call_sign);
            return Ok(Completion::Removed);
        }

        if aircraft.arrival == own_icao {
            aircraft.active = RouteKind::Star;
            return Ok(Completion::Stays);
        }

        let Some(destination) = self.directory.airport(&aircraft.arrival) else {
            let call_sign = aircraft.call_sign.clone();
            traffic.remove(idx);
            report.dropped.push(call_sign);
            return Ok(Completion::Removed);
        };

        let first = aircraft
            .star_route
            .next_point()
            .ok_or_else(|| SimError::EmptyRoute {
                call_sign: aircraft.call_sign.clone(),
            })?
            .to_string();
        let entry = destination.waypoint(&first)?.position;

        let jitter = self.rules.handoff_jitter.max(1);
        aircraft.active = RouteKind::Star;
        aircraft.position = SimPosition::new(
            entry.x + f64::from(rng.random_range(0..jitter)),
            entry.y + f64::from(rng.random_range(0..jitter)),
        );
        aircraft.trail.clear();
        aircraft.star_route.remove_point(&first);

        let aircraft = traffic.remove(idx);
        report.handoffs.push(HandOff {
            destination: aircraft.arrival.clone(),
            aircraft,
        });
        Ok(Completion::Removed)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::models::AircraftType;
    use crate::navigation::{AreaBounds, GpsCoordinate, Route};
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn bare_airport() -> Airport {
        let gps = GpsCoordinate::new(48.0, 17.0).unwrap();
        let bounds = AreaBounds::new(48.5, 17.5, 47.5, 16.5).unwrap();
        let mut airport = Airport::new("AAAA", "A", gps, bounds);
        airport.center = SimPosition::new(500.0, 300.0);
        airport
    }

    fn synthetic(x: f64, y: f64, level: i32) -> Aircraft {
        let sid = Route::new(1, "S", RouteKind::Sid, Vec::<String>::new());
        let star = Route::new(1, "T", RouteKind::Star, Vec::<String>::new());
        let mut acft = Aircraft::new(AircraftType::C172, "OM-AAA", "AAAA", "BBBB", sid, star);
        acft.position = SimPosition::new(x, y);
        acft.actual_flight_level = level;
        acft
    }

    proptest! {
        /// The runway is clear exactly when nobody low is inside the box.
        #[test]
        fn runway_clear_matches_box_rule(
            planes in prop::collection::vec((300.0f64..700.0, 100.0f64..500.0, 0i32..150), 0..6)
        ) {
            let airport = bare_airport();
            let rules = TrafficRules::default();
            let dir: BTreeMap<String, Arc<Airport>> = BTreeMap::new();
            let engine = TrafficEngine::new(&airport, &dir, &rules);

            let traffic: Vec<Aircraft> = planes.iter().map(|(x, y, l)| synthetic(*x, *y, *l)).collect();
            let expected_blocked = planes.iter().any(|(x, y, l)| {
                (x - 500.0).abs() <= 50.0 && (y - 300.0).abs() <= 50.0 && *l <= 50
            });
            prop_assert_eq!(engine.runway_clear(&traffic), !expected_blocked);
        }

        /// A step never moves the aircraft further than the step distance
        /// along a diagonal.
        #[test]
        fn diagonal_step_is_bounded(
            fx in 0.0f64..1000.0, fy in 0.0f64..1000.0,
            tx in 0.0f64..1000.0, ty in 0.0f64..1000.0,
            step in 0.0f64..5.0,
        ) {
            let from = SimPosition::new(fx, fy);
            let target = SimPosition::new(tx, ty);
            let octant = Octant::classify(from, target);
            prop_assume!(octant.is_diagonal());
            let next = advance_position(from, target, octant, step);
            prop_assert!(next.x.is_finite() && next.y.is_finite());
            let moved = ((next.x - fx).powi(2) + (next.y - fy).powi(2)).sqrt();
            prop_assert!(moved <= step + 1e-6);
        }

        /// Without go-arounds, a tick never lengthens an active route.
        #[test]
        fn route_progress_is_monotonic(
            x in 0.0f64..1000.0, y in 0.0f64..600.0, speed in 0i32..400,
        ) {
            let mut airport = bare_airport();
            airport.add_waypoint(crate::navigation::Waypoint::plain("AAAA", 48.0, 17.0).unwrap()).unwrap();
            airport.add_waypoint(crate::navigation::Waypoint::plain("FIX", 48.1, 17.1).unwrap()).unwrap();
            for waypoint in airport.waypoints_mut() {
                waypoint.position = SimPosition::new(400.0, 200.0);
            }
            let rules = TrafficRules::default();
            let dir: BTreeMap<String, Arc<Airport>> = BTreeMap::new();
            let engine = TrafficEngine::new(&airport, &dir, &rules);

            let mut acft = synthetic(x, y, 100);
            acft.sid_route = Route::new(1, "S", RouteKind::Sid, ["FIX", "AAAA"]);
            acft.cleared_for_departure = true;
            acft.actual_air_speed = speed;
            acft.final_air_speed = speed;

            let mut traffic = vec![acft];
            let mut runway = RunwayOccupancy::default();
            let mut rng = rand::rngs::StdRng::seed_from_u64(5);
            let mut previous = 2;
            for _ in 0..5 {
                let report = engine.advance(&mut traffic, &mut runway, TickContext::default(), &mut rng);
                prop_assert!(report.go_arounds.is_empty());
                let Some(acft) = traffic.first() else { break };
                let remaining = acft.sid_route.remaining();
                prop_assert!(remaining <= previous);
                previous = remaining;
            }
        }
    }
}
