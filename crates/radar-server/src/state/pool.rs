//! Airport pool: which airports are free to claim and which are attached to a
//! session, with per-airport locks for runway state and traffic.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use radar_core::{Aircraft, Airport, AirportDirectory, HandOff, RunwayOccupancy};

use crate::error::SessionError;

/// One attached airport.
///
/// The projected geometry is immutable once claimed. Runway occupancy and the
/// aircraft list each have their own lock; code that needs both must take the
/// traffic lock first.
#[derive(Debug)]
pub struct AirportSlot {
    airport: Arc<Airport>,
    runway: Mutex<RunwayOccupancy>,
    traffic: Mutex<Vec<Aircraft>>,
}

impl AirportSlot {
    fn new(airport: Airport) -> Self {
        Self {
            airport: Arc::new(airport),
            runway: Mutex::new(RunwayOccupancy::default()),
            traffic: Mutex::new(Vec::new()),
        }
    }

    pub fn icao(&self) -> &str {
        &self.airport.icao
    }

    pub fn airport(&self) -> &Arc<Airport> {
        &self.airport
    }

    pub fn lock_traffic(&self) -> MutexGuard<'_, Vec<Aircraft>> {
        self.traffic.lock()
    }

    pub fn lock_runway(&self) -> MutexGuard<'_, RunwayOccupancy> {
        self.runway.lock()
    }

    pub fn traffic(&self) -> Vec<Aircraft> {
        self.traffic.lock().clone()
    }

    pub fn runway(&self) -> RunwayOccupancy {
        self.runway.lock().clone()
    }

    /// Airport value as sent to clients, with the current runway state filled in.
    pub fn snapshot(&self) -> Airport {
        let runway = self.runway();
        let mut airport = Airport::clone(&self.airport);
        airport.runway_blocked = runway.blocked;
        airport.blocking_call_sign = runway.call_sign;
        airport
    }
}

/// Shared registry of free and attached airports.
#[derive(Debug, Default)]
pub struct AirportPool {
    available: Mutex<BTreeSet<String>>,
    attached: DashMap<String, Arc<AirportSlot>>,
}

impl AirportPool {
    pub fn new(available: impl IntoIterator<Item = String>) -> Self {
        Self {
            available: Mutex::new(available.into_iter().map(|c| c.to_uppercase()).collect()),
            attached: DashMap::new(),
        }
    }

    /// Free ICAO codes, by value.
    pub fn available(&self) -> Vec<String> {
        self.available.lock().iter().cloned().collect()
    }

    pub fn is_available(&self, icao: &str) -> bool {
        self.available.lock().contains(icao)
    }

    pub fn slot(&self, icao: &str) -> Option<Arc<AirportSlot>> {
        self.attached.get(icao).map(|entry| Arc::clone(entry.value()))
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Take `airport` out of the free set and attach it.
    pub fn claim(&self, airport: Airport) -> Result<Arc<AirportSlot>, SessionError> {
        let icao = airport.icao.clone();
        let mut available = self.available.lock();
        if !available.remove(&icao) {
            return Err(SessionError::AirportUnavailable(icao));
        }
        let slot = Arc::new(AirportSlot::new(airport));
        self.attached.insert(icao, Arc::clone(&slot));
        Ok(slot)
    }

    /// Detach `icao` and make it claimable again. Releasing twice is a no-op.
    pub fn release(&self, icao: &str) -> Option<Arc<AirportSlot>> {
        let mut available = self.available.lock();
        let (code, slot) = self.attached.remove(icao)?;
        available.insert(code);
        Some(slot)
    }

    /// Deliver a handed-off aircraft into its destination's traffic list.
    ///
    /// Both lists are locked in ICAO order for the splice. Returns false when
    /// the aircraft was not delivered: the destination is not attached, is the
    /// source itself, or already tracks that call sign.
    pub fn transfer(&self, source: &str, handoff: HandOff) -> bool {
        let HandOff {
            destination,
            aircraft,
        } = handoff;
        if destination == source {
            return false;
        }
        let Some(target) = self.slot(&destination) else {
            return false;
        };
        let Some(origin) = self.slot(source) else {
            return deliver(&mut target.lock_traffic(), aircraft);
        };

        let (mut origin_traffic, mut target_traffic) = if source < destination.as_str() {
            let o = origin.lock_traffic();
            let t = target.lock_traffic();
            (o, t)
        } else {
            let t = target.lock_traffic();
            let o = origin.lock_traffic();
            (o, t)
        };
        origin_traffic.retain(|a| a.call_sign != aircraft.call_sign);
        deliver(&mut target_traffic, aircraft)
    }
}

fn deliver(traffic: &mut Vec<Aircraft>, aircraft: Aircraft) -> bool {
    if traffic.iter().any(|a| a.call_sign == aircraft.call_sign) {
        return false;
    }
    traffic.push(aircraft);
    true
}

impl AirportDirectory for AirportPool {
    fn airport(&self, icao: &str) -> Option<Arc<Airport>> {
        self.slot(icao).map(|slot| Arc::clone(slot.airport()))
    }

    fn airports(&self) -> Vec<Arc<Airport>> {
        let mut airports: Vec<Arc<Airport>> = self
            .attached
            .iter()
            .map(|entry| Arc::clone(entry.value().airport()))
            .collect();
        airports.sort_by(|a, b| a.icao.cmp(&b.icao));
        airports
    }
}
