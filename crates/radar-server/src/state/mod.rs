//! Process-wide server state shared by all session workers.

pub mod pool;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use radar_core::TrafficRules;

use crate::config::Config;
use crate::loader::AirportLoader;

pub use pool::{AirportPool, AirportSlot};

pub struct ServerState {
    pub pool: AirportPool,
    pub loader: Arc<dyn AirportLoader>,
    pub config: Config,
    pub rules: TrafficRules,
    session_counter: AtomicU64,
}

impl ServerState {
    /// Seed the pool with every airport the loader offers.
    pub fn new(config: Config, loader: Arc<dyn AirportLoader>) -> Result<Self, crate::LoadError> {
        let available = loader.list_available()?;
        let rules = TrafficRules {
            max_departures: config.max_departures,
            ..TrafficRules::default()
        };
        Ok(Self {
            pool: AirportPool::new(available),
            loader,
            config,
            rules,
            session_counter: AtomicU64::new(1),
        })
    }

    pub fn with_rules(mut self, rules: TrafficRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn next_session_id(&self) -> u64 {
        self.session_counter.fetch_add(1, Ordering::SeqCst)
    }
}
