//! Per-connection session worker.
//!
//! A session walks the handshake, claims one airport, then serves the
//! operating loop: one GET_AIRCRAFT / PUT_MODIFIED pair per refresh interval.
//! Whatever way the worker exits, the claimed airport goes back to the pool
//! when the session is dropped.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use radar_core::{
    Action, Aircraft, Airport, Request, Response, ScreenSize, SessionState, TickContext,
    TickPhase, TrafficEngine,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, info, warn, Instrument};

use crate::error::SessionError;
use crate::state::{AirportSlot, ServerState};

/// Largest accepted request line.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Holds an airport claim and returns it to the pool on drop.
struct ClaimGuard {
    state: Arc<ServerState>,
    slot: Arc<AirportSlot>,
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if self.state.pool.release(self.slot.icao()).is_some() {
            info!(icao = %self.slot.icao(), "airport released");
        }
    }
}

pub struct Session<S> {
    id: u64,
    state: Arc<ServerState>,
    framed: Framed<S, LinesCodec>,
    protocol: SessionState,
    screen: Option<ScreenSize>,
    claim: Option<ClaimGuard>,
    ticker: Interval,
    last_trail: Instant,
    rng: StdRng,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(id: u64, state: Arc<ServerState>, stream: S) -> Self {
        let mut ticker = time::interval(state.config.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            id,
            state,
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_BYTES)),
            protocol: SessionState::Waiting,
            screen: None,
            claim: None,
            ticker,
            last_trail: Instant::now(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Make spawning and manoeuvre randomness reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serve requests until END or an error.
    pub async fn run(mut self) -> Result<(), SessionError> {
        loop {
            if self.protocol == SessionState::AirportSent(TickPhase::AwaitAircraftRequest) {
                self.ticker.tick().await;
            }

            let request = self.next_request().await?;
            let transition = self.protocol.on_request(request)?;
            self.protocol = transition.next;

            match transition.action {
                Action::SendAirportList => {
                    let airports = self.state.pool.available();
                    debug!(count = airports.len(), "sending airport list");
                    self.send(Response::AirportList { airports }).await?;
                }
                Action::RecordScreenSize(screen) => self.record_screen(screen)?,
                Action::AttachAirport(icao) => {
                    let airport = self.attach(&icao)?;
                    self.send(Response::Airport {
                        airport: Box::new(airport),
                    })
                    .await?;
                    self.ticker.reset();
                    self.last_trail = Instant::now();
                }
                Action::Tick => {
                    let aircraft = self.tick()?;
                    self.send(Response::Aircraft { aircraft }).await?;
                }
                Action::ApplyModifications(modified) => self.apply_modifications(&modified)?,
                Action::Terminate => {
                    self.claim.take();
                    self.send(Response::End).await?;
                    SinkExt::<String>::close(&mut self.framed).await?;
                    return Ok(());
                }
            }
        }
    }

    async fn next_request(&mut self) -> Result<Request, SessionError> {
        let line = self
            .framed
            .next()
            .await
            .ok_or(SessionError::Disconnected)??;
        serde_json::from_str(&line).map_err(SessionError::Decode)
    }

    async fn send(&mut self, response: Response) -> Result<(), SessionError> {
        let line = serde_json::to_string(&response).map_err(SessionError::Encode)?;
        self.framed.send(line).await?;
        Ok(())
    }

    fn record_screen(&mut self, screen: ScreenSize) -> Result<(), SessionError> {
        if !self.state.config.screen_in_bounds(screen.width, screen.height) {
            return Err(SessionError::InvalidScreenSize {
                width: screen.width,
                height: screen.height,
            });
        }
        debug!(width = screen.width, height = screen.height, "screen size received");
        self.screen = Some(screen);
        Ok(())
    }

    /// Load, project and claim `icao`; returns the snapshot to send.
    fn attach(&mut self, icao: &str) -> Result<Airport, SessionError> {
        let screen = self.screen.ok_or(SessionError::MissingHandshake("SCREEN_SIZE"))?;
        if !self.state.pool.is_available(icao) {
            return Err(SessionError::AirportUnavailable(icao.to_string()));
        }

        let airport = self.state.loader.load(icao, screen)?;
        let slot = self.state.pool.claim(airport)?;
        info!(icao = %slot.icao(), name = %slot.airport().name, "airport attached");

        let snapshot = slot.snapshot();
        self.claim = Some(ClaimGuard {
            state: Arc::clone(&self.state),
            slot,
        });
        Ok(snapshot)
    }

    fn slot(&self) -> Result<Arc<AirportSlot>, SessionError> {
        self.claim
            .as_ref()
            .map(|claim| Arc::clone(&claim.slot))
            .ok_or(SessionError::MissingHandshake("GET_AIRPORT"))
    }

    /// Spawn, advance every aircraft once, deliver hand-offs and return the
    /// resulting traffic list.
    fn tick(&mut self) -> Result<Vec<Aircraft>, SessionError> {
        let slot = self.slot()?;
        let record_trail = self.last_trail.elapsed() >= self.state.rules.trail_interval;
        if record_trail {
            self.last_trail = Instant::now();
        }

        let engine = TrafficEngine::new(slot.airport(), &self.state.pool, &self.state.rules);
        let (spawned, report) = {
            let mut traffic = slot.lock_traffic();
            let mut runway = slot.lock_runway();
            let spawned = engine.maybe_spawn(&mut traffic, &mut runway, &mut self.rng);
            let report = engine.advance(
                &mut traffic,
                &mut runway,
                TickContext { record_trail },
                &mut self.rng,
            );
            (spawned, report)
        };

        match spawned {
            Ok(Some(call_sign)) => info!(%call_sign, "departure spawned"),
            Ok(None) => {}
            Err(err) => debug!(%err, "no departure spawned"),
        }
        for err in &report.errors {
            warn!(%err, "aircraft skipped this tick");
        }
        for call_sign in &report.cleared_to_land {
            debug!(%call_sign, "cleared to land");
        }
        for call_sign in &report.go_arounds {
            info!(%call_sign, "go-around");
        }
        for call_sign in &report.landed {
            info!(%call_sign, "landed");
        }
        for call_sign in &report.dropped {
            warn!(%call_sign, "destination has no session; aircraft dropped");
        }
        for handoff in report.handoffs {
            let call_sign = handoff.aircraft.call_sign.clone();
            let destination = handoff.destination.clone();
            if self.state.pool.transfer(slot.icao(), handoff) {
                info!(%call_sign, %destination, "handed off");
            } else {
                warn!(%call_sign, %destination, "hand-off not delivered");
            }
        }

        Ok(slot.traffic())
    }

    /// Apply the first modified aircraft to its tracked counterpart.
    fn apply_modifications(&mut self, modified: &[Aircraft]) -> Result<(), SessionError> {
        let slot = self.slot()?;
        let Some(first) = modified.first() else {
            return Ok(());
        };

        let mut traffic = slot.lock_traffic();
        match traffic.iter_mut().find(|a| a.matches(first)) {
            Some(aircraft) => {
                aircraft.apply_modification(first);
                debug!(
                    call_sign = %aircraft.call_sign,
                    speed = aircraft.final_air_speed,
                    level = aircraft.final_flight_level,
                    cleared = aircraft.cleared_for_departure,
                    "modification applied"
                );
            }
            None => debug!(call_sign = %first.call_sign, "modified aircraft is not tracked"),
        }
        Ok(())
    }
}

/// Run one session to completion, logging how it ended.
pub async fn handle_connection<S>(state: Arc<ServerState>, stream: S)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let id = state.next_session_id();
    let span = tracing::info_span!("session", id);
    async move {
        info!("session started");
        match Session::new(id, state, stream).run().await {
            Ok(()) => info!("session ended"),
            Err(SessionError::Disconnected) => info!("client disconnected"),
            Err(err) => warn!(%err, "session terminated"),
        }
    }
    .instrument(span)
    .await
}
