//! Session protocol integration tests.
//!
//! Each test runs real session workers over in-memory duplex streams and talks
//! to them through the SDK client, using the sample airports in `data/airports`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use radar_core::{Aircraft, AircraftType, RouteKind, SimPosition, TrafficRules};
use radar_sdk::{modified, Instruction, RadarClient};
use radar_server::{Config, JsonAirportLoader, ServerState, Session, SessionError};
use tokio::io::DuplexStream;
use tokio::task::JoinHandle;

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/airports")
}

fn server_state(rules: TrafficRules) -> Arc<ServerState> {
    let config = Config {
        refresh_interval: Duration::from_millis(10),
        ..Config::default()
    };
    let loader = Arc::new(JsonAirportLoader::new(data_dir()));
    Arc::new(ServerState::new(config, loader).unwrap().with_rules(rules))
}

fn quiet_rules() -> TrafficRules {
    TrafficRules {
        max_departures: 0,
        ..TrafficRules::default()
    }
}

fn connect(
    state: &Arc<ServerState>,
    seed: u64,
) -> (RadarClient<DuplexStream>, JoinHandle<Result<(), SessionError>>) {
    let (client, server) = tokio::io::duplex(1 << 20);
    let session = Session::new(state.next_session_id(), Arc::clone(state), server).with_seed(seed);
    (RadarClient::new(client), tokio::spawn(session.run()))
}

async fn attach(client: &mut RadarClient<DuplexStream>, icao: &str) -> radar_core::Airport {
    let airports = client.list_airports().await.unwrap();
    assert!(airports.iter().any(|a| a == icao), "{icao} not offered");
    client.send_screen_size(1200, 600).await.unwrap();
    client.request_airport(icao).await.unwrap()
}

#[tokio::test]
async fn test_attach_returns_projected_airport() {
    let state = server_state(quiet_rules());
    let (mut client, _session) = connect(&state, 1);

    let airport = attach(&mut client, "LZIB").await;

    assert_eq!(airport.icao, "LZIB");
    assert_ne!(airport.center, SimPosition::default());
    assert!(!airport.runways().is_empty());
    for runway in airport.runways() {
        assert_ne!(runway.start, SimPosition::default());
        assert_ne!(runway.end, SimPosition::default());
    }
    assert!(!state.pool.is_available("LZIB"));

    // What the client rebuilt equals the server's snapshot.
    let snapshot = state.pool.slot("LZIB").unwrap().snapshot();
    assert_eq!(airport, snapshot);
}

#[tokio::test]
async fn test_modification_is_visible_on_next_tick() {
    let rules = TrafficRules {
        max_departures: 1,
        spawn_gate_factor: 1,
        ..TrafficRules::default()
    };
    let state = server_state(rules);
    let (mut controller, _a) = connect(&state, 7);
    let (mut neighbour, _b) = connect(&state, 8);
    attach(&mut controller, "LZIB").await;
    attach(&mut neighbour, "LOWW").await;

    let traffic = controller.request_aircraft().await.unwrap();
    assert_eq!(traffic.len(), 1);
    let departure = &traffic[0];
    assert_eq!(departure.departure, "LZIB");
    assert_eq!(departure.arrival, "LOWW");

    let change = modified(departure, &[Instruction::Speed(250)]);
    controller.send_modified(vec![change]).await.unwrap();

    let traffic = controller.request_aircraft().await.unwrap();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].call_sign, departure.call_sign);
    assert_eq!(traffic[0].final_air_speed, 250);
}

#[tokio::test]
async fn test_end_releases_airport_and_closes() {
    let state = server_state(quiet_rules());
    let (mut client, session) = connect(&state, 1);
    attach(&mut client, "LKPR").await;

    assert!(client.request_aircraft().await.unwrap().is_empty());
    client.send_modified(Vec::new()).await.unwrap();

    client.send(&radar_core::Request::End).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), Some(radar_core::Response::End));
    assert_eq!(client.recv().await.unwrap(), None);

    session.await.unwrap().unwrap();
    assert!(state.pool.is_available("LKPR"));
    assert!(state.pool.slot("LKPR").is_none());
}

#[tokio::test]
async fn test_end_during_handshake_is_acknowledged() {
    let state = server_state(quiet_rules());
    let (mut client, session) = connect(&state, 1);

    client.list_airports().await.unwrap();
    client.end().await.unwrap();
    session.await.unwrap().unwrap();
    assert_eq!(state.pool.available(), vec!["LKPR", "LOWW", "LZIB"]);
}

#[tokio::test]
async fn test_protocol_violation_terminates_session() {
    let state = server_state(quiet_rules());
    let (mut client, session) = connect(&state, 1);
    attach(&mut client, "LZIB").await;

    // Modifications before the aircraft request are out of slot.
    client.send_modified(Vec::new()).await.unwrap();
    assert_eq!(client.recv().await.unwrap(), None);

    let result = session.await.unwrap();
    assert!(matches!(result, Err(SessionError::Protocol(_))));
    assert!(state.pool.is_available("LZIB"));
}

#[tokio::test]
async fn test_disconnect_releases_airport() {
    let state = server_state(quiet_rules());
    let (mut client, session) = connect(&state, 1);
    attach(&mut client, "LOWW").await;
    drop(client);

    let result = session.await.unwrap();
    assert!(matches!(result, Err(SessionError::Disconnected)));
    assert!(state.pool.is_available("LOWW"));
}

#[tokio::test]
async fn test_airport_cannot_be_claimed_twice() {
    let state = server_state(quiet_rules());
    let (mut first, _a) = connect(&state, 1);
    attach(&mut first, "LZIB").await;

    let (mut second, session) = connect(&state, 2);
    let offered = second.list_airports().await.unwrap();
    assert!(!offered.contains(&"LZIB".to_string()));
    second.send_screen_size(1200, 600).await.unwrap();
    assert!(second.request_airport("LZIB").await.is_err());

    let result = session.await.unwrap();
    assert!(matches!(result, Err(SessionError::AirportUnavailable(code)) if code == "LZIB"));
    assert!(!state.pool.is_available("LZIB"));
}

#[tokio::test]
async fn test_invalid_screen_size_is_fatal() {
    let state = server_state(quiet_rules());
    let (mut client, session) = connect(&state, 1);
    client.list_airports().await.unwrap();
    client.send_screen_size(10, 10).await.unwrap();

    let result = session.await.unwrap();
    assert!(matches!(
        result,
        Err(SessionError::InvalidScreenSize { width: 10, height: 10 })
    ));
}

#[tokio::test]
async fn test_completed_departure_is_handed_off() {
    let state = server_state(quiet_rules());
    let (mut origin, _a) = connect(&state, 3);
    let (mut destination, _b) = connect(&state, 4);
    let lzib = attach(&mut origin, "LZIB").await;
    let lkpr = attach(&mut destination, "LKPR").await;

    let mut aircraft = Aircraft::new(
        AircraftType::A320,
        "CSA777",
        "LZIB",
        "LKPR",
        lzib.route("SIRAV1A").unwrap().clone(),
        lkpr.route("LOMKI1P").unwrap().clone(),
    );
    aircraft.sid_route.points.clear();
    aircraft.cleared_for_departure = true;
    aircraft.position = lzib.waypoint("SIRAV").unwrap().position;
    aircraft.actual_air_speed = 250;
    aircraft.final_air_speed = 250;
    aircraft.actual_flight_level = 120;
    aircraft.final_flight_level = 120;
    state
        .pool
        .slot("LZIB")
        .unwrap()
        .lock_traffic()
        .push(aircraft);

    let traffic = origin.request_aircraft().await.unwrap();
    assert!(traffic.iter().all(|a| a.call_sign != "CSA777"));

    let traffic = destination.request_aircraft().await.unwrap();
    let arrived = traffic
        .iter()
        .find(|a| a.call_sign == "CSA777")
        .expect("aircraft delivered to LKPR");
    assert_eq!(arrived.active, RouteKind::Star);
    assert!(arrived.cleared_for_departure);
    assert!(!arrived.star_route.points.iter().any(|p| p == "LOMKI"));
}
