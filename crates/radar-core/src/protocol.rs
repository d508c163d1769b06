//! Wire messages and the per-connection protocol state machine.
//!
//! Messages are serde-tagged on `op`. The transition table lives in
//! [`SessionState::on_request`]; the server drives it and performs the side
//! effects each [`Transition`] asks for.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Aircraft;
use crate::navigation::{Airport, ScreenSize};

/// Client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    ListAirports,
    ScreenSize { width: u32, height: u32 },
    GetAirport { icao: String },
    GetAircraft,
    PutModified { aircraft: Vec<Aircraft> },
    End,
}

impl Request {
    pub fn opcode(&self) -> Opcode {
        match self {
            Request::ListAirports => Opcode::ListAirports,
            Request::ScreenSize { .. } => Opcode::ScreenSize,
            Request::GetAirport { .. } => Opcode::GetAirport,
            Request::GetAircraft => Opcode::GetAircraft,
            Request::PutModified { .. } => Opcode::PutModified,
            Request::End => Opcode::End,
        }
    }
}

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Response {
    AirportList { airports: Vec<String> },
    Airport { airport: Box<Airport> },
    Aircraft { aircraft: Vec<Aircraft> },
    End,
}

/// Request discriminant, used in transitions and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Opcode {
    ListAirports,
    ScreenSize,
    GetAirport,
    GetAircraft,
    PutModified,
    End,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::ListAirports => "LIST_AIRPORTS",
            Opcode::ScreenSize => "SCREEN_SIZE",
            Opcode::GetAirport => "GET_AIRPORT",
            Opcode::GetAircraft => "GET_AIRCRAFT",
            Opcode::PutModified => "PUT_MODIFIED",
            Opcode::End => "END",
        };
        f.write_str(name)
    }
}

/// Which of the two per-tick reads the operating loop expects next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickPhase {
    AwaitAircraftRequest,
    AwaitModifications,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Waiting,
    ListSent,
    ScreenSizeReceived,
    /// Operating loop; the airport has been sent and is owned by the session.
    AirportSent(TickPhase),
    Terminated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Waiting => f.write_str("WAITING"),
            SessionState::ListSent => f.write_str("LIST_SENT"),
            SessionState::ScreenSizeReceived => f.write_str("SCREEN_SIZE_RECEIVED"),
            SessionState::AirportSent(TickPhase::AwaitAircraftRequest) => {
                f.write_str("AIRPORT_SENT/AIRCRAFT")
            }
            SessionState::AirportSent(TickPhase::AwaitModifications) => {
                f.write_str("AIRPORT_SENT/MODIFIED")
            }
            SessionState::Terminated => f.write_str("TERMINATED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("unexpected {opcode} in state {state}")]
    UnexpectedRequest { state: SessionState, opcode: Opcode },
}

/// Side effect the session must perform for an accepted request.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendAirportList,
    RecordScreenSize(ScreenSize),
    AttachAirport(String),
    Tick,
    ApplyModifications(Vec<Aircraft>),
    Terminate,
}

/// Result of feeding one request to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: SessionState,
    pub action: Action,
}

impl SessionState {
    /// Validate `request` against the current state.
    ///
    /// END is accepted everywhere except after termination. Any other request
    /// outside its slot is a protocol violation.
    pub fn on_request(self, request: Request) -> Result<Transition, ProtocolError> {
        let opcode = request.opcode();
        let (next, action) = match (self, request) {
            (SessionState::Terminated, _) => {
                return Err(ProtocolError::UnexpectedRequest {
                    state: self,
                    opcode,
                })
            }
            (_, Request::End) => (SessionState::Terminated, Action::Terminate),
            (SessionState::Waiting, Request::ListAirports) => {
                (SessionState::ListSent, Action::SendAirportList)
            }
            (SessionState::ListSent, Request::ScreenSize { width, height }) => (
                SessionState::ScreenSizeReceived,
                Action::RecordScreenSize(ScreenSize::new(width, height)),
            ),
            (SessionState::ScreenSizeReceived, Request::GetAirport { icao }) => (
                SessionState::AirportSent(TickPhase::AwaitAircraftRequest),
                Action::AttachAirport(icao.to_uppercase()),
            ),
            (SessionState::AirportSent(TickPhase::AwaitAircraftRequest), Request::GetAircraft) => (
                SessionState::AirportSent(TickPhase::AwaitModifications),
                Action::Tick,
            ),
            (
                SessionState::AirportSent(TickPhase::AwaitModifications),
                Request::PutModified { aircraft },
            ) => (
                SessionState::AirportSent(TickPhase::AwaitAircraftRequest),
                Action::ApplyModifications(aircraft),
            ),
            (state, _) => return Err(ProtocolError::UnexpectedRequest { state, opcode }),
        };
        Ok(Transition { next, action })
    }

    pub fn is_operating(self) -> bool {
        matches!(self, SessionState::AirportSent(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(state: SessionState, request: Request) -> Transition {
        state.on_request(request).unwrap()
    }

    #[test]
    fn test_handshake_sequence() {
        let t = step(SessionState::Waiting, Request::ListAirports);
        assert_eq!(t.next, SessionState::ListSent);
        assert_eq!(t.action, Action::SendAirportList);

        let t = step(t.next, Request::ScreenSize { width: 1200, height: 600 });
        assert_eq!(t.next, SessionState::ScreenSizeReceived);
        assert_eq!(t.action, Action::RecordScreenSize(ScreenSize::new(1200, 600)));

        let t = step(t.next, Request::GetAirport { icao: "lzib".into() });
        assert_eq!(t.next, SessionState::AirportSent(TickPhase::AwaitAircraftRequest));
        assert_eq!(t.action, Action::AttachAirport("LZIB".into()));
        assert!(t.next.is_operating());
    }

    #[test]
    fn test_operating_loop_alternates() {
        let start = SessionState::AirportSent(TickPhase::AwaitAircraftRequest);
        let t = step(start, Request::GetAircraft);
        assert_eq!(t.action, Action::Tick);

        let t = step(t.next, Request::PutModified { aircraft: vec![] });
        assert_eq!(t.next, start);
        assert_eq!(t.action, Action::ApplyModifications(vec![]));
    }

    #[test]
    fn test_end_accepted_in_every_live_state() {
        for state in [
            SessionState::Waiting,
            SessionState::ListSent,
            SessionState::ScreenSizeReceived,
            SessionState::AirportSent(TickPhase::AwaitAircraftRequest),
            SessionState::AirportSent(TickPhase::AwaitModifications),
        ] {
            let t = step(state, Request::End);
            assert_eq!(t.next, SessionState::Terminated);
            assert_eq!(t.action, Action::Terminate);
        }
        assert!(SessionState::Terminated.on_request(Request::End).is_err());
    }

    #[test]
    fn test_out_of_slot_requests_are_violations() {
        let err = SessionState::Waiting.on_request(Request::GetAircraft).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnexpectedRequest {
                state: SessionState::Waiting,
                opcode: Opcode::GetAircraft,
            }
        );

        // Two aircraft requests in a row skip the modification slot.
        let state = SessionState::AirportSent(TickPhase::AwaitModifications);
        assert!(state.on_request(Request::GetAircraft).is_err());

        let state = SessionState::AirportSent(TickPhase::AwaitAircraftRequest);
        assert!(state
            .on_request(Request::PutModified { aircraft: vec![] })
            .is_err());
        assert!(state.on_request(Request::ListAirports).is_err());
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_string(&Request::ScreenSize { width: 800, height: 600 }).unwrap();
        assert_eq!(json, r#"{"op":"SCREEN_SIZE","width":800,"height":600}"#);

        let parsed: Request = serde_json::from_str(r#"{"op":"GET_AIRPORT","icao":"LZIB"}"#).unwrap();
        assert_eq!(parsed, Request::GetAirport { icao: "LZIB".into() });

        let end = serde_json::to_string(&Response::End).unwrap();
        assert_eq!(end, r#"{"op":"END"}"#);

        let list = Response::AirportList { airports: vec!["LKPR".into(), "LZIB".into()] };
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(serde_json::from_str::<Response>(&json).unwrap(), list);
    }

    #[test]
    fn test_error_message_names_state_and_opcode() {
        let err = ProtocolError::UnexpectedRequest {
            state: SessionState::ListSent,
            opcode: Opcode::GetAirport,
        };
        assert_eq!(err.to_string(), "unexpected GET_AIRPORT in state LIST_SENT");
    }
}
