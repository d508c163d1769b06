//! Radar SDK client for the line-delimited JSON session protocol.

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use radar_core::{Aircraft, Airport, Request, Response};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::{Framed, LinesCodec};
use tracing::debug;

/// Largest accepted response line; airport snapshots are the biggest frames.
const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Client for one radar session.
pub struct RadarClient<S = TcpStream> {
    framed: Framed<S, LinesCodec>,
}

impl RadarClient<TcpStream> {
    /// Connect to a radar server.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl<S> RadarClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(MAX_FRAME_BYTES)),
        }
    }

    /// Send one request without waiting for a reply.
    pub async fn send(&mut self, request: &Request) -> Result<()> {
        let line = serde_json::to_string(request)?;
        debug!(op = %request.opcode(), "sending request");
        self.framed.send(line).await?;
        Ok(())
    }

    /// Next response, or `None` once the server closed the connection.
    pub async fn recv(&mut self) -> Result<Option<Response>> {
        match self.framed.next().await {
            Some(line) => Ok(Some(serde_json::from_str(&line?)?)),
            None => Ok(None),
        }
    }

    async fn expect_response(&mut self) -> Result<Response> {
        self.recv()
            .await?
            .ok_or_else(|| anyhow!("server closed the connection"))
    }

    /// Ask for the ICAO codes nobody is controlling.
    pub async fn list_airports(&mut self) -> Result<Vec<String>> {
        self.send(&Request::ListAirports).await?;
        match self.expect_response().await? {
            Response::AirportList { airports } => Ok(airports),
            other => bail!("expected airport list, got {:?}", other),
        }
    }

    /// Report the radar screen size the airport should be projected for.
    pub async fn send_screen_size(&mut self, width: u32, height: u32) -> Result<()> {
        self.send(&Request::ScreenSize { width, height }).await
    }

    /// Claim an airport and receive its projected snapshot.
    pub async fn request_airport(&mut self, icao: &str) -> Result<Airport> {
        self.send(&Request::GetAirport {
            icao: icao.to_string(),
        })
        .await?;
        match self.expect_response().await? {
            Response::Airport { airport } => Ok(*airport),
            other => bail!("expected airport {}, got {:?}", icao, other),
        }
    }

    /// Advance the simulation one tick and fetch the airport's traffic.
    pub async fn request_aircraft(&mut self) -> Result<Vec<Aircraft>> {
        self.send(&Request::GetAircraft).await?;
        match self.expect_response().await? {
            Response::Aircraft { aircraft } => Ok(aircraft),
            other => bail!("expected aircraft list, got {:?}", other),
        }
    }

    /// Send controller modifications; only the first entry is applied.
    pub async fn send_modified(&mut self, aircraft: Vec<Aircraft>) -> Result<()> {
        self.send(&Request::PutModified { aircraft }).await
    }

    /// End the session and wait for the server's acknowledgment.
    pub async fn end(mut self) -> Result<()> {
        self.send(&Request::End).await?;
        match self.expect_response().await? {
            Response::End => Ok(()),
            other => bail!("expected END, got {:?}", other),
        }
    }
}
