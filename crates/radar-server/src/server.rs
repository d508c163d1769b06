//! TCP listener and accept loop.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::session;
use crate::state::ServerState;

/// Bind the listening socket on all interfaces.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    Ok(listener)
}

/// Accept connections forever, one session task per client.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                info!(%peer, "client connected");
                if let Err(err) = socket.set_nodelay(true) {
                    warn!(%peer, %err, "failed to set TCP_NODELAY");
                }
                tokio::spawn(session::handle_connection(Arc::clone(&state), socket));
            }
            Err(err) => warn!(%err, "accept failed"),
        }
    }
}
