use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use controller::SlmController;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::watch,
};
use tracing::{debug, info, warn};

/// Raw advance-pulse listener. Accepts connections until shutdown is
/// signalled; each connection gets its own task, and a broken connection
/// never takes the listener down with it.
pub async fn serve(
    listener: TcpListener,
    controller: Arc<SlmController>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<()> {
    info!(addr = %listener.local_addr()?, "advance listener ready");
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "pulse connection accepted");
                    let controller = Arc::clone(&controller);
                    tokio::spawn(connection(stream, peer, controller));
                }
                Err(error) => warn!(%error, "accept failed"),
            },
            changed = shutdown.changed() => {
                // A dropped sender counts as shutdown too.
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!("advance listener stopped");
    Ok(())
}

/// One pulse connection: every non-empty line advances the sequence by one
/// position, wrapping around. EOF and read errors end this connection only.
async fn connection(stream: TcpStream, peer: SocketAddr, controller: Arc<SlmController>) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match controller.advance() {
                    Ok(position) => debug!(%peer, position, "advance pulse"),
                    Err(error) => warn!(%peer, %error, "advance pulse rejected"),
                }
            }
            Ok(None) => {
                debug!(%peer, "pulse connection closed");
                break;
            }
            Err(error) => {
                warn!(%peer, %error, "pulse connection error");
                break;
            }
        }
    }
}
