//! Capture intake TCP server.
//!
//! Notifier processes connect here and stream length-prefixed JSON frames.
//! Every decoded capture event is forwarded into the daemon event channel —
//! the explicit message-passing seam between the passive listener side and
//! the relay, with no shared service instance.

use crate::core::DaemonEvent;
use hearnear_proto::protocol::{Frame, PROTOCOL_VERSION};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Bind the intake socket and spawn the accept loop.  Binding happens before
/// this returns so the caller can treat a successful return as
/// "registration succeeded"; the bound address is returned for callers that
/// asked for an ephemeral port.
pub async fn start_server(
    bind_address: String,
    port: u16,
    event_tx: mpsc::Sender<DaemonEvent>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    info!("Capture intake listening at {}", local_addr);

    let handle = tokio::spawn(async move {
        let mut notifier_id = 0usize;
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    notifier_id += 1;
                    let id = notifier_id;
                    info!("Notifier {} connected from {}", id, peer);
                    let tx = event_tx.clone();
                    tokio::spawn(async move {
                        handle_notifier(stream, id, tx).await;
                        info!("Notifier {} disconnected", id);
                    });
                }
                Err(e) => {
                    error!("Failed to accept notifier connection: {}", e);
                }
            }
        }
    });
    Ok((local_addr, handle))
}

async fn handle_notifier(
    mut stream: TcpStream,
    notifier_id: usize,
    event_tx: mpsc::Sender<DaemonEvent>,
) {
    let mut tmp = [0u8; 4096];
    let mut read_buf: Vec<u8> = Vec::new();
    let mut greeted = false;

    loop {
        match stream.read(&mut tmp).await {
            Ok(0) => {
                info!("Notifier {} closed connection", notifier_id);
                break;
            }
            Ok(n) => {
                read_buf.extend_from_slice(&tmp[..n]);

                loop {
                    match Frame::decode(&read_buf) {
                        Ok(Some((frame, consumed))) => {
                            read_buf.drain(..consumed);
                            match frame {
                                Frame::Hello { protocol_version } => {
                                    if protocol_version != PROTOCOL_VERSION {
                                        warn!(
                                            "Notifier {} speaks protocol {} (expected {}), dropping",
                                            notifier_id, protocol_version, PROTOCOL_VERSION
                                        );
                                        return;
                                    }
                                    greeted = true;
                                }
                                Frame::Capture { data } => {
                                    if !greeted {
                                        warn!(
                                            "Notifier {} sent capture before hello, dropping",
                                            notifier_id
                                        );
                                        return;
                                    }
                                    if event_tx.send(DaemonEvent::Capture(data)).await.is_err() {
                                        warn!("Daemon event channel closed");
                                        return;
                                    }
                                }
                            }
                        }
                        // Not enough bytes for the next frame yet.
                        Ok(None) => break,
                        // A complete frame that does not parse means the
                        // stream is corrupt; nothing after it can be trusted.
                        Err(e) => {
                            warn!(
                                "Notifier {} sent a malformed frame, dropping: {}",
                                notifier_id, e
                            );
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                error!("Read error from notifier {}: {}", notifier_id, e);
                break;
            }
        }
    }
}
