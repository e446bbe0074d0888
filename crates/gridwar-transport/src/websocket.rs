//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! A background task owns the listener. Every accepted socket performs its
//! upgrade handshake in its own task under [`HANDSHAKE_TIMEOUT`], so a
//! client that opens TCP and goes quiet never holds up the next one.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::error::{Error as WsError, ProtocolError as WsProtocolError};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// How long an accepted socket may take to finish the upgrade handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgraded connections waiting for [`Transport::accept`].
const ACCEPT_BACKLOG: usize = 64;

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

fn io_error(
    kind: io::ErrorKind,
    e: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> io::Error {
    io::Error::new(kind, e)
}

/// Maps a failed write. A peer that already closed is reported as
/// [`TransportError::ConnectionClosed`].
fn send_error(e: WsError) -> TransportError {
    match e {
        e @ (WsError::ConnectionClosed
        | WsError::AlreadyClosed
        | WsError::Protocol(WsProtocolError::SendAfterClosing)) => {
            TransportError::ConnectionClosed(e.to_string())
        }
        e => TransportError::SendFailed(io_error(io::ErrorKind::BrokenPipe, e)),
    }
}

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<WebSocketConnection>,
    acceptor: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address. Port `0`
    /// picks a free port; see [`local_addr`](Self::local_addr).
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        Self::bind_with_timeout(addr, HANDSHAKE_TIMEOUT).await
    }

    /// Like [`bind`](Self::bind), with a custom handshake timeout.
    pub async fn bind_with_timeout(
        addr: &str,
        handshake_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::BindFailed)?;
        let local_addr = listener.local_addr().map_err(TransportError::BindFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::channel(ACCEPT_BACKLOG);
        let acceptor = tokio::spawn(accept_loop(listener, tx, handshake_timeout));
        Ok(Self {
            local_addr,
            incoming,
            acceptor,
        })
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.local_addr)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.acceptor.abort();
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        self.incoming
            .recv()
            .await
            .ok_or_else(|| TransportError::AcceptFailed(io::Error::other("listener stopped")))
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        self.acceptor.abort();
        Ok(())
    }
}

/// Accepts sockets until the transport goes away, handing each one to its
/// own handshake task.
async fn accept_loop(
    listener: TcpListener,
    tx: mpsc::Sender<WebSocketConnection>,
    handshake_timeout: Duration,
) {
    loop {
        let (stream, addr) = tokio::select! {
            _ = tx.closed() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "TCP accept failed");
                    continue;
                }
            },
        };

        let tx = tx.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(handshake_timeout, handshake(stream)).await {
                Ok(Ok(conn)) => {
                    tracing::debug!(
                        id = %conn.id,
                        %addr,
                        path = %conn.path,
                        "accepted WebSocket connection"
                    );
                    let _ = tx.send(conn).await;
                }
                Ok(Err(e)) => tracing::debug!(%addr, error = %e, "WebSocket handshake failed"),
                Err(_) => tracing::debug!(%addr, "WebSocket handshake timed out"),
            }
        });
    }
}

/// Upgrades one socket, keeping the request path. The path selects
/// pairing, a new session, or a session id.
async fn handshake(stream: TcpStream) -> Result<WebSocketConnection, WsError> {
    let mut path = String::from("/");
    let ws = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            path = req.uri().path().to_owned();
            Ok(resp)
        },
    )
    .await?;

    let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    let (writer, reader) = ws.split();
    Ok(WebSocketConnection {
        id,
        path,
        writer: Mutex::new(writer),
        reader: Mutex::new(reader),
    })
}

/// A single WebSocket connection.
///
/// The stream is split so a pending [`recv`](Connection::recv) never
/// blocks a concurrent send.
pub struct WebSocketConnection {
    id: ConnectionId,
    path: String,
    writer: Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<SplitStream<WsStream>>,
}

impl WebSocketConnection {
    async fn send_message(&self, msg: Message) -> Result<(), TransportError> {
        self.writer
            .lock()
            .await
            .send(msg)
            .await
            .map_err(send_error)
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.send_message(Message::Binary(data.to_vec().into()))
            .await
    }

    async fn send_text(&self, text: &str) -> Result<(), Self::Error> {
        self.send_message(Message::text(text)).await
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(data))) => return Ok(Some(data.into())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text.as_bytes().to_vec())),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                // ping/pong are answered by tungstenite
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(io_error(
                        io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn path(&self) -> &str {
        &self.path
    }
}
