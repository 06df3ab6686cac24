//! Control-socket lifecycle for obs-websocket.
//!
//! Owns at most one connection at a time. The handshake runs on the caller's
//! task; once identified, a socket task multiplexes outgoing requests,
//! request responses and push events until the socket closes or
//! `disconnect()` is called.

use crate::{
    CoreError, CoreResult,
    engine::Ingress,
    link::{ConnectionEvent, ConnectionSettings, DeviceLink},
    protocol::{self, ServerMessage},
    session::RawStatus,
};

use std::{
    collections::HashMap,
    panic::Location,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use error_location::ErrorLocation;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::{
    net::TcpStream,
    sync::{Mutex, mpsc, oneshot, watch},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Capacity of the per-connection request queue.
const REQUEST_QUEUE_CAPACITY: usize = 32;

struct OutgoingRequest {
    request_type: &'static str,
    reply_tx: oneshot::Sender<CoreResult<Value>>,
}

enum Link {
    Idle,
    Connecting {
        generation: u64,
        cancel_tx: watch::Sender<bool>,
    },
    Connected {
        generation: u64,
        requests_tx: mpsc::Sender<OutgoingRequest>,
        close_tx: watch::Sender<bool>,
    },
}

struct SupervisorInner {
    ingress_tx: mpsc::Sender<Ingress>,
    generation: AtomicU64,
    link: Mutex<Link>,
}

/// obs-websocket implementation of [`DeviceLink`].
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<SupervisorInner>,
}

impl ConnectionSupervisor {
    /// Create a supervisor reporting into the engine's ingress queue.
    pub fn new(ingress_tx: mpsc::Sender<Ingress>) -> Self {
        Self {
            inner: Arc::new(SupervisorInner {
                ingress_tx,
                generation: AtomicU64::new(0),
                link: Mutex::new(Link::Idle),
            }),
        }
    }

    async fn emit(&self, generation: u64, event: ConnectionEvent) {
        if self
            .inner
            .ingress_tx
            .send(Ingress::Connection { generation, event })
            .await
            .is_err()
        {
            debug!(generation, "Ingress queue closed, dropping connection event");
        }
    }

    /// Return the link to idle if it still belongs to `generation`.
    async fn release(&self, generation: u64) {
        let mut link = self.inner.link.lock().await;
        let owned = match &*link {
            Link::Connecting { generation: g, .. } | Link::Connected { generation: g, .. } => {
                *g == generation
            }
            Link::Idle => false,
        };
        if owned {
            *link = Link::Idle;
        }
    }

    async fn request(&self, request_type: &'static str) -> CoreResult<Value> {
        let requests_tx = match &*self.inner.link.lock().await {
            Link::Connected { requests_tx, .. } => requests_tx.clone(),
            _ => return Err(CoreError::not_connected()),
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        requests_tx
            .send(OutgoingRequest {
                request_type,
                reply_tx,
            })
            .await
            .map_err(|_| CoreError::not_connected())?;

        // The socket task drops pending replies when the connection closes.
        reply_rx.await.map_err(|_| CoreError::not_connected())?
    }
}

impl DeviceLink for ConnectionSupervisor {
    #[instrument(skip(self))]
    async fn connect(&self, settings: &ConnectionSettings) -> CoreResult<()> {
        let (generation, mut cancel_rx) = {
            let mut link = self.inner.link.lock().await;
            if !matches!(*link, Link::Idle) {
                debug!("Connection attempt already in flight");
                return Ok(());
            }
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let (cancel_tx, cancel_rx) = watch::channel(false);
            *link = Link::Connecting {
                generation,
                cancel_tx,
            };
            (generation, cancel_rx)
        };

        self.emit(generation, ConnectionEvent::Connecting).await;
        info!(generation, url = %settings.url(), "Connecting to OBS");

        let outcome = tokio::select! {
            result = handshake(settings) => result,
            _ = cancel_rx.changed() => Err(CoreError::ConnectionCancelled {
                location: ErrorLocation::from(Location::caller()),
            }),
        };

        let (socket, version) = match outcome {
            Ok(pair) => pair,
            Err(e @ CoreError::ConnectionCancelled { .. }) => {
                debug!(generation, "Connection attempt cancelled");
                return Err(e);
            }
            Err(e) => {
                self.release(generation).await;
                warn!(generation, error = %e, "Connection attempt failed");
                self.emit(
                    generation,
                    ConnectionEvent::ConnectionError {
                        message: e.to_string(),
                    },
                )
                .await;
                return Err(e);
            }
        };

        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_QUEUE_CAPACITY);
        let (close_tx, close_rx) = watch::channel(false);

        {
            let mut link = self.inner.link.lock().await;
            let still_ours =
                matches!(&*link, Link::Connecting { generation: g, .. } if *g == generation);
            if !still_ours {
                // disconnect() won the race after the handshake resolved
                drop(link);
                let mut socket = socket;
                let _ = socket.close(None).await;
                return Err(CoreError::ConnectionCancelled {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            *link = Link::Connected {
                generation,
                requests_tx,
                close_tx,
            };
        }

        info!(generation, version = %version, "Connected to OBS");
        self.emit(generation, ConnectionEvent::Connected { version })
            .await;

        tokio::spawn(run_socket(
            self.clone(),
            generation,
            socket,
            requests_rx,
            close_rx,
        ));

        Ok(())
    }

    #[instrument(skip(self))]
    async fn disconnect(&self) {
        let mut link = self.inner.link.lock().await;
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        match std::mem::replace(&mut *link, Link::Idle) {
            Link::Idle => debug!(generation, "Disconnect requested while idle"),
            Link::Connecting { cancel_tx, .. } => {
                let _ = cancel_tx.send(true);
                info!(generation, "Cancelled connection attempt");
            }
            Link::Connected { close_tx, .. } => {
                let _ = close_tx.send(true);
                info!(generation, "Disconnecting from OBS");
            }
        }
    }

    async fn get_record_status(&self) -> CoreResult<RawStatus> {
        let data = self.request(protocol::GET_RECORD_STATUS).await?;
        protocol::record_status(data)
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }
}

/// Read the next protocol message, skipping control frames.
async fn next_message(socket: &mut Socket) -> CoreResult<ServerMessage> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => return protocol::decode(text.as_str()),
            Some(Ok(Message::Close(frame))) => {
                let reason = frame
                    .map(|f| format!("closed by server ({}): {}", f.code, f.reason.as_str()))
                    .unwrap_or_else(|| "closed by server".to_string());
                return Err(CoreError::connection_failed(reason));
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
            None => return Err(CoreError::connection_failed("socket closed during handshake")),
        }
    }
}

/// Hello → Identify → Identified → GetVersion.
async fn handshake(settings: &ConnectionSettings) -> CoreResult<(Socket, String)> {
    let (mut socket, _) = connect_async(settings.url()).await?;

    let hello = match next_message(&mut socket).await? {
        ServerMessage::Hello(hello) => hello,
        other => return Err(CoreError::protocol(format!("Expected Hello, got {:?}", other))),
    };
    debug!(
        server_version = %hello.obs_web_socket_version,
        auth = hello.authentication.is_some(),
        "Received Hello"
    );

    let identify = protocol::identify(&hello, settings.password.as_deref())?;
    socket.send(Message::Text(identify.into())).await?;

    match next_message(&mut socket).await? {
        ServerMessage::Identified(identified) => {
            debug!(rpc_version = identified.negotiated_rpc_version, "Identified");
        }
        other => {
            return Err(CoreError::protocol(format!(
                "Expected Identified, got {:?}",
                other
            )));
        }
    }

    let request_id = Uuid::new_v4().to_string();
    socket
        .send(Message::Text(
            protocol::request(protocol::GET_VERSION, &request_id).into(),
        ))
        .await?;

    loop {
        if let ServerMessage::RequestResponse(response) = next_message(&mut socket).await?
            && response.request_id == request_id
        {
            let version = protocol::version(response.into_result()?)?;
            return Ok((socket, version));
        }
    }
}

/// Pump one identified socket until it closes.
async fn run_socket(
    supervisor: ConnectionSupervisor,
    generation: u64,
    socket: Socket,
    mut requests_rx: mpsc::Receiver<OutgoingRequest>,
    mut close_rx: watch::Receiver<bool>,
) {
    let (mut sink, mut stream) = socket.split();
    let mut pending: HashMap<String, oneshot::Sender<CoreResult<Value>>> = HashMap::new();

    loop {
        tokio::select! {
            // Also fires when the link was replaced and the sender dropped.
            _ = close_rx.changed() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            Some(request) = requests_rx.recv() => {
                let request_id = Uuid::new_v4().to_string();
                let frame = protocol::request(request.request_type, &request_id);
                match sink.send(Message::Text(frame.into())).await {
                    Ok(()) => {
                        pending.insert(request_id, request.reply_tx);
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "Failed to send request");
                        let _ = request.reply_tx.send(Err(e.into()));
                        break;
                    }
                }
            }

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match protocol::decode(text.as_str()) {
                    Ok(ServerMessage::Event(event)) => match event.record_state() {
                        Some(Ok(raw)) => {
                            supervisor
                                .emit(generation, ConnectionEvent::RecordStateChanged(raw))
                                .await;
                        }
                        Some(Err(e)) => warn!(generation, error = %e, "Ignoring record event"),
                        None => {}
                    },
                    Ok(ServerMessage::RequestResponse(response)) => {
                        if let Some(reply_tx) = pending.remove(&response.request_id) {
                            let _ = reply_tx.send(response.into_result());
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!(generation, error = %e, "Ignoring undecodable frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    info!(generation, frame = ?frame, "Socket closed by server");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(generation, error = %e, "Socket error");
                    break;
                }
                None => break,
            },
        }
    }

    // Dropping `pending` fails every in-flight request with NotConnected.
    drop(pending);
    supervisor.release(generation).await;
    info!(generation, "Disconnected from OBS");
    supervisor
        .emit(generation, ConnectionEvent::Disconnected)
        .await;
}
