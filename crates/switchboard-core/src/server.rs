//! TCP server half of the route-dispatch protocol.
//!
//! Binds the configured address, accepts connections, and handles each one on
//! its own spawned task: read one framed request, dispatch it through the
//! route table, write one framed response, close.
//!
//! # Thread Safety
//!
//! The route table is frozen when `serve` takes the server and shared across
//! connection tasks via `Arc`; dispatch never takes a lock.

use crate::config::NetConfig;
use crate::error::Result;
use crate::protocol::{read_frame, status, write_frame, CallValue, Request, Response};
use crate::routes::RouteTable;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Handle to a running server. Dropping shuts the server down.
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    conn_shutdown_tx: watch::Sender<bool>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Stop the server.
    ///
    /// Ends the accept loop immediately and signals connection tasks still
    /// waiting for a request frame; an exchange already dispatched finishes
    /// its write.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.conn_shutdown_tx.send(true);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// TCP route-dispatch server.
///
/// Construction records the bind address; nothing touches the network until
/// [`serve`](Server::serve).
pub struct Server {
    host: String,
    port: u16,
    routes: Arc<RouteTable>,
}

impl Server {
    /// Record the bind address and take ownership of the route table.
    ///
    /// Port 0 requests an OS-assigned port, resolved when `serve` binds.
    pub fn new(host: impl Into<String>, port: u16, routes: RouteTable) -> Self {
        Self {
            host: host.into(),
            port,
            routes: Arc::new(routes),
        }
    }

    /// Dispatch a route in-process, without the wire.
    ///
    /// Same lookup, status mapping, and timing as a framed request.
    pub fn dispatch(&self, route: &str, value: CallValue) -> Response {
        self.routes.dispatch(route, value)
    }

    /// Bind the configured address and start serving.
    ///
    /// Returns once the listener is live; the accept loop runs in background
    /// tasks until the handle shuts it down.
    pub async fn serve(self) -> Result<ServerHandle> {
        let listener = TcpListener::bind((self.host.as_str(), self.port)).await?;
        let addr = listener.local_addr()?;

        info!("serving {} routes on {}", self.routes.len(), addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (conn_shutdown_tx, conn_shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));

        let task_handle = tokio::spawn(Self::accept_loop(
            listener,
            self.routes,
            shutdown_rx,
            conn_shutdown_rx,
            active_connections,
        ));

        Ok(ServerHandle {
            addr,
            shutdown_tx: Some(shutdown_tx),
            conn_shutdown_tx,
            task_handle: Some(task_handle),
        })
    }

    async fn accept_loop(
        listener: TcpListener,
        routes: Arc<RouteTable>,
        mut shutdown_rx: oneshot::Receiver<()>,
        conn_shutdown_rx: watch::Receiver<bool>,
        active_connections: Arc<AtomicUsize>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let current = active_connections.load(Ordering::Relaxed);
                            if current >= NetConfig::MAX_CONNECTIONS {
                                warn!(
                                    "rejecting connection from {}: at max capacity ({})",
                                    peer_addr,
                                    NetConfig::MAX_CONNECTIONS
                                );
                                continue;
                            }

                            active_connections.fetch_add(1, Ordering::Relaxed);
                            let routes = routes.clone();
                            let conns = active_connections.clone();
                            let mut conn_shutdown = conn_shutdown_rx.clone();

                            tokio::spawn(async move {
                                debug!("connection from {}", peer_addr);
                                match Self::handle_connection(stream, &routes, &mut conn_shutdown).await {
                                    Ok(()) => debug!("connection from {} closed", peer_addr),
                                    Err(e) => debug!("connection from {} ended: {}", peer_addr, e),
                                }
                                conns.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!("accept error: {}", e);
                        }
                    }
                }
            }
        }
    }

    /// Handle exactly one request/response exchange, then close.
    async fn handle_connection(
        mut stream: TcpStream,
        routes: &RouteTable,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.split();

        // Wait for the request frame or a shutdown signal. A clean EOF here
        // is the peer closing without sending; the connection just ends.
        let frame = tokio::select! {
            result = read_frame(&mut reader) => {
                match result? {
                    Some(f) => f,
                    None => return Ok(()),
                }
            }
            _ = shutdown_rx.changed() => {
                return Ok(());
            }
        };

        let response = Self::process_frame(&frame, routes);
        let response_bytes = serde_json::to_vec(&response)?;
        write_frame(&mut writer, &response_bytes).await?;

        Ok(())
    }

    /// Decode and dispatch one request frame.
    ///
    /// A frame that arrives intact but does not decode as a `Request` is
    /// answered in-band with a 400 response; framing-level faults never
    /// reach this point.
    fn process_frame(frame: &[u8], routes: &RouteTable) -> Response {
        let request: Request = match serde_json::from_slice(frame) {
            Ok(req) => req,
            Err(e) => {
                debug!("rejecting undecodable request: {}", e);
                return Response::error(
                    status::BAD_REQUEST,
                    format!("malformed request: {}", e),
                    0.0,
                );
            }
        };

        let response = routes.dispatch(&request.route, request.value);
        debug!(
            "dispatched {} -> {} in {:.6}s",
            request.route, response.status, response.elapsed
        );
        response
    }
}
