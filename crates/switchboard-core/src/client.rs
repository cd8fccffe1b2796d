//! TCP client half of the route-dispatch protocol.
//!
//! Each call opens its own connection for a single framed exchange; every
//! path out, success or error, releases the connection.

use crate::config::NetConfig;
use crate::error::{Result, SwitchboardError};
use crate::future::CallFuture;
use crate::protocol::{read_frame, write_frame, CallValue, Request, Response};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tracing::debug;

/// Client for a route-dispatch server.
///
/// [`connect`](Client::connect) records the target address and probes the
/// server's `alive` route; whether the probe succeeded is readable through
/// [`is_active`](Client::is_active). Calls are independent of the probe
/// outcome and can be issued either way.
#[derive(Debug)]
pub struct Client {
    host: String,
    port: u16,
    active: AtomicBool,
}

impl Client {
    /// Record the target address and probe it.
    ///
    /// The probe calls the server's `alive` route and marks the client
    /// active only when the response payload carries a truthy `on` field.
    /// An unreachable or unknown-route answer leaves the client inactive;
    /// it never fails construction.
    pub async fn connect(host: impl Into<String>, port: u16) -> Self {
        let client = Self {
            host: host.into(),
            port,
            active: AtomicBool::new(false),
        };
        client.authenticate().await;
        client
    }

    /// Whether a liveness probe has succeeded.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Relaxed)
    }

    /// Re-run the liveness probe.
    ///
    /// Only ever flips the client from inactive to active; a failed re-probe
    /// leaves an earlier verdict in place.
    pub async fn authenticate(&self) {
        let probe = self
            .call_async(NetConfig::ALIVE_ROUTE, CallValue::default())
            .then(|response: Response| truthy(response.payload.get("on")));

        match probe.await {
            Ok(true) => {
                self.active.store(true, Ordering::Relaxed);
                debug!("{}:{} is alive", self.host, self.port);
            }
            Ok(false) => {
                debug!("{}:{} answered without a truthy on flag", self.host, self.port);
            }
            Err(e) => {
                debug!("probe of {}:{} failed: {}", self.host, self.port, e);
            }
        }
    }

    /// Call a route and wait for the response.
    ///
    /// Any response the server sends back is `Ok`, including 404 and 500;
    /// `Err` means the exchange itself failed.
    pub async fn call(&self, route: &str, value: impl Into<CallValue>) -> Result<Response> {
        let request = Request::new(route, value);
        Self::exchange(&self.host, self.port, &request).await
    }

    /// Call a route without waiting; the exchange runs on a spawned task.
    ///
    /// The returned future resolves with the response or rejects with the
    /// exchange error. Chain work onto it with
    /// [`then`](crate::future::CallFuture::then) or await it directly.
    pub fn call_async(&self, route: &str, value: impl Into<CallValue>) -> CallFuture<Response> {
        let (promise, future) = CallFuture::pair();
        let host = self.host.clone();
        let port = self.port;
        let request = Request::new(route, value);

        tokio::spawn(async move {
            match Self::exchange(&host, port, &request).await {
                Ok(response) => promise.resolve(response),
                Err(e) => promise.reject(e),
            }
        });

        future
    }

    /// One full exchange on a fresh connection.
    ///
    /// The stream lives only in this scope, so every return path, early or
    /// not, closes it.
    async fn exchange(host: &str, port: u16, request: &Request) -> Result<Response> {
        let request_bytes = serde_json::to_vec(request)?;

        let mut stream = TcpStream::connect((host, port)).await.map_err(|e| {
            SwitchboardError::Connect {
                addr: format!("{}:{}", host, port),
                message: e.to_string(),
            }
        })?;
        let (mut reader, mut writer) = stream.split();

        write_frame(&mut writer, &request_bytes).await?;

        let frame = read_frame(&mut reader)
            .await?
            .ok_or(SwitchboardError::ConnectionClosed)?;

        Ok(serde_json::from_slice(&frame)?)
    }
}

/// Loose truthiness for probe payload fields: absent, null, `false`, zero,
/// and empty values are all falsey.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
