//! Switchboard Core - Route-dispatch RPC over TCP.
//!
//! This crate provides both halves of a small request/response protocol:
//! servers register handlers in a [`RouteTable`] (optionally composed from
//! namespaced [`Blueprint`]s) and serve them over length-prefixed JSON
//! frames; clients call routes synchronously or through a promise-backed
//! [`CallFuture`].
//!
//! For a ready-to-run server binary, see the `switchboard-rpc` crate.
//!
//! # Example
//!
//! ```rust,ignore
//! use switchboard_core::{CallValue, Client, RouteTable, Server};
//!
//! #[tokio::main]
//! async fn main() -> switchboard_core::Result<()> {
//!     let mut table = RouteTable::new();
//!     table.insert("alive", |_| Ok(serde_json::json!({"on": true})));
//!     table.insert("echo", |value: CallValue| Ok(serde_json::to_value(value)?));
//!
//!     let mut handle = Server::new("127.0.0.1", 0, table).serve().await?;
//!
//!     let client = Client::connect("127.0.0.1", handle.port()).await;
//!     assert!(client.is_active());
//!
//!     let response = client.call("echo", "hi").await?;
//!     println!("{} -> {:?}", response.status, response.payload);
//!
//!     handle.shutdown();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod future;
pub mod protocol;
pub mod routes;
pub mod server;

// Re-export commonly used types
pub use client::Client;
pub use error::{Result, SwitchboardError};
pub use future::{CallFuture, CallPromise};
pub use protocol::{read_frame, status, write_frame, CallValue, Request, Response};
pub use routes::{Blueprint, Handler, RouteTable};
pub use server::{Server, ServerHandle};
