//! Centralized configuration for switchboard.
//!
//! Wire limits and networking defaults, kept as unit structs with associated
//! consts so call sites read as `WireConfig::MAX_FRAME_SIZE`.

/// Wire protocol limits.
pub struct WireConfig;

impl WireConfig {
    /// Maximum accepted frame payload size, checked before allocation.
    pub const MAX_FRAME_SIZE: usize = 1_048_576; // 1 MiB
}

/// Networking defaults shared by the server and client.
pub struct NetConfig;

impl NetConfig {
    /// Default bind/connect host.
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";

    /// Route probed by `Client::connect` to decide the active flag.
    pub const ALIVE_ROUTE: &'static str = "alive";

    /// Connections the server handles concurrently before shedding new ones.
    pub const MAX_CONNECTIONS: usize = 128;
}
