//! Builtin route set served by the standalone binary.

use serde_json::json;
use switchboard_core::{Blueprint, CallValue, RouteTable};

/// Routes every standalone server answers.
///
/// `alive` is the liveness probe clients check at connect time, `echo`
/// reflects the call value back, and the `sys` blueprint exposes process
/// facts for supervisors.
pub fn builtin_routes() -> RouteTable {
    let mut table = RouteTable::new();

    table.insert("alive", |_| Ok(json!({"on": true})));
    table.insert("echo", |value: CallValue| Ok(serde_json::to_value(value)?));

    let mut sys = Blueprint::new("sys");
    sys.route("version", |_| Ok(json!(env!("CARGO_PKG_VERSION"))));
    sys.route("pid", |_| Ok(json!(std::process::id())));
    table.mount(sys);

    table
}
