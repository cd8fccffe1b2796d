//! Route registration and dispatch.
//!
//! A `RouteTable` maps route names to handlers. `Blueprint` groups routes
//! under a shared prefix for merging into a parent table. Dispatch resolves a
//! route, invokes its handler, and produces the response envelope with the
//! status mapping and the elapsed clock.

use crate::error::Result;
use crate::protocol::{status, CallValue, Response};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Handler invoked when its route is dispatched.
///
/// The returned value becomes the response payload; an error becomes a 500
/// response carrying the error text.
pub type Handler = Arc<dyn Fn(CallValue) -> Result<serde_json::Value> + Send + Sync>;

/// Mapping from route name to handler.
///
/// Every table owns its map. Tables only ever share entries through an
/// explicit [`merge`](RouteTable::merge); there is no implicit cross-instance
/// state.
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, Handler>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a handler under an exact route name.
    ///
    /// Replaces any previous handler for the same route.
    pub fn insert<F>(&mut self, route: impl Into<String>, handler: F)
    where
        F: Fn(CallValue) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.routes.insert(route.into(), Arc::new(handler));
    }

    /// Union `other`'s entries into this table.
    ///
    /// On key collision `other`'s entry wins, silently.
    pub fn merge(&mut self, other: RouteTable) {
        self.routes.extend(other.routes);
    }

    /// Merge a sequence of tables in order; later tables win collisions.
    pub fn merge_all(&mut self, tables: impl IntoIterator<Item = RouteTable>) {
        for table in tables {
            self.merge(table);
        }
    }

    /// Merge a blueprint's accumulated routes into this table.
    pub fn mount(&mut self, blueprint: Blueprint) {
        self.merge(blueprint.into_table());
    }

    /// Whether a handler is registered under `route`.
    pub fn contains(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Look up `route` and invoke its handler, producing the response
    /// envelope.
    ///
    /// The elapsed clock starts immediately before the lookup and stops when
    /// the envelope is built, so it covers lookup plus handler execution but
    /// not serialization.
    ///
    /// - absent route: status 404, payload `"invalid"`
    /// - handler `Ok(v)`: status 200, payload `v`
    /// - handler `Err(e)`: status 500, payload `e.to_string()`
    pub fn dispatch(&self, route: &str, value: CallValue) -> Response {
        let started = Instant::now();
        match self.routes.get(route) {
            Some(handler) => match handler(value) {
                Ok(payload) => Response::ok(payload, started.elapsed().as_secs_f64()),
                Err(e) => {
                    debug!("handler for {} failed: {}", route, e);
                    Response::error(
                        status::INTERNAL_ERROR,
                        e.to_string(),
                        started.elapsed().as_secs_f64(),
                    )
                }
            },
            None => Response::error(
                status::NOT_FOUND,
                "invalid",
                started.elapsed().as_secs_f64(),
            ),
        }
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("RouteTable").field("routes", &names).finish()
    }
}

/// Namespaced group of routes mergeable into a parent table.
///
/// Routes land under `prefix + "/" + sub`, joined verbatim: duplicate or
/// trailing separators are kept, never normalized.
#[derive(Debug, Default)]
pub struct Blueprint {
    prefix: String,
    table: RouteTable,
}

impl Blueprint {
    /// Create a blueprint whose routes are grouped under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            table: RouteTable::new(),
        }
    }

    /// Register a handler under `prefix + "/" + sub`.
    pub fn route<F>(&mut self, sub: &str, handler: F)
    where
        F: Fn(CallValue) -> Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.table.insert(format!("{}/{}", self.prefix, sub), handler);
    }

    /// The prefix routes are grouped under.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Consume the blueprint, yielding its accumulated table.
    pub fn into_table(self) -> RouteTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwitchboardError;
    use serde_json::json;

    fn identity(value: CallValue) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(value)?)
    }

    #[test]
    fn test_dispatch_known_route_returns_200() {
        let mut table = RouteTable::new();
        table.insert("echo", identity);

        let resp = table.dispatch("echo", "hi".into());

        assert_eq!(resp.status, status::OK);
        assert_eq!(resp.payload, json!("hi"));
        assert!(resp.elapsed >= 0.0);
    }

    #[test]
    fn test_dispatch_unknown_route_returns_invalid() {
        let table = RouteTable::new();

        let resp = table.dispatch("ghost", "anything".into());

        assert_eq!(resp.status, status::NOT_FOUND);
        assert_eq!(resp.payload, json!("invalid"));
    }

    #[test]
    fn test_dispatch_handler_error_returns_500() {
        let mut table = RouteTable::new();
        table.insert("boom", |_| Err(SwitchboardError::Other("bad".into())));

        let resp = table.dispatch("boom", CallValue::default());

        assert_eq!(resp.status, status::INTERNAL_ERROR);
        assert!(resp.payload.as_str().unwrap().contains("bad"));
    }

    #[test]
    fn test_dispatch_elapsed_covers_handler_time() {
        let mut table = RouteTable::new();
        table.insert("slow", |_| {
            std::thread::sleep(std::time::Duration::from_millis(10));
            Ok(json!(null))
        });

        let resp = table.dispatch("slow", CallValue::default());

        assert!(resp.elapsed >= 0.010);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let mut table = RouteTable::new();
        table.insert("r", |_| Ok(json!(1)));
        table.insert("r", |_| Ok(json!(2)));

        assert_eq!(table.len(), 1);
        assert_eq!(table.dispatch("r", CallValue::default()).payload, json!(2));
    }

    #[test]
    fn test_merge_later_wins() {
        let mut a = RouteTable::new();
        a.insert("shared", |_| Ok(json!("from a")));
        a.insert("only_a", |_| Ok(json!(true)));

        let mut b = RouteTable::new();
        b.insert("shared", |_| Ok(json!("from b")));

        a.merge(b);

        assert_eq!(a.len(), 2);
        assert_eq!(
            a.dispatch("shared", CallValue::default()).payload,
            json!("from b")
        );
    }

    #[test]
    fn test_merge_all_applies_in_order() {
        let mut base = RouteTable::new();
        let mut first = RouteTable::new();
        first.insert("r", |_| Ok(json!("first")));
        let mut second = RouteTable::new();
        second.insert("r", |_| Ok(json!("second")));

        base.merge_all([first, second]);

        assert_eq!(
            base.dispatch("r", CallValue::default()).payload,
            json!("second")
        );
    }

    #[test]
    fn test_blueprint_routes_land_under_prefix() {
        let mut bp = Blueprint::new("api");
        bp.route("users", |_| Ok(json!([])));

        let mut table = RouteTable::new();
        table.mount(bp);

        assert!(table.contains("api/users"));
        assert!(!table.contains("users"));
    }

    #[test]
    fn test_blueprint_prefix_join_is_verbatim() {
        let mut trailing = Blueprint::new("api/");
        trailing.route("users", |_| Ok(json!([])));
        assert!(trailing.into_table().contains("api//users"));

        let mut empty = Blueprint::default();
        empty.route("bare", |_| Ok(json!([])));
        assert!(empty.into_table().contains("/bare"));
    }

    #[test]
    fn test_blueprint_tables_are_independent() {
        let mut first = Blueprint::new("api");
        first.route("one", |_| Ok(json!(1)));

        let second = Blueprint::new("api");

        assert!(first.table.contains("api/one"));
        assert!(second.table.is_empty());
    }

    #[test]
    fn test_tables_are_independent() {
        let mut a = RouteTable::new();
        a.insert("r", |_| Ok(json!(1)));

        let b = RouteTable::new();

        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn test_debug_lists_route_names() {
        let mut table = RouteTable::new();
        table.insert("b", |_| Ok(json!(null)));
        table.insert("a", |_| Ok(json!(null)));

        let rendered = format!("{:?}", table);
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains("\"b\""));
    }
}
