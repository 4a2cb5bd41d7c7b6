//! Merged tool catalog and name-to-backend routing.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tcommon::{BackendId, Registry};
use tracing::{debug, warn};

use crate::mcp::StdioConnector;
use crate::schema::normalize_schema;
use crate::{
    BackendConnection, BackendConnector, BackendSession, BackendTarget, ToolDescriptor, ToolError,
};

/// Owns every backend session and routes tool names to them.
///
/// Construction is all-or-nothing: if any backend fails to connect, list its
/// tools, or advertise a usable schema, every session opened so far is closed
/// before the error is returned. Tool names must be unique across the whole
/// registry.
pub struct ToolRegistry {
    backends: Vec<BackendConnection>,
    catalog: Vec<ToolDescriptor>,
    routes: RwLock<Registry<String, usize>>,
    closed: AtomicBool,
}

struct Index {
    backends: Vec<BackendConnection>,
    catalog: Vec<ToolDescriptor>,
    routes: Registry<String, usize>,
}

impl ToolRegistry {
    /// Connects every backend in key order and indexes its tools.
    pub async fn connect(
        targets: BTreeMap<BackendId, BackendTarget>,
        connector: &dyn BackendConnector,
    ) -> Result<Self, ToolError> {
        if targets.is_empty() {
            return Err(ToolError::configuration(
                "at least one tool backend must be configured",
            ));
        }

        let mut sessions: Vec<Arc<dyn BackendSession>> = Vec::with_capacity(targets.len());
        for (id, target) in &targets {
            match connector.connect(id.clone(), target).await {
                Ok(session) => {
                    debug!(backend = %id, command = %target.command.display(), "backend connected");
                    sessions.push(session);
                }
                Err(error) => {
                    close_all(&sessions).await;
                    return Err(error.with_backend_id(id.clone()));
                }
            }
        }

        Self::from_sessions(sessions).await
    }

    /// Spawns every backend as an MCP stdio server.
    pub async fn connect_stdio(
        targets: BTreeMap<BackendId, BackendTarget>,
    ) -> Result<Self, ToolError> {
        Self::connect(targets, &StdioConnector).await
    }

    /// Builds a registry over sessions that are already open.
    ///
    /// The registry takes ownership of the sessions; they are closed if
    /// indexing fails.
    pub async fn from_sessions(sessions: Vec<Arc<dyn BackendSession>>) -> Result<Self, ToolError> {
        if sessions.is_empty() {
            return Err(ToolError::configuration(
                "at least one tool backend must be configured",
            ));
        }

        match index(&sessions).await {
            Ok(index) => {
                debug!(
                    backends = index.backends.len(),
                    tools = index.catalog.len(),
                    "tool registry built"
                );
                Ok(Self {
                    backends: index.backends,
                    catalog: index.catalog,
                    routes: RwLock::new(index.routes),
                    closed: AtomicBool::new(false),
                })
            }
            Err(error) => {
                close_all(&sessions).await;
                Err(error)
            }
        }
    }

    /// Every advertised tool, in backend order then listing order.
    pub fn catalog(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    /// The backend that owns `name`, if any.
    ///
    /// Always `None` once the registry is closed. A backend whose session
    /// has gone away loses its routes on first lookup.
    pub fn route_for(&self, name: &str) -> Option<BackendConnection> {
        if self.is_closed() {
            return None;
        }

        let position = {
            let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
            *routes.get(name)?
        };
        let backend = self.backends.get(position)?;
        if backend.session.is_closed() {
            self.drop_routes_to(position);
            return None;
        }
        Some(backend.clone())
    }

    fn drop_routes_to(&self, position: usize) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let before = routes.len();
        routes.retain(|_, owner| *owner != position);
        if routes.len() != before
            && let Some(backend) = self.backends.get(position)
        {
            warn!(backend = %backend.id, "backend session ended; its tools are no longer routed");
        }
    }

    pub fn backend_ids(&self) -> Vec<BackendId> {
        self.backends
            .iter()
            .map(|backend| backend.id.clone())
            .collect()
    }

    pub fn tool_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes every backend session. Later calls do nothing.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        for backend in &self.backends {
            backend.session.close().await;
            debug!(backend = %backend.id, "backend closed");
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("backends", &self.backends)
            .field("tools", &self.catalog.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn index(sessions: &[Arc<dyn BackendSession>]) -> Result<Index, ToolError> {
    let mut backends = Vec::with_capacity(sessions.len());
    let mut catalog = Vec::new();
    let mut routes = Registry::new();

    for (position, session) in sessions.iter().enumerate() {
        let id = session.id().clone();
        let listed = session
            .list_tools()
            .await
            .map_err(|error| error.with_backend_id(id.clone()))?;

        let mut owned = Vec::with_capacity(listed.len());
        for tool in listed {
            let parameters = normalize_schema(&tool.name, tool.input_schema)
                .map_err(|error| error.with_backend_id(id.clone()))?;

            if let Err((_, existing)) = routes.try_insert(tool.name.clone(), position) {
                let owner = sessions[*existing].id();
                let message = if *existing == position {
                    format!("backend '{id}' lists tool '{}' more than once", tool.name)
                } else {
                    format!(
                        "tool '{}' is provided by both '{owner}' and '{id}'",
                        tool.name
                    )
                };
                return Err(ToolError::name_collision(message)
                    .with_tool_name(tool.name)
                    .with_backend_id(id));
            }

            owned.push(tool.name.clone());
            catalog.push(ToolDescriptor {
                name: tool.name,
                description: tool.description.unwrap_or_default(),
                parameters,
            });
        }

        backends.push(BackendConnection {
            id,
            session: Arc::clone(session),
            tools: owned,
        });
    }

    Ok(Index {
        backends,
        catalog,
        routes,
    })
}

async fn close_all(sessions: &[Arc<dyn BackendSession>]) {
    for session in sessions {
        session.close().await;
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_support::{FakeConnector, FakeSession};
    use crate::{BackendToolInfo, ToolErrorKind};

    fn targets(ids: &[&str]) -> BTreeMap<BackendId, BackendTarget> {
        ids.iter()
            .map(|id| (BackendId::from(*id), BackendTarget::new(format!("/bin/{id}"))))
            .collect()
    }

    #[tokio::test]
    async fn routes_each_tool_to_the_backend_that_lists_it() {
        let files = FakeSession::new("files")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .shared();
        let prices = FakeSession::new("prices")
            .with_tool(
                BackendToolInfo::new("get_crypto_price")
                    .with_description("Current coin price")
                    .with_schema(json!({
                        "type": "object",
                        "properties": {"coin_id": {"type": "string"}}
                    })),
            )
            .shared();
        let connector = FakeConnector::default()
            .with_session(files.clone())
            .with_session(prices.clone());

        let registry = ToolRegistry::connect(targets(&["files", "prices"]), &connector)
            .await
            .expect("registry builds");

        let names: Vec<_> = registry.catalog().iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names, vec!["save_to_file", "get_crypto_price"]);
        assert_eq!(registry.catalog()[1].description, "Current coin price");
        assert_eq!(
            registry.catalog()[0].parameters,
            crate::schema::empty_object_schema()
        );

        let route = registry.route_for("get_crypto_price").expect("tool is routed");
        assert_eq!(route.id.as_str(), "prices");
        assert!(route.owns("get_crypto_price"));
        assert!(registry.route_for("unknown").is_none());
        assert_eq!(registry.tool_count(), 2);
        assert_eq!(
            registry.backend_ids(),
            vec![BackendId::from("files"), BackendId::from("prices")]
        );
    }

    #[tokio::test]
    async fn empty_backend_map_is_a_configuration_error() {
        let error = ToolRegistry::connect(BTreeMap::new(), &FakeConnector::default())
            .await
            .expect_err("empty map rejected");
        assert_eq!(error.kind, ToolErrorKind::Configuration);

        let error = ToolRegistry::from_sessions(Vec::new())
            .await
            .expect_err("no sessions rejected");
        assert_eq!(error.kind, ToolErrorKind::Configuration);
    }

    #[tokio::test]
    async fn colliding_names_across_backends_fail_and_close_everything() {
        let first = FakeSession::new("alpha")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .shared();
        let second = FakeSession::new("beta")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .shared();
        let connector = FakeConnector::default()
            .with_session(first.clone())
            .with_session(second.clone());

        let error = ToolRegistry::connect(targets(&["alpha", "beta"]), &connector)
            .await
            .expect_err("collision rejected");

        assert_eq!(error.kind, ToolErrorKind::NameCollision);
        assert_eq!(error.tool_name.as_deref(), Some("save_to_file"));
        assert_eq!(error.backend_id, Some(BackendId::from("beta")));
        assert!(error.message.contains("alpha"));
        assert_eq!(first.close_count(), 1);
        assert_eq!(second.close_count(), 1);
    }

    #[tokio::test]
    async fn duplicate_name_within_one_backend_is_a_collision() {
        let session = FakeSession::new("files")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .with_tool(BackendToolInfo::new("save_to_file"))
            .shared();

        let error = ToolRegistry::from_sessions(vec![session.handle()])
            .await
            .expect_err("duplicate rejected");

        assert_eq!(error.kind, ToolErrorKind::NameCollision);
        assert!(error.message.contains("more than once"));
        assert_eq!(session.close_count(), 1);
    }

    #[tokio::test]
    async fn bad_schema_is_fatal_to_construction() {
        let good = FakeSession::new("good")
            .with_tool(BackendToolInfo::new("greet"))
            .shared();
        let bad = FakeSession::new("bad")
            .with_tool(BackendToolInfo::new("count_chars").with_schema(json!("{oops")))
            .shared();
        let connector = FakeConnector::default()
            .with_session(good.clone())
            .with_session(bad.clone());

        let error = ToolRegistry::connect(targets(&["bad", "good"]), &connector)
            .await
            .expect_err("bad schema rejected");

        assert_eq!(error.kind, ToolErrorKind::InvalidSchema);
        assert_eq!(error.tool_name.as_deref(), Some("count_chars"));
        assert_eq!(error.backend_id, Some(BackendId::from("bad")));
        assert_eq!(good.close_count(), 1);
        assert_eq!(bad.close_count(), 1);
    }

    #[tokio::test]
    async fn connect_failure_closes_backends_opened_earlier() {
        let first = FakeSession::new("a")
            .with_tool(BackendToolInfo::new("greet"))
            .shared();
        let connector = FakeConnector::default()
            .with_session(first.clone())
            .failing("b");

        let error = ToolRegistry::connect(targets(&["a", "b"]), &connector)
            .await
            .expect_err("second backend fails");

        assert_eq!(error.kind, ToolErrorKind::Transport);
        assert_eq!(error.backend_id, Some(BackendId::from("b")));
        assert_eq!(first.close_count(), 1);
        assert_eq!(connector.connected(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn listing_failure_closes_all_sessions() {
        let first = FakeSession::new("a")
            .with_tool(BackendToolInfo::new("greet"))
            .shared();
        let broken = FakeSession::new("b")
            .with_list_error(ToolError::transport("pipe closed"))
            .shared();

        let error = ToolRegistry::from_sessions(vec![first.handle(), broken.handle()])
            .await
            .expect_err("listing failure rejected");

        assert_eq!(error.kind, ToolErrorKind::Transport);
        assert_eq!(error.backend_id, Some(BackendId::from("b")));
        assert_eq!(first.close_count(), 1);
        assert_eq!(broken.close_count(), 1);
    }

    #[tokio::test]
    async fn ended_backend_loses_its_routes_and_others_keep_theirs() {
        let files = FakeSession::new("files")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .with_tool(BackendToolInfo::new("read_file"))
            .shared();
        let prices = FakeSession::new("prices")
            .with_tool(BackendToolInfo::new("get_crypto_price"))
            .shared();
        let registry = ToolRegistry::from_sessions(vec![files.handle(), prices.handle()])
            .await
            .expect("registry builds");

        files.end();

        assert!(registry.route_for("save_to_file").is_none());
        assert!(registry.route_for("read_file").is_none());
        assert_eq!(
            registry.route_for("get_crypto_price").map(|route| route.id),
            Some(BackendId::from("prices"))
        );
        assert!(!registry.is_closed());
        assert_eq!(registry.catalog().len(), 3);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_clears_routes() {
        let session = FakeSession::new("files")
            .with_tool(BackendToolInfo::new("save_to_file"))
            .shared();
        let registry = ToolRegistry::from_sessions(vec![session.handle()])
            .await
            .expect("registry builds");

        registry.close().await;
        registry.close().await;

        assert!(registry.is_closed());
        assert!(registry.route_for("save_to_file").is_none());
        assert_eq!(session.close_count(), 1);
    }
}
