// ── Fleet ──
//
// Registry of independently running routers keyed by profile name. Each
// entry is a full `Router` with its own session, schedulers and snapshot.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;

use crate::health::HealthState;
use crate::router::Router;

#[derive(Default, Clone)]
pub struct Fleet {
    routers: Arc<DashMap<String, Router>>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a router. A router previously registered under `name` is
    /// shut down and replaced.
    pub async fn insert(&self, name: impl Into<String>, router: Router) {
        let name = name.into();
        if let Some(previous) = self.routers.insert(name.clone(), router) {
            previous.shutdown().await;
            info!(router = %name, "replaced router");
        }
    }

    /// Remove and shut down a router.
    pub async fn remove(&self, name: &str) -> bool {
        match self.routers.remove(name) {
            Some((_, router)) => {
                router.shutdown().await;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<Router> {
        self.routers.get(name).map(|r| r.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.routers.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.routers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Current health of every router, sorted by name.
    pub fn health(&self) -> Vec<(String, Arc<HealthState>)> {
        let mut all: Vec<_> = self
            .routers
            .iter()
            .map(|r| (r.key().clone(), r.value().health()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// Shut every router down and empty the registry.
    pub async fn shutdown_all(&self) {
        let routers: Vec<Router> = self.routers.iter().map(|r| r.value().clone()).collect();
        self.routers.clear();
        for router in routers {
            router.shutdown().await;
        }
    }
}
