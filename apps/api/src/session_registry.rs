//! Per-client session services.
//!
//! Each signed-in browser owns one [`SessionService`]; the cookie session only
//! carries the key under which the service is tracked here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use talentdesk_application::SessionService;
use talentdesk_core::{AppError, AppResult};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Builds a fresh, uninitialized session service for one client.
pub type SessionFactory = Arc<dyn Fn() -> SessionService + Send + Sync>;

struct ClientSession {
    service: SessionService,
    last_seen: Instant,
}

#[derive(Clone)]
pub struct SessionRegistry {
    factory: SessionFactory,
    idle_timeout: Duration,
    clients: Arc<RwLock<HashMap<Uuid, ClientSession>>>,
}

impl SessionRegistry {
    pub fn new(factory: SessionFactory, idle_timeout: Duration) -> Self {
        Self {
            factory,
            idle_timeout,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Builds and initializes a service that is not tracked yet.
    pub async fn start(&self) -> AppResult<SessionService> {
        let service = (self.factory)();
        service.init().await.map_err(|error| {
            AppError::Internal(format!("failed to start client session: {error}"))
        })?;
        Ok(service)
    }

    /// Tracks a service and returns its new key.
    pub async fn track(&self, service: SessionService) -> Uuid {
        let key = Uuid::new_v4();
        self.clients.write().await.insert(
            key,
            ClientSession {
                service,
                last_seen: Instant::now(),
            },
        );
        debug!(%key, "client session tracked");
        key
    }

    /// Returns the service tracked under `key` and marks it as used.
    pub async fn get(&self, key: Uuid) -> Option<SessionService> {
        let mut clients = self.clients.write().await;
        let client = clients.get_mut(&key)?;
        client.last_seen = Instant::now();
        Some(client.service.clone())
    }

    /// Stops tracking `key` and hands the service back to the caller.
    pub async fn release(&self, key: Uuid) -> Option<SessionService> {
        self.clients
            .write()
            .await
            .remove(&key)
            .map(|client| client.service)
    }

    /// Disposes every service idle for at least the idle timeout.
    pub async fn prune_idle(&self) -> usize {
        let expired = {
            let mut clients = self.clients.write().await;
            let now = Instant::now();
            let keys = clients
                .iter()
                .filter(|(_, client)| now.duration_since(client.last_seen) >= self.idle_timeout)
                .map(|(key, _)| *key)
                .collect::<Vec<_>>();

            keys.iter()
                .filter_map(|key| clients.remove(key))
                .map(|client| client.service)
                .collect::<Vec<_>>()
        };

        for service in &expired {
            service.dispose().await;
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "idle client sessions disposed");
        }

        expired.len()
    }

    /// Disposes every tracked service.
    pub async fn dispose_all(&self) {
        let services = self
            .clients
            .write()
            .await
            .drain()
            .map(|(_, client)| client.service)
            .collect::<Vec<_>>();

        for service in services {
            service.dispose().await;
        }
    }
}
