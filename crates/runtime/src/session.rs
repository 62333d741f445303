//! High-level session orchestrator.
//!
//! One [`Session`] per room visit: it owns the background worker, wires up
//! command/event channels, and exposes a builder so the composing component
//! constructs an explicit instance — there is no global engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use combat_core::{ActionCatalog, EngineConfig, GateExits, RollOracle, RoomEngine};

use crate::errors::{Result, SessionError};
use crate::events::{SessionEvent, StateBroadcaster};
use crate::gateway::RoomGateway;
use crate::handle::SessionHandle;
use crate::rand_roll::EntropyRoller;
use crate::worker::SessionWorker;

/// Session configuration shared across the orchestrator and worker.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub engine: EngineConfig,
    /// Gates of the starting room.
    pub initial_exits: GateExits,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Degraded mode: populate each entered room from the deterministic
    /// fallback generator instead of waiting on the tactical-data feed.
    pub use_fallback_roster: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            initial_exits: GateExits::ALL,
            command_buffer_size: 32,
            event_buffer_size: 100,
            use_fallback_roster: false,
        }
    }
}

/// A running room session.
///
/// [`SessionHandle`] provides a cloneable façade for clients; dropping the
/// `Session` without [`shutdown`](Session::shutdown) leaves the worker
/// running until every handle is gone.
pub struct Session {
    handle: SessionHandle,
    worker_handle: JoinHandle<()>,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Cloneable handle, shareable across clients and tasks.
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn subscribe_state(&self) -> tokio::sync::watch::Receiver<combat_core::CombatState> {
        self.handle.subscribe_state()
    }

    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<SessionEvent> {
        self.handle.subscribe_events()
    }

    /// Stop the worker and wait for it to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The worker may already be gone; joining is what matters.
        let _ = self.handle.send_shutdown().await;
        self.worker_handle.await.map_err(SessionError::WorkerJoin)
    }
}

/// Builder wiring the engine, gateway, and channels into a session.
pub struct SessionBuilder {
    config: SessionConfig,
    catalog: ActionCatalog,
    gateway: Option<Arc<dyn RoomGateway>>,
    roller: Option<Box<dyn RollOracle>>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            catalog: ActionCatalog::standard(),
            gateway: None,
            roller: None,
        }
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The external room-movement collaborator. Required.
    pub fn gateway(mut self, gateway: Arc<dyn RoomGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Roll source for combat resolution. Defaults to [`EntropyRoller`].
    pub fn roller(mut self, roller: Box<dyn RollOracle>) -> Self {
        self.roller = Some(roller);
        self
    }

    pub fn build(self) -> Result<Session> {
        let gateway = self.gateway.ok_or(SessionError::MissingGateway)?;
        let roller = self
            .roller
            .unwrap_or_else(|| Box::new(EntropyRoller::new()));

        let engine = RoomEngine::new(
            self.config.engine.clone(),
            self.catalog,
            self.config.initial_exits,
            roller,
        );
        let broadcaster = StateBroadcaster::new(engine.snapshot(), self.config.event_buffer_size);
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size);

        let worker = SessionWorker::new(
            engine,
            gateway,
            broadcaster.clone(),
            command_rx,
            self.config.use_fallback_roster,
        );
        let worker_handle = tokio::spawn(worker.run());

        Ok(Session {
            handle: SessionHandle::new(command_tx, broadcaster),
            worker_handle,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
