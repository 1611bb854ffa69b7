//! Application state shared across routes

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::plugin::PluginSettings;
use crate::ws::{Bridge, HostEnvelope, PluginBatch};

/// The zone runtime plus the outbound queue of the attached game server.
///
/// Batches are pushed while the lock is held, so the game server receives
/// them in the order the runtime produced them. The queue is unbounded:
/// a batch is never dropped while its connection is alive.
pub struct BridgeLink {
    pub bridge: Bridge,
    session: Option<(Uuid, mpsc::UnboundedSender<PluginBatch>)>,
}

impl BridgeLink {
    pub fn new(bridge: Bridge) -> Self {
        Self {
            bridge,
            session: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.session.is_some()
    }

    /// Attach a game server connection; only one may be attached at a time
    pub fn attach(&mut self, session_id: Uuid) -> Option<mpsc::UnboundedReceiver<PluginBatch>> {
        if self.is_attached() {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.session = Some((session_id, tx));
        info!(session_id = %session_id, "Game server attached");
        Some(rx)
    }

    /// Detach the session and reset runtime state tied to the connection
    pub fn detach(&mut self, session_id: Uuid) {
        match &self.session {
            Some((current, _)) if *current == session_id => {
                self.session = None;
                self.bridge.disconnected();
            }
            _ => debug!(session_id = %session_id, "Detach for a session that is not attached"),
        }
    }

    /// Apply one inbound frame and queue its reply
    pub fn handle(&mut self, envelope: HostEnvelope) {
        let batch = self.bridge.handle(envelope);
        self.deliver(batch);
    }

    /// Run the repeat tick and queue whatever it drew
    pub fn tick(&mut self) {
        let batch = self.bridge.tick();
        if !batch.actions.is_empty() {
            self.deliver(batch);
        }
    }

    fn deliver(&mut self, batch: PluginBatch) {
        let Some((session_id, tx)) = &self.session else {
            debug!(actions = batch.actions.len(), "No game server attached, batch dropped");
            return;
        };
        if tx.send(batch).is_err() {
            warn!(session_id = %session_id, "Writer for game server is gone");
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub link: Arc<Mutex<BridgeLink>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        let bridge = Bridge::new(PluginSettings::from_config(&config));
        let link = Arc::new(Mutex::new(BridgeLink::new(bridge)));

        Self { config, link }
    }
}
