//! Game server bridge over WebSocket

pub mod bridge;
pub mod handler;
pub mod protocol;

pub use bridge::{Bridge, BridgeHost, BridgeStatus};
pub use protocol::{HostEnvelope, HostEvent, PlayerSnapshot, PluginAction, PluginBatch};
