//! Zones: model, per-map storage and live trigger binding

pub mod binding;
pub mod model;
pub mod storage;

pub use binding::TriggerBinding;
pub use model::{Teleport, Zone, ZoneFile, ZoneProperties};
pub use storage::{StorageError, ZoneId, ZoneStorage};
