//! Association between zones and the live trigger volumes of the current round

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::host::{Host, VolumeHandle};

use super::model::Zone;
use super::storage::{ZoneId, ZoneStorage};

/// Live volume index. Rebuilt from storage every round; a transient view,
/// never persisted.
#[derive(Debug, Default)]
pub struct TriggerBinding {
    by_volume: HashMap<VolumeHandle, ZoneId>,
    by_zone: HashMap<ZoneId, VolumeHandle>,
}

impl TriggerBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn one volume per stored zone
    pub fn create_all(&mut self, storage: &ZoneStorage, host: &mut dyn Host) {
        for (id, zone) in storage.iter() {
            self.bind(id, zone, host);
        }
        info!(volumes = self.len(), "Zone volumes created");
    }

    /// Remove every tracked volume from the engine
    pub fn destroy_all(&mut self, host: &mut dyn Host) {
        for (volume, _) in self.by_volume.drain() {
            host.remove_volume(volume);
        }
        self.by_zone.clear();
    }

    /// Drop every entry without touching the engine (its volumes are already gone)
    pub fn forget_all(&mut self) {
        self.by_volume.clear();
        self.by_zone.clear();
    }

    /// Spawn and track a volume for a single zone
    pub fn bind(&mut self, id: ZoneId, zone: &Zone, host: &mut dyn Host) -> Option<VolumeHandle> {
        if let Some(existing) = self.by_zone.get(&id) {
            warn!(zone = ?id, volume = %existing, "Zone already has a volume");
            return Some(*existing);
        }

        let Some(volume) = host.spawn_trigger(&zone.trigger_volume()) else {
            warn!(zone = ?id, "Host refused to spawn zone volume");
            return None;
        };

        self.by_volume.insert(volume, id);
        self.by_zone.insert(id, volume);
        debug!(zone = ?id, volume = %volume, "Zone volume bound");
        Some(volume)
    }

    /// Remove a zone's volume, if it has one
    pub fn unbind(&mut self, id: ZoneId, host: &mut dyn Host) {
        if let Some(volume) = self.by_zone.remove(&id) {
            self.by_volume.remove(&volume);
            host.remove_volume(volume);
            debug!(zone = ?id, volume = %volume, "Zone volume unbound");
        }
    }

    /// Engine deleted an entity; drop it if it was one of ours
    pub fn on_entity_deleted(&mut self, volume: VolumeHandle) {
        if let Some(id) = self.by_volume.remove(&volume) {
            self.by_zone.remove(&id);
            debug!(zone = ?id, volume = %volume, "Zone volume deleted by engine");
        }
    }

    pub fn zone_for(&self, volume: VolumeHandle) -> Option<ZoneId> {
        self.by_volume.get(&volume).copied()
    }

    pub fn volume_for(&self, id: ZoneId) -> Option<VolumeHandle> {
        self.by_zone.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_volume.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_volume.is_empty()
    }
}
