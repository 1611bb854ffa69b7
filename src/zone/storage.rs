//! Ordered zone storage for the current map, backed by per-map JSON files

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use slotmap::SlotMap;
use tracing::{debug, info};

use super::model::{Zone, ZoneFile};

slotmap::new_key_type! {
    /// Stable zone identity, independent of the zone's position in storage
    pub struct ZoneId;
}

/// Zone storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("zone file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed zone file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode zones for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Zones of the loaded map, in file order.
///
/// Mutations stay in memory until [`ZoneStorage::save`] is called.
pub struct ZoneStorage {
    mapdata_dir: PathBuf,
    zones: SlotMap<ZoneId, Zone>,
    order: Vec<ZoneId>,
}

impl ZoneStorage {
    pub fn new(mapdata_dir: impl Into<PathBuf>) -> Self {
        Self {
            mapdata_dir: mapdata_dir.into(),
            zones: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Path of the zone file for a map
    pub fn file_path(&self, map_name: &str) -> PathBuf {
        self.mapdata_dir.join(format!("{}.json", map_name))
    }

    pub fn mapdata_dir(&self) -> &Path {
        &self.mapdata_dir
    }

    /// Replace every zone with the contents of the map's zone file.
    ///
    /// A missing file (or no map) leaves storage empty. A malformed file
    /// also leaves it empty and is reported.
    pub fn load(&mut self, map_name: &str) -> Result<(), StorageError> {
        self.clear();

        if map_name.is_empty() {
            return Ok(());
        }

        let path = self.file_path(map_name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(map = %map_name, path = %path.display(), "No zone file, starting empty");
                return Ok(());
            }
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        let file: ZoneFile = serde_json::from_str(&contents)
            .map_err(|source| StorageError::Parse { path: path.clone(), source })?;

        for zone in file.zones {
            self.append(zone);
        }

        info!(map = %map_name, zones = self.len(), "Zones loaded");
        Ok(())
    }

    /// Write every zone, in order, to the map's zone file
    pub fn save(&self, map_name: &str) -> Result<(), StorageError> {
        let path = self.file_path(map_name);
        let io_err = |source| StorageError::Io { path: path.clone(), source };

        fs::create_dir_all(&self.mapdata_dir).map_err(io_err)?;

        let file = ZoneFile {
            zones: self.iter().map(|(_, zone)| zone.clone()).collect(),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        file.serialize(&mut ser)
            .map_err(|source| StorageError::Encode { path: path.clone(), source })?;

        fs::write(&path, buf).map_err(io_err)?;

        info!(map = %map_name, zones = self.len(), "Zones saved");
        Ok(())
    }

    pub fn append(&mut self, zone: Zone) -> ZoneId {
        let id = self.zones.insert(zone);
        self.order.push(id);
        id
    }

    pub fn pop(&mut self, id: ZoneId) -> Option<Zone> {
        let zone = self.zones.remove(id)?;
        self.order.retain(|other| *other != id);
        Some(zone)
    }

    pub fn clear(&mut self) {
        self.zones.clear();
        self.order.clear();
    }

    pub fn get(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.get(id)
    }

    pub fn get_mut(&mut self, id: ZoneId) -> Option<&mut Zone> {
        self.zones.get_mut(id)
    }

    pub fn id_at(&self, index: usize) -> Option<ZoneId> {
        self.order.get(index).copied()
    }

    pub fn position(&self, id: ZoneId) -> Option<usize> {
        self.order.iter().position(|other| *other == id)
    }

    pub fn first(&self) -> Option<ZoneId> {
        self.order.first().copied()
    }

    pub fn last(&self) -> Option<ZoneId> {
        self.order.last().copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Zones in navigation order
    pub fn iter(&self) -> impl Iterator<Item = (ZoneId, &Zone)> + '_ {
        self.order.iter().filter_map(|id| self.zones.get(*id).map(|zone| (*id, zone)))
    }

    pub fn ids(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.order.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::vector::Vector;

    fn zone(x: f32) -> Zone {
        Zone::new(Vector::new(x, 0.0, 0.0), Vector::new(x + 8.0, 8.0, 8.0))
    }

    #[test]
    fn save_then_load_preserves_order_and_properties() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ZoneStorage::new(dir.path().join("limit_zones"));

        let a = storage.append(zone(0.0));
        storage.append(zone(16.0));
        storage.append(zone(32.0));
        storage.get_mut(a).unwrap().properties.teleport.origin = Some(Vector::new(1.0, 2.0, 3.0));
        storage.save("de_dust2").unwrap();

        let mut loaded = ZoneStorage::new(dir.path().join("limit_zones"));
        loaded.load("de_dust2").unwrap();

        let before: Vec<Zone> = storage.iter().map(|(_, z)| z.clone()).collect();
        let after: Vec<Zone> = loaded.iter().map(|(_, z)| z.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn saved_file_is_indented_with_four_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ZoneStorage::new(dir.path());
        storage.append(zone(0.0));
        storage.save("map").unwrap();

        let text = fs::read_to_string(storage.file_path("map")).unwrap();
        assert!(text.starts_with("{\n    \"zones\": ["));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ZoneStorage::new(dir.path());
        storage.append(zone(0.0));

        storage.load("no_such_map").unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn load_replaces_instead_of_merging() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = ZoneStorage::new(dir.path());
        storage.append(zone(0.0));
        storage.append(zone(8.0));
        storage.save("map").unwrap();

        storage.load("map").unwrap();
        storage.load("map").unwrap();
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage_dir = dir.path().to_path_buf();
        fs::write(storage_dir.join("broken.json"), "{ \"zones\": [ { \"mins\": 3 } ] }").unwrap();

        let mut storage = ZoneStorage::new(storage_dir);
        let err = storage.load("broken").unwrap_err();
        assert!(matches!(err, StorageError::Parse { .. }));
        assert!(storage.is_empty());
    }

    #[test]
    fn pop_keeps_remaining_order() {
        let mut storage = ZoneStorage::new("unused");
        let a = storage.append(zone(0.0));
        let b = storage.append(zone(8.0));
        let c = storage.append(zone(16.0));

        assert!(storage.pop(b).is_some());
        assert!(storage.pop(b).is_none());
        assert_eq!(storage.ids().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(storage.position(c), Some(1));
        assert_eq!(storage.get(a).map(|z| z.mins().x), Some(0.0));
    }
}
