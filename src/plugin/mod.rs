//! The zone runtime: owns every zone table and exposes the host lifecycle hooks

pub mod commands;

pub use commands::EditorCommand;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{error, info};

use crate::config::Config;
use crate::editor::{Highlights, Inspects, Popup, PopupKind, ZonesEdit, EDITOR_STEP_UNITS};
use crate::game::touch::TouchContext;
use crate::game::{EffectTable, TouchDispatcher, TouchKind, TouchToken, UserCmd};
use crate::host::{EntityIndex, Host, PlayerIndex, VolumeHandle};
use crate::util::time::{repeat_interval_secs, TICK_REPEAT_MS};
use crate::zone::{TriggerBinding, ZoneId, ZoneStorage};

/// Runtime settings derived from the process configuration
#[derive(Debug, Clone)]
pub struct PluginSettings {
    pub mapdata_dir: PathBuf,
    pub editor_step: f32,
    pub tick_interval: Duration,
}

impl PluginSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mapdata_dir: config.mapdata_path.clone(),
            editor_step: config.editor_step_units,
            tick_interval: config.tick_repeat_interval,
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            mapdata_dir: PathBuf::from("mapdata/limit_zones"),
            editor_step: EDITOR_STEP_UNITS,
            tick_interval: Duration::from_millis(TICK_REPEAT_MS),
        }
    }
}

/// Zone runtime and editor state for one game server
pub struct LimitZones {
    settings: PluginSettings,
    map_name: String,
    storage: ZoneStorage,
    binding: TriggerBinding,
    touches: TouchDispatcher,
    effects: EffectTable,
    edit: ZonesEdit,
    highlights: Highlights,
    inspects: Inspects,
    popups: HashMap<PlayerIndex, PopupKind>,
}

impl LimitZones {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            storage: ZoneStorage::new(settings.mapdata_dir.clone()),
            edit: ZonesEdit::new(settings.editor_step),
            settings,
            map_name: String::new(),
            binding: TriggerBinding::new(),
            touches: TouchDispatcher::new(),
            effects: EffectTable::new(),
            highlights: Highlights::new(),
            inspects: Inspects::new(),
            popups: HashMap::new(),
        }
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn storage(&self) -> &ZoneStorage {
        &self.storage
    }

    pub fn binding(&self) -> &TriggerBinding {
        &self.binding
    }

    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    pub fn highlighted(&self, player: PlayerIndex) -> Option<ZoneId> {
        self.highlights.zone_of(player)
    }

    pub fn is_editing(&self, player: PlayerIndex) -> bool {
        self.edit.is_editing(player)
    }

    pub fn open_popup(&self, player: PlayerIndex) -> Option<PopupKind> {
        self.popups.get(&player).copied()
    }

    /// Replace storage from the current map's zone file. A bad file leaves
    /// storage empty.
    fn reload_storage(&mut self) {
        if let Err(e) = self.storage.load(&self.map_name) {
            error!(map = %self.map_name, error = %e, "Failed to load zones");
        }
        self.highlights.reset(&self.storage);
    }

    /// Plugin loaded into a running server. Also sent again when the host
    /// reconnects mid-map, so any volumes from the previous load go first.
    pub fn on_load(&mut self, map_name: &str, host: &mut dyn Host) {
        self.binding.destroy_all(host);
        self.touches.clear();
        self.effects.clear();

        self.map_name = map_name.to_string();
        if self.map_name.is_empty() {
            return;
        }
        self.reload_storage();
        self.binding.create_all(&self.storage, host);
        info!(map = %self.map_name, zones = self.storage.len(), "Limit zones loaded");
    }

    /// Plugin about to be unloaded
    pub fn on_unload(&mut self, host: &mut dyn Host) {
        self.binding.destroy_all(host);
        for player in self.popups.drain().map(|(player, _)| player) {
            host.close_popup(player);
        }
        info!("Limit zones unloaded");
    }

    /// New map: the engine already dropped every volume
    pub fn on_level_init(&mut self, map_name: &str) {
        self.map_name = map_name.to_string();
        self.binding.forget_all();
        self.touches.clear();
        self.reload_storage();
        self.effects.clear();
        self.popups.clear();
        info!(map = %self.map_name, zones = self.storage.len(), "Level initialized");
    }

    /// Volumes do not survive a round restart; spawn them again
    pub fn on_round_start(&mut self, host: &mut dyn Host) {
        self.binding.forget_all();
        self.binding.create_all(&self.storage, host);
    }

    pub fn on_entity_deleted(&mut self, volume: VolumeHandle) {
        self.binding.on_entity_deleted(volume);
    }

    pub fn on_pre_touch(&mut self, kind: TouchKind, volume: VolumeHandle, other: EntityIndex) -> TouchToken {
        self.touches.pre_touch(kind, volume, other)
    }

    /// Drop a pre touch whose post event will never come
    pub fn discard_touch(&mut self, token: TouchToken) {
        self.touches.discard(token);
    }

    /// Forget every in-flight touch (host connection lost)
    pub fn clear_touches(&mut self) {
        self.touches.clear();
    }

    pub fn touches_in_flight(&self) -> usize {
        self.touches.in_flight()
    }

    pub fn on_post_touch(&mut self, token: TouchToken, host: &mut dyn Host) {
        let ctx = TouchContext {
            storage: &self.storage,
            binding: &self.binding,
            effects: &mut self.effects,
        };
        self.touches.post_touch(token, ctx, host);
    }

    /// Runs before the engine applies the player's command
    pub fn on_player_run_command(&mut self, player: PlayerIndex, cmd: &mut UserCmd, host: &mut dyn Host) {
        let velocity = host.player_velocity(player).unwrap_or_default();
        if let Some(base_velocity) = self.effects.apply(player, cmd, velocity) {
            host.set_base_velocity(player, base_velocity);
        }
    }

    pub fn on_client_disconnect(&mut self, player: PlayerIndex) {
        self.edit.client_disconnect(player);
        self.inspects.client_disconnect(player);
        self.highlights.client_disconnect(player);
        self.effects.remove_player(player);
        self.popups.remove(&player);
    }

    /// Redraw previews, inspect outlines and highlights
    pub fn on_tick_repeat(&mut self, host: &mut dyn Host) {
        let life_time = repeat_interval_secs(self.settings.tick_interval);
        self.edit.tick(host, life_time);
        self.inspects.tick(&self.storage, host, life_time);
        self.highlights.tick(&self.storage, host, life_time);
    }

    fn send_popup(&mut self, player: PlayerIndex, popup: Popup, host: &mut dyn Host) {
        if self.popups.contains_key(&player) {
            host.close_popup(player);
        }
        self.popups.insert(player, popup.kind);
        host.send_popup(player, &popup);
    }

    fn send_highlight_popup(&mut self, player: PlayerIndex, zone: Option<ZoneId>, host: &mut dyn Host) {
        let popup = Popup::highlight(zone.and_then(|id| self.storage.get(id)));
        self.send_popup(player, popup, host);
    }
}
