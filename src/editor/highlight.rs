//! Per-player highlight cursor over the stored zones.
//!
//! Each zone owns a recipient set; a player highlights a zone by being a
//! member of its set, and is a member of at most one set at a time.

use slotmap::SecondaryMap;

use crate::host::{BeamStyle, Host, PlayerIndex, Recipients};
use crate::zone::{ZoneId, ZoneStorage};

#[derive(Debug, Default)]
pub struct Highlights {
    recipients: SecondaryMap<ZoneId, Recipients>,
}

impl Highlights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh empty sets for every stored zone (storage was reloaded)
    pub fn reset(&mut self, storage: &ZoneStorage) {
        self.recipients.clear();
        for id in storage.ids() {
            self.append_zone(id);
        }
    }

    pub fn append_zone(&mut self, id: ZoneId) {
        self.recipients.insert(id, Recipients::new());
    }

    /// Drop a zone's set, returning the players that had it highlighted
    pub fn pop_zone(&mut self, id: ZoneId) -> Recipients {
        self.recipients.remove(id).unwrap_or_default()
    }

    /// Zone the player currently has highlighted
    pub fn zone_of(&self, player: PlayerIndex) -> Option<ZoneId> {
        self.recipients
            .iter()
            .find(|(_, recipients)| recipients.contains(player))
            .map(|(id, _)| id)
    }

    fn clear_player(&mut self, player: PlayerIndex) -> Option<ZoneId> {
        let current = self.zone_of(player)?;
        if let Some(recipients) = self.recipients.get_mut(current) {
            recipients.remove(player);
        }
        Some(current)
    }

    fn set(&mut self, player: PlayerIndex, id: Option<ZoneId>) -> Option<ZoneId> {
        let id = id?;
        self.recipients.get_mut(id)?.add(player);
        Some(id)
    }

    /// Move to the next zone; from none jump to the first, past the last clear
    pub fn highlight_next(&mut self, player: PlayerIndex, storage: &ZoneStorage) -> Option<ZoneId> {
        let target = match self.clear_player(player) {
            None => storage.first(),
            Some(current) => storage
                .position(current)
                .and_then(|pos| storage.id_at(pos + 1)),
        };
        self.set(player, target)
    }

    /// Move to the previous zone; from none jump to the last, before the first clear
    pub fn highlight_prev(&mut self, player: PlayerIndex, storage: &ZoneStorage) -> Option<ZoneId> {
        let target = match self.clear_player(player) {
            None => storage.last(),
            Some(current) => storage
                .position(current)
                .and_then(|pos| pos.checked_sub(1))
                .and_then(|pos| storage.id_at(pos)),
        };
        self.set(player, target)
    }

    /// Draw each highlighted zone to the players highlighting it
    pub fn tick(&self, storage: &ZoneStorage, host: &mut dyn Host, life_time: f32) {
        let style = BeamStyle::highlight(life_time);
        for (id, zone) in storage.iter() {
            let Some(recipients) = self.recipients.get(id) else {
                continue;
            };
            if recipients.is_empty() {
                continue;
            }
            host.draw_box(recipients, zone.mins(), zone.maxs(), &style);
        }
    }

    pub fn client_disconnect(&mut self, player: PlayerIndex) {
        for (_, recipients) in self.recipients.iter_mut() {
            recipients.remove(player);
        }
    }
}
