//! Per-player effect state accumulated from overlapping zones

use std::collections::HashMap;

use crate::host::PlayerIndex;
use crate::util::vector::Vector;
use crate::zone::{ZoneId, ZoneProperties};

use super::{PlayerButtons, UserCmd};

/// Stacked restrictions of every zone a player is currently inside
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerEffects {
    pub nojump_count: u32,
    pub noduck_count: u32,
    /// Active caps in entry order; duplicates are separate entries
    pub speed_caps: Vec<f32>,
}

impl PlayerEffects {
    /// Player entered a zone with these properties
    pub fn enter(&mut self, properties: &ZoneProperties) {
        if properties.nojump {
            self.nojump_count += 1;
        }
        if properties.noduck {
            self.noduck_count += 1;
        }
        if let Some(cap) = properties.speed_cap {
            self.speed_caps.push(cap);
        }
    }

    /// Player left a zone. Counters never go below zero; a cap that is not
    /// active (changed while the player was inside) is ignored.
    pub fn exit(&mut self, properties: &ZoneProperties) {
        if properties.nojump {
            self.nojump_count = self.nojump_count.saturating_sub(1);
        }
        if properties.noduck {
            self.noduck_count = self.noduck_count.saturating_sub(1);
        }
        if let Some(cap) = properties.speed_cap {
            if let Some(pos) = self.speed_caps.iter().position(|c| *c == cap) {
                self.speed_caps.remove(pos);
            }
        }
    }

    /// Tightest active cap
    pub fn effective_cap(&self) -> Option<f32> {
        self.speed_caps.iter().copied().reduce(f32::min)
    }

    pub fn is_idle(&self) -> bool {
        self.nojump_count == 0 && self.noduck_count == 0 && self.speed_caps.is_empty()
    }

    /// Strip restricted buttons from the command and return the base
    /// velocity that clamps the player's speed, if a cap is exceeded.
    pub fn apply(&self, cmd: &mut UserCmd, velocity: Vector) -> Option<Vector> {
        if self.nojump_count > 0 {
            cmd.buttons.remove(PlayerButtons::JUMP);
        }
        if self.noduck_count > 0 {
            cmd.buttons.remove(PlayerButtons::DUCK);
        }

        let cap = self.effective_cap()?;
        let speed = velocity.length();
        if 0.0 < cap && cap < speed {
            Some(velocity.with_length(cap) - velocity)
        } else {
            None
        }
    }
}

/// Effect state of every player, reset on level init and disconnect.
///
/// Also records which zones each player is inside, so a zone deleted while
/// occupied can release what it applied.
#[derive(Debug, Default)]
pub struct EffectTable {
    players: HashMap<PlayerIndex, PlayerEffects>,
    occupancy: HashMap<(PlayerIndex, ZoneId), u32>,
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player: PlayerIndex) -> Option<&PlayerEffects> {
        self.players.get(&player)
    }

    /// Times the player is recorded inside the zone
    pub fn occupancy(&self, player: PlayerIndex, zone: ZoneId) -> u32 {
        self.occupancy.get(&(player, zone)).copied().unwrap_or(0)
    }

    pub fn enter(&mut self, player: PlayerIndex, zone: ZoneId, properties: &ZoneProperties) {
        *self.occupancy.entry((player, zone)).or_insert(0) += 1;
        self.players.entry(player).or_default().enter(properties);
    }

    pub fn exit(&mut self, player: PlayerIndex, zone: ZoneId, properties: &ZoneProperties) {
        if let Some(count) = self.occupancy.get_mut(&(player, zone)) {
            *count -= 1;
            if *count == 0 {
                self.occupancy.remove(&(player, zone));
            }
        }
        self.release(player, properties);
    }

    /// Exit every occupant of a zone that is going away
    pub fn release_zone(&mut self, zone: ZoneId, properties: &ZoneProperties) {
        let occupants: Vec<_> = self
            .occupancy
            .iter()
            .filter(|((_, id), _)| *id == zone)
            .map(|((player, _), count)| (*player, *count))
            .collect();

        for (player, count) in occupants {
            self.occupancy.remove(&(player, zone));
            for _ in 0..count {
                self.release(player, properties);
            }
        }
    }

    fn release(&mut self, player: PlayerIndex, properties: &ZoneProperties) {
        if let Some(effects) = self.players.get_mut(&player) {
            effects.exit(properties);
            if effects.is_idle() {
                self.players.remove(&player);
            }
        }
    }

    pub fn apply(&self, player: PlayerIndex, cmd: &mut UserCmd, velocity: Vector) -> Option<Vector> {
        self.players.get(&player)?.apply(cmd, velocity)
    }

    pub fn remove_player(&mut self, player: PlayerIndex) {
        self.players.remove(&player);
        self.occupancy.retain(|(p, _), _| *p != player);
    }

    pub fn clear(&mut self) {
        self.players.clear();
        self.occupancy.clear();
    }
}
