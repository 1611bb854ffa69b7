//! Recording host used by unit tests

use std::collections::{HashMap, HashSet};

use crate::editor::popup::Popup;
use crate::util::vector::Vector;

use super::{
    BeamStyle, EntityIndex, Host, Message, Permission, PlayerIndex, Recipients, TriggerVolume,
    VolumeHandle,
};

#[derive(Debug, Clone, Default)]
pub struct FakePlayer {
    pub entity: Option<EntityIndex>,
    pub origin: Vector,
    pub angles: Vector,
    pub view: Option<Vector>,
    pub velocity: Vector,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Teleport(PlayerIndex, Option<Vector>, Option<Vector>),
    BaseVelocity(PlayerIndex, Vector),
    Spawn(VolumeHandle, TriggerVolume),
    Remove(VolumeHandle),
    Draw(Vec<PlayerIndex>, Vector, Vector, f32),
    Popup(PlayerIndex, Popup),
    ClosePopup(PlayerIndex),
    Message(PlayerIndex, Message),
}

#[derive(Debug, Default)]
pub struct FakeHost {
    pub players: HashMap<PlayerIndex, FakePlayer>,
    pub denied: HashSet<PlayerIndex>,
    pub calls: Vec<Call>,
    pub live_volumes: HashSet<VolumeHandle>,
    next_volume: u64,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a player whose entity index equals its slot + 100
    pub fn connect(&mut self, player: PlayerIndex) -> &mut FakePlayer {
        self.players.entry(player).or_insert_with(|| FakePlayer {
            entity: Some(EntityIndex(player.0 + 100)),
            ..FakePlayer::default()
        })
    }

    pub fn player(&mut self, player: PlayerIndex) -> &mut FakePlayer {
        self.connect(player)
    }

    pub fn entity_of(&self, player: PlayerIndex) -> EntityIndex {
        self.players
            .get(&player)
            .and_then(|p| p.entity)
            .unwrap_or(EntityIndex(u32::MAX))
    }

    pub fn take_calls(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }

    pub fn messages(&self, player: PlayerIndex) -> Vec<Message> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Message(p, m) if *p == player => Some(*m),
                _ => None,
            })
            .collect()
    }

    pub fn last_popup(&self, player: PlayerIndex) -> Option<&Popup> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Popup(p, popup) if *p == player => Some(popup),
            _ => None,
        })
    }

    pub fn spawned(&self) -> Vec<VolumeHandle> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Spawn(handle, _) => Some(*handle),
                _ => None,
            })
            .collect()
    }
}

impl Host for FakeHost {
    fn player_from_entity(&self, entity: EntityIndex) -> Option<PlayerIndex> {
        self.players
            .iter()
            .find(|(_, p)| p.entity == Some(entity))
            .map(|(idx, _)| *idx)
    }

    fn player_origin(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.origin)
    }

    fn player_angles(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.angles)
    }

    fn player_view_coordinates(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).and_then(|p| p.view)
    }

    fn player_velocity(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.velocity)
    }

    fn has_permission(&self, player: PlayerIndex, _permission: Permission) -> bool {
        !self.denied.contains(&player)
    }

    fn teleport(&mut self, player: PlayerIndex, origin: Option<Vector>, angles: Option<Vector>) {
        if let Some(p) = self.players.get_mut(&player) {
            if let Some(origin) = origin {
                p.origin = origin;
            }
            if let Some(angles) = angles {
                p.angles = angles;
            }
        }
        self.calls.push(Call::Teleport(player, origin, angles));
    }

    fn set_base_velocity(&mut self, player: PlayerIndex, velocity: Vector) {
        self.calls.push(Call::BaseVelocity(player, velocity));
    }

    fn spawn_trigger(&mut self, volume: &TriggerVolume) -> Option<VolumeHandle> {
        self.next_volume += 1;
        let handle = VolumeHandle(self.next_volume);
        self.live_volumes.insert(handle);
        self.calls.push(Call::Spawn(handle, *volume));
        Some(handle)
    }

    fn remove_volume(&mut self, volume: VolumeHandle) {
        self.live_volumes.remove(&volume);
        self.calls.push(Call::Remove(volume));
    }

    fn draw_box(&mut self, recipients: &Recipients, mins: Vector, maxs: Vector, style: &BeamStyle) {
        self.calls.push(Call::Draw(
            recipients.iter().collect(),
            mins,
            maxs,
            style.width,
        ));
    }

    fn send_popup(&mut self, player: PlayerIndex, popup: &Popup) {
        self.calls.push(Call::Popup(player, popup.clone()));
    }

    fn close_popup(&mut self, player: PlayerIndex) {
        self.calls.push(Call::ClosePopup(player));
    }

    fn send_message(&mut self, player: PlayerIndex, message: Message) {
        self.calls.push(Call::Message(player, message));
    }
}
