//! Engine-facing interface: everything the zone runtime needs from the game server

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::vector::Vector;

#[cfg(test)]
pub mod testing;

/// Player slot on the game server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerIndex(pub u32);

/// Any networked engine entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityIndex(pub u32);

/// Live trigger volume. Issued by the host, never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeHandle(pub u64);

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for VolumeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editor capabilities checked by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "limit_zones_editor.create")]
    Create,
    #[serde(rename = "limit_zones_editor.inspect")]
    Inspect,
}

/// Localisation keys for chat messages sent to a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Message {
    #[serde(rename = "error invalid_coordinates")]
    InvalidCoordinates,
    #[serde(rename = "lz_end wrong_order")]
    EndWrongOrder,
    #[serde(rename = "lz_start wrong_order")]
    StartWrongOrder,
    #[serde(rename = "lz_inspect start")]
    InspectStart,
    #[serde(rename = "lz_inspect stop")]
    InspectStop,
    #[serde(rename = "error none_highlighted")]
    NoneHighlighted,
    #[serde(rename = "error invalid_attach_to_arg")]
    InvalidAttachToArg,
    #[serde(rename = "lz_save_to_file done")]
    Saved,
    #[serde(rename = "lz_load_from_file done")]
    Loaded,
    #[serde(rename = "error storage")]
    StorageFailed,
}

/// Set of players a debug draw is sent to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipients(BTreeSet<PlayerIndex>);

impl Recipients {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(player: PlayerIndex) -> Self {
        let mut recipients = Self::new();
        recipients.add(player);
        recipients
    }

    pub fn add(&mut self, player: PlayerIndex) {
        self.0.insert(player);
    }

    /// Returns true if the player was a member
    pub fn remove(&mut self, player: PlayerIndex) -> bool {
        self.0.remove(&player)
    }

    pub fn contains(&self, player: PlayerIndex) -> bool {
        self.0.contains(&player)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = PlayerIndex> + '_ {
        self.0.iter().copied()
    }
}

/// RGBA color for debug beams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const GREEN: Color = Color(0, 255, 0, 255);
    pub const BLUE: Color = Color(0, 0, 255, 255);
    pub const ORANGE: Color = Color(255, 165, 0, 255);
}

/// Beam parameters for a debug box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeamStyle {
    pub color: Color,
    pub model: &'static str,
    pub width: f32,
    /// Seconds the beam stays visible
    pub life_time: f32,
}

pub const LASER_BEAM_MODEL: &str = "sprites/laserbeam.vmt";

impl BeamStyle {
    /// Live preview of a box being edited
    pub fn editor(life_time: f32) -> Self {
        Self {
            color: Color::GREEN,
            model: LASER_BEAM_MODEL,
            width: 2.0,
            life_time,
        }
    }

    /// Every zone, for players with inspect enabled
    pub fn inspect(life_time: f32) -> Self {
        Self {
            color: Color::BLUE,
            model: LASER_BEAM_MODEL,
            width: 2.0,
            life_time,
        }
    }

    /// The zone a player has highlighted
    pub fn highlight(life_time: f32) -> Self {
        Self {
            color: Color::ORANGE,
            model: LASER_BEAM_MODEL,
            width: 4.0,
            life_time,
        }
    }
}

/// Trigger volume to spawn: origin plus bounds relative to it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriggerVolume {
    pub origin: Vector,
    pub mins: Vector,
    pub maxs: Vector,
}

/// Engine entity class used for zone volumes
pub const ZONE_ENTITY_CLASSNAME: &str = "trigger_multiple";

/// The game server as seen by the zone runtime.
///
/// Queries return `None` for players that are not (or no longer) connected.
/// Mutations on a disconnected player are ignored by the host.
pub trait Host {
    fn player_from_entity(&self, entity: EntityIndex) -> Option<PlayerIndex>;
    fn player_origin(&self, player: PlayerIndex) -> Option<Vector>;
    fn player_angles(&self, player: PlayerIndex) -> Option<Vector>;
    /// World point under the player's crosshair; `None` if the aim ray hits nothing
    fn player_view_coordinates(&self, player: PlayerIndex) -> Option<Vector>;
    fn player_velocity(&self, player: PlayerIndex) -> Option<Vector>;
    fn has_permission(&self, player: PlayerIndex, permission: Permission) -> bool;

    /// Missing halves leave that part of the player's state untouched
    fn teleport(&mut self, player: PlayerIndex, origin: Option<Vector>, angles: Option<Vector>);
    /// Overwrite the player's residual base velocity
    fn set_base_velocity(&mut self, player: PlayerIndex, velocity: Vector);

    fn spawn_trigger(&mut self, volume: &TriggerVolume) -> Option<VolumeHandle>;
    fn remove_volume(&mut self, volume: VolumeHandle);

    fn draw_box(&mut self, recipients: &Recipients, mins: Vector, maxs: Vector, style: &BeamStyle);
    /// Replaces whatever popup the player currently has open
    fn send_popup(&mut self, player: PlayerIndex, popup: &crate::editor::popup::Popup);
    fn close_popup(&mut self, player: PlayerIndex);
    fn send_message(&mut self, player: PlayerIndex, message: Message);
}
