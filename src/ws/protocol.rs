//! WebSocket protocol message definitions
//! These are the wire types between the game server and the zone runtime

use serde::{Deserialize, Serialize};

use crate::editor::Popup;
use crate::game::TouchKind;
use crate::host::{BeamStyle, EntityIndex, Message, Permission, PlayerIndex, TriggerVolume, VolumeHandle};
use crate::plugin::EditorCommand;
use crate::util::vector::Vector;

/// One frame from the game server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEnvelope {
    /// Echoed back as `ack` on the batch answering this frame
    pub seq: u64,
    pub event: HostEvent,
}

/// Events sent from the game server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// Plugin loaded into a running server
    PluginLoad {
        /// Current map, empty while no map is running
        #[serde(default)]
        map: String,
    },

    /// Plugin about to be unloaded
    PluginUnload,

    /// A new map started
    LevelInit { map: String },

    /// Round restarted; the engine dropped every trigger volume
    RoundStart,

    /// A trigger volume was deleted by the engine
    EntityDeleted { volume: VolumeHandle },

    /// Connect or refresh a player mirror
    PlayerState { player: PlayerSnapshot },

    ClientDisconnect { player: PlayerIndex },

    /// Touch about to be dispatched; `frame` pairs it with its post event
    PreTouch {
        frame: u64,
        kind: TouchKind,
        volume: VolumeHandle,
        other: EntityIndex,
    },

    PostTouch { frame: u64 },

    /// A player command before the engine applies it
    RunCommand {
        player: PlayerIndex,
        /// Raw engine button bits
        buttons: u32,
        /// Current velocity, if changed since the last snapshot
        #[serde(default)]
        velocity: Option<Vector>,
    },

    /// Editor command typed in console or chat
    Command {
        player: PlayerIndex,
        command: EditorCommand,
    },

    /// Option picked in the player's open popup
    PopupSelect { player: PlayerIndex, choice: u8 },
}

/// Mirrored state of a connected player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player: PlayerIndex,
    pub entity: EntityIndex,
    pub origin: Vector,
    pub angles: Vector,
    /// World point under the crosshair, absent when the aim ray hits nothing
    #[serde(default)]
    pub view_coordinates: Option<Vector>,
    #[serde(default)]
    pub velocity: Vector,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Actions for the game server, answering one frame or one repeat tick
#[derive(Debug, Clone, Serialize)]
pub struct PluginBatch {
    pub ack: Option<u64>,
    pub actions: Vec<PluginAction>,
}

/// Actions sent to the game server
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PluginAction {
    SpawnTrigger {
        volume: VolumeHandle,
        classname: &'static str,
        trigger: TriggerVolume,
    },

    RemoveVolume { volume: VolumeHandle },

    Teleport {
        player: PlayerIndex,
        origin: Option<Vector>,
        angles: Option<Vector>,
    },

    SetBaseVelocity { player: PlayerIndex, velocity: Vector },

    /// Replacement button bits for the command being run
    SetButtons { player: PlayerIndex, buttons: u32 },

    DrawBox {
        recipients: Vec<PlayerIndex>,
        mins: Vector,
        maxs: Vector,
        style: BeamStyle,
    },

    SendPopup { player: PlayerIndex, popup: Popup },

    ClosePopup { player: PlayerIndex },

    SendMessage { player: PlayerIndex, message: Message },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_host_frames() {
        let frame: HostEnvelope = serde_json::from_str(
            r#"{
                "seq": 7,
                "event": {
                    "type": "player_state",
                    "player": {
                        "player": 3,
                        "entity": 103,
                        "origin": {"x": 1.0, "y": 2.0, "z": 3.0},
                        "angles": {"x": 0.0, "y": 90.0, "z": 0.0},
                        "permissions": ["limit_zones_editor.create"]
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(frame.seq, 7);
        let HostEvent::PlayerState { player } = frame.event else {
            panic!("wrong event");
        };
        assert_eq!(player.player, PlayerIndex(3));
        assert_eq!(player.view_coordinates, None);
        assert_eq!(player.permissions, vec![Permission::Create]);
    }

    #[test]
    fn decodes_nested_editor_command() {
        let frame: HostEnvelope = serde_json::from_str(
            r#"{"seq": 1, "event": {"type": "command", "player": 1,
                "command": {"name": "!lz_set_boost", "x": 0.0, "y": 0.0, "z": 400.0}}}"#,
        )
        .unwrap();
        assert!(matches!(
            frame.event,
            HostEvent::Command {
                command: EditorCommand::SetBoost { z, .. },
                ..
            } if z == 400.0
        ));
    }

    #[test]
    fn encodes_actions_with_type_tag() {
        let batch = PluginBatch {
            ack: Some(4),
            actions: vec![
                PluginAction::SetButtons {
                    player: PlayerIndex(2),
                    buttons: 1,
                },
                PluginAction::SendMessage {
                    player: PlayerIndex(2),
                    message: Message::Saved,
                },
            ],
        };
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["ack"], 4);
        assert_eq!(json["actions"][0]["type"], "set_buttons");
        assert_eq!(json["actions"][1]["message"], "lz_save_to_file done");
    }
}
