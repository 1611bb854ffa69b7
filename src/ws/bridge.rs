//! Host implementation backed by the bridge connection.
//!
//! Queries are answered from player mirrors the game server keeps fresh with
//! `player_state` frames. Mutations are queued as [`PluginAction`]s and
//! flushed as one batch per inbound frame or repeat tick.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::editor::Popup;
use crate::game::{PlayerButtons, TouchToken, UserCmd};
use crate::host::{
    BeamStyle, EntityIndex, Host, Message, Permission, PlayerIndex, Recipients, TriggerVolume,
    VolumeHandle, ZONE_ENTITY_CLASSNAME,
};
use crate::plugin::{LimitZones, PluginSettings};
use crate::util::vector::Vector;

use super::protocol::{HostEnvelope, HostEvent, PlayerSnapshot, PluginAction, PluginBatch};

#[derive(Debug, Default)]
pub struct BridgeHost {
    players: HashMap<PlayerIndex, PlayerSnapshot>,
    outbox: Vec<PluginAction>,
    next_volume: u64,
}

impl BridgeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_player(&mut self, snapshot: PlayerSnapshot) {
        self.players.insert(snapshot.player, snapshot);
    }

    pub fn remove_player(&mut self, player: PlayerIndex) -> bool {
        self.players.remove(&player).is_some()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    fn push(&mut self, action: PluginAction) {
        self.outbox.push(action);
    }

    pub fn drain(&mut self) -> Vec<PluginAction> {
        std::mem::take(&mut self.outbox)
    }
}

impl Host for BridgeHost {
    fn player_from_entity(&self, entity: EntityIndex) -> Option<PlayerIndex> {
        self.players
            .values()
            .find(|p| p.entity == entity)
            .map(|p| p.player)
    }

    fn player_origin(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.origin)
    }

    fn player_angles(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.angles)
    }

    fn player_view_coordinates(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).and_then(|p| p.view_coordinates)
    }

    fn player_velocity(&self, player: PlayerIndex) -> Option<Vector> {
        self.players.get(&player).map(|p| p.velocity)
    }

    fn has_permission(&self, player: PlayerIndex, permission: Permission) -> bool {
        self.players
            .get(&player)
            .is_some_and(|p| p.permissions.contains(&permission))
    }

    fn teleport(&mut self, player: PlayerIndex, origin: Option<Vector>, angles: Option<Vector>) {
        let Some(mirror) = self.players.get_mut(&player) else {
            return;
        };
        if let Some(origin) = origin {
            mirror.origin = origin;
        }
        if let Some(angles) = angles {
            mirror.angles = angles;
        }
        self.push(PluginAction::Teleport { player, origin, angles });
    }

    fn set_base_velocity(&mut self, player: PlayerIndex, velocity: Vector) {
        if self.players.contains_key(&player) {
            self.push(PluginAction::SetBaseVelocity { player, velocity });
        }
    }

    fn spawn_trigger(&mut self, trigger: &TriggerVolume) -> Option<VolumeHandle> {
        self.next_volume += 1;
        let volume = VolumeHandle(self.next_volume);
        self.push(PluginAction::SpawnTrigger {
            volume,
            classname: ZONE_ENTITY_CLASSNAME,
            trigger: *trigger,
        });
        Some(volume)
    }

    fn remove_volume(&mut self, volume: VolumeHandle) {
        self.push(PluginAction::RemoveVolume { volume });
    }

    fn draw_box(&mut self, recipients: &Recipients, mins: Vector, maxs: Vector, style: &BeamStyle) {
        let recipients: Vec<_> = recipients
            .iter()
            .filter(|player| self.players.contains_key(player))
            .collect();
        if recipients.is_empty() {
            return;
        }
        self.push(PluginAction::DrawBox {
            recipients,
            mins,
            maxs,
            style: style.clone(),
        });
    }

    fn send_popup(&mut self, player: PlayerIndex, popup: &Popup) {
        self.push(PluginAction::SendPopup {
            player,
            popup: popup.clone(),
        });
    }

    fn close_popup(&mut self, player: PlayerIndex) {
        self.push(PluginAction::ClosePopup { player });
    }

    fn send_message(&mut self, player: PlayerIndex, message: Message) {
        self.push(PluginAction::SendMessage { player, message });
    }
}

/// Snapshot reported by the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub map: String,
    pub zones: usize,
    pub volumes: usize,
    pub players: usize,
}

/// The zone runtime wired to a bridge host
pub struct Bridge {
    plugin: LimitZones,
    host: BridgeHost,
    /// Host touch frame -> token handed out by the pre hook
    touches: HashMap<u64, TouchToken>,
}

impl Bridge {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            plugin: LimitZones::new(settings),
            host: BridgeHost::new(),
            touches: HashMap::new(),
        }
    }

    pub fn plugin(&self) -> &LimitZones {
        &self.plugin
    }

    pub fn status(&self) -> BridgeStatus {
        BridgeStatus {
            map: self.plugin.map_name().to_string(),
            zones: self.plugin.storage().len(),
            volumes: self.plugin.binding().len(),
            players: self.host.player_count(),
        }
    }

    /// Apply one inbound frame and collect the actions it produced
    pub fn handle(&mut self, envelope: HostEnvelope) -> PluginBatch {
        let HostEnvelope { seq, event } = envelope;
        self.dispatch(event);
        PluginBatch {
            ack: Some(seq),
            actions: self.host.drain(),
        }
    }

    /// Run the repeat tick
    pub fn tick(&mut self) -> PluginBatch {
        self.plugin.on_tick_repeat(&mut self.host);
        PluginBatch {
            ack: None,
            actions: self.host.drain(),
        }
    }

    fn dispatch(&mut self, event: HostEvent) {
        let host = &mut self.host;
        match event {
            HostEvent::PluginLoad { map } => self.plugin.on_load(&map, host),
            HostEvent::PluginUnload => self.plugin.on_unload(host),
            HostEvent::LevelInit { map } => {
                self.touches.clear();
                self.plugin.on_level_init(&map);
            }
            HostEvent::RoundStart => self.plugin.on_round_start(host),
            HostEvent::EntityDeleted { volume } => self.plugin.on_entity_deleted(volume),
            HostEvent::PlayerState { player } => host.update_player(player),
            HostEvent::ClientDisconnect { player } => {
                if !host.remove_player(player) {
                    debug!(player = %player, "Disconnect for unknown player");
                }
                self.plugin.on_client_disconnect(player);
            }
            HostEvent::PreTouch {
                frame,
                kind,
                volume,
                other,
            } => {
                let token = self.plugin.on_pre_touch(kind, volume, other);
                if let Some(displaced) = self.touches.insert(frame, token) {
                    warn!(frame, "Touch frame reused before its post event");
                    self.plugin.discard_touch(displaced);
                }
            }
            HostEvent::PostTouch { frame } => match self.touches.remove(&frame) {
                Some(token) => self.plugin.on_post_touch(token, host),
                None => warn!(frame, "Post touch without matching pre touch"),
            },
            HostEvent::RunCommand {
                player,
                buttons,
                velocity,
            } => {
                if let (Some(velocity), Some(mirror)) = (velocity, host.players.get_mut(&player)) {
                    mirror.velocity = velocity;
                }
                let mut cmd = UserCmd {
                    buttons: PlayerButtons::from_bits_retain(buttons),
                };
                self.plugin.on_player_run_command(player, &mut cmd, host);
                if cmd.buttons.bits() != buttons {
                    host.push(PluginAction::SetButtons {
                        player,
                        buttons: cmd.buttons.bits(),
                    });
                }
            }
            HostEvent::Command { player, command } => self.plugin.handle_command(player, command, host),
            HostEvent::PopupSelect { player, choice } => self.plugin.on_popup_select(player, choice, host),
        }
    }

    /// Drop every mirror and pending touch once the game server goes away
    pub fn disconnected(&mut self) {
        let players: Vec<_> = self.host.players.keys().copied().collect();
        for player in players {
            self.host.remove_player(player);
            self.plugin.on_client_disconnect(player);
        }
        self.touches.clear();
        self.plugin.clear_touches();
        self.host.drain();
        info!("Bridge state reset after disconnect");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::HighlightChoice;
    use crate::game::TouchKind;
    use crate::plugin::EditorCommand;

    const P: PlayerIndex = PlayerIndex(1);

    fn bridge() -> (tempfile::TempDir, Bridge) {
        let dir = tempfile::tempdir().unwrap();
        let bridge = Bridge::new(PluginSettings {
            mapdata_dir: dir.path().to_path_buf(),
            ..PluginSettings::default()
        });
        (dir, bridge)
    }

    fn frame(seq: u64, event: HostEvent) -> HostEnvelope {
        HostEnvelope { seq, event }
    }

    fn snapshot(view: Option<Vector>) -> PlayerSnapshot {
        PlayerSnapshot {
            player: P,
            entity: EntityIndex(101),
            origin: Vector::ZERO,
            angles: Vector::ZERO,
            view_coordinates: view,
            velocity: Vector::ZERO,
            permissions: vec![Permission::Create, Permission::Inspect],
        }
    }

    /// Creates one zone through editor commands and returns its volume
    fn create_zone(bridge: &mut Bridge) -> VolumeHandle {
        bridge.handle(frame(1, HostEvent::PluginLoad { map: "kz_test".into() }));
        bridge.handle(frame(2, HostEvent::PlayerState { player: snapshot(Some(Vector::ZERO)) }));
        bridge.handle(frame(
            3,
            HostEvent::Command {
                player: P,
                command: EditorCommand::Start { attach_to: None },
            },
        ));
        bridge.handle(frame(
            4,
            HostEvent::PlayerState {
                player: snapshot(Some(Vector::new(64.0, 64.0, 64.0))),
            },
        ));
        let batch = bridge.handle(frame(5, HostEvent::Command { player: P, command: EditorCommand::End }));
        match batch.actions.as_slice() {
            [PluginAction::SpawnTrigger { volume, classname, trigger }] => {
                assert_eq!(*classname, "trigger_multiple");
                assert_eq!(trigger.origin, Vector::new(32.0, 32.0, 32.0));
                *volume
            }
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn batches_ack_their_frame() {
        let (_dir, mut bridge) = bridge();
        let batch = bridge.handle(frame(42, HostEvent::PluginLoad { map: String::new() }));
        assert_eq!(batch.ack, Some(42));
        assert!(batch.actions.is_empty());
        assert_eq!(bridge.tick().ack, None);
    }

    #[test]
    fn touch_frames_pair_into_effects() {
        let (_dir, mut bridge) = bridge();
        let volume = create_zone(&mut bridge);

        bridge.handle(frame(6, HostEvent::Command { player: P, command: EditorCommand::Highlight }));
        bridge.handle(frame(
            7,
            HostEvent::PopupSelect {
                player: P,
                choice: HighlightChoice::Next.choice(),
            },
        ));
        bridge.handle(frame(
            8,
            HostEvent::PopupSelect {
                player: P,
                choice: HighlightChoice::ToggleNojump.choice(),
            },
        ));

        bridge.handle(frame(
            9,
            HostEvent::PreTouch {
                frame: 500,
                kind: TouchKind::Start,
                volume,
                other: EntityIndex(101),
            },
        ));
        bridge.handle(frame(10, HostEvent::PostTouch { frame: 500 }));

        let jump_attack = (PlayerButtons::JUMP | PlayerButtons::ATTACK).bits();
        let batch = bridge.handle(frame(
            11,
            HostEvent::RunCommand {
                player: P,
                buttons: jump_attack,
                velocity: None,
            },
        ));
        assert!(matches!(
            batch.actions.as_slice(),
            [PluginAction::SetButtons { buttons, .. }] if *buttons == PlayerButtons::ATTACK.bits()
        ));

        // unchanged buttons produce no action
        let batch = bridge.handle(frame(
            12,
            HostEvent::RunCommand {
                player: P,
                buttons: PlayerButtons::ATTACK.bits(),
                velocity: None,
            },
        ));
        assert!(batch.actions.is_empty());
    }

    #[test]
    fn reused_and_abandoned_touch_frames_do_not_pile_up() {
        let (_dir, mut bridge) = bridge();
        let volume = create_zone(&mut bridge);
        let pre = |frame| HostEvent::PreTouch {
            frame,
            kind: TouchKind::Start,
            volume,
            other: EntityIndex(101),
        };

        for seq in 0..3 {
            bridge.handle(frame(10 + seq, pre(1)));
        }
        assert_eq!(bridge.plugin().touches_in_flight(), 1);

        bridge.handle(frame(20, HostEvent::PostTouch { frame: 1 }));
        assert_eq!(bridge.plugin().touches_in_flight(), 0);

        bridge.handle(frame(21, pre(2)));
        bridge.disconnected();
        assert_eq!(bridge.plugin().touches_in_flight(), 0);
    }

    #[test]
    fn unmatched_post_touch_is_ignored() {
        let (_dir, mut bridge) = bridge();
        let batch = bridge.handle(frame(1, HostEvent::PostTouch { frame: 9 }));
        assert!(batch.actions.is_empty());
    }

    #[test]
    fn permissions_come_from_the_mirror() {
        let (_dir, mut bridge) = bridge();
        let mut player = snapshot(Some(Vector::ZERO));
        player.permissions = vec![Permission::Inspect];
        bridge.handle(frame(1, HostEvent::PlayerState { player }));

        let batch = bridge.handle(frame(
            2,
            HostEvent::Command {
                player: P,
                command: EditorCommand::Start { attach_to: None },
            },
        ));
        assert!(batch.actions.is_empty());
        assert!(!bridge.plugin().is_editing(P));

        let batch = bridge.handle(frame(3, HostEvent::Command { player: P, command: EditorCommand::Inspect }));
        assert!(matches!(
            batch.actions.as_slice(),
            [PluginAction::SendMessage { message: Message::InspectStart, .. }]
        ));
    }

    #[test]
    fn tick_draws_only_for_connected_players() {
        let (_dir, mut bridge) = bridge();
        create_zone(&mut bridge);
        bridge.handle(frame(6, HostEvent::Command { player: P, command: EditorCommand::Inspect }));

        let batch = bridge.tick();
        assert!(matches!(batch.actions.as_slice(), [PluginAction::DrawBox { recipients, .. }] if recipients == &vec![P]));

        bridge.handle(frame(7, HostEvent::ClientDisconnect { player: P }));
        assert!(bridge.tick().actions.is_empty());
    }

    #[test]
    fn status_reports_zone_counts() {
        let (_dir, mut bridge) = bridge();
        create_zone(&mut bridge);
        let status = bridge.status();
        assert_eq!(status.map, "kz_test");
        assert_eq!(status.zones, 1);
        assert_eq!(status.volumes, 1);
        assert_eq!(status.players, 1);

        bridge.handle(frame(9, HostEvent::RoundStart));
        assert_eq!(bridge.status().volumes, 1);

        bridge.disconnected();
        assert_eq!(bridge.status().players, 0);
    }
}
