//! Editor command surface and popup selections

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::editor::popup::{DELETE_NO, DELETE_YES};
use crate::editor::{AttachTo, EditError, HighlightChoice, Popup, PopupKind};
use crate::host::{Host, Message, Permission, PlayerIndex};
use crate::util::vector::Vector;
use crate::zone::ZoneProperties;

use super::LimitZones;

/// Editor commands. Console names are the tags below; chat aliases carry a
/// leading `!`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum EditorCommand {
    #[serde(rename = "lz_start", alias = "!lz_start")]
    Start {
        #[serde(default)]
        attach_to: Option<String>,
    },
    #[serde(rename = "lz_end", alias = "!lz_end")]
    End,
    #[serde(rename = "lz_cancel", alias = "!lz_cancel")]
    Cancel,
    #[serde(rename = "lz_save_to_file", alias = "!lz_save_to_file")]
    SaveToFile,
    #[serde(rename = "lz_load_from_file", alias = "!lz_load_from_file")]
    LoadFromFile,
    #[serde(rename = "lz_inspect", alias = "!lz_inspect")]
    Inspect,
    #[serde(rename = "lz_highlight", alias = "!lz_highlight")]
    Highlight,
    #[serde(rename = "lz_set_teleport_origin", alias = "!lz_set_teleport_origin")]
    SetTeleportOrigin { x: f32, y: f32, z: f32 },
    #[serde(rename = "lz_copy_teleport_origin", alias = "!lz_copy_teleport_origin")]
    CopyTeleportOrigin,
    #[serde(rename = "lz_unset_teleport_origin", alias = "!lz_unset_teleport_origin")]
    UnsetTeleportOrigin,
    #[serde(rename = "lz_set_teleport_angles", alias = "!lz_set_teleport_angles")]
    SetTeleportAngles { x: f32, y: f32, z: f32 },
    #[serde(rename = "lz_copy_teleport_angles", alias = "!lz_copy_teleport_angles")]
    CopyTeleportAngles,
    #[serde(rename = "lz_unset_teleport_angles", alias = "!lz_unset_teleport_angles")]
    UnsetTeleportAngles,
    #[serde(rename = "lz_set_speed_cap", alias = "!lz_set_speed_cap")]
    SetSpeedCap { speed_cap: f32 },
    #[serde(rename = "lz_unset_speed_cap", alias = "!lz_unset_speed_cap")]
    UnsetSpeedCap,
    #[serde(rename = "lz_set_boost", alias = "!lz_set_boost")]
    SetBoost { x: f32, y: f32, z: f32 },
    #[serde(rename = "lz_unset_boost", alias = "!lz_unset_boost")]
    UnsetBoost,
}

impl EditorCommand {
    /// Capability the acting player needs
    pub fn permission(&self) -> Permission {
        match self {
            EditorCommand::Inspect => Permission::Inspect,
            _ => Permission::Create,
        }
    }
}

impl LimitZones {
    pub fn handle_command(&mut self, player: PlayerIndex, command: EditorCommand, host: &mut dyn Host) {
        if !host.has_permission(player, command.permission()) {
            warn!(player = %player, ?command, "Editor command denied");
            return;
        }

        debug!(player = %player, ?command, "Editor command");
        match command {
            EditorCommand::Start { attach_to } => self.start(player, attach_to.as_deref(), host),
            EditorCommand::End => self.end(player, host),
            EditorCommand::Cancel => {
                if self.edit.cancel_edit(player).is_err() {
                    host.send_message(player, Message::EndWrongOrder);
                }
            }
            EditorCommand::SaveToFile => self.save_to_file(player, host),
            EditorCommand::LoadFromFile => self.load_from_file(player, host),
            EditorCommand::Inspect => {
                let message = if self.inspects.toggle(player) {
                    Message::InspectStart
                } else {
                    Message::InspectStop
                };
                host.send_message(player, message);
            }
            EditorCommand::Highlight => {
                let zone = self.highlights.zone_of(player);
                self.send_highlight_popup(player, zone, host);
            }
            EditorCommand::SetTeleportOrigin { x, y, z } => {
                self.edit_highlighted(player, host, |p| p.teleport.origin = Some(Vector::new(x, y, z)));
            }
            EditorCommand::CopyTeleportOrigin => {
                let origin = host.player_origin(player);
                self.edit_highlighted(player, host, |p| {
                    if origin.is_some() {
                        p.teleport.origin = origin;
                    }
                });
            }
            EditorCommand::UnsetTeleportOrigin => {
                self.edit_highlighted(player, host, |p| p.teleport.origin = None);
            }
            EditorCommand::SetTeleportAngles { x, y, z } => {
                self.edit_highlighted(player, host, |p| p.teleport.angles = Some(Vector::new(x, y, z)));
            }
            EditorCommand::CopyTeleportAngles => {
                let angles = host.player_angles(player);
                self.edit_highlighted(player, host, |p| {
                    if angles.is_some() {
                        p.teleport.angles = angles;
                    }
                });
            }
            EditorCommand::UnsetTeleportAngles => {
                self.edit_highlighted(player, host, |p| p.teleport.angles = None);
            }
            EditorCommand::SetSpeedCap { speed_cap } => {
                self.edit_highlighted(player, host, |p| p.speed_cap = Some(speed_cap));
            }
            EditorCommand::UnsetSpeedCap => {
                self.edit_highlighted(player, host, |p| p.speed_cap = None);
            }
            EditorCommand::SetBoost { x, y, z } => {
                self.edit_highlighted(player, host, |p| p.boost = Some(Vector::new(x, y, z)));
            }
            EditorCommand::UnsetBoost => {
                self.edit_highlighted(player, host, |p| p.boost = None);
            }
        }
    }

    /// Route a popup selection to the popup the player has open
    pub fn on_popup_select(&mut self, player: PlayerIndex, choice: u8, host: &mut dyn Host) {
        let Some(kind) = self.popups.remove(&player) else {
            debug!(player = %player, choice, "Selection without an open popup");
            return;
        };

        match kind {
            PopupKind::Highlight => self.select_highlight(player, choice, host),
            PopupKind::DeleteConfirm => self.select_delete(player, choice, host),
        }
    }

    fn start(&mut self, player: PlayerIndex, attach_to: Option<&str>, host: &mut dyn Host) {
        let attach_to = match attach_to.unwrap_or("view").parse::<AttachTo>() {
            Ok(attach_to) => attach_to,
            Err(_) => {
                host.send_message(player, Message::InvalidAttachToArg);
                return;
            }
        };

        match self.edit.start_edit(player, attach_to, host) {
            Ok(()) => {}
            Err(EditError::IncorrectEditOrder(_)) => host.send_message(player, Message::StartWrongOrder),
            Err(_) => host.send_message(player, Message::InvalidCoordinates),
        }
    }

    fn end(&mut self, player: PlayerIndex, host: &mut dyn Host) {
        let zone = match self.edit.end_edit(player, host) {
            Ok(zone) => zone,
            Err(EditError::IncorrectEditOrder(_)) => {
                host.send_message(player, Message::EndWrongOrder);
                return;
            }
            Err(_) => {
                host.send_message(player, Message::InvalidCoordinates);
                return;
            }
        };

        let id = self.storage.append(zone);
        self.highlights.append_zone(id);
        if let Some(zone) = self.storage.get(id) {
            self.binding.bind(id, zone, host);
        }
        info!(player = %player, zone = ?id, zones = self.storage.len(), "Zone created");
    }

    fn save_to_file(&mut self, player: PlayerIndex, host: &mut dyn Host) {
        match self.storage.save(&self.map_name) {
            Ok(()) => host.send_message(player, Message::Saved),
            Err(e) => {
                error!(map = %self.map_name, error = %e, "Failed to save zones");
                host.send_message(player, Message::StorageFailed);
            }
        }
    }

    /// Reload the zone file and rebuild every volume from it
    fn load_from_file(&mut self, player: PlayerIndex, host: &mut dyn Host) {
        self.binding.destroy_all(host);
        self.effects.clear();

        let result = self.storage.load(&self.map_name);
        self.highlights.reset(&self.storage);
        self.binding.create_all(&self.storage, host);

        match result {
            Ok(()) => host.send_message(player, Message::Loaded),
            Err(e) => {
                error!(map = %self.map_name, error = %e, "Failed to load zones");
                host.send_message(player, Message::StorageFailed);
            }
        }
    }

    /// Mutate the acting player's highlighted zone and refresh their popup
    fn edit_highlighted(
        &mut self,
        player: PlayerIndex,
        host: &mut dyn Host,
        edit: impl FnOnce(&mut ZoneProperties),
    ) {
        let Some(id) = self.highlights.zone_of(player) else {
            host.send_message(player, Message::NoneHighlighted);
            return;
        };

        if let Some(zone) = self.storage.get_mut(id) {
            edit(&mut zone.properties);
        }
        self.send_highlight_popup(player, Some(id), host);
    }

    fn select_highlight(&mut self, player: PlayerIndex, choice: u8, host: &mut dyn Host) {
        let Some(choice) = HighlightChoice::from_choice(choice) else {
            warn!(player = %player, choice, "Unknown highlight popup choice");
            return;
        };

        match choice {
            HighlightChoice::Next => {
                let zone = self.highlights.highlight_next(player, &self.storage);
                self.send_highlight_popup(player, zone, host);
            }
            HighlightChoice::Prev => {
                let zone = self.highlights.highlight_prev(player, &self.storage);
                self.send_highlight_popup(player, zone, host);
            }
            HighlightChoice::Delete => {
                if self.highlights.zone_of(player).is_some() {
                    self.send_popup(player, Popup::delete_confirm(), host);
                } else {
                    host.send_message(player, Message::NoneHighlighted);
                }
            }
            HighlightChoice::ToggleNojump => {
                self.edit_highlighted(player, host, |p| p.nojump = !p.nojump);
            }
            HighlightChoice::ToggleNoduck => {
                self.edit_highlighted(player, host, |p| p.noduck = !p.noduck);
            }
        }
    }

    fn select_delete(&mut self, player: PlayerIndex, choice: u8, host: &mut dyn Host) {
        let Some(old) = self.highlights.zone_of(player) else {
            return;
        };

        let zone = match choice {
            DELETE_YES => {
                let previous = self.highlights.highlight_prev(player, &self.storage);
                let orphaned = self.highlights.pop_zone(old);
                // The engine's end touch for this volume will find no binding
                if let Some(zone) = self.storage.get(old) {
                    self.effects.release_zone(old, &zone.properties);
                }
                self.binding.unbind(old, host);
                self.storage.pop(old);
                info!(player = %player, zone = ?old, zones = self.storage.len(), "Zone deleted");

                for other in orphaned.iter() {
                    if self.popups.get(&other) == Some(&PopupKind::Highlight) {
                        self.send_highlight_popup(other, None, host);
                    }
                }
                previous
            }
            DELETE_NO => Some(old),
            _ => {
                warn!(player = %player, choice, "Unknown delete popup choice");
                Some(old)
            }
        };

        self.send_highlight_popup(player, zone, host);
    }
}
