//! Two-point zone capture, one session per player

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::{BeamStyle, Host, PlayerIndex, Recipients};
use crate::util::vector::Vector;
use crate::zone::Zone;

/// Default editor grid step in world units
pub const EDITOR_STEP_UNITS: f32 = 8.0;

/// Which point of the player a corner is taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachTo {
    /// World point under the crosshair
    #[default]
    View,
    /// The player's own origin
    Origin,
}

impl AttachTo {
    fn reference_point(self, player: PlayerIndex, host: &dyn Host) -> Option<Vector> {
        match self {
            AttachTo::View => host.player_view_coordinates(player),
            AttachTo::Origin => host.player_origin(player),
        }
    }
}

impl FromStr for AttachTo {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(AttachTo::View),
            "origin" => Ok(AttachTo::Origin),
            _ => Err(EditError::InvalidAttachTo(s.to_string())),
        }
    }
}

/// Editor errors, reported back to the acting player
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("incorrect edit order: {0}")]
    IncorrectEditOrder(&'static str),

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(&'static str),

    #[error("invalid attach target {0:?}, expected \"view\" or \"origin\"")]
    InvalidAttachTo(String),
}

#[derive(Debug, Clone, Copy)]
struct EditSession {
    attach_to: AttachTo,
    start: Vector,
}

/// Open edit sessions keyed by player
#[derive(Debug)]
pub struct ZonesEdit {
    step: f32,
    sessions: HashMap<PlayerIndex, EditSession>,
}

impl ZonesEdit {
    pub fn new(step: f32) -> Self {
        Self {
            step,
            sessions: HashMap::new(),
        }
    }

    pub fn is_editing(&self, player: PlayerIndex) -> bool {
        self.sessions.contains_key(&player)
    }

    fn capture(&self, player: PlayerIndex, attach_to: AttachTo, host: &dyn Host) -> Option<Vector> {
        attach_to
            .reference_point(player, host)
            .map(|point| point.rounded_to_grid(self.step))
    }

    pub fn start_edit(
        &mut self,
        player: PlayerIndex,
        attach_to: AttachTo,
        host: &dyn Host,
    ) -> Result<(), EditError> {
        if self.is_editing(player) {
            return Err(EditError::IncorrectEditOrder(
                "end_edit or cancel_edit must be called for this player first",
            ));
        }

        let start = self
            .capture(player, attach_to, host)
            .ok_or(EditError::InvalidCoordinates("couldn't get start point"))?;

        debug!(player = %player, ?attach_to, ?start, "Zone edit started");
        self.sessions.insert(player, EditSession { attach_to, start });
        Ok(())
    }

    /// Finish the session and build the zone. The session stays open if the
    /// end point cannot be taken, so the player can retry.
    pub fn end_edit(&mut self, player: PlayerIndex, host: &dyn Host) -> Result<Zone, EditError> {
        let session = *self.sessions.get(&player).ok_or(EditError::IncorrectEditOrder(
            "start_edit must be called for this player first",
        ))?;

        let end = self
            .capture(player, session.attach_to, host)
            .ok_or(EditError::InvalidCoordinates("couldn't get end point"))?;

        self.sessions.remove(&player);
        debug!(player = %player, start = ?session.start, ?end, "Zone edit finished");
        Ok(Zone::from_corners(session.start, end))
    }

    pub fn cancel_edit(&mut self, player: PlayerIndex) -> Result<(), EditError> {
        if self.sessions.remove(&player).is_none() {
            return Err(EditError::IncorrectEditOrder(
                "start_edit must be called for this player first",
            ));
        }
        debug!(player = %player, "Zone edit cancelled");
        Ok(())
    }

    /// Draw every open session's box to its editor
    pub fn tick(&self, host: &mut dyn Host, life_time: f32) {
        let style = BeamStyle::editor(life_time);
        for (player, session) in &self.sessions {
            let Some(end) = self.capture(*player, session.attach_to, host) else {
                continue;
            };
            host.draw_box(&Recipients::single(*player), session.start, end, &style);
        }
    }

    pub fn client_disconnect(&mut self, player: PlayerIndex) {
        self.sessions.remove(&player);
    }
}
