//! Players who see every zone outlined

use crate::host::{BeamStyle, Host, PlayerIndex, Recipients};
use crate::zone::ZoneStorage;

#[derive(Debug, Default)]
pub struct Inspects {
    recipients: Recipients,
}

impl Inspects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip inspect mode; returns true if it is now on
    pub fn toggle(&mut self, player: PlayerIndex) -> bool {
        if self.recipients.remove(player) {
            false
        } else {
            self.recipients.add(player);
            true
        }
    }

    pub fn contains(&self, player: PlayerIndex) -> bool {
        self.recipients.contains(player)
    }

    pub fn tick(&self, storage: &ZoneStorage, host: &mut dyn Host, life_time: f32) {
        if self.recipients.is_empty() {
            return;
        }
        let style = BeamStyle::inspect(life_time);
        for (_, zone) in storage.iter() {
            host.draw_box(&self.recipients, zone.mins(), zone.maxs(), &style);
        }
    }

    pub fn client_disconnect(&mut self, player: PlayerIndex) {
        self.recipients.remove(player);
    }
}
