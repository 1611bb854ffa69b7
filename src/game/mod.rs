//! Zone effects on players: touch dispatch and per-command restrictions

pub mod effects;
pub mod touch;

pub use effects::{EffectTable, PlayerEffects};
pub use touch::{TouchDispatcher, TouchKind, TouchToken};

bitflags::bitflags! {
    /// Input buttons of a player command (engine `IN_*` bits)
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PlayerButtons: u32 {
        const ATTACK = 1 << 0;
        const JUMP   = 1 << 1;
        const DUCK   = 1 << 2;
        const FORWARD = 1 << 3;
        const BACK   = 1 << 4;
        const USE    = 1 << 5;
    }
}

/// The part of a player's command the zones modify
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCmd {
    pub buttons: PlayerButtons,
}
