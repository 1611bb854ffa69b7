//! Start/end touch dispatch for zone volumes.
//!
//! The host calls [`TouchDispatcher::pre_touch`] before the engine's touch
//! call runs and [`TouchDispatcher::post_touch`] once it has returned. The
//! token handed out by the pre hook is the only link between the two, so
//! interleaved touch calls never see each other's entities.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::host::{EntityIndex, Host, PlayerIndex, VolumeHandle};
use crate::zone::{TriggerBinding, ZoneId, ZoneProperties, ZoneStorage};

use super::effects::EffectTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchKind {
    /// Entity started overlapping a volume
    Start,
    /// Entity stopped overlapping a volume
    End,
}

/// Correlates a pre-touch hook with its post-touch hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TouchToken(pub u64);

#[derive(Debug, Clone, Copy)]
struct PendingTouch {
    kind: TouchKind,
    volume: VolumeHandle,
    other: EntityIndex,
}

/// Zone state a touch reads and mutates
pub struct TouchContext<'a> {
    pub storage: &'a ZoneStorage,
    pub binding: &'a TriggerBinding,
    pub effects: &'a mut EffectTable,
}

#[derive(Debug, Default)]
pub struct TouchDispatcher {
    next_token: u64,
    pending: HashMap<TouchToken, PendingTouch>,
}

impl TouchDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the touching pair before the engine call runs
    pub fn pre_touch(&mut self, kind: TouchKind, volume: VolumeHandle, other: EntityIndex) -> TouchToken {
        self.next_token += 1;
        let token = TouchToken(self.next_token);
        self.pending.insert(token, PendingTouch { kind, volume, other });
        token
    }

    /// Resolve the pair captured under `token` and apply or remove effects
    pub fn post_touch(&mut self, token: TouchToken, ctx: TouchContext<'_>, host: &mut dyn Host) {
        let Some(touch) = self.pending.remove(&token) else {
            warn!(token = token.0, "Post-touch without matching pre-touch");
            return;
        };

        let Some(zone_id) = ctx.binding.zone_for(touch.volume) else {
            trace!(volume = %touch.volume, "Touch on untracked volume");
            return;
        };
        let Some(zone) = ctx.storage.get(zone_id) else {
            trace!(zone = ?zone_id, "Touch on a zone no longer in storage");
            return;
        };
        let Some(player) = host.player_from_entity(touch.other) else {
            return;
        };

        match touch.kind {
            TouchKind::Start => {
                debug!(player = %player, zone = ?zone_id, "Player entered zone");
                on_enter(player, zone_id, &zone.properties, ctx.effects, host);
            }
            TouchKind::End => {
                debug!(player = %player, zone = ?zone_id, "Player left zone");
                ctx.effects.exit(player, zone_id, &zone.properties);
            }
        }
    }

    /// Forget a pending touch without dispatching it
    pub fn discard(&mut self, token: TouchToken) -> bool {
        self.pending.remove(&token).is_some()
    }

    /// Touch calls still waiting for their post hook
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Forget in-flight touches (level change)
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

fn on_enter(
    player: PlayerIndex,
    zone: ZoneId,
    properties: &ZoneProperties,
    effects: &mut EffectTable,
    host: &mut dyn Host,
) {
    let teleport = properties.teleport;
    if teleport.is_set() {
        host.teleport(player, teleport.origin, teleport.angles);
    }

    if let Some(boost) = properties.boost {
        host.set_base_velocity(player, boost);
    }

    effects.enter(player, zone, properties);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::testing::{Call, FakeHost};
    use crate::util::vector::Vector;
    use crate::zone::Zone;

    struct World {
        storage: ZoneStorage,
        binding: TriggerBinding,
        effects: EffectTable,
        touches: TouchDispatcher,
        host: FakeHost,
    }

    impl World {
        fn new(zones: Vec<Zone>) -> Self {
            let mut storage = ZoneStorage::new("unused");
            for zone in zones {
                storage.append(zone);
            }
            let mut host = FakeHost::new();
            let mut binding = TriggerBinding::new();
            binding.create_all(&storage, &mut host);
            host.take_calls();
            Self {
                storage,
                binding,
                effects: EffectTable::new(),
                touches: TouchDispatcher::new(),
                host,
            }
        }

        fn volume(&self, index: usize) -> VolumeHandle {
            let id = self.storage.id_at(index).unwrap();
            self.binding.volume_for(id).unwrap()
        }

        fn pre(&mut self, kind: TouchKind, index: usize, other: EntityIndex) -> TouchToken {
            let volume = self.volume(index);
            self.touches.pre_touch(kind, volume, other)
        }

        fn post(&mut self, token: TouchToken) {
            let ctx = TouchContext {
                storage: &self.storage,
                binding: &self.binding,
                effects: &mut self.effects,
            };
            self.touches.post_touch(token, ctx, &mut self.host);
        }

        fn touch(&mut self, kind: TouchKind, index: usize, other: EntityIndex) {
            let token = self.pre(kind, index, other);
            self.post(token);
        }
    }

    fn zone_with(f: impl FnOnce(&mut ZoneProperties)) -> Zone {
        let mut zone = Zone::new(Vector::ZERO, Vector::new(64.0, 64.0, 64.0));
        f(&mut zone.properties);
        zone
    }

    #[test]
    fn enter_applies_teleport_boost_and_restrictions() {
        let zone = zone_with(|p| {
            p.nojump = true;
            p.speed_cap = Some(200.0);
            p.teleport.angles = Some(Vector::new(0.0, 180.0, 0.0));
            p.boost = Some(Vector::new(0.0, 0.0, 400.0));
        });
        let mut world = World::new(vec![zone]);
        let player = PlayerIndex(1);
        world.host.connect(player);
        let entity = world.host.entity_of(player);

        world.touch(TouchKind::Start, 0, entity);

        assert_eq!(
            world.host.calls,
            vec![
                Call::Teleport(player, None, Some(Vector::new(0.0, 180.0, 0.0))),
                Call::BaseVelocity(player, Vector::new(0.0, 0.0, 400.0)),
            ]
        );
        let effects = world.effects.get(player).unwrap();
        assert_eq!(effects.nojump_count, 1);
        assert_eq!(effects.speed_caps, vec![200.0]);

        world.touch(TouchKind::End, 0, entity);
        assert!(world.effects.get(player).is_none());
    }

    #[test]
    fn interleaved_touches_keep_their_own_pairs() {
        let nojump = zone_with(|p| p.nojump = true);
        let noduck = zone_with(|p| p.noduck = true);
        let mut world = World::new(vec![nojump, noduck]);
        let (a, b) = (PlayerIndex(1), PlayerIndex(2));
        world.host.connect(a);
        world.host.connect(b);
        let (ea, eb) = (world.host.entity_of(a), world.host.entity_of(b));

        let first = world.pre(TouchKind::Start, 0, ea);
        let second = world.pre(TouchKind::Start, 1, eb);
        assert_ne!(first, second);
        assert_eq!(world.touches.in_flight(), 2);

        world.post(second);
        world.post(first);

        assert_eq!(world.effects.get(a).map(|e| (e.nojump_count, e.noduck_count)), Some((1, 0)));
        assert_eq!(world.effects.get(b).map(|e| (e.nojump_count, e.noduck_count)), Some((0, 1)));
        assert_eq!(world.touches.in_flight(), 0);
    }

    #[test]
    fn untracked_volumes_and_non_players_are_ignored() {
        let mut world = World::new(vec![zone_with(|p| p.nojump = true)]);
        let player = PlayerIndex(4);
        world.host.connect(player);

        let token = world.touches.pre_touch(TouchKind::Start, VolumeHandle(777), world.host.entity_of(player));
        world.post(token);
        world.touch(TouchKind::Start, 0, EntityIndex(5000));
        world.post(TouchToken(12345));

        assert!(world.host.calls.is_empty());
        assert!(world.effects.get(player).is_none());
    }

    #[test]
    fn discarded_touch_is_never_dispatched() {
        let mut world = World::new(vec![zone_with(|p| p.nojump = true)]);
        let player = PlayerIndex(1);
        world.host.connect(player);
        let entity = world.host.entity_of(player);

        let token = world.pre(TouchKind::Start, 0, entity);
        assert!(world.touches.discard(token));
        assert!(!world.touches.discard(token));
        assert_eq!(world.touches.in_flight(), 0);

        world.post(token);
        assert!(world.effects.get(player).is_none());
    }

    #[test]
    fn exit_after_cap_change_leaves_other_caps_alone() {
        let mut world = World::new(vec![zone_with(|p| p.speed_cap = Some(100.0))]);
        let player = PlayerIndex(2);
        world.host.connect(player);
        let entity = world.host.entity_of(player);

        world.touch(TouchKind::Start, 0, entity);
        let id = world.storage.id_at(0).unwrap();
        world.storage.get_mut(id).unwrap().properties.speed_cap = Some(50.0);
        world.touch(TouchKind::End, 0, entity);

        assert_eq!(world.effects.get(player).map(|e| e.speed_caps.clone()), Some(vec![100.0]));
    }
}
