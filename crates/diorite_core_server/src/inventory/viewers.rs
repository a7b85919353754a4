use std::sync::{Arc, Weak};

use diorite_mc_protocol::play::clientbound::Packet;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::player::Player;

/// Players currently looking at an inventory, keyed by entity id.
#[derive(Debug, Default)]
pub struct Viewers {
    players: RwLock<FxHashMap<i32, Weak<Player>>>,
    /// Never removed: the player whose own inventory this is.
    owner: Option<i32>,
}

impl Viewers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn owned_by(owner_id: i32, owner: Weak<Player>) -> Self {
        let mut players = FxHashMap::default();
        players.insert(owner_id, owner);
        Self {
            players: RwLock::new(players),
            owner: Some(owner_id),
        }
    }

    pub fn add(&self, player: &Arc<Player>) -> bool {
        self.players.write().insert(player.id(), Arc::downgrade(player)).is_none()
    }

    /// The owner of a player inventory stays a viewer for as long as the
    /// inventory exists.
    pub fn remove(&self, player_id: i32) -> bool {
        if self.owner == Some(player_id) {
            return false;
        }
        self.players.write().remove(&player_id).is_some()
    }

    pub fn contains(&self, player_id: i32) -> bool {
        self.players.read().contains_key(&player_id)
    }

    pub fn len(&self) -> usize {
        self.players.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.read().is_empty()
    }

    pub fn ids(&self) -> Vec<i32> {
        self.players.read().keys().copied().collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<Player>> {
        self.players.read().values().filter_map(Weak::upgrade).collect()
    }

    pub fn has_receiving_viewer(&self) -> bool {
        self.snapshot().iter().any(|player| player.can_receive_packets())
    }

    /// Sends the batch as one write to every viewer that can receive it.
    /// Returns the number of viewers reached.
    pub fn send_packets(&self, packets: &[Packet]) -> usize {
        if packets.is_empty() {
            return 0;
        }

        let mut reached = 0;
        for player in self.snapshot() {
            if player.can_receive_packets() {
                player.send_packets(packets.to_vec());
                reached += 1;
            }
        }
        reached
    }
}
