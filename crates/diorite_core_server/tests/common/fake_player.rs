use std::{collections::VecDeque, sync::Arc};

use diorite_core_server::{player::Player, world::World};
use diorite_mc_protocol::play::clientbound::{Packet, PacketId};
use diorite_network::{ChannelConnection, PacketReceiver};
use glam::DVec3;

use crate::log;

use super::create_game_profile;

/// A connected player whose client is the test: packets sent to it are read
/// back in order.
pub struct FakePlayer {
    pub player: Arc<Player>,
    receiver: Option<PacketReceiver>,
    outgoing: VecDeque<Packet>,
}

impl FakePlayer {
    pub fn join(world: &Arc<World>, username: &str, position: DVec3) -> Self {
        let (connection, receiver) = ChannelConnection::new();
        let player = world.spawn_player(create_game_profile(username), Some(Arc::new(connection)), position);
        Self {
            player,
            receiver: Some(receiver),
            outgoing: VecDeque::new(),
        }
    }

    fn receive(&mut self) {
        if let Some(receiver) = &self.receiver {
            self.outgoing.extend(receiver.drain_packets());
        }
    }

    fn next_outgoing(&mut self) -> Packet {
        self.receive();
        match self.outgoing.pop_front() {
            Some(packet) => {
                log!("Found packet with id: {:?}", packet.get_packet_id());
                packet
            },
            None => panic!("expected a packet, but there was none"),
        }
    }

    pub fn assert_outgoing(&mut self, expected: impl Into<Packet>) {
        let expected = expected.into();
        let packet = self.next_outgoing();
        if packet != expected {
            panic!("\npacket assertion failed!\n\texpected: {:?}\n\tgot: {:?}\n", expected, packet);
        }
    }

    pub fn assert_outgoing_as<F: FnOnce(&Packet)>(&mut self, func: F) {
        let packet = self.next_outgoing();
        func(&packet);
    }

    pub fn assert_none_outgoing(&mut self) {
        self.receive();
        if let Some(packet) = self.outgoing.front() {
            panic!("\npacket assertion failed: expected no more packets,\n\tgot: {:?}\n", packet);
        }
    }

    pub fn skip_outgoing(&mut self, packet_id: PacketId) {
        let packet = self.next_outgoing();
        assert_eq!(packet_id, packet.get_packet_id(), "expected: {:?}, found: {:?}", packet_id, packet);
    }

    pub fn skip_all_outgoing(&mut self) {
        self.receive();
        self.outgoing.clear();
    }

    /// Every pending packet, without asserting on order.
    pub fn drain_outgoing(&mut self) -> Vec<Packet> {
        self.receive();
        self.outgoing.drain(..).collect()
    }

    /// Closes the client side of the connection.
    pub fn disconnect(&mut self) {
        self.receiver = None;
        self.outgoing.clear();
    }
}
