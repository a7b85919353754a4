use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TryRecvError};
use diorite_mc_protocol::play::clientbound::Packet;

mod packet_buffer;
pub use packet_buffer::PacketBuffer;

/// Outbound side of a client connection.
///
/// Sends are fire-and-forget: the packets are handed to the transport and
/// delivered in FIFO order per connection, with no acknowledgement.
pub trait Connection: Send + Sync {
    fn send_packets(&self, packets: Vec<Packet>);
    fn is_connected(&self) -> bool;

    fn send_packet(&self, packet: Packet) {
        self.send_packets(vec![packet]);
    }
}

/// A connection whose transport is a channel. Every `send_packets` call is
/// a single message, mirroring one network write.
pub struct ChannelConnection {
    sender: Sender<Vec<Packet>>,
    connected: AtomicBool,
}

impl ChannelConnection {
    pub fn new() -> (Self, PacketReceiver) {
        let (sender, receiver) = channel::unbounded();
        let connection = Self {
            sender,
            connected: AtomicBool::new(true),
        };
        (connection, PacketReceiver { receiver })
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }
}

impl Connection for ChannelConnection {
    fn send_packets(&self, packets: Vec<Packet>) {
        if packets.is_empty() || !self.is_connected() {
            return;
        }

        if self.sender.send(packets).is_err() {
            // Transport side went away
            self.disconnect();
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("the connection was closed")]
pub struct ConnectionClosed;

/// Transport side of a `ChannelConnection`.
pub struct PacketReceiver {
    receiver: Receiver<Vec<Packet>>,
}

impl PacketReceiver {
    /// Next write, if one is queued.
    pub fn try_recv(&self) -> Result<Option<Vec<Packet>>, ConnectionClosed> {
        match self.receiver.try_recv() {
            Ok(packets) => Ok(Some(packets)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ConnectionClosed),
        }
    }

    /// All queued writes, one entry per `send_packets` call.
    pub fn drain_writes(&self) -> Vec<Vec<Packet>> {
        self.receiver.try_iter().collect()
    }

    /// All queued packets, flattened in send order.
    pub fn drain_packets(&self) -> Vec<Packet> {
        self.receiver.try_iter().flatten().collect()
    }
}
