use diorite_mc_protocol::play::clientbound::Packet;

/// Ordered batch of packets built up during a tick and handed to a
/// connection in one write.
#[derive(Clone, Debug, Default)]
pub struct PacketBuffer {
    packets: Vec<Packet>,
}

impl PacketBuffer {
    pub fn new() -> PacketBuffer {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    pub fn write_packet<T: Into<Packet>>(&mut self, packet: T) {
        self.packets.push(packet.into());
    }

    pub fn pop_written(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.packets)
    }
}

#[cfg(test)]
mod tests {
    use diorite_mc_protocol::play::clientbound::RemoveEntities;

    use super::*;

    #[test]
    fn pop_clears() {
        let mut buffer = PacketBuffer::new();
        buffer.write_packet(RemoveEntities { entities: vec![3] });
        buffer.write_packet(RemoveEntities { entities: vec![4] });
        assert_eq!(buffer.len(), 2);

        let written = buffer.pop_written();
        assert_eq!(written[1], Packet::RemoveEntities(RemoveEntities { entities: vec![4] }));
        assert!(buffer.is_empty());
        assert!(buffer.pop_written().is_empty());
    }
}
