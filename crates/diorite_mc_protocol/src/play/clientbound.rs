use crate::identify_packets;
use crate::types::{EquipmentSlot, MetadataEntry, ProtocolItemStack};

identify_packets! {
    PacketId,
    AddEntity = 0x00,
    ContainerSetContent = 0x14,
    ContainerSetSlot = 0x16,
    RemoveEntities = 0x32,
    SetEntityData = 0x3c,
    SetEquipment = 0x3f,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddEntity {
    pub entity_id: i32,
    pub uuid: u128,
    pub entity_type: u8,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub x_vel: f32,
    pub y_vel: f32,
    pub z_vel: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveEntities {
    pub entities: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSetSlot {
    pub window_id: i8,
    pub slot: i16,
    pub item: Option<ProtocolItemStack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSetContent {
    pub window_id: i8,
    pub items: Vec<Option<ProtocolItemStack>>,
    pub carried_item: Option<ProtocolItemStack>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetEntityData {
    pub entity_id: i32,
    pub metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetEquipment {
    pub entity_id: i32,
    pub equipment: Vec<(EquipmentSlot, Option<ProtocolItemStack>)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingHandler {
        slots: usize,
        removed: Vec<i32>,
    }

    impl PacketHandler for CountingHandler {
        fn handle_container_set_slot(&mut self, _: &ContainerSetSlot) {
            self.slots += 1;
        }

        fn handle_remove_entities(&mut self, packet: &RemoveEntities) {
            self.removed.extend_from_slice(&packet.entities);
        }
    }

    #[test]
    fn packet_ids() {
        let packet: Packet = RemoveEntities { entities: vec![1, 2] }.into();
        assert_eq!(packet.get_packet_id(), PacketId::RemoveEntities);
        assert_eq!(u8::from(PacketId::RemoveEntities), 0x32);
        assert_eq!(PacketId::try_from(0x16).unwrap(), PacketId::ContainerSetSlot);
    }

    #[test]
    fn handler_dispatch() {
        let mut handler = CountingHandler::default();
        handler.handle(&Packet::ContainerSetSlot(ContainerSetSlot { window_id: 0, slot: 36, item: None }));
        handler.handle(&Packet::RemoveEntities(RemoveEntities { entities: vec![7] }));
        handler.handle(&Packet::SetEntityData(SetEntityData { entity_id: 7, metadata: vec![] }));

        assert_eq!(handler.slots, 1);
        assert_eq!(handler.removed, vec![7]);
    }
}
