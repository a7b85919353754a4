use diorite_mc_protocol::play::clientbound::{
    AddEntity, ContainerSetContent, ContainerSetSlot, PacketHandler, RemoveEntities, SetEntityData, SetEquipment,
};
use tracing::info;

/// Logs what a client would have been sent.
pub struct PacketLog {
    pub username: String,
    pub received: usize,
}

impl PacketLog {
    pub fn new(username: impl Into<String>) -> Self {
        Self { username: username.into(), received: 0 }
    }
}

impl PacketHandler for PacketLog {
    fn handle_add_entity(&mut self, packet: &AddEntity) {
        self.received += 1;
        info!(client = %self.username, id = packet.entity_id, entity_type = packet.entity_type,
            x = packet.x, y = packet.y, z = packet.z, "add entity");
    }

    fn handle_remove_entities(&mut self, packet: &RemoveEntities) {
        self.received += 1;
        info!(client = %self.username, ids = ?packet.entities, "remove entities");
    }

    fn handle_set_entity_data(&mut self, packet: &SetEntityData) {
        self.received += 1;
        info!(client = %self.username, id = packet.entity_id, entries = packet.metadata.len(), "entity data");
    }

    fn handle_set_equipment(&mut self, packet: &SetEquipment) {
        self.received += 1;
        let held = packet.equipment.first().and_then(|(_, item)| item.as_ref()).map(|item| item.item);
        info!(client = %self.username, id = packet.entity_id, ?held, "equipment");
    }

    fn handle_container_set_content(&mut self, packet: &ContainerSetContent) {
        self.received += 1;
        let filled = packet.items.iter().filter(|item| item.is_some()).count();
        info!(client = %self.username, window = packet.window_id, filled, "window contents");
    }

    fn handle_container_set_slot(&mut self, packet: &ContainerSetSlot) {
        self.received += 1;
        info!(client = %self.username, window = packet.window_id, slot = packet.slot,
            item = ?packet.item.as_ref().map(|item| (item.item, item.count)), "slot changed");
    }
}
