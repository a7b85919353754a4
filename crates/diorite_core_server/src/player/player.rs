use std::{fmt, sync::Arc};

use diorite_mc_constants::entity::EntityType;
use diorite_mc_protocol::{play::clientbound::{Packet, RemoveEntities, SetEquipment}, types::GameProfile};
use diorite_network::Connection;
use glam::DVec3;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use crate::{
    entity::{Entity, EntityFilter, EntityTracker, PlayerView, REMOVED_ENTITY_ID},
    inventory::{Inventory, InventoryView, PlayerInventory},
    world::{CHUNK_WIDTH, TickContext, World},
};

use super::{PICKUP_RANGE_HORIZONTAL, PICKUP_RANGE_VERTICAL};

/// A player entity together with its connection, inventory and view of the
/// world. Players without a connection are bots: they are ticked and seen
/// by others but never sent anything.
pub struct Player {
    entity: Arc<Entity>,
    profile: GameProfile,
    connection: Option<Arc<dyn Connection>>,
    inventory: PlayerInventory,
    view: PlayerView,
    opened_inventory: Mutex<Option<Arc<Inventory>>>,
}

impl Player {
    pub(crate) fn new(world: &Arc<World>, id: i32, profile: GameProfile, connection: Option<Arc<dyn Connection>>,
            position: DVec3) -> Arc<Player> {
        Arc::new_cyclic(|weak| Player {
            entity: Arc::new(Entity::with_uuid(world, id, profile.uuid, EntityType::Player, position)),
            inventory: PlayerInventory::new(id, weak.clone(), world.recipes().clone()),
            view: PlayerView::new(),
            opened_inventory: Mutex::new(None),
            profile,
            connection,
        })
    }

    pub fn id(&self) -> i32 {
        self.entity.id()
    }

    pub fn entity(&self) -> &Arc<Entity> {
        &self.entity
    }

    pub fn profile(&self) -> &GameProfile {
        &self.profile
    }

    pub fn inventory(&self) -> &PlayerInventory {
        &self.inventory
    }

    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    pub fn is_bot(&self) -> bool {
        self.connection.is_none()
    }

    /// A real player whose connection has gone away. Bots never disconnect.
    pub fn is_disconnected(&self) -> bool {
        self.connection.as_ref().is_some_and(|connection| !connection.is_connected())
    }

    pub fn can_receive_packets(&self) -> bool {
        self.connection.as_ref().is_some_and(|connection| connection.is_connected())
    }

    /// Sends the packets as one write. Dropped for bots.
    pub fn send_packets(&self, packets: Vec<Packet>) {
        if packets.is_empty() {
            return;
        }
        if let Some(connection) = &self.connection {
            connection.send_packets(packets);
        }
    }

    pub fn send_packet(&self, packet: impl Into<Packet>) {
        self.send_packets(vec![packet.into()]);
    }

    pub fn do_tick(self: &Arc<Self>, ctx: &TickContext) {
        let removals = self.view.take_pending_removals();
        if !removals.is_empty() {
            self.send_packet(RemoveEntities { entities: removals });
        }

        self.entity.do_tick(ctx);
        if self.entity.is_removed() {
            return;
        }
        let Some(world) = self.entity.world() else {
            return;
        };

        self.update_visibility(&world);
        self.pickup_items(ctx, &world);

        self.inventory.soft_update();
        if self.inventory.take_equipment_changed() {
            world.broadcast_to_viewers(self.id(), vec![self.equipment_packet().into()]);
        }
    }

    /// Spawns entities that came into view and removes the ones that left it,
    /// as a single write.
    fn update_visibility(&self, world: &World) {
        let config = world.config();
        let distance = (config.view_distance as i32 * CHUNK_WIDTH) as f64;
        let own_id = self.id();
        let tracker = world.tracker();

        let in_range = self.entity.nearby_entities(distance, config.world_height() as f64, distance, EntityFilter::Any);
        let mut in_range_ids = FxHashSet::default();
        let mut packets = Vec::new();

        for entity in &in_range {
            let id = entity.id();
            if id == REMOVED_ENTITY_ID {
                continue;
            }
            in_range_ids.insert(id);

            if self.view.is_visible(id) || !tracker.add_viewer(id, own_id) {
                continue;
            }
            self.view.mark_visible(id);

            packets.push(entity.spawn_packet().into());
            packets.push(entity.full_metadata_packet().into());
            if entity.is_player() {
                if let Some(player) = world.player(id) {
                    packets.push(player.equipment_packet().into());
                }
            }
        }

        let mut removed = Vec::new();
        for id in self.view.visible_ids() {
            if !in_range_ids.contains(&id) {
                self.view.mark_hidden(id);
                tracker.remove_viewer(id, own_id);
                removed.push(id);
            }
        }
        if !removed.is_empty() {
            trace!(player = own_id, count = removed.len(), "entities left view");
            packets.push(RemoveEntities { entities: removed }.into());
        }

        self.send_packets(packets);
    }

    fn pickup_items(&self, ctx: &TickContext, world: &World) {
        let items = self.entity.nearby_entities(PICKUP_RANGE_HORIZONTAL, PICKUP_RANGE_VERTICAL,
            PICKUP_RANGE_HORIZONTAL, EntityFilter::Type(EntityType::Item));

        for item in items {
            let Some(dropped_item) = item.dropped_item() else {
                continue;
            };

            let collected = {
                let mut dropped_item = dropped_item.lock();
                if dropped_item.pickup_delay > 0 {
                    continue;
                }
                let Some(stack) = dropped_item.stack.take() else {
                    continue;
                };

                let leftover = self.inventory.add(std::slice::from_ref(&stack)).pop();
                let collected = leftover.is_none();
                if !collected {
                    item.update_item_metadata(leftover.as_ref());
                }
                dropped_item.stack = leftover;
                collected
            };

            if collected {
                debug!(player = self.id(), item = item.id(), "picked up item");
                world.remove_entity(ctx, &item);
            }
        }
    }

    /// Makes the client forget an entity. Sent right away when this player
    /// belongs to the calling worker or the entity is a player, queued for
    /// the start of this player's next tick otherwise.
    pub fn remove_entity_from_view(&self, ctx: &TickContext, entity: &Entity) {
        self.remove_entity_id_from_view(ctx, entity.id(), entity.is_player());
    }

    pub fn remove_entity_id_from_view(&self, ctx: &TickContext, entity_id: i32, is_player: bool) {
        if !self.view.mark_hidden(entity_id) {
            return;
        }
        if let Some(tracker) = self.entity.tracker() {
            tracker.remove_viewer(entity_id, self.id());
        }

        if is_player || ctx.owns(&self.entity) {
            self.send_packet(RemoveEntities { entities: vec![entity_id] });
        } else {
            self.view.queue_removal(entity_id);
        }
    }

    /// Opens a shared window, closing whichever one was open before.
    pub fn open_inventory(self: &Arc<Self>, inventory: Arc<Inventory>) {
        self.close_inventory();

        inventory.viewers().add(self);
        self.send_packet(inventory.contents_packet());
        debug!(player = self.id(), window = inventory.window_id(), "opened inventory");

        *self.opened_inventory.lock() = Some(inventory);
    }

    pub fn close_inventory(&self) -> Option<Arc<Inventory>> {
        let inventory = self.opened_inventory.lock().take()?;
        inventory.viewers().remove(self.id());

        if inventory.viewers().is_empty() {
            let drag = inventory.drag_controller();
            if let Some(right_click) = drag.is_right_click() {
                drag.end(right_click);
            }
        }
        Some(inventory)
    }

    pub fn opened_inventory(&self) -> Option<Arc<Inventory>> {
        self.opened_inventory.lock().clone()
    }

    pub fn equipment_packet(&self) -> SetEquipment {
        SetEquipment {
            entity_id: self.id(),
            equipment: self.inventory.equipment(),
        }
    }

    /// The tracker of the world this player is in.
    pub fn tracker(&self) -> Option<Arc<EntityTracker>> {
        self.entity.tracker()
    }
}

impl fmt::Debug for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Player")
            .field("id", &self.id())
            .field("username", &self.profile.username)
            .field("bot", &self.is_bot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use diorite_mc_constants::item::Material;
    use diorite_network::{ChannelConnection, PacketReceiver};

    use crate::{config::WorldConfig, entity::EntityIdCounter, inventory::{InventorySlot, item_stack::ItemStack}};

    use super::*;

    fn world() -> Arc<World> {
        World::new(WorldConfig::default(), Arc::new(EntityIdCounter::new())).unwrap()
    }

    fn profile(name: &str) -> GameProfile {
        GameProfile { uuid: name.len() as u128, username: name.into() }
    }

    fn connected(world: &Arc<World>, name: &str, position: DVec3) -> (Arc<Player>, PacketReceiver) {
        let (connection, receiver) = ChannelConnection::new();
        let player = world.spawn_player(profile(name), Some(Arc::new(connection)), position);
        receiver.drain_packets();
        (player, receiver)
    }

    #[test]
    fn bots_receive_nothing() {
        let world = world();
        let bot = world.spawn_player(profile("bot"), None, DVec3::new(8.0, 4.0, 8.0));
        assert!(bot.is_bot());
        assert!(!bot.can_receive_packets());
        assert!(!bot.is_disconnected());
        assert!(!bot.inventory().viewers().has_receiving_viewer());
    }

    #[test]
    fn joining_sends_the_inventory() {
        let world = world();
        let (connection, receiver) = ChannelConnection::new();
        world.spawn_player(profile("alice"), Some(Arc::new(connection)), DVec3::new(8.0, 4.0, 8.0));

        let packets = receiver.drain_packets();
        assert!(packets.iter().any(|packet| matches!(packet, Packet::ContainerSetContent(content) if content.window_id == 0)));
    }

    #[test]
    fn removal_from_another_worker_is_queued() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let pig = world.spawn_entity(EntityType::Pig, DVec3::new(10.0, 4.0, 8.0)).unwrap();

        player.do_tick(&TickContext::new(2, 1));
        assert!(player.view().is_visible(pig.id()));
        receiver.drain_packets();

        player.remove_entity_from_view(&TickContext::new(5, 1), &pig);
        assert!(receiver.drain_packets().is_empty());
        assert_eq!(player.view().pending_removals(), vec![pig.id()]);

        player.do_tick(&TickContext::new(2, 2));
        let packets = receiver.drain_packets();
        assert_eq!(packets[0], Packet::RemoveEntities(RemoveEntities { entities: vec![pig.id()] }));
    }

    #[test]
    fn removal_from_the_owning_worker_is_immediate() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let pig = world.spawn_entity(EntityType::Pig, DVec3::new(10.0, 4.0, 8.0)).unwrap();

        player.do_tick(&TickContext::new(2, 1));
        receiver.drain_packets();

        player.remove_entity_from_view(&TickContext::new(2, 1), &pig);
        assert_eq!(receiver.drain_packets(), vec![Packet::RemoveEntities(RemoveEntities { entities: vec![pig.id()] })]);
        assert!(player.view().pending_removals().is_empty());
    }

    #[test]
    fn player_removal_is_always_immediate() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let bob = world.spawn_player(profile("bob"), None, DVec3::new(10.0, 4.0, 8.0));

        player.do_tick(&TickContext::new(2, 1));
        assert!(player.view().is_visible(bob.id()));
        receiver.drain_packets();

        player.remove_entity_from_view(&TickContext::new(5, 1), bob.entity());
        assert_eq!(receiver.drain_packets(), vec![Packet::RemoveEntities(RemoveEntities { entities: vec![bob.id()] })]);
    }

    #[test]
    fn entities_in_view_are_spawned_once() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let pig = world.spawn_entity(EntityType::Pig, DVec3::new(12.0, 4.0, 8.0)).unwrap();
        world.spawn_entity(EntityType::Pig, DVec3::new(120.0, 4.0, 120.0)).unwrap();

        player.do_tick(&TickContext::new(1, 1));
        let packets = receiver.drain_packets();
        assert!(matches!(&packets[0], Packet::AddEntity(add) if add.entity_id == pig.id()));
        assert!(matches!(&packets[1], Packet::SetEntityData(data) if data.entity_id == pig.id()));
        assert_eq!(packets.len(), 2);
        assert_eq!(world.tracker().viewers(pig.id()), vec![player.id()]);

        player.do_tick(&TickContext::new(1, 2));
        assert!(receiver.drain_packets().is_empty());
    }

    #[test]
    fn entities_leaving_view_are_removed() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let pig = world.spawn_entity(EntityType::Pig, DVec3::new(12.0, 4.0, 8.0)).unwrap();

        player.do_tick(&TickContext::new(1, 1));
        receiver.drain_packets();

        pig.set_position(DVec3::new(120.0, 4.0, 120.0));
        player.do_tick(&TickContext::new(1, 2));
        assert_eq!(receiver.drain_packets(), vec![Packet::RemoveEntities(RemoveEntities { entities: vec![pig.id()] })]);
        assert!(world.tracker().viewers(pig.id()).is_empty());
    }

    #[test]
    fn visible_players_include_equipment() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let bob = world.spawn_player(profile("bob"), None, DVec3::new(10.0, 4.0, 8.0));

        player.do_tick(&TickContext::new(1, 1));
        let packets = receiver.drain_packets();
        assert!(matches!(&packets[2], Packet::SetEquipment(equipment) if equipment.entity_id == bob.id()));
    }

    #[test]
    fn equipment_changes_reach_viewers() {
        let world = world();
        let (alice, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let bob = world.spawn_player(profile("bob"), None, DVec3::new(10.0, 4.0, 8.0));

        alice.do_tick(&TickContext::new(1, 1));
        bob.do_tick(&TickContext::new(2, 1));
        receiver.drain_packets();

        bob.inventory().set_slot(InventorySlot::Hotbar(0), Some(ItemStack::single(Material::DiamondSword))).unwrap();
        bob.do_tick(&TickContext::new(2, 2));

        let packets = receiver.drain_packets();
        assert!(packets.iter().any(|packet| matches!(packet, Packet::SetEquipment(equipment)
            if equipment.entity_id == bob.id() && equipment.equipment[0].1.is_some())));
    }

    #[test]
    fn open_and_close_inventory() {
        let world = world();
        let (player, receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let chest = Arc::new(Inventory::chest(1, 3, "Chest"));
        chest.set_item(4, Some(ItemStack::new(Material::Apple, 5))).unwrap();

        player.open_inventory(chest.clone());
        assert!(chest.viewers().contains(player.id()));
        let packets = receiver.drain_packets();
        assert!(matches!(&packets[0], Packet::ContainerSetContent(content) if content.window_id == 1 && content.items[4].is_some()));

        chest.drag_controller().start(false);
        let closed = player.close_inventory().unwrap();
        assert!(Arc::ptr_eq(&closed, &chest));
        assert!(!chest.viewers().contains(player.id()));
        assert!(!chest.drag_controller().is_dragging());
        assert!(player.opened_inventory().is_none());
        assert!(player.close_inventory().is_none());
    }

    #[test]
    fn drags_survive_while_other_viewers_remain() {
        let world = world();
        let (alice, _alice_packets) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        let (bob, _bob_packets) = connected(&world, "bob", DVec3::new(9.0, 4.0, 8.0));
        let chest = Arc::new(Inventory::chest(1, 1, "Chest"));

        alice.open_inventory(chest.clone());
        bob.open_inventory(chest.clone());
        chest.drag_controller().start(true);

        alice.close_inventory();
        assert!(chest.drag_controller().is_dragging());
    }

    #[test]
    fn the_owner_stays_a_viewer() {
        let world = world();
        let (player, _receiver) = connected(&world, "alice", DVec3::new(8.0, 4.0, 8.0));
        assert!(!player.inventory().viewers().remove(player.id()));
        assert!(player.inventory().viewers().contains(player.id()));
    }
}
