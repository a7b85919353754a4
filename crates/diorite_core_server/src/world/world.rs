use std::sync::{Arc, atomic::{AtomicU64, Ordering}};

use diorite_mc_constants::{entity::EntityType, item::Material};
use diorite_mc_protocol::{play::clientbound::Packet, types::GameProfile};
use diorite_network::Connection;
use glam::DVec3;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::{
    config::{ConfigError, WorldConfig},
    entity::{Entity, EntityFactory, EntityIdCounter, EntityTracker, REMOVED_ENTITY_ID},
    inventory::{Inventory, InventoryView, item_stack::ItemStack, recipe::{RecipeManager, SimpleRecipeManager}},
    player::Player,
    types::AABB,
};

use super::{CHUNK_WIDTH, DRIVER_WORKER, TickContext, chunk::Chunk};

/// A fixed grid of chunks and everything in it.
pub struct World {
    config: WorldConfig,
    ids: Arc<EntityIdCounter>,
    chunks: Vec<Arc<Chunk>>,
    entities: RwLock<FxHashMap<i32, Arc<Entity>>>,
    players: RwLock<FxHashMap<i32, Arc<Player>>>,
    tracker: Arc<EntityTracker>,
    factory: EntityFactory,
    recipes: Arc<dyn RecipeManager>,
    current_tick: AtomicU64,
}

impl World {
    pub fn new(config: WorldConfig, ids: Arc<EntityIdCounter>) -> Result<Arc<World>, ConfigError> {
        Self::with_parts(config, ids, Arc::new(SimpleRecipeManager::default()), EntityFactory::new())
    }

    pub fn with_parts(config: WorldConfig, ids: Arc<EntityIdCounter>, recipes: Arc<dyn RecipeManager>,
            factory: EntityFactory) -> Result<Arc<World>, ConfigError> {
        config.validate()?;

        let mut chunks = Vec::with_capacity((config.chunks_x * config.chunks_z) as usize);
        for z in 0..config.chunks_z {
            for x in 0..config.chunks_x {
                let chunk = Chunk::new(x, z, config.section_count);
                chunk.fill_ground(config.ground_height, Material::Stone);
                chunks.push(Arc::new(chunk));
            }
        }

        info!(chunks_x = config.chunks_x, chunks_z = config.chunks_z, tick_rate = config.tick_rate, "created world");

        Ok(Arc::new(World {
            config,
            ids,
            chunks,
            entities: RwLock::new(FxHashMap::default()),
            players: RwLock::new(FxHashMap::default()),
            tracker: Arc::new(EntityTracker::new()),
            factory,
            recipes,
            current_tick: AtomicU64::new(0),
        }))
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn tracker(&self) -> &Arc<EntityTracker> {
        &self.tracker
    }

    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    pub fn recipes(&self) -> &Arc<dyn RecipeManager> {
        &self.recipes
    }

    pub fn next_entity_id(&self) -> i32 {
        self.ids.next_entity_id()
    }

    pub fn current_tick(&self) -> u64 {
        self.current_tick.load(Ordering::Acquire)
    }

    /// Context for work done outside of the tick workers.
    pub fn driver_context(&self) -> TickContext {
        TickContext::new(DRIVER_WORKER, self.current_tick())
    }

    // Blocks

    pub fn get_chunk(&self, x: i32, z: i32) -> Option<&Arc<Chunk>> {
        if x < 0 || z < 0 || x >= self.config.chunks_x || z >= self.config.chunks_z {
            None
        } else {
            self.chunks.get((x + z * self.config.chunks_x) as usize)
        }
    }

    pub fn chunks(&self) -> &[Arc<Chunk>] {
        &self.chunks
    }

    /// Air outside of the chunk grid.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Material {
        self.get_chunk(x >> 4, z >> 4)
            .and_then(|chunk| chunk.get_block(x, y, z))
            .unwrap_or(Material::Air)
    }

    pub fn set_block(&self, x: i32, y: i32, z: i32, material: Material) -> Option<Material> {
        self.get_chunk(x >> 4, z >> 4)?.set_block(x, y, z, material)
    }

    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        self.get_block(x, y, z).is_solid()
    }

    /// Moves `aabb` along `delta` until it touches a solid block, then keeps
    /// sliding along whichever axes are still free. Returns how far the box
    /// actually moved.
    pub fn sweep_bounding_box(&self, aabb: AABB, delta: DVec3) -> DVec3 {
        if delta == DVec3::ZERO {
            return DVec3::ZERO;
        }

        let obstacles = self.solid_blocks_around(aabb.expand(delta));
        if obstacles.is_empty() {
            return delta;
        }

        let mut aabb = aabb;
        let mut remaining = delta;
        let mut moved = DVec3::ZERO;
        while let Some(direction) = remaining.try_normalize() {
            let reach = remaining.length();
            let hit = obstacles.iter()
                .filter_map(|block| first_contact(-direction, aabb.minkowski_difference(*block)))
                .filter(|hit| hit.distance < reach)
                .min_by(|a, b| a.distance.total_cmp(&b.distance));

            let Some(hit) = hit else {
                return moved + remaining;
            };

            let step = direction * hit.distance;
            moved += step;
            remaining -= step;
            remaining[hit.axis] = 0.0;
            aabb = aabb.translate(step);
        }
        moved
    }

    /// Unit boxes of the solid blocks in and one block around `region`.
    /// Only blocks inside the world can be solid.
    fn solid_blocks_around(&self, region: AABB) -> Vec<AABB> {
        let min = (region.min() - 1E-7).floor().as_ivec3() - 1;
        let max = (region.max() + 1E-7).floor().as_ivec3() + 1;
        let width_x = self.config.chunks_x * CHUNK_WIDTH;
        let width_z = self.config.chunks_z * CHUNK_WIDTH;

        let mut blocks = Vec::new();
        for x in min.x.max(0)..=max.x.min(width_x - 1) {
            for y in min.y.max(0)..=max.y.min(self.config.world_height() - 1) {
                for z in min.z.max(0)..=max.z.min(width_z - 1) {
                    if self.is_solid(x, y, z) {
                        blocks.push(AABB::block(x, y, z));
                    }
                }
            }
        }
        blocks
    }

    // Entities

    /// Creates an entity through the factory and adds it to the world.
    /// Returns `None` if the type has no registered constructor.
    pub fn spawn_entity(self: &Arc<Self>, entity_type: EntityType, position: DVec3) -> Option<Arc<Entity>> {
        let entity = self.factory.create_entity(self, entity_type, position)?;
        self.add_entity(&entity);
        Some(entity)
    }

    pub fn spawn_entity_by_name(self: &Arc<Self>, name: &str, position: DVec3) -> Option<Arc<Entity>> {
        let entity = self.factory.create_entity_by_name(self, name, position)?;
        self.add_entity(&entity);
        Some(entity)
    }

    /// Adds an entity built for this world. Players join through
    /// [`World::spawn_player`] instead.
    pub fn add_entity(&self, entity: &Arc<Entity>) -> bool {
        if entity.is_player() || entity.is_removed() {
            return false;
        }

        self.entities.write().insert(entity.id(), entity.clone());
        entity.on_spawn(&self.tracker);
        entity.update_chunk();
        debug!(id = entity.id(), entity_type = ?entity.entity_type(), position = ?entity.position(), "spawned entity");
        true
    }

    /// Drops a stack into the world as an item entity.
    pub fn drop_item(self: &Arc<Self>, position: DVec3, stack: ItemStack) -> Option<Arc<Entity>> {
        if stack.is_empty() {
            return None;
        }

        let entity = self.factory.create_entity(self, EntityType::Item, position)?;
        entity.set_dropped_stack(Some(stack), self.config.pickup_delay);
        self.add_entity(&entity);
        Some(entity)
    }

    pub fn spawn_player(self: &Arc<Self>, profile: GameProfile, connection: Option<Arc<dyn Connection>>,
            position: DVec3) -> Arc<Player> {
        let player = self.factory.create_player(self, profile, connection, position);

        self.players.write().insert(player.id(), player.clone());
        player.entity().on_spawn(&self.tracker);
        player.entity().update_chunk();
        player.inventory().update();

        info!(id = player.id(), username = %player.profile().username, bot = player.is_bot(), "player joined");
        player
    }

    /// Removes an entity from the world for good: it leaves the chunk
    /// index, every viewer is told to forget it and its id becomes
    /// [`REMOVED_ENTITY_ID`].
    pub fn remove_entity(&self, ctx: &TickContext, entity: &Arc<Entity>) -> bool {
        let id = entity.id();
        if id == REMOVED_ENTITY_ID {
            return false;
        }

        let removed = if entity.is_player() {
            self.players.write().remove(&id).is_some()
        } else {
            self.entities.write().remove(&id).is_some()
        };
        if !removed {
            return false;
        }

        entity.remove_from_chunk();
        self.tracker.forget_viewer(id);
        for viewer_id in self.tracker.untrack(id) {
            if let Some(viewer) = self.player(viewer_id) {
                viewer.remove_entity_id_from_view(ctx, id, entity.is_player());
            }
        }
        entity.mark_removed();

        debug!(id, entity_type = ?entity.entity_type(), "removed entity");
        true
    }

    pub fn remove_player(&self, ctx: &TickContext, player_id: i32) -> bool {
        let Some(player) = self.player(player_id) else {
            return false;
        };

        player.close_inventory();
        let removed = self.remove_entity(ctx, player.entity());
        if removed {
            info!(id = player_id, username = %player.profile().username, "player left");
        }
        removed
    }

    /// Entity or player with this id.
    pub fn entity(&self, id: i32) -> Option<Arc<Entity>> {
        if let Some(entity) = self.entities.read().get(&id) {
            return Some(entity.clone());
        }
        self.player(id).map(|player| player.entity().clone())
    }

    pub fn player(&self, id: i32) -> Option<Arc<Player>> {
        self.players.read().get(&id).cloned()
    }

    /// Snapshot of the non-player entities.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        self.entities.read().values().cloned().collect()
    }

    pub fn players(&self) -> Vec<Arc<Player>> {
        self.players.read().values().cloned().collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    pub fn player_count(&self) -> usize {
        self.players.read().len()
    }

    /// Sends packets to every player that can see the entity.
    pub fn broadcast_to_viewers(&self, entity_id: i32, packets: Vec<Packet>) {
        for viewer_id in self.tracker.viewers(entity_id) {
            if let Some(viewer) = self.player(viewer_id) {
                viewer.send_packets(packets.clone());
            }
        }
    }

    // Ticking

    /// Runs one tick: entities first, then players, then the shared windows
    /// players have open. Entities and players are ticked in parallel.
    pub fn tick(&self) {
        let tick = self.current_tick.fetch_add(1, Ordering::AcqRel) + 1;
        let driver = TickContext::new(DRIVER_WORKER, tick);

        // Remove all players that have disconnected
        for player in self.players() {
            if player.is_disconnected() {
                self.remove_player(&driver, player.id());
            }
        }

        let entities = self.entities();
        entities.par_iter().for_each(|entity| entity.do_tick(&TickContext::current(tick)));

        let players = self.players();
        players.par_iter().for_each(|player| player.do_tick(&TickContext::current(tick)));

        let mut containers: Vec<Arc<Inventory>> = Vec::new();
        for inventory in players.iter().filter_map(|player| player.opened_inventory()) {
            if !containers.iter().any(|known| Arc::ptr_eq(known, &inventory)) {
                containers.push(inventory);
            }
        }
        containers.par_iter()
            .filter(|inventory| inventory.viewers().has_receiving_viewer())
            .for_each(|inventory| {
                inventory.soft_update();
            });
    }
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    distance: f64,
    axis: usize,
}

/// Where a ray from the origin enters `target`, and the axis of the face it
/// enters through. Sweeping a box against a block is the same as casting a
/// ray against their Minkowski difference.
fn first_contact(ray: DVec3, target: AABB) -> Option<Contact> {
    let mut entry = Contact { distance: f64::MIN, axis: 0 };
    let mut exit = f64::MAX;

    for axis in 0..3 {
        let (min, max) = (target.min()[axis], target.max()[axis]);
        if ray[axis] == 0.0 {
            // Parallel to this slab, so the origin has to be strictly inside it
            if min >= 0.0 || max <= 0.0 {
                return None;
            }
            continue;
        }

        let inverse = ray[axis].recip();
        let (near, far) = if inverse >= 0.0 {
            (min * inverse, max * inverse)
        } else {
            (max * inverse, min * inverse)
        };

        exit = exit.min(far);
        if near > entry.distance {
            entry = Contact { distance: near, axis };
        }
        if entry.distance > exit {
            return None;
        }
    }

    (entry.distance >= 0.0).then_some(entry)
}
