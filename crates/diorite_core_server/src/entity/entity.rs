use std::{fmt, sync::{Arc, Weak, atomic::{AtomicI32, AtomicUsize, Ordering}}};

use diorite_mc_constants::entity::{EntityCategory, EntityDimensions, EntityType};
use diorite_mc_protocol::play::clientbound::{AddEntity, SetEntityData};
use glam::{DVec3, Vec3};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, MutexGuard};
use tracing::{trace, warn};

use crate::{
    inventory::item_stack::ItemStack,
    types::AABB,
    world::{CHUNK_WIDTH, TickContext, World, chunk::Chunk, chunk_coord},
};

use super::{EntityTracker, metadata::EntityMetadata};

/// Id of an entity after it has been fully removed from its world.
pub const REMOVED_ENTITY_ID: i32 = -1;

const NEVER_TICKED: usize = usize::MAX;
/// How far below the feet the ground check samples.
const GROUND_EPSILON: f64 = 0.01;
/// Collision may shave a little off an axis without the entity hitting
/// anything on it.
const COLLISION_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone)]
struct EntityState {
    position: DVec3,
    yaw: f32,
    pitch: f32,
    velocity: Vec3,
    bounding_box: AABB,
    on_ground: Option<bool>,
}

impl EntityState {
    fn new(position: DVec3, dimensions: &EntityDimensions) -> Self {
        let mut state = Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            velocity: Vec3::ZERO,
            bounding_box: AABB::standing_at(position, 0.0, 0.0),
            on_ground: None,
        };
        state.recenter(dimensions);
        state
    }

    fn recenter(&mut self, dimensions: &EntityDimensions) {
        self.bounding_box = AABB::standing_at(self.position, dimensions.width as f64, dimensions.height as f64);
    }

    /// Computed on first use after every move.
    fn is_on_ground(&mut self, world: &World) -> bool {
        let position = self.position;
        *self.on_ground.get_or_insert_with(|| {
            world.is_solid(position.x.floor() as i32, (position.y - GROUND_EPSILON).floor() as i32, position.z.floor() as i32)
        })
    }
}

/// Item stack carried by an item entity, and how long until it can be
/// picked up.
#[derive(Debug, Default)]
pub struct DroppedItem {
    pub stack: Option<ItemStack>,
    pub pickup_delay: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFilter {
    Any,
    Type(EntityType),
    Category(EntityCategory),
}

impl EntityFilter {
    pub fn matches(&self, entity_type: EntityType) -> bool {
        match self {
            EntityFilter::Any => true,
            EntityFilter::Type(filter) => *filter == entity_type,
            EntityFilter::Category(category) => entity_type.category() == *category,
        }
    }
}

/// Anything that exists in a world and moves: players, mobs, dropped items.
///
/// Entities are shared between the tick workers, the chunk index and the
/// tracker, so all mutable state sits behind locks or atomics. The state
/// lock is never held while the entity moves between chunks.
pub struct Entity {
    id: AtomicI32,
    uuid: u128,
    entity_type: EntityType,
    world: Weak<World>,
    state: Mutex<EntityState>,
    metadata: Mutex<EntityMetadata>,
    chunk: Mutex<Option<Arc<Chunk>>>,
    last_tick_worker: AtomicUsize,
    tracker: OnceCell<Weak<EntityTracker>>,
    dropped_item: Option<Mutex<DroppedItem>>,
}

impl Entity {
    pub fn new(world: &Arc<World>, id: i32, entity_type: EntityType, position: DVec3) -> Self {
        Self::with_uuid(world, id, rand::random(), entity_type, position)
    }

    pub fn with_uuid(world: &Arc<World>, id: i32, uuid: u128, entity_type: EntityType, position: DVec3) -> Self {
        Self {
            id: AtomicI32::new(id),
            uuid,
            entity_type,
            world: Arc::downgrade(world),
            state: Mutex::new(EntityState::new(position, entity_type.get_dimensions())),
            metadata: Mutex::new(EntityMetadata::for_type(entity_type)),
            chunk: Mutex::new(None),
            last_tick_worker: AtomicUsize::new(NEVER_TICKED),
            tracker: OnceCell::new(),
            dropped_item: (entity_type == EntityType::Item).then(|| Mutex::new(DroppedItem::default())),
        }
    }

    pub fn id(&self) -> i32 {
        self.id.load(Ordering::Acquire)
    }

    pub fn uuid(&self) -> u128 {
        self.uuid
    }

    pub fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    pub fn is_player(&self) -> bool {
        self.entity_type.is_player()
    }

    pub fn is_removed(&self) -> bool {
        self.id() == REMOVED_ENTITY_ID
    }

    pub fn world(&self) -> Option<Arc<World>> {
        self.world.upgrade()
    }

    pub fn position(&self) -> DVec3 {
        self.state.lock().position
    }

    /// Moves the entity, relocating it between chunks as needed.
    pub fn set_position(self: &Arc<Self>, position: DVec3) {
        {
            let mut state = self.state.lock();
            state.position = position;
            state.on_ground = None;
            state.recenter(self.entity_type.get_dimensions());
        }
        self.update_chunk();
    }

    pub fn move_by(self: &Arc<Self>, delta: DVec3) {
        let position = self.position() + delta;
        self.set_position(position);
    }

    pub fn rotation(&self) -> (f32, f32) {
        let state = self.state.lock();
        (state.yaw, state.pitch)
    }

    pub fn set_rotation(&self, yaw: f32, pitch: f32) {
        let mut state = self.state.lock();
        state.yaw = yaw;
        state.pitch = pitch;
    }

    pub fn velocity(&self) -> Vec3 {
        self.state.lock().velocity
    }

    pub fn set_velocity(&self, velocity: Vec3) {
        self.state.lock().velocity = velocity;
    }

    pub fn bounding_box(&self) -> AABB {
        self.state.lock().bounding_box
    }

    pub fn is_on_ground(&self) -> bool {
        match self.world() {
            Some(world) => self.state.lock().is_on_ground(&world),
            None => false,
        }
    }

    pub fn metadata(&self) -> MutexGuard<'_, EntityMetadata> {
        self.metadata.lock()
    }

    pub fn current_chunk(&self) -> Option<Arc<Chunk>> {
        self.chunk.lock().clone()
    }

    /// Worker that ticked this entity last, if it was ever ticked.
    pub fn last_tick_worker(&self) -> Option<usize> {
        match self.last_tick_worker.load(Ordering::Acquire) {
            NEVER_TICKED => None,
            worker => Some(worker),
        }
    }

    pub fn dropped_item(&self) -> Option<&Mutex<DroppedItem>> {
        self.dropped_item.as_ref()
    }

    pub(crate) fn set_dropped_stack(&self, stack: Option<ItemStack>, pickup_delay: u32) {
        if let Some(dropped_item) = &self.dropped_item {
            self.update_item_metadata(stack.as_ref());
            *dropped_item.lock() = DroppedItem { stack, pickup_delay };
        }
    }

    pub(crate) fn update_item_metadata(&self, stack: Option<&ItemStack>) {
        if let Some(metadata) = self.metadata.lock().as_item_mut() {
            metadata.set_item(stack.map(ItemStack::to_protocol));
        }
    }

    pub fn tracker(&self) -> Option<Arc<EntityTracker>> {
        self.tracker.get().and_then(Weak::upgrade)
    }

    /// Registers the entity with the world's tracker. Called once when the
    /// entity enters its world.
    ///
    /// # Panics
    ///
    /// Panics if the entity was already spawned.
    pub fn on_spawn(&self, tracker: &Arc<EntityTracker>) {
        if self.tracker.set(Arc::downgrade(tracker)).is_err() {
            panic!("entity {} was spawned twice", self.id());
        }
        tracker.track(self.id());
    }

    pub fn spawn_packet(&self) -> AddEntity {
        let state = self.state.lock();
        AddEntity {
            entity_id: self.id(),
            uuid: self.uuid,
            entity_type: self.entity_type.id(),
            x: state.position.x,
            y: state.position.y,
            z: state.position.z,
            yaw: state.yaw,
            pitch: state.pitch,
            x_vel: state.velocity.x,
            y_vel: state.velocity.y,
            z_vel: state.velocity.z,
        }
    }

    pub fn full_metadata_packet(&self) -> SetEntityData {
        SetEntityData {
            entity_id: self.id(),
            metadata: self.metadata.lock().write_all(),
        }
    }

    pub fn do_tick(self: &Arc<Self>, ctx: &TickContext) {
        self.last_tick_worker.store(ctx.worker(), Ordering::Release);
        if self.is_removed() {
            return;
        }
        let Some(world) = self.world() else {
            return;
        };

        if self.tick_physics(&world) {
            self.update_chunk();
        }

        if let Some(dropped_item) = &self.dropped_item {
            let mut dropped_item = dropped_item.lock();
            dropped_item.pickup_delay = dropped_item.pickup_delay.saturating_sub(1);
        }

        let changes = self.metadata.lock().write_changes();
        if !changes.is_empty() {
            let packet = SetEntityData {
                entity_id: self.id(),
                metadata: changes,
            };
            world.broadcast_to_viewers(self.id(), vec![packet.into()]);
        }
    }

    /// Applies gravity and velocity. Returns whether the entity moved.
    fn tick_physics(&self, world: &World) -> bool {
        let dimensions = self.entity_type.get_dimensions();
        let gravity = dimensions.gravity && !self.metadata.lock().no_gravity();
        let config = world.config();
        let multiplier = config.speed_multiplier();

        let mut state = self.state.lock();
        state.on_ground = None;
        state.recenter(dimensions);

        if gravity {
            if state.is_on_ground(world) {
                if state.velocity.y < 0.0 {
                    state.velocity.y = 0.0;
                }
            } else {
                state.velocity.y = (state.velocity.y - config.gravity * multiplier) * config.vertical_drag;
            }
        }

        let desired = state.velocity.as_dvec3() * multiplier as f64;
        if desired == DVec3::ZERO {
            return false;
        }

        let moved = world.sweep_bounding_box(state.bounding_box, desired);
        for axis in 0..3 {
            if (moved[axis] - desired[axis]).abs() > COLLISION_EPSILON {
                state.velocity[axis] = 0.0;
            }
        }
        if moved == DVec3::ZERO {
            return false;
        }

        let landed = desired.y < 0.0 && (moved.y - desired.y).abs() > COLLISION_EPSILON;
        state.position += moved;
        state.on_ground = landed.then_some(true);
        state.recenter(dimensions);
        true
    }

    /// Moves the entity into the chunk its position falls in.
    pub(crate) fn update_chunk(self: &Arc<Self>) {
        let Some(world) = self.world() else {
            return;
        };

        let mut current = self.chunk.lock();
        if self.is_removed() {
            return;
        }

        // Read under the chunk lock so the last mover wins
        let position = self.position();
        let target = world.get_chunk(chunk_coord(position.x), chunk_coord(position.z)).cloned();
        self.relocate(&mut current, target);
    }

    fn relocate(self: &Arc<Self>, current: &mut Option<Arc<Chunk>>, target: Option<Arc<Chunk>>) {
        match (current.as_ref(), target.as_ref()) {
            (Some(old), Some(new)) if Arc::ptr_eq(old, new) => return,
            (None, None) => return,
            _ => {}
        }

        let id = self.id();
        if let Some(old) = current.take() {
            old.remove_entity(id);
        }

        match &target {
            Some(new) => {
                new.add_entity(self.clone());
                trace!(id, chunk_x = new.x(), chunk_z = new.z(), "entity changed chunk");
            },
            None => warn!(id, "entity left the chunk grid"),
        }
        *current = target;
    }

    /// Takes the entity out of the chunk index without removing it from its
    /// world. The next move puts it back.
    pub fn remove_from_chunk(&self) -> bool {
        match self.chunk.lock().take() {
            Some(chunk) => chunk.remove_entity(self.id()),
            None => false,
        }
    }

    pub(crate) fn mark_removed(&self) {
        let mut chunk = self.chunk.lock();
        if let Some(chunk) = chunk.take() {
            chunk.remove_entity(self.id());
        }
        self.id.store(REMOVED_ENTITY_ID, Ordering::Release);
    }

    /// Entities whose bounding boxes intersect this entity's box grown by
    /// the given amounts. The entity itself is never included.
    pub fn nearby_entities(&self, dx: f64, dy: f64, dz: f64, filter: EntityFilter) -> Vec<Arc<Entity>> {
        let Some(world) = self.world() else {
            return Vec::new();
        };

        let (bounds, position) = {
            let state = self.state.lock();
            (state.bounding_box.grow(dx, dy, dz), state.position)
        };

        let config = world.config();
        let (min_x, max_x) = chunk_span(position.x, dx, config.chunks_x);
        let (min_z, max_z) = chunk_span(position.z, dz, config.chunks_z);
        let own_id = self.id();

        let mut nearby = Vec::new();
        for chunk_x in min_x..=max_x {
            for chunk_z in min_z..=max_z {
                let Some(chunk) = world.get_chunk(chunk_x, chunk_z) else {
                    continue;
                };
                if !chunk.is_loaded() {
                    continue;
                }

                for entity in chunk.entities() {
                    if entity.id() == own_id || !filter.matches(entity.entity_type) {
                        continue;
                    }
                    if entity.bounding_box().intersects(&bounds) {
                        nearby.push(entity);
                    }
                }
            }
        }
        nearby
    }
}

/// Chunks within reach of `coordinate` grown by `extent`, limited to the
/// `0..chunks` grid. The range is empty when nothing in the grid is in reach.
fn chunk_span(coordinate: f64, extent: f64, chunks: i32) -> (i32, i32) {
    let center = chunk_coord(coordinate);
    // Saturating float to int cast, so an unbounded extent covers the grid
    let range = ((extent.abs() / CHUNK_WIDTH as f64).ceil() as i32).saturating_add(1);
    (center.saturating_sub(range).max(0), center.saturating_add(range).min(chunks - 1))
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id())
            .field("entity_type", &self.entity_type)
            .field("position", &self.position())
            .finish()
    }
}
