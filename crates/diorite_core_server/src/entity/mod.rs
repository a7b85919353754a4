use std::sync::atomic::{AtomicI32, Ordering};

mod entity;
mod factory;
pub mod metadata;
mod tracker;

pub use entity::*;
pub use factory::{EntityConstructor, EntityFactory};
pub use tracker::{EntityTracker, PlayerView};

/// Source of entity ids for every world of a universe. Ids start at 1 and
/// are never reused.
#[derive(Debug)]
pub struct EntityIdCounter(AtomicI32);

impl EntityIdCounter {
    pub fn new() -> Self {
        Self(AtomicI32::new(1))
    }

    pub fn next_entity_id(&self) -> i32 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for EntityIdCounter {
    fn default() -> Self {
        Self::new()
    }
}
