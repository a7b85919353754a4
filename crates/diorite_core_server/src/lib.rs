use std::sync::Arc;

use slab::Slab;
use tracing::info;

use config::{ConfigError, WorldConfig};
use entity::EntityIdCounter;
use inventory::recipe::{RecipeManager, SimpleRecipeManager};
use world::World;

pub mod config;
pub mod entity;
pub mod inventory;
pub mod player;
pub mod types;
pub mod world;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorldId(usize);

/// Every world of a server. Worlds share one entity id counter so ids stay
/// unique when entities are looked up across worlds.
pub struct Universe {
    ids: Arc<EntityIdCounter>,
    worlds: Slab<Arc<World>>,
    recipes: Arc<dyn RecipeManager>,
}

impl Universe {
    pub fn new() -> Self {
        Self::with_recipes(Arc::new(SimpleRecipeManager::default()))
    }

    pub fn with_recipes(recipes: Arc<dyn RecipeManager>) -> Self {
        Self {
            ids: Arc::new(EntityIdCounter::new()),
            worlds: Slab::new(),
            recipes,
        }
    }

    pub fn create_world(&mut self, config: WorldConfig) -> Result<WorldId, ConfigError> {
        let world = World::with_parts(config, self.ids.clone(), self.recipes.clone(), Default::default())?;
        let id = self.worlds.insert(world);
        info!(world = id, "added world to universe");
        Ok(WorldId(id))
    }

    pub fn world(&self, world_id: WorldId) -> Option<&Arc<World>> {
        self.worlds.get(world_id.0)
    }

    pub fn remove_world(&mut self, world_id: WorldId) -> Option<Arc<World>> {
        self.worlds.try_remove(world_id.0)
    }

    pub fn worlds(&self) -> impl Iterator<Item = (WorldId, &Arc<World>)> {
        self.worlds.iter().map(|(id, world)| (WorldId(id), world))
    }

    pub fn ids(&self) -> &Arc<EntityIdCounter> {
        &self.ids
    }

    /// Ticks every world in turn.
    pub fn tick(&self) {
        for (_, world) in &self.worlds {
            world.tick();
        }
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}
