use std::sync::Arc;

use diorite_mc_constants::entity::EntityType;
use diorite_mc_protocol::types::GameProfile;
use diorite_network::Connection;
use glam::DVec3;
use rustc_hash::FxHashMap;
use strum::IntoEnumIterator;

use crate::{player::Player, world::World};

use super::Entity;

pub type EntityConstructor = Box<dyn Fn(&Arc<World>, i32, DVec3) -> Entity + Send + Sync>;

/// Builds entities by type. Players are created through
/// [`EntityFactory::create_player`] and cannot be registered.
pub struct EntityFactory {
    constructors: FxHashMap<EntityType, EntityConstructor>,
}

impl EntityFactory {
    pub fn empty() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    /// A factory that can build every non-player entity type.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        for entity_type in EntityType::iter().filter(|entity_type| !entity_type.is_player()) {
            factory.register(entity_type, move |world, id, position| Entity::new(world, id, entity_type, position));
        }
        factory
    }

    /// Replaces the constructor for `entity_type`. Returns `false` for
    /// players, which cannot be constructed here.
    pub fn register<F>(&mut self, entity_type: EntityType, constructor: F) -> bool
    where
        F: Fn(&Arc<World>, i32, DVec3) -> Entity + Send + Sync + 'static,
    {
        if entity_type.is_player() {
            return false;
        }
        self.constructors.insert(entity_type, Box::new(constructor));
        true
    }

    pub fn is_registered(&self, entity_type: EntityType) -> bool {
        self.constructors.contains_key(&entity_type)
    }

    /// Builds an entity with a fresh id. The entity is not yet part of the
    /// world; see [`World::add_entity`].
    pub fn create_entity(&self, world: &Arc<World>, entity_type: EntityType, position: DVec3) -> Option<Arc<Entity>> {
        let constructor = self.constructors.get(&entity_type)?;
        Some(Arc::new(constructor(world, world.next_entity_id(), position)))
    }

    pub fn create_entity_by_name(&self, world: &Arc<World>, name: &str, position: DVec3) -> Option<Arc<Entity>> {
        self.create_entity(world, EntityType::from_name(name)?, position)
    }

    pub fn create_player(&self, world: &Arc<World>, profile: GameProfile, connection: Option<Arc<dyn Connection>>,
            position: DVec3) -> Arc<Player> {
        Player::new(world, world.next_entity_id(), profile, connection, position)
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use diorite_mc_protocol::types::GameProfile;

    use crate::{config::WorldConfig, entity::EntityIdCounter};

    use super::*;

    fn world() -> Arc<World> {
        World::new(WorldConfig::default(), Arc::new(EntityIdCounter::new())).unwrap()
    }

    #[test]
    fn every_non_player_type_is_registered() {
        let factory = EntityFactory::new();
        for entity_type in EntityType::iter() {
            assert_eq!(factory.is_registered(entity_type), !entity_type.is_player(), "{:?}", entity_type);
        }
        assert!(!EntityFactory::empty().is_registered(EntityType::Pig));
    }

    #[test]
    fn players_cannot_be_registered() {
        let mut factory = EntityFactory::empty();
        assert!(!factory.register(EntityType::Player, |world, id, position| Entity::new(world, id, EntityType::Player, position)));
        assert!(!factory.is_registered(EntityType::Player));
    }

    #[test]
    fn registered_constructor_replaces_the_default() {
        let world = world();
        let mut factory = EntityFactory::new();
        factory.register(EntityType::Pig, |world, id, position| Entity::with_uuid(world, id, 7, EntityType::Pig, position));

        let pig = factory.create_entity(&world, EntityType::Pig, DVec3::new(1.0, 4.0, 1.0)).unwrap();
        assert_eq!(pig.uuid(), 7);
        assert_eq!(pig.entity_type(), EntityType::Pig);
    }

    #[test]
    fn created_entities_are_not_added() {
        let world = world();
        let factory = EntityFactory::new();

        let first = factory.create_entity(&world, EntityType::Zombie, DVec3::new(1.0, 4.0, 1.0)).unwrap();
        let second = factory.create_entity_by_name(&world, "minecraft:zombie", DVec3::new(1.0, 4.0, 1.0)).unwrap();
        assert_ne!(first.id(), second.id());
        assert!(first.current_chunk().is_none());
        assert_eq!(world.entity_count(), 0);

        assert!(factory.create_entity_by_name(&world, "minecraft:player", DVec3::ZERO).is_none());
    }

    #[test]
    fn players_keep_their_profile_uuid() {
        let world = world();
        let profile = GameProfile { uuid: 0xabcdef, username: "steve".into() };

        let player = EntityFactory::new().create_player(&world, profile, None, DVec3::new(1.0, 4.0, 1.0));
        assert_eq!(player.entity().uuid(), 0xabcdef);
        assert_eq!(player.entity().entity_type(), EntityType::Player);
        assert_eq!(world.player_count(), 0);
    }
}
