use std::sync::Arc;

use diorite_core_server::{config::WorldConfig, entity::EntityIdCounter, world::World};
use diorite_mc_protocol::types::GameProfile;

mod fake_player;
pub use fake_player::*;

#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {{
        eprintln!("[{}:{}] {}", file!(), line!(), format!($($arg)*));
    }};
}

pub fn create_game_profile(username: &str) -> GameProfile {
    GameProfile {
        uuid: 0xd0e05de76067454dbeaec6d19d886191 ^ username.len() as u128,
        username: username.into(),
    }
}

pub fn create_world() -> Arc<World> {
    World::new(WorldConfig::default(), Arc::new(EntityIdCounter::new())).unwrap()
}
