use std::sync::{Arc, atomic::{AtomicBool, Ordering}};

use diorite_mc_constants::item::Material;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::entity::Entity;

use super::chunk_section::{ChunkSection, SECTION_WIDTH};

/// A 16-block wide column of sections, plus the entities currently inside
/// it.
#[derive(Debug)]
pub struct Chunk {
    x: i32,
    z: i32,
    loaded: AtomicBool,
    block_sections: Vec<ChunkSection>,
    entities: RwLock<FxHashMap<i32, Arc<Entity>>>,
}

impl Chunk {
    pub fn new(x: i32, z: i32, section_count: usize) -> Self {
        Self {
            x,
            z,
            loaded: AtomicBool::new(true),
            block_sections: (0..section_count).map(|_| ChunkSection::new_empty()).collect(),
            entities: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Unloaded chunks keep their contents but are skipped by entity queries.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Release);
    }

    pub fn height(&self) -> i32 {
        (self.block_sections.len() * SECTION_WIDTH) as i32
    }

    fn section_at(&self, y: i32) -> Option<&ChunkSection> {
        if y < 0 {
            return None;
        }
        self.block_sections.get(y as usize / SECTION_WIDTH)
    }

    /// `x` and `z` are world coordinates; only their low four bits are used.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<Material> {
        let section = self.section_at(y)?;
        Some(section.get_block((x & 0xF) as u8, (y & 0xF) as u8, (z & 0xF) as u8))
    }

    /// Returns the previous block if it changed.
    pub fn set_block(&self, x: i32, y: i32, z: i32, material: Material) -> Option<Material> {
        let section = self.section_at(y)?;
        section.set_block((x & 0xF) as u8, (y & 0xF) as u8, (z & 0xF) as u8, material)
    }

    /// Fills every block below `height` with `material`.
    pub(crate) fn fill_ground(&self, height: i32, material: Material) {
        for (index, section) in self.block_sections.iter().enumerate() {
            let bottom = (index * SECTION_WIDTH) as i32;
            let layers = (height - bottom).clamp(0, SECTION_WIDTH as i32) as u8;
            if layers as usize == SECTION_WIDTH {
                section.fill_blocks(material);
            } else if layers > 0 {
                section.fill_layers(0, layers, material);
            }
        }
    }

    pub(crate) fn add_entity(&self, entity: Arc<Entity>) {
        self.entities.write().insert(entity.id(), entity);
    }

    pub(crate) fn remove_entity(&self, entity_id: i32) -> bool {
        self.entities.write().remove(&entity_id).is_some()
    }

    pub fn contains_entity(&self, entity_id: i32) -> bool {
        self.entities.read().contains_key(&entity_id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.read().len()
    }

    /// Snapshot of the entities in this chunk.
    pub fn entities(&self) -> Vec<Arc<Entity>> {
        self.entities.read().values().cloned().collect()
    }
}
