use diorite_mc_constants::item::Material;
use parking_lot::RwLock;

pub const SECTION_WIDTH: usize = 16;
const SECTION_VOLUME: usize = SECTION_WIDTH * SECTION_WIDTH * SECTION_WIDTH;

#[derive(Debug, Default)]
struct SectionBlocks {
    /// Allocated on the first non-air block.
    blocks: Option<Box<[Material]>>,
    non_air_blocks: u16,
}

/// A 16x16x16 cube of blocks.
#[derive(Debug, Default)]
pub struct ChunkSection {
    data: RwLock<SectionBlocks>,
}

fn index(x: u8, y: u8, z: u8) -> usize {
    debug_assert!((x as usize) < SECTION_WIDTH && (y as usize) < SECTION_WIDTH && (z as usize) < SECTION_WIDTH);
    (y as usize) << 8 | (z as usize) << 4 | x as usize
}

impl ChunkSection {
    pub fn new_empty() -> Self {
        Self::default()
    }

    pub fn filled(material: Material) -> Self {
        let section = Self::new_empty();
        section.fill_blocks(material);
        section
    }

    pub fn fill_blocks(&self, material: Material) {
        let mut data = self.data.write();
        if material.is_air() {
            *data = SectionBlocks::default();
        } else {
            data.blocks = Some(vec![material; SECTION_VOLUME].into_boxed_slice());
            data.non_air_blocks = SECTION_VOLUME as u16;
        }
    }

    /// Fills the horizontal layers `from_y..to_y`.
    pub fn fill_layers(&self, from_y: u8, to_y: u8, material: Material) {
        for y in from_y..to_y.min(SECTION_WIDTH as u8) {
            for z in 0..SECTION_WIDTH as u8 {
                for x in 0..SECTION_WIDTH as u8 {
                    self.set_block(x, y, z, material);
                }
            }
        }
    }

    /// Returns the previous block if it changed.
    pub fn set_block(&self, x: u8, y: u8, z: u8, material: Material) -> Option<Material> {
        let mut data = self.data.write();
        let data = &mut *data;

        if data.blocks.is_none() {
            if material.is_air() {
                return None;
            }
            data.blocks = Some(vec![Material::Air; SECTION_VOLUME].into_boxed_slice());
        }
        let blocks = data.blocks.as_mut()?;

        let previous = std::mem::replace(&mut blocks[index(x, y, z)], material);
        if previous == material {
            return None;
        }

        // Update non_air_block count
        if previous.is_air() {
            data.non_air_blocks += 1;
        } else if material.is_air() {
            data.non_air_blocks -= 1;
        }

        Some(previous)
    }

    pub fn get_block(&self, x: u8, y: u8, z: u8) -> Material {
        match &self.data.read().blocks {
            Some(blocks) => blocks[index(x, y, z)],
            None => Material::Air,
        }
    }

    pub fn get_non_air_count(&self) -> u16 {
        self.data.read().non_air_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_section_reads_air() {
        let section = ChunkSection::new_empty();
        assert_eq!(section.get_block(3, 4, 5), Material::Air);
        assert_eq!(section.set_block(3, 4, 5, Material::Air), None);
        assert_eq!(section.get_non_air_count(), 0);
    }

    #[test]
    fn set_block_tracks_non_air_count() {
        let section = ChunkSection::new_empty();
        assert_eq!(section.set_block(0, 0, 0, Material::Stone), Some(Material::Air));
        assert_eq!(section.set_block(0, 0, 0, Material::Stone), None);
        assert_eq!(section.set_block(15, 15, 15, Material::Dirt), Some(Material::Air));
        assert_eq!(section.get_non_air_count(), 2);

        assert_eq!(section.set_block(0, 0, 0, Material::Air), Some(Material::Stone));
        assert_eq!(section.get_non_air_count(), 1);
        assert_eq!(section.get_block(15, 15, 15), Material::Dirt);
    }

    #[test]
    fn fill_layers() {
        let section = ChunkSection::new_empty();
        section.fill_layers(0, 4, Material::Grass);
        assert_eq!(section.get_non_air_count(), 4 * 256);
        assert_eq!(section.get_block(7, 3, 7), Material::Grass);
        assert_eq!(section.get_block(7, 4, 7), Material::Air);

        section.fill_blocks(Material::Air);
        assert_eq!(section.get_non_air_count(), 0);
        assert_eq!(ChunkSection::filled(Material::Stone).get_non_air_count(), 4096);
    }
}
