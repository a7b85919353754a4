pub mod chunk;
pub mod chunk_section;
mod tick;
mod world;

pub use tick::{DRIVER_WORKER, TickContext};
pub use world::*;

pub const CHUNK_WIDTH: i32 = 16;

/// Chunk coordinate of a block coordinate.
pub fn chunk_coord(coordinate: f64) -> i32 {
    (coordinate.floor() as i32) >> 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_coords_round_down() {
        assert_eq!(chunk_coord(0.0), 0);
        assert_eq!(chunk_coord(15.99), 0);
        assert_eq!(chunk_coord(16.0), 1);
        assert_eq!(chunk_coord(-0.5), -1);
        assert_eq!(chunk_coord(-16.0), -1);
        assert_eq!(chunk_coord(-16.01), -2);
    }
}
