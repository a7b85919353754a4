mod player;

pub use player::Player;

/// Blocks around a player in which dropped items are collected.
pub const PICKUP_RANGE_HORIZONTAL: f64 = 1.0;
pub const PICKUP_RANGE_VERTICAL: f64 = 0.5;
