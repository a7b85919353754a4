use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;

/// Tick rate the physics constants are tuned for.
pub const BASE_TICK_RATE: f32 = 20.0;

pub const MAX_VIEW_DISTANCE: u8 = 32;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub chunks_x: i32,
    pub chunks_z: i32,
    pub section_count: usize,
    /// Blocks `0..ground_height` are generated as solid ground.
    pub ground_height: i32,
    pub tick_rate: u32,
    pub gravity: f32,
    pub vertical_drag: f32,
    /// In chunks.
    pub view_distance: u8,
    /// Ticks before a dropped item can be collected.
    pub pickup_delay: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunks_x: 8,
            chunks_z: 8,
            section_count: 16,
            ground_height: 4,
            tick_rate: 20,
            gravity: 0.08,
            vertical_drag: 0.98,
            view_distance: 4,
            pickup_delay: 10,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("chunk grid must be at least 1x1, got {0}x{1}")]
    InvalidGrid(i32, i32),
    #[error("a world needs at least one chunk section")]
    NoSections,
    #[error("ground height {0} is outside of the world")]
    InvalidGroundHeight(i32),
    #[error("tick rate must be positive")]
    ZeroTickRate,
    #[error("view distance must be between 1 and {MAX_VIEW_DISTANCE}, got {0}")]
    InvalidViewDistance(u8),
}

impl WorldConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("unable to read world config {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("invalid world config {}", path.display()))
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: WorldConfig = serde_json::from_str(json).context("malformed json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunks_x <= 0 || self.chunks_z <= 0 {
            return Err(ConfigError::InvalidGrid(self.chunks_x, self.chunks_z));
        }
        if self.section_count == 0 {
            return Err(ConfigError::NoSections);
        }
        if self.ground_height < 0 || self.ground_height > self.world_height() {
            return Err(ConfigError::InvalidGroundHeight(self.ground_height));
        }
        if self.tick_rate == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        if self.view_distance == 0 || self.view_distance > MAX_VIEW_DISTANCE {
            return Err(ConfigError::InvalidViewDistance(self.view_distance));
        }
        Ok(())
    }

    pub fn world_height(&self) -> i32 {
        self.section_count as i32 * 16
    }

    /// Scales per-tick motion so that entities move at the same speed in
    /// blocks per second regardless of the configured tick rate.
    pub fn speed_multiplier(&self) -> f32 {
        BASE_TICK_RATE / self.tick_rate as f32
    }
}
