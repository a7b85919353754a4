pub mod entity;
pub mod item;
