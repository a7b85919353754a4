use num_enum::IntoPrimitive;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EntityCategory {
    Player,
    Living,
    Item,
    Projectile,
    Vehicle,
    Other,
}

/// Static per-type data. Replaces one marker type per entity kind.
#[derive(Debug)]
pub struct EntityDimensions {
    pub width: f32,
    pub height: f32,
    pub gravity: bool,
    pub category: EntityCategory,
}

#[derive(Debug, thiserror::Error)]
#[error("No entity type exists for id: {0}")]
pub struct NoSuchEntityTypeError(pub u8);

macro_rules! entity_types {
    { $( $name:ident = $id:literal { width: $width:literal, height: $height:literal, gravity: $gravity:literal, category: $category:ident } ),* $(,)? } => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, IntoPrimitive, EnumString, IntoStaticStr, EnumIter)]
        #[strum(serialize_all = "snake_case")]
        #[repr(u8)]
        pub enum EntityType {
            $( $name = $id, )*
        }

        impl EntityType {
            pub const fn get_dimensions(self) -> &'static EntityDimensions {
                match self {
                    $( EntityType::$name => &EntityDimensions {
                        width: $width,
                        height: $height,
                        gravity: $gravity,
                        category: EntityCategory::$category
                    }, )*
                }
            }
        }

        impl TryFrom<u8> for EntityType {
            type Error = NoSuchEntityTypeError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $( $id => Ok(EntityType::$name), )*
                    _ => Err(NoSuchEntityTypeError(value))
                }
            }
        }
    }
}

entity_types! {
    Item = 1 { width: 0.25, height: 0.25, gravity: true, category: Item },
    ExperienceOrb = 2 { width: 0.5, height: 0.5, gravity: true, category: Other },
    AreaEffectCloud = 3 { width: 6.0, height: 0.5, gravity: false, category: Other },
    Arrow = 10 { width: 0.5, height: 0.5, gravity: true, category: Projectile },
    Snowball = 11 { width: 0.25, height: 0.25, gravity: true, category: Projectile },
    PrimedTnt = 20 { width: 0.98, height: 0.98, gravity: true, category: Other },
    FallingBlock = 21 { width: 0.98, height: 0.98, gravity: true, category: Other },
    ArmorStand = 30 { width: 0.5, height: 1.975, gravity: true, category: Living },
    Boat = 41 { width: 1.375, height: 0.5625, gravity: true, category: Vehicle },
    Minecart = 42 { width: 0.98, height: 0.7, gravity: true, category: Vehicle },
    Zombie = 54 { width: 0.6, height: 1.95, gravity: true, category: Living },
    Pig = 90 { width: 0.9, height: 0.9, gravity: true, category: Living },
    Player = 105 { width: 0.6, height: 1.8, gravity: true, category: Player },
}

impl EntityType {
    pub const fn category(self) -> EntityCategory {
        self.get_dimensions().category
    }

    pub const fn has_gravity(self) -> bool {
        self.get_dimensions().gravity
    }

    pub fn is_player(self) -> bool {
        self == EntityType::Player
    }

    pub fn id(self) -> u8 {
        self.into()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    pub fn from_name(name: &str) -> Option<EntityType> {
        let name = name.strip_prefix("minecraft:").unwrap_or(name);
        name.parse().ok()
    }
}
