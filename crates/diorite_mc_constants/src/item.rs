use num_enum::IntoPrimitive;
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

#[derive(Debug)]
pub struct MaterialProperties {
    pub max_stack_size: u8,
    pub solid: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("No material exists for id: {0}")]
pub struct NoSuchMaterialError(pub u16);

macro_rules! materials {
    { $( $name:ident = $id:literal { max_stack_size: $max:literal, solid: $solid:literal } ),* $(,)? } => {
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, IntoPrimitive, EnumString, IntoStaticStr, EnumIter)]
        #[strum(serialize_all = "snake_case")]
        #[repr(u16)]
        pub enum Material {
            $( $name = $id, )*
        }

        impl Material {
            pub const fn get_properties(self) -> &'static MaterialProperties {
                match self {
                    $( Material::$name => &MaterialProperties { max_stack_size: $max, solid: $solid }, )*
                }
            }
        }

        impl TryFrom<u16> for Material {
            type Error = NoSuchMaterialError;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $( $id => Ok(Material::$name), )*
                    _ => Err(NoSuchMaterialError(value))
                }
            }
        }
    }
}

materials! {
    Air = 0 { max_stack_size: 64, solid: false },
    Stone = 1 { max_stack_size: 64, solid: true },
    Grass = 2 { max_stack_size: 64, solid: true },
    Dirt = 3 { max_stack_size: 64, solid: true },
    Cobblestone = 4 { max_stack_size: 64, solid: true },
    Planks = 5 { max_stack_size: 64, solid: true },
    Bedrock = 7 { max_stack_size: 64, solid: true },
    Water = 9 { max_stack_size: 64, solid: false },
    Sand = 12 { max_stack_size: 64, solid: true },
    Gravel = 13 { max_stack_size: 64, solid: true },
    Log = 17 { max_stack_size: 64, solid: true },
    Glass = 20 { max_stack_size: 64, solid: true },
    Torch = 50 { max_stack_size: 64, solid: false },
    Chest = 54 { max_stack_size: 64, solid: true },
    CraftingTable = 58 { max_stack_size: 64, solid: true },
    IronShovel = 256 { max_stack_size: 1, solid: false },
    Apple = 260 { max_stack_size: 64, solid: false },
    Bow = 261 { max_stack_size: 1, solid: false },
    Arrow = 262 { max_stack_size: 64, solid: false },
    Diamond = 264 { max_stack_size: 64, solid: false },
    IronIngot = 265 { max_stack_size: 64, solid: false },
    DiamondSword = 276 { max_stack_size: 1, solid: false },
    Stick = 280 { max_stack_size: 64, solid: false },
    Bread = 297 { max_stack_size: 64, solid: false },
    IronHelmet = 306 { max_stack_size: 1, solid: false },
    IronChestplate = 307 { max_stack_size: 1, solid: false },
    IronLeggings = 308 { max_stack_size: 1, solid: false },
    IronBoots = 309 { max_stack_size: 1, solid: false },
    Bucket = 325 { max_stack_size: 16, solid: false },
    Snowball = 332 { max_stack_size: 16, solid: false },
    Egg = 344 { max_stack_size: 16, solid: false },
    EnderPearl = 368 { max_stack_size: 16, solid: false },
}

impl Material {
    pub const fn max_stack_size(self) -> u8 {
        self.get_properties().max_stack_size
    }

    pub const fn is_solid(self) -> bool {
        self.get_properties().solid
    }

    /// Air doubles as the "no item" sentinel in slots.
    pub fn is_air(self) -> bool {
        self == Material::Air
    }

    pub fn id(self) -> u16 {
        self.into()
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Accepts both `apple` and `minecraft:apple`.
    pub fn from_name(name: &str) -> Option<Material> {
        let name = name.strip_prefix("minecraft:").unwrap_or(name);
        name.parse().ok()
    }
}
