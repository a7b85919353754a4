use diorite_mc_constants::entity::{EntityCategory, EntityType};
use diorite_mc_protocol::types::{MetadataEntry, MetadataValue, ProtocolItemStack};

/// Bits of the shared flags byte at index 0.
pub mod flags {
    pub const ON_FIRE: u8 = 0x01;
    pub const SNEAKING: u8 = 0x02;
    pub const SPRINTING: u8 = 0x08;
    pub const INVISIBLE: u8 = 0x20;
    pub const GLOWING: u8 = 0x40;
}

const INDEX_COUNT: usize = 16;

#[derive(Debug, Clone, Default)]
enum MetadataChanges<const T: usize> {
    #[default]
    NoChanges,
    SingleChange {
        index: usize
    },
    ManyChanges {
        indices: [bool; T]
    }
}

impl<const T: usize> MetadataChanges<T> {
    fn mark_dirty(&mut self, index: usize) {
        match self {
            Self::NoChanges => {
                *self = Self::SingleChange { index }
            },
            Self::SingleChange { index: old_index } => {
                if *old_index != index {
                    let mut indices = [false; T];
                    indices[*old_index] = true;
                    indices[index] = true;
                    *self = Self::ManyChanges { indices }
                }
            },
            Self::ManyChanges { indices } => {
                indices[index] = true;
            }
        }
    }

    fn is_dirty(&self) -> bool {
        !matches!(self, Self::NoChanges)
    }

    fn take(&mut self) -> [bool; T] {
        match std::mem::take(self) {
            Self::NoChanges => [false; T],
            Self::SingleChange { index } => {
                let mut indices = [false; T];
                indices[index] = true;
                indices
            },
            Self::ManyChanges { indices } => indices,
        }
    }
}

macro_rules! entity_metadata {
    { $( $(#[$attr:meta])* $name:ident { $( $index:literal => $field:ident: $ty:ty = $default:expr, as $variant:ident ),* $(,)? } )* } => {
        $(
            $(#[$attr])*
            #[readonly::make]
            #[derive(Debug, Clone)]
            pub struct $name {
                changes: MetadataChanges<INDEX_COUNT>,
                $( pub $field: $ty, )*
            }

            impl Default for $name {
                fn default() -> Self {
                    Self {
                        changes: MetadataChanges::default(),
                        $( $field: $default, )*
                    }
                }
            }

            impl $name {
                paste::paste! {
                    $(
                        pub fn [<set_ $field>](&mut self, value: $ty) {
                            if self.$field != value {
                                self.changes.mark_dirty($index);
                                self.$field = value;
                            }
                        }
                    )*
                }

                pub fn has_changes(&self) -> bool {
                    self.changes.is_dirty()
                }

                /// Entries changed since the last call.
                pub fn write_changes(&mut self) -> Vec<MetadataEntry> {
                    let changed = self.changes.take();
                    let mut entries = Vec::new();
                    $(
                        if changed[$index] {
                            entries.push(MetadataEntry {
                                index: $index,
                                value: MetadataValue::$variant(self.$field.clone()),
                            });
                        }
                    )*
                    entries
                }

                /// Every entry, as sent when an entity first becomes visible.
                pub fn write_all(&self) -> Vec<MetadataEntry> {
                    vec![
                        $( MetadataEntry {
                            index: $index,
                            value: MetadataValue::$variant(self.$field.clone()),
                        }, )*
                    ]
                }
            }
        )*
    }
}

entity_metadata! {
    BaseMetadata {
        0 => flags: u8 = 0, as Byte,
        1 => air_ticks: i32 = 300, as VarInt,
        2 => custom_name: Option<String> = None, as OptString,
        3 => custom_name_visible: bool = false, as Boolean,
        4 => silent: bool = false, as Boolean,
        5 => no_gravity: bool = false, as Boolean,
    }

    ItemMetadata {
        0 => flags: u8 = 0, as Byte,
        1 => air_ticks: i32 = 300, as VarInt,
        2 => custom_name: Option<String> = None, as OptString,
        3 => custom_name_visible: bool = false, as Boolean,
        4 => silent: bool = false, as Boolean,
        5 => no_gravity: bool = false, as Boolean,
        6 => item: Option<ProtocolItemStack> = None, as Item,
    }

    LivingMetadata {
        0 => flags: u8 = 0, as Byte,
        1 => air_ticks: i32 = 300, as VarInt,
        2 => custom_name: Option<String> = None, as OptString,
        3 => custom_name_visible: bool = false, as Boolean,
        4 => silent: bool = false, as Boolean,
        5 => no_gravity: bool = false, as Boolean,
        6 => hand_state: u8 = 0, as Byte,
        7 => health: f32 = 20.0, as Float,
        8 => potion_color: i32 = 0, as VarInt,
        9 => potion_ambient: bool = false, as Boolean,
        10 => arrow_count: i32 = 0, as VarInt,
    }

    PlayerMetadata {
        0 => flags: u8 = 0, as Byte,
        1 => air_ticks: i32 = 300, as VarInt,
        2 => custom_name: Option<String> = None, as OptString,
        3 => custom_name_visible: bool = false, as Boolean,
        4 => silent: bool = false, as Boolean,
        5 => no_gravity: bool = false, as Boolean,
        6 => hand_state: u8 = 0, as Byte,
        7 => health: f32 = 20.0, as Float,
        8 => potion_color: i32 = 0, as VarInt,
        9 => potion_ambient: bool = false, as Boolean,
        10 => arrow_count: i32 = 0, as VarInt,
        11 => additional_hearts: f32 = 0.0, as Float,
        12 => score: i32 = 0, as VarInt,
        13 => skin_parts: u8 = 0x7f, as Byte,
        14 => main_hand: u8 = 1, as Byte,
    }
}

/// Typed metadata of one entity. The variant follows the entity's category.
#[derive(Debug, Clone)]
pub enum EntityMetadata {
    Base(BaseMetadata),
    Item(ItemMetadata),
    Living(LivingMetadata),
    Player(PlayerMetadata),
}

macro_rules! dispatch {
    ($self:expr, $metadata:ident => $body:expr) => {
        match $self {
            EntityMetadata::Base($metadata) => $body,
            EntityMetadata::Item($metadata) => $body,
            EntityMetadata::Living($metadata) => $body,
            EntityMetadata::Player($metadata) => $body,
        }
    };
}

impl EntityMetadata {
    pub fn for_type(entity_type: EntityType) -> Self {
        match entity_type.category() {
            EntityCategory::Player => EntityMetadata::Player(PlayerMetadata::default()),
            EntityCategory::Living => EntityMetadata::Living(LivingMetadata::default()),
            EntityCategory::Item => EntityMetadata::Item(ItemMetadata::default()),
            _ => EntityMetadata::Base(BaseMetadata::default()),
        }
    }

    pub fn has_changes(&self) -> bool {
        dispatch!(self, metadata => metadata.has_changes())
    }

    pub fn write_changes(&mut self) -> Vec<MetadataEntry> {
        dispatch!(self, metadata => metadata.write_changes())
    }

    pub fn write_all(&self) -> Vec<MetadataEntry> {
        dispatch!(self, metadata => metadata.write_all())
    }

    pub fn flags(&self) -> u8 {
        dispatch!(self, metadata => metadata.flags)
    }

    pub fn set_flags(&mut self, flags: u8) {
        dispatch!(self, metadata => metadata.set_flags(flags))
    }

    pub fn set_flag(&mut self, flag: u8, enabled: bool) {
        let flags = if enabled { self.flags() | flag } else { self.flags() & !flag };
        self.set_flags(flags);
    }

    pub fn custom_name(&self) -> Option<&str> {
        dispatch!(self, metadata => metadata.custom_name.as_deref())
    }

    pub fn set_custom_name(&mut self, name: Option<String>) {
        dispatch!(self, metadata => metadata.set_custom_name(name))
    }

    pub fn no_gravity(&self) -> bool {
        dispatch!(self, metadata => metadata.no_gravity)
    }

    pub fn set_no_gravity(&mut self, no_gravity: bool) {
        dispatch!(self, metadata => metadata.set_no_gravity(no_gravity))
    }

    pub fn set_silent(&mut self, silent: bool) {
        dispatch!(self, metadata => metadata.set_silent(silent))
    }

    pub fn as_item_mut(&mut self) -> Option<&mut ItemMetadata> {
        match self {
            EntityMetadata::Item(metadata) => Some(metadata),
            _ => None,
        }
    }

    pub fn as_living_mut(&mut self) -> Option<&mut LivingMetadata> {
        match self {
            EntityMetadata::Living(metadata) => Some(metadata),
            _ => None,
        }
    }

    pub fn as_player_mut(&mut self) -> Option<&mut PlayerMetadata> {
        match self {
            EntityMetadata::Player(metadata) => Some(metadata),
            _ => None,
        }
    }
}
