use num_enum::{IntoPrimitive, TryFromPrimitive};

// Item Stack

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProtocolItemStack {
    pub item: u16,
    pub count: i8,
    pub damage: u16,
    pub display_name: Option<String>,
}

impl ProtocolItemStack {
    pub fn is_empty(&self) -> bool {
        self.item == 0 || self.count == 0
    }
}

// Equipment

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum EquipmentSlot {
    MainHand = 0,
    OffHand = 1,
    Feet = 2,
    Legs = 3,
    Chest = 4,
    Head = 5,
}

// Entity Metadata

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(u8),
    VarInt(i32),
    Float(f32),
    OptString(Option<String>),
    Item(Option<ProtocolItemStack>),
    Boolean(bool),
}

impl MetadataValue {
    /// Serializer id written before the value on the wire.
    pub fn serializer_id(&self) -> u8 {
        match self {
            MetadataValue::Byte(_) => 0,
            MetadataValue::VarInt(_) => 1,
            MetadataValue::Float(_) => 2,
            MetadataValue::OptString(_) => 4,
            MetadataValue::Item(_) => 5,
            MetadataValue::Boolean(_) => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

// Game Profile

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfile {
    pub uuid: u128,
    pub username: String,
}
