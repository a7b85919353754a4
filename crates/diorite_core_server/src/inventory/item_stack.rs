use std::sync::{Arc, atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering}};

use diorite_mc_constants::item::{Material, NoSuchMaterialError};
use diorite_mc_protocol::types::ProtocolItemStack;

/// Per-stack data that takes part in stack equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ItemData {
    pub damage: u16,
    pub display_name: Option<Arc<str>>,
}

/// A stack of items as stored in a slot.
///
/// Stacks live behind an `Arc` inside slot arrays, and the same instance is
/// handed out to every reader. The amount and the dirty flag may change in
/// place; everything else is fixed for the life of the stack.
#[derive(Debug)]
pub struct ItemStack {
    material: Material,
    amount: AtomicU8,
    data: ItemData,
    dirty: AtomicBool,
    origin: AtomicU64,
}

pub(crate) const NO_ORIGIN: u64 = 0;

impl ItemStack {
    pub fn new(material: Material, amount: u8) -> Self {
        Self::with_data(material, amount, ItemData::default())
    }

    pub fn single(material: Material) -> Self {
        Self::new(material, 1)
    }

    pub fn with_data(material: Material, amount: u8, data: ItemData) -> Self {
        Self {
            material,
            amount: AtomicU8::new(amount),
            data,
            dirty: AtomicBool::new(true),
            origin: AtomicU64::new(NO_ORIGIN),
        }
    }

    /// Copy of this stack with a different amount.
    pub fn with_amount(&self, amount: u8) -> Self {
        Self::with_data(self.material, amount, self.data.clone())
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn amount(&self) -> u8 {
        self.amount.load(Ordering::Acquire)
    }

    /// Changes the amount in place. A stack whose amount drops to zero is
    /// removed from its slot on the next soft update.
    pub fn set_amount(&self, amount: u8) {
        self.amount.store(amount, Ordering::Release);
        self.set_dirty();
    }

    pub fn data(&self) -> &ItemData {
        &self.data
    }

    pub fn max_stack_size(&self) -> u8 {
        self.material.max_stack_size()
    }

    pub fn is_full(&self) -> bool {
        self.amount() >= self.max_stack_size()
    }

    pub fn is_empty(&self) -> bool {
        self.material.is_air() || self.amount() == 0
    }

    /// Same material and data, ignoring the amount.
    pub fn is_similar(&self, other: &ItemStack) -> bool {
        self.material == other.material && self.data == other.data
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn set_dirty(&self) {
        self.dirty.store(true, Ordering::Release);
    }

    /// Clears the dirty flag, returning whether it was set.
    pub fn set_clean(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }

    /// Tag of the slot array this instance was last stored into.
    pub(crate) fn origin(&self) -> u64 {
        self.origin.load(Ordering::Acquire)
    }

    pub(crate) fn set_origin(&self, owner: u64) {
        self.origin.store(owner, Ordering::Release);
    }

    pub fn to_protocol(&self) -> ProtocolItemStack {
        ProtocolItemStack::from(self)
    }
}

impl Clone for ItemStack {
    /// Clones are new stacks: dirty, and not yet stored anywhere.
    fn clone(&self) -> Self {
        self.with_amount(self.amount())
    }
}

impl PartialEq for ItemStack {
    fn eq(&self, other: &Self) -> bool {
        self.material == other.material && self.amount() == other.amount() && self.data == other.data
    }
}

impl Eq for ItemStack {}

impl TryFrom<&ProtocolItemStack> for ItemStack {
    type Error = NoSuchMaterialError;

    fn try_from(protocol_itemstack: &ProtocolItemStack) -> Result<Self, Self::Error> {
        let material = Material::try_from(protocol_itemstack.item)?;
        let data = ItemData {
            damage: protocol_itemstack.damage,
            display_name: protocol_itemstack.display_name.as_deref().map(Arc::from),
        };
        Ok(ItemStack::with_data(material, protocol_itemstack.count.max(0) as u8, data))
    }
}

impl From<&ItemStack> for ProtocolItemStack {
    fn from(itemstack: &ItemStack) -> Self {
        ProtocolItemStack {
            item: itemstack.material.id(),
            count: itemstack.amount().min(i8::MAX as u8) as i8,
            damage: itemstack.data.damage,
            display_name: itemstack.data.display_name.as_deref().map(String::from),
        }
    }
}

/// Wire form of an optional slot. Empty stacks are sent as no item.
pub(crate) fn to_protocol_slot(item: Option<&ItemStack>) -> Option<ProtocolItemStack> {
    item.filter(|item| !item.is_empty()).map(ProtocolItemStack::from)
}
