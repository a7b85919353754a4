use std::sync::Arc;

use diorite_mc_constants::item::Material;
use diorite_mc_protocol::play::clientbound::{ContainerSetContent, Packet};
use thiserror::Error;

use self::{item_stack::ItemStack, slot_array::SlotArray};

pub mod item_stack;
pub mod slot_array;
pub mod drag;
pub mod recipe;
mod search;
mod sync;
mod viewers;
mod container;
mod player_inventory;

pub use container::{Inventory, InventoryHolder, InventoryType};
pub use drag::DragController;
pub use player_inventory::PlayerInventory;
pub use search::SlotRange;
pub use viewers::Viewers;

/// Role of a slot within its inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotType {
    Result,
    Crafting,
    Armor,
    Container,
    Hotbar,
    OffHand,
    Cursor,
    Outside,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("slot index out of bounds: the max is {0} but the index is {1}")]
pub struct SlotOutOfBoundsError(pub usize, pub usize);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error(transparent)]
    SlotOutOfBounds(#[from] SlotOutOfBoundsError),
    /// The expected stack was never stored in this inventory, so comparing
    /// against it can only be a caller bug.
    #[error("item stack was not obtained from this inventory")]
    ForeignItem,
}

/// Shared behaviour of every inventory: slot access, searching, stacking and
/// viewer synchronization.
///
/// Implementors describe their layout (`slots`, `storage`, `resolve`) and
/// how they diff against viewers; everything else is provided. Searches
/// return `None` where no slot matches.
pub trait InventoryView: Send + Sync {
    /// Backing slots, numbered like the inventory.
    fn slots(&self) -> &SlotArray;
    fn window_id(&self) -> i8;
    fn title(&self) -> &str;
    fn viewers(&self) -> &Viewers;
    fn drag_controller(&self) -> &DragController;
    fn slot_type(&self, slot: usize) -> SlotType;

    /// Ranges that searches and `add` walk, in priority order.
    fn storage(&self) -> Vec<SlotRange>;

    /// Slot changes viewers have not seen yet, consuming dirty flags.
    fn poll_changes(&self) -> Vec<Packet>;

    /// Full contents for a viewer that just opened the inventory. Does not
    /// touch the synchronization state.
    fn contents_packet(&self) -> ContainerSetContent;

    /// Full contents, marking everything as seen by all viewers.
    fn full_contents(&self) -> Vec<Packet>;

    fn size(&self) -> usize {
        self.slots().len()
    }

    /// Array and index holding `slot`.
    fn resolve(&self, slot: usize) -> Option<(&SlotArray, usize)> {
        (slot < self.slots().len()).then(|| (self.slots(), slot))
    }

    fn get_item(&self, slot: usize) -> Result<Option<Arc<ItemStack>>, SlotOutOfBoundsError> {
        let (slots, index) = self.resolve(slot).ok_or(SlotOutOfBoundsError(self.size(), slot))?;
        Ok(slots.get(index))
    }

    /// Stores `item`, returning the stack it replaced.
    fn set_item(&self, slot: usize, item: Option<ItemStack>) -> Result<Option<Arc<ItemStack>>, SlotOutOfBoundsError> {
        let (slots, index) = self.resolve(slot).ok_or(SlotOutOfBoundsError(self.size(), slot))?;
        Ok(slots.get_and_set(index, item.map(Arc::new)))
    }

    /// Atomically replaces the content of `slot` if it still equals
    /// `expected`. `expected` must have been obtained from this inventory.
    fn replace(&self, slot: usize, expected: Option<&Arc<ItemStack>>, item: Option<ItemStack>) -> Result<bool, InventoryError> {
        let (slots, index) = self.resolve(slot).ok_or(SlotOutOfBoundsError(self.size(), slot))?;
        if let Some(expected) = expected {
            if expected.origin() != slots.owner() {
                return Err(InventoryError::ForeignItem);
            }
        }
        Ok(slots.compare_and_set(index, expected.map(|expected| &**expected), item.map(Arc::new)))
    }

    /// Finds the slot currently holding `expected` and replaces it there.
    fn replace_any(&self, expected: &Arc<ItemStack>, item: Option<ItemStack>) -> Result<bool, InventoryError> {
        if expected.origin() != self.slots().owner() {
            return Err(InventoryError::ForeignItem);
        }

        for slot in 0..self.size() {
            let current = self.get_item(slot)?;
            if current.map_or(false, |current| Arc::ptr_eq(&current, expected)) {
                return self.replace(slot, Some(expected), item);
            }
        }
        Ok(false)
    }

    fn contents(&self) -> Vec<Option<Arc<ItemStack>>> {
        (0..self.size())
            .map(|slot| self.resolve(slot).and_then(|(slots, index)| slots.get(index)))
            .collect()
    }

    fn clear(&self) {
        for slot in 0..self.size() {
            if let Some((slots, index)) = self.resolve(slot) {
                slots.set(index, None);
            }
        }
    }

    fn first(&self, item: &ItemStack, with_amount: bool) -> Option<usize> {
        search::first(&self.storage(), |slot| slot.map_or(false, |slot| search::matches(slot, item, with_amount)))
    }

    fn last(&self, item: &ItemStack, with_amount: bool) -> Option<usize> {
        search::last(&self.storage(), |slot| slot.map_or(false, |slot| search::matches(slot, item, with_amount)))
    }

    fn first_material(&self, material: Material) -> Option<usize> {
        search::first(&self.storage(), |slot| slot.map_or(false, |slot| slot.material() == material && !slot.is_empty()))
    }

    fn first_empty(&self) -> Option<usize> {
        search::first(&self.storage(), search::is_empty_slot)
    }

    fn last_empty(&self) -> Option<usize> {
        search::last(&self.storage(), search::is_empty_slot)
    }

    /// First slot with a similar stack that still has room.
    fn first_not_full(&self, item: &ItemStack) -> Option<usize> {
        search::first(&self.storage(), |slot| slot.map_or(false, |slot| slot.is_similar(item) && !slot.is_full()))
    }

    fn last_not_full(&self, item: &ItemStack) -> Option<usize> {
        search::last(&self.storage(), |slot| slot.map_or(false, |slot| slot.is_similar(item) && !slot.is_full()))
    }

    fn contains(&self, item: &ItemStack, with_amount: bool) -> bool {
        self.first(item, with_amount).is_some()
    }

    fn contains_at_least(&self, material: Material, amount: u32) -> bool {
        search::count_material(&self.storage(), material) >= amount
    }

    /// Stacks the items into storage. Returns what did not fit.
    fn add(&self, items: &[ItemStack]) -> Vec<ItemStack> {
        search::add(&self.storage(), items, false)
    }

    fn add_from_end(&self, items: &[ItemStack]) -> Vec<ItemStack> {
        search::add(&self.storage(), items, true)
    }

    /// Removes similar stacks up to each item's amount. Returns the amounts
    /// that could not be found.
    fn remove(&self, items: &[ItemStack]) -> Vec<ItemStack> {
        search::remove(&self.storage(), items)
    }

    /// Sends pending slot changes to viewers as one batch. Returns whether
    /// anything had changed.
    fn soft_update(&self) -> bool {
        let packets = self.poll_changes();
        if packets.is_empty() {
            return false;
        }
        self.viewers().send_packets(&packets);
        true
    }

    /// Sends the full contents to every viewer.
    fn update(&self) {
        let packets = self.full_contents();
        self.viewers().send_packets(&packets);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventorySlot {
    Hotbar(usize),
    Main(usize),
    OffHand,
    Head,
    Chest,
    Legs,
    Feet,
    CraftingInput(usize),
    CraftingResult,
}

impl InventorySlot {
    pub fn from_index(slot: i16) -> std::result::Result<Self, SlotOutOfBoundsError> {
        match slot {
            36..=44 => {
                Ok(InventorySlot::Hotbar(slot as usize - 36))
            }
            9..=35 => {
                Ok(InventorySlot::Main(slot as usize - 9))
            }
            45 => Ok(InventorySlot::OffHand),
            5 => Ok(InventorySlot::Head),
            6 => Ok(InventorySlot::Chest),
            7 => Ok(InventorySlot::Legs),
            8 => Ok(InventorySlot::Feet),
            1..=4 => {
                Ok(InventorySlot::CraftingInput(slot as usize - 1))
            }
            0 => Ok(InventorySlot::CraftingResult),
            _ => Err(SlotOutOfBoundsError(46, slot.max(0) as usize))
        }
    }

    pub fn get_index(&self) -> std::result::Result<usize, SlotOutOfBoundsError> {
        match self {
            InventorySlot::Hotbar(index) => {
                if *index < 9 {
                    Ok(index + 36)
                } else {
                    Err(SlotOutOfBoundsError(9, *index))
                }
            }
            InventorySlot::Main(index) => {
                if *index < 27 {
                    Ok(index + 9)
                } else {
                    Err(SlotOutOfBoundsError(27, *index))
                }
            }
            InventorySlot::OffHand => Ok(45),
            InventorySlot::Head => Ok(5),
            InventorySlot::Chest => Ok(6),
            InventorySlot::Legs => Ok(7),
            InventorySlot::Feet => Ok(8),
            InventorySlot::CraftingInput(index) => {
                if *index < 4 {
                    Ok(index + 1)
                } else {
                    Err(SlotOutOfBoundsError(4, *index))
                }
            }
            InventorySlot::CraftingResult => Ok(0),
        }
    }

    pub fn slot_type(&self) -> SlotType {
        match self {
            InventorySlot::Hotbar(_) => SlotType::Hotbar,
            InventorySlot::Main(_) => SlotType::Container,
            InventorySlot::OffHand => SlotType::OffHand,
            InventorySlot::Head | InventorySlot::Chest | InventorySlot::Legs | InventorySlot::Feet => SlotType::Armor,
            InventorySlot::CraftingInput(_) => SlotType::Crafting,
            InventorySlot::CraftingResult => SlotType::Result,
        }
    }
}
