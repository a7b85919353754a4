use std::sync::Arc;

use diorite_mc_protocol::play::clientbound::{ContainerSetContent, Packet};
use diorite_network::PacketBuffer;
use glam::IVec3;
use parking_lot::Mutex;

use super::{
    DragController, InventoryView, SlotRange, SlotType, Viewers,
    item_stack::to_protocol_slot,
    recipe::{CraftingGrid, RecipeManager},
    slot_array::SlotArray,
    sync::{diff_slots, mark_all_seen, set_slot_packet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryType {
    Chest { rows: u8 },
    /// Result slot followed by a 3x3 crafting matrix.
    Workbench,
    Generic { size: usize },
}

impl InventoryType {
    pub fn size(&self) -> usize {
        match self {
            InventoryType::Chest { rows } => *rows as usize * 9,
            InventoryType::Workbench => 10,
            InventoryType::Generic { size } => *size,
        }
    }
}

/// What an inventory belongs to in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryHolder {
    Block(IVec3),
    Entity(i32),
}

/// A non-player inventory: chests, workbenches and other windows that a
/// player opens on top of their own inventory.
pub struct Inventory {
    inventory_type: InventoryType,
    window_id: i8,
    title: String,
    holder: Option<InventoryHolder>,
    slots: SlotArray,
    crafting: Option<(CraftingGrid, Arc<dyn RecipeManager>)>,
    viewers: Viewers,
    drag: DragController,
    known: Mutex<Vec<bool>>,
}

impl Inventory {
    pub fn new(window_id: i8, inventory_type: InventoryType, title: impl Into<String>) -> Self {
        let size = inventory_type.size();
        Self {
            inventory_type,
            window_id,
            title: title.into(),
            holder: None,
            slots: SlotArray::new(size),
            crafting: None,
            viewers: Viewers::new(),
            drag: DragController::new(),
            known: Mutex::new(vec![false; size]),
        }
    }

    pub fn chest(window_id: i8, rows: u8, title: impl Into<String>) -> Self {
        Self::new(window_id, InventoryType::Chest { rows }, title)
    }

    pub fn workbench(window_id: i8, recipes: Arc<dyn RecipeManager>) -> Self {
        let mut inventory = Self::new(window_id, InventoryType::Workbench, "Crafting");
        let grid = CraftingGrid::new(&inventory.slots, 3, 0);
        inventory.crafting = Some((grid, recipes));
        inventory
    }

    pub fn with_holder(mut self, holder: InventoryHolder) -> Self {
        self.holder = Some(holder);
        self
    }

    pub fn inventory_type(&self) -> InventoryType {
        self.inventory_type
    }

    pub fn holder(&self) -> Option<InventoryHolder> {
        self.holder
    }

    pub fn crafting_grid(&self) -> Option<&CraftingGrid> {
        self.crafting.as_ref().map(|(grid, _)| grid)
    }
}

impl InventoryView for Inventory {
    fn slots(&self) -> &SlotArray {
        &self.slots
    }

    fn window_id(&self) -> i8 {
        self.window_id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn viewers(&self) -> &Viewers {
        &self.viewers
    }

    fn drag_controller(&self) -> &DragController {
        &self.drag
    }

    fn slot_type(&self, slot: usize) -> SlotType {
        match self.inventory_type {
            _ if slot >= self.slots.len() => SlotType::Outside,
            InventoryType::Workbench if slot == 0 => SlotType::Result,
            InventoryType::Workbench => SlotType::Crafting,
            _ => SlotType::Container,
        }
    }

    fn storage(&self) -> Vec<SlotRange> {
        match self.inventory_type {
            InventoryType::Workbench => vec![SlotRange::new(self.slots.get_sub_array_from(1), 1)],
            _ => vec![SlotRange::new(self.slots.clone(), 0)],
        }
    }

    fn poll_changes(&self) -> Vec<Packet> {
        let mut known = self.known.lock();
        if let Some((grid, recipes)) = &self.crafting {
            if grid.matrix_changed(&known) {
                grid.check_recipe(&**recipes);
            }
        }

        let mut buffer = PacketBuffer::new();
        diff_slots(&self.slots, &mut known, |index, item| {
            buffer.write_packet(set_slot_packet(self.window_id, index as i16, item));
        });
        buffer.pop_written()
    }

    fn contents_packet(&self) -> ContainerSetContent {
        ContainerSetContent {
            window_id: self.window_id,
            items: self.slots.iter().map(|item| to_protocol_slot(item.as_deref())).collect(),
            carried_item: None,
        }
    }

    fn full_contents(&self) -> Vec<Packet> {
        let mut known = self.known.lock();
        mark_all_seen(&self.slots, &mut known);
        vec![self.contents_packet().into()]
    }
}

#[cfg(test)]
mod tests {
    use diorite_mc_constants::item::Material;
    use diorite_mc_protocol::play::clientbound::ContainerSetSlot;

    use crate::inventory::{InventoryError, item_stack::ItemStack, recipe::SimpleRecipeManager};

    use super::*;

    #[test]
    fn chest_layout() {
        let chest = Inventory::chest(3, 3, "Chest").with_holder(InventoryHolder::Block(IVec3::new(1, 4, 1)));
        assert_eq!(chest.size(), 27);
        assert_eq!(chest.slot_type(26), SlotType::Container);
        assert_eq!(chest.slot_type(27), SlotType::Outside);
        assert_eq!(chest.holder(), Some(InventoryHolder::Block(IVec3::new(1, 4, 1))));
        assert!(chest.get_item(27).is_err());
    }

    #[test]
    fn changes_are_reported_with_window_id() {
        let chest = Inventory::chest(2, 1, "Chest");
        chest.set_item(4, Some(ItemStack::new(Material::Bread, 2))).unwrap();

        assert_eq!(chest.poll_changes(), vec![Packet::from(ContainerSetSlot {
            window_id: 2,
            slot: 4,
            item: Some(ItemStack::new(Material::Bread, 2).to_protocol()),
        })]);
        assert!(chest.poll_changes().is_empty());
    }

    #[test]
    fn full_contents_consumes_pending_changes() {
        let chest = Inventory::chest(2, 1, "Chest");
        chest.set_item(0, Some(ItemStack::single(Material::Bread))).unwrap();

        let packets = chest.full_contents();
        assert_eq!(packets.len(), 1);
        assert!(chest.poll_changes().is_empty());
    }

    #[test]
    fn workbench_crafts_on_poll() {
        let workbench = Inventory::workbench(5, Arc::new(SimpleRecipeManager::default()));
        workbench.set_item(5, Some(ItemStack::single(Material::Log))).unwrap();

        let packets = workbench.poll_changes();
        assert_eq!(packets.len(), 2);
        assert_eq!(*workbench.get_item(0).unwrap().unwrap(), ItemStack::new(Material::Planks, 4));
        assert_eq!(workbench.slot_type(0), SlotType::Result);
        assert_eq!(workbench.slot_type(9), SlotType::Crafting);
    }

    #[test]
    fn workbench_storage_skips_result() {
        let workbench = Inventory::workbench(5, Arc::new(SimpleRecipeManager::empty()));
        assert_eq!(workbench.first_empty(), Some(1));
    }

    #[test]
    fn replace_requires_an_item_from_this_inventory() {
        let chest = Inventory::chest(1, 1, "Chest");
        let other = Inventory::chest(2, 1, "Other");
        chest.set_item(0, Some(ItemStack::single(Material::Apple))).unwrap();
        other.set_item(0, Some(ItemStack::single(Material::Apple))).unwrap();

        let foreign = other.get_item(0).unwrap();
        assert_eq!(chest.replace(0, foreign.as_ref(), None), Err(InventoryError::ForeignItem));

        let own = chest.get_item(0).unwrap();
        assert_eq!(chest.replace(0, own.as_ref(), Some(ItemStack::single(Material::Stick))), Ok(true));
        assert_eq!(chest.replace(0, own.as_ref(), None), Ok(false));
    }

    #[test]
    fn failed_compare_and_set_keeps_the_stack_with_its_inventory() {
        let chest = Inventory::chest(1, 1, "Chest");
        let other = Inventory::chest(2, 1, "Other");
        chest.set_item(0, Some(ItemStack::single(Material::Stick))).unwrap();
        other.set_item(0, Some(ItemStack::single(Material::Apple))).unwrap();

        let apple = other.get_item(0).unwrap().unwrap();
        let wrong = ItemStack::single(Material::Diamond);
        assert!(!chest.slots().compare_and_set(0, Some(&wrong), Some(apple.clone())));

        assert_eq!(chest.replace(0, Some(&apple), None), Err(InventoryError::ForeignItem));
        assert_eq!(other.replace(0, Some(&apple), None), Ok(true));
    }

    #[test]
    fn replace_any_finds_the_instance() {
        let chest = Inventory::chest(1, 1, "Chest");
        chest.set_item(6, Some(ItemStack::single(Material::Diamond))).unwrap();
        let diamond = chest.get_item(6).unwrap().unwrap();

        assert_eq!(chest.replace_any(&diamond, None), Ok(true));
        assert!(chest.get_item(6).unwrap().is_none());
        assert_eq!(chest.replace_any(&diamond, None), Ok(false));
    }
}
