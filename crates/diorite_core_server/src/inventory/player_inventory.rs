use std::{ops::Range, slice, sync::{Arc, Weak, atomic::{AtomicBool, AtomicU8, Ordering}}};

use diorite_mc_protocol::{
    play::{CURSOR_SLOT, CURSOR_WINDOW_ID, OFF_HAND_SLOT, PLAYER_WINDOW_ID, clientbound::{ContainerSetContent, Packet}},
    types::{EquipmentSlot, ProtocolItemStack},
};
use diorite_network::PacketBuffer;
use parking_lot::Mutex;

use crate::player::Player;

use super::{
    DragController, InventorySlot, InventoryView, SlotOutOfBoundsError, SlotRange, SlotType, Viewers,
    item_stack::{ItemStack, to_protocol_slot},
    recipe::{CraftingGrid, RecipeManager},
    slot_array::SlotArray,
    sync::{diff_slots, mark_all_seen, set_slot_packet},
};

pub const CRAFTING_RESULT_SLOT: usize = 0;
pub const CRAFTING_SLOTS: Range<usize> = 1..5;
pub const ARMOR_SLOTS: Range<usize> = 5..9;
pub const MAIN_SLOTS: Range<usize> = 9..36;
pub const HOTBAR_SLOTS: Range<usize> = 36..45;
/// Slots stored in the backing array. The off-hand and cursor live in their
/// own single-slot arrays.
const BACKING_SIZE: usize = 45;
pub const PLAYER_INVENTORY_SIZE: usize = 46;

#[derive(Debug)]
struct SyncState {
    slots: Vec<bool>,
    off_hand: bool,
    cursor: bool,
    held_slot: u8,
}

/// The inventory every player carries, numbered the way the client numbers
/// window 0:
///
/// | slots  | contents               |
/// |--------|------------------------|
/// | 0      | crafting result        |
/// | 1-4    | 2x2 crafting matrix    |
/// | 5-8    | armor, head to feet    |
/// | 9-35   | main storage           |
/// | 36-44  | hotbar                 |
/// | 45     | off-hand               |
///
/// The cursor is kept alongside and synchronized as window -1, slot -1.
pub struct PlayerInventory {
    slots: SlotArray,
    crafting: CraftingGrid,
    armor: SlotArray,
    main: SlotArray,
    hotbar: SlotArray,
    off_hand: SlotArray,
    cursor: SlotArray,
    held_slot: AtomicU8,
    viewers: Viewers,
    drag: DragController,
    sync: Mutex<SyncState>,
    equipment_changed: AtomicBool,
    recipes: Arc<dyn RecipeManager>,
}

impl PlayerInventory {
    pub(crate) fn new(owner_id: i32, owner: Weak<Player>, recipes: Arc<dyn RecipeManager>) -> Self {
        let owner_tag = SlotArray::allocate_owner();
        let slots = SlotArray::with_owner(BACKING_SIZE, owner_tag);

        Self {
            crafting: CraftingGrid::new(&slots, 2, CRAFTING_RESULT_SLOT),
            armor: slots.get_sub_array(ARMOR_SLOTS.start, ARMOR_SLOTS.len()),
            main: slots.get_sub_array(MAIN_SLOTS.start, MAIN_SLOTS.len()),
            hotbar: slots.get_sub_array(HOTBAR_SLOTS.start, HOTBAR_SLOTS.len()),
            off_hand: SlotArray::with_owner(1, owner_tag),
            cursor: SlotArray::with_owner(1, owner_tag),
            slots,
            held_slot: AtomicU8::new(0),
            viewers: Viewers::owned_by(owner_id, owner),
            drag: DragController::new(),
            sync: Mutex::new(SyncState {
                slots: vec![false; BACKING_SIZE],
                off_hand: false,
                cursor: false,
                held_slot: 0,
            }),
            equipment_changed: AtomicBool::new(false),
            recipes,
        }
    }

    pub fn slot(&self, slot: InventorySlot) -> Result<Option<Arc<ItemStack>>, SlotOutOfBoundsError> {
        self.get_item(slot.get_index()?)
    }

    pub fn set_slot(&self, slot: InventorySlot, item: Option<ItemStack>) -> Result<Option<Arc<ItemStack>>, SlotOutOfBoundsError> {
        self.set_item(slot.get_index()?, item)
    }

    pub fn crafting_grid(&self) -> &CraftingGrid {
        &self.crafting
    }

    pub fn armor(&self) -> &SlotArray {
        &self.armor
    }

    pub fn main(&self) -> &SlotArray {
        &self.main
    }

    pub fn hotbar(&self) -> &SlotArray {
        &self.hotbar
    }

    pub fn off_hand(&self) -> Option<Arc<ItemStack>> {
        self.off_hand.get(0)
    }

    pub fn cursor(&self) -> Option<Arc<ItemStack>> {
        self.cursor.get(0)
    }

    pub fn set_cursor(&self, item: Option<ItemStack>) -> Option<Arc<ItemStack>> {
        self.cursor.get_and_set(0, item.map(Arc::new))
    }

    pub fn held_slot(&self) -> u8 {
        self.held_slot.load(Ordering::Acquire)
    }

    pub fn set_held_slot(&self, slot: u8) -> Result<(), SlotOutOfBoundsError> {
        if slot as usize >= HOTBAR_SLOTS.len() {
            return Err(SlotOutOfBoundsError(HOTBAR_SLOTS.len(), slot as usize));
        }
        self.held_slot.store(slot, Ordering::Release);
        Ok(())
    }

    pub fn held_item(&self) -> Option<Arc<ItemStack>> {
        self.hotbar.get(self.held_slot() as usize)
    }

    /// Whether armor, the off-hand or the held item changed since the last
    /// call. Set by soft updates.
    pub fn take_equipment_changed(&self) -> bool {
        self.equipment_changed.swap(false, Ordering::AcqRel)
    }

    /// Visible equipment in the order the client expects it.
    pub fn equipment(&self) -> Vec<(EquipmentSlot, Option<ProtocolItemStack>)> {
        let slot = |item: Option<Arc<ItemStack>>| to_protocol_slot(item.as_deref());
        vec![
            (EquipmentSlot::MainHand, slot(self.held_item())),
            (EquipmentSlot::OffHand, slot(self.off_hand())),
            (EquipmentSlot::Feet, slot(self.armor.get(3))),
            (EquipmentSlot::Legs, slot(self.armor.get(2))),
            (EquipmentSlot::Chest, slot(self.armor.get(1))),
            (EquipmentSlot::Head, slot(self.armor.get(0))),
        ]
    }
}

impl InventoryView for PlayerInventory {
    fn slots(&self) -> &SlotArray {
        &self.slots
    }

    fn window_id(&self) -> i8 {
        PLAYER_WINDOW_ID
    }

    fn title(&self) -> &str {
        "Inventory"
    }

    fn viewers(&self) -> &Viewers {
        &self.viewers
    }

    fn drag_controller(&self) -> &DragController {
        &self.drag
    }

    fn slot_type(&self, slot: usize) -> SlotType {
        match InventorySlot::from_index(slot.min(i16::MAX as usize) as i16) {
            Ok(slot) => slot.slot_type(),
            Err(_) => SlotType::Outside,
        }
    }

    fn size(&self) -> usize {
        PLAYER_INVENTORY_SIZE
    }

    fn resolve(&self, slot: usize) -> Option<(&SlotArray, usize)> {
        match slot {
            0..=44 => Some((&self.slots, slot)),
            45 => Some((&self.off_hand, 0)),
            _ => None,
        }
    }

    /// Hotbar first, then main storage.
    fn storage(&self) -> Vec<SlotRange> {
        vec![
            SlotRange::new(self.hotbar.clone(), HOTBAR_SLOTS.start),
            SlotRange::new(self.main.clone(), MAIN_SLOTS.start),
        ]
    }

    fn poll_changes(&self) -> Vec<Packet> {
        let mut sync = self.sync.lock();
        let sync = &mut *sync;

        if self.crafting.matrix_changed(&sync.slots) {
            self.crafting.check_recipe(&*self.recipes);
        }

        let held_slot = self.held_slot();
        let held_index = HOTBAR_SLOTS.start + held_slot as usize;
        let mut equipment_changed = sync.held_slot != held_slot;
        sync.held_slot = held_slot;

        let mut buffer = PacketBuffer::new();
        diff_slots(&self.slots, &mut sync.slots, |index, item| {
            if ARMOR_SLOTS.contains(&index) || index == held_index {
                equipment_changed = true;
            }
            buffer.write_packet(set_slot_packet(PLAYER_WINDOW_ID, index as i16, item));
        });
        diff_slots(&self.off_hand, slice::from_mut(&mut sync.off_hand), |_, item| {
            equipment_changed = true;
            buffer.write_packet(set_slot_packet(PLAYER_WINDOW_ID, OFF_HAND_SLOT, item));
        });
        diff_slots(&self.cursor, slice::from_mut(&mut sync.cursor), |_, item| {
            buffer.write_packet(set_slot_packet(CURSOR_WINDOW_ID, CURSOR_SLOT, item));
        });

        if equipment_changed {
            self.equipment_changed.store(true, Ordering::Release);
        }
        buffer.pop_written()
    }

    fn contents_packet(&self) -> ContainerSetContent {
        ContainerSetContent {
            window_id: PLAYER_WINDOW_ID,
            items: self.contents().iter().map(|item| to_protocol_slot(item.as_deref())).collect(),
            carried_item: to_protocol_slot(self.cursor().as_deref()),
        }
    }

    fn full_contents(&self) -> Vec<Packet> {
        let mut sync = self.sync.lock();
        let sync = &mut *sync;
        mark_all_seen(&self.slots, &mut sync.slots);
        mark_all_seen(&self.off_hand, slice::from_mut(&mut sync.off_hand));
        mark_all_seen(&self.cursor, slice::from_mut(&mut sync.cursor));
        vec![self.contents_packet().into()]
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use diorite_mc_constants::item::Material;
    use diorite_mc_protocol::play::clientbound::ContainerSetSlot;

    use crate::inventory::{InventoryError, recipe::SimpleRecipeManager};

    use super::*;

    fn inventory() -> PlayerInventory {
        PlayerInventory::new(1, Weak::new(), Arc::new(SimpleRecipeManager::default()))
    }

    fn set_slot(window_id: i8, slot: i16, item: Option<ItemStack>) -> Packet {
        ContainerSetSlot {
            window_id,
            slot,
            item: item.map(|item| item.to_protocol()),
        }.into()
    }

    #[test]
    fn single_change_produces_single_packet() {
        let inventory = inventory();
        inventory.set_item(36, Some(ItemStack::single(Material::Apple))).unwrap();

        assert_eq!(inventory.poll_changes(), vec![set_slot(0, 36, Some(ItemStack::single(Material::Apple)))]);
        assert!(inventory.poll_changes().is_empty());
    }

    #[test]
    fn zero_amount_removes_the_stack() {
        let inventory = inventory();
        inventory.set_item(10, Some(ItemStack::new(Material::Apple, 5))).unwrap();
        inventory.poll_changes();

        inventory.get_item(10).unwrap().unwrap().set_amount(0);
        assert_eq!(inventory.poll_changes(), vec![set_slot(0, 10, None)]);
        assert!(inventory.get_item(10).unwrap().is_none());
    }

    #[test]
    fn cursor_uses_its_own_window() {
        let inventory = inventory();
        inventory.set_cursor(Some(ItemStack::new(Material::Stick, 3)));

        assert_eq!(inventory.poll_changes(), vec![set_slot(-1, -1, Some(ItemStack::new(Material::Stick, 3)))]);

        inventory.set_cursor(None);
        assert_eq!(inventory.poll_changes(), vec![set_slot(-1, -1, None)]);
    }

    #[test]
    fn off_hand_is_slot_45() {
        let inventory = inventory();
        inventory.set_item(45, Some(ItemStack::single(Material::Torch))).unwrap();
        assert_eq!(inventory.off_hand().unwrap().material(), Material::Torch);
        assert_eq!(inventory.slot_type(45), SlotType::OffHand);
        assert!(inventory.get_item(46).is_err());

        assert_eq!(inventory.poll_changes(), vec![set_slot(0, 45, Some(ItemStack::single(Material::Torch)))]);
        assert!(inventory.take_equipment_changed());
    }

    #[test]
    fn crafting_matrix_drives_result() {
        let inventory = inventory();
        inventory.set_slot(InventorySlot::CraftingInput(2), Some(ItemStack::single(Material::Log))).unwrap();

        assert_eq!(inventory.poll_changes(), vec![
            set_slot(0, 0, Some(ItemStack::new(Material::Planks, 4))),
            set_slot(0, 3, Some(ItemStack::single(Material::Log))),
        ]);

        inventory.set_slot(InventorySlot::CraftingInput(2), None).unwrap();
        assert_eq!(inventory.poll_changes(), vec![set_slot(0, 0, None), set_slot(0, 3, None)]);
        assert!(inventory.crafting_grid().result().is_none());
    }

    #[test]
    fn equipment_changes_are_flagged() {
        let inventory = inventory();
        inventory.set_item(20, Some(ItemStack::single(Material::Apple))).unwrap();
        inventory.poll_changes();
        assert!(!inventory.take_equipment_changed());

        inventory.set_slot(InventorySlot::Head, Some(ItemStack::single(Material::IronHelmet))).unwrap();
        inventory.poll_changes();
        assert!(inventory.take_equipment_changed());

        inventory.set_held_slot(4).unwrap();
        inventory.poll_changes();
        assert!(inventory.take_equipment_changed());
        assert!(inventory.set_held_slot(9).is_err());

        let equipment = inventory.equipment();
        assert_eq!(equipment[5], (EquipmentSlot::Head, Some(ItemStack::single(Material::IronHelmet).to_protocol())));
        assert_eq!(equipment[0], (EquipmentSlot::MainHand, None));
    }

    #[test]
    fn searches_start_at_the_hotbar() {
        let inventory = inventory();
        assert_eq!(inventory.first_empty(), Some(36));
        assert_eq!(inventory.last_empty(), Some(35));

        inventory.set_item(12, Some(ItemStack::new(Material::Arrow, 10))).unwrap();
        inventory.set_item(40, Some(ItemStack::new(Material::Arrow, 64))).unwrap();
        assert_eq!(inventory.first(&ItemStack::single(Material::Arrow), false), Some(40));
        assert_eq!(inventory.first_not_full(&ItemStack::single(Material::Arrow)), Some(12));
        assert_eq!(inventory.first_material(Material::Arrow), Some(40));
        assert!(inventory.contains_at_least(Material::Arrow, 74));
        assert!(!inventory.contains_at_least(Material::Arrow, 75));
    }

    #[test]
    fn armor_is_not_storage() {
        let inventory = inventory();
        inventory.set_slot(InventorySlot::Feet, Some(ItemStack::single(Material::IronBoots))).unwrap();
        assert!(!inventory.contains(&ItemStack::single(Material::IronBoots), true));
    }

    #[test]
    fn add_reports_leftovers() {
        let inventory = inventory();
        for slot in HOTBAR_SLOTS.chain(MAIN_SLOTS) {
            inventory.set_item(slot, Some(ItemStack::new(Material::Stone, 64))).unwrap();
        }
        inventory.set_item(36, Some(ItemStack::new(Material::Apple, 60))).unwrap();

        let leftovers = inventory.add(&[ItemStack::new(Material::Apple, 10)]);
        assert_eq!(leftovers, vec![ItemStack::new(Material::Apple, 6)]);
        assert_eq!(inventory.get_item(36).unwrap().unwrap().amount(), 64);
    }

    #[test]
    fn clear_empties_everything() {
        let inventory = inventory();
        inventory.set_item(0, Some(ItemStack::single(Material::Stick))).unwrap();
        inventory.set_item(45, Some(ItemStack::single(Material::Stick))).unwrap();
        inventory.clear();
        assert!(inventory.contents().iter().all(Option::is_none));
        assert_eq!(inventory.contents().len(), PLAYER_INVENTORY_SIZE);
    }

    #[test]
    fn foreign_items_are_rejected() {
        let first = inventory();
        let second = inventory();
        second.set_item(9, Some(ItemStack::single(Material::Egg))).unwrap();
        let foreign = second.get_item(9).unwrap();

        assert_eq!(first.replace(9, foreign.as_ref(), None), Err(InventoryError::ForeignItem));
    }

    #[test]
    fn off_hand_items_belong_to_the_inventory() {
        let inventory = inventory();
        inventory.set_item(45, Some(ItemStack::single(Material::Egg))).unwrap();
        let egg = inventory.get_item(45).unwrap();
        assert_eq!(inventory.replace(45, egg.as_ref(), None), Ok(true));
    }

    #[test]
    fn concurrent_replace_has_one_winner() {
        let inventory = inventory();
        inventory.set_item(9, Some(ItemStack::single(Material::Apple))).unwrap();
        let expected = inventory.get_item(9).unwrap();

        let wins: usize = thread::scope(|scope| {
            let handles: Vec<_> = [Material::Stick, Material::Diamond].into_iter().map(|material| {
                let inventory = &inventory;
                let expected = expected.clone();
                scope.spawn(move || inventory.replace(9, expected.as_ref(), Some(ItemStack::single(material))).unwrap() as usize)
            }).collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).sum()
        });

        assert_eq!(wins, 1);
        let material = inventory.get_item(9).unwrap().unwrap().material();
        assert!(material == Material::Stick || material == Material::Diamond);
    }

    #[test]
    fn full_contents_include_cursor() {
        let inventory = inventory();
        inventory.set_cursor(Some(ItemStack::single(Material::Bow)));
        inventory.set_item(45, Some(ItemStack::single(Material::Torch))).unwrap();

        let contents = inventory.contents_packet();
        assert_eq!(contents.items.len(), PLAYER_INVENTORY_SIZE);
        assert_eq!(contents.items[45], Some(ItemStack::single(Material::Torch).to_protocol()));
        assert_eq!(contents.carried_item, Some(ItemStack::single(Material::Bow).to_protocol()));

        inventory.full_contents();
        assert!(inventory.poll_changes().is_empty());
    }
}
