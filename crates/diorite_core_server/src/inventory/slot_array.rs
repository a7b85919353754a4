use std::{fmt, ptr, sync::{Arc, atomic::{AtomicU64, Ordering}}};

use arc_swap::ArcSwapOption;

use super::item_stack::{ItemStack, NO_ORIGIN};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(NO_ORIGIN + 1);

/// Fixed-size array of slots with atomic per-slot replacement.
///
/// A `SlotArray` may be a window into a larger backing array (see
/// [`SlotArray::get_sub_array`]); windows alias the same cells, so a write
/// through one is visible through every other.
#[derive(Clone)]
pub struct SlotArray {
    cells: Arc<[ArcSwapOption<ItemStack>]>,
    offset: usize,
    length: usize,
    owner: u64,
}

impl SlotArray {
    pub fn new(length: usize) -> Self {
        Self::with_owner(length, Self::allocate_owner())
    }

    /// Arrays created with the same owner tag count as one inventory for the
    /// purposes of the foreign item check.
    pub(crate) fn with_owner(length: usize, owner: u64) -> Self {
        Self {
            cells: (0..length).map(|_| ArcSwapOption::empty()).collect(),
            offset: 0,
            length,
            owner,
        }
    }

    pub(crate) fn allocate_owner() -> u64 {
        NEXT_OWNER.fetch_add(1, Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    pub fn get(&self, index: usize) -> Option<Arc<ItemStack>> {
        self.cell(index).load_full()
    }

    pub fn set(&self, index: usize, item: Option<Arc<ItemStack>>) {
        self.get_and_set(index, item);
    }

    pub fn get_and_set(&self, index: usize, item: Option<Arc<ItemStack>>) -> Option<Arc<ItemStack>> {
        let cell = self.cell(index);
        self.adopt(item.as_deref());
        cell.swap(item)
    }

    /// Replaces the slot content with `item` if the current content equals
    /// `expected` (material, amount and data; `None` matches an empty slot).
    ///
    /// Returns `false` only when the content differs from `expected`. A
    /// concurrent swap between the comparison and the store is retried.
    pub fn compare_and_set(&self, index: usize, expected: Option<&ItemStack>, item: Option<Arc<ItemStack>>) -> bool {
        let cell = self.cell(index);

        loop {
            let current = cell.load();
            if current.as_deref() != expected {
                return false;
            }

            let previous = cell.compare_and_swap(&current, item.clone());
            if stack_ptr(&previous) == stack_ptr(&current) {
                self.adopt(item.as_deref());
                return true;
            }
        }
    }

    /// Like [`SlotArray::compare_and_set`], but matches the exact stack
    /// instance instead of an equal stack.
    pub(crate) fn compare_and_set_instance(&self, index: usize, expected: Option<&Arc<ItemStack>>,
            item: Option<Arc<ItemStack>>) -> bool {
        let cell = self.cell(index);
        let expected = expected.map_or(ptr::null(), Arc::as_ptr);

        let current = cell.load();
        if stack_ptr(&current) != expected {
            return false;
        }

        let previous = cell.compare_and_swap(&current, item.clone());
        if stack_ptr(&previous) != expected {
            return false;
        }
        self.adopt(item.as_deref());
        true
    }

    /// Window of `length` slots starting at `offset`, sharing cells with
    /// this array.
    ///
    /// # Panics
    ///
    /// Panics if the window does not fit inside this array.
    pub fn get_sub_array(&self, offset: usize, length: usize) -> SlotArray {
        assert!(offset.checked_add(length).map_or(false, |end| end <= self.length),
            "sub array {}..{} out of bounds for length {}", offset, offset.saturating_add(length), self.length);

        SlotArray {
            cells: self.cells.clone(),
            offset: self.offset + offset,
            length,
            owner: self.owner,
        }
    }

    pub fn get_sub_array_from(&self, offset: usize) -> SlotArray {
        self.get_sub_array(offset, self.length.saturating_sub(offset))
    }

    pub fn snapshot(&self) -> Vec<Option<Arc<ItemStack>>> {
        (0..self.length).map(|index| self.get(index)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<Arc<ItemStack>>> + '_ {
        (0..self.length).map(|index| self.get(index))
    }

    fn cell(&self, index: usize) -> &ArcSwapOption<ItemStack> {
        assert!(index < self.length, "slot index {} out of bounds for length {}", index, self.length);
        &self.cells[self.offset + index]
    }

    /// Marks a stack as belonging here, and as changed. Only called once the
    /// stack is stored.
    fn adopt(&self, item: Option<&ItemStack>) {
        if let Some(item) = item {
            item.set_origin(self.owner);
            item.set_dirty();
        }
    }
}

fn stack_ptr(item: &Option<Arc<ItemStack>>) -> *const ItemStack {
    item.as_ref().map_or(ptr::null(), Arc::as_ptr)
}

impl fmt::Debug for SlotArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
