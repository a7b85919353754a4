//! Slot scans and stacking shared by every inventory layout. Layouts hand in
//! their storage as an ordered list of ranges; indices returned are
//! positions in the inventory, not in the range.

use std::sync::Arc;

use diorite_mc_constants::item::Material;

use super::{item_stack::ItemStack, slot_array::SlotArray};

/// A window of an inventory's storage, and where it starts in the
/// inventory's numbering.
#[derive(Debug, Clone)]
pub struct SlotRange {
    pub slots: SlotArray,
    pub start: usize,
}

impl SlotRange {
    pub fn new(slots: SlotArray, start: usize) -> Self {
        Self { slots, start }
    }
}

pub(crate) fn is_empty_slot(item: Option<&Arc<ItemStack>>) -> bool {
    item.map_or(true, |item| item.is_empty())
}

pub(crate) fn matches(slot: &ItemStack, item: &ItemStack, with_amount: bool) -> bool {
    if with_amount {
        slot == item
    } else {
        slot.is_similar(item)
    }
}

pub(crate) fn first(ranges: &[SlotRange], predicate: impl Fn(Option<&Arc<ItemStack>>) -> bool) -> Option<usize> {
    ranges.iter().find_map(|range| {
        (0..range.slots.len())
            .find(|&index| predicate(range.slots.get(index).as_ref()))
            .map(|index| range.start + index)
    })
}

pub(crate) fn last(ranges: &[SlotRange], predicate: impl Fn(Option<&Arc<ItemStack>>) -> bool) -> Option<usize> {
    ranges.iter().rev().find_map(|range| {
        (0..range.slots.len()).rev()
            .find(|&index| predicate(range.slots.get(index).as_ref()))
            .map(|index| range.start + index)
    })
}

pub(crate) fn count_material(ranges: &[SlotRange], material: Material) -> u32 {
    ranges.iter()
        .flat_map(|range| range.slots.iter())
        .flatten()
        .filter(|item| item.material() == material)
        .map(|item| item.amount() as u32)
        .sum()
}

/// Stacks `items` into the ranges: first on top of similar stacks, then
/// into empty slots. Whatever does not fit is returned.
pub(crate) fn add(ranges: &[SlotRange], items: &[ItemStack], from_end: bool) -> Vec<ItemStack> {
    let mut leftovers = Vec::new();

    for item in items {
        if item.is_empty() {
            continue;
        }

        let mut remaining = item.amount();
        for pass in [merge_into as StackingPass, place_into] {
            for (slots, index) in ordered_slots(ranges, from_end) {
                if remaining == 0 {
                    break;
                }
                remaining = pass(slots, index, item, remaining);
            }
        }

        if remaining > 0 {
            leftovers.push(item.with_amount(remaining));
        }
    }

    leftovers
}

/// Takes `items` out of the ranges, ignoring amounts when matching. Amounts
/// that could not be found are returned.
pub(crate) fn remove(ranges: &[SlotRange], items: &[ItemStack]) -> Vec<ItemStack> {
    let mut leftovers = Vec::new();

    for item in items {
        let mut remaining = item.amount();
        for (slots, index) in ordered_slots(ranges, false) {
            if remaining == 0 {
                break;
            }
            remaining = take_from(slots, index, item, remaining);
        }

        if remaining > 0 {
            leftovers.push(item.with_amount(remaining));
        }
    }

    leftovers
}

type StackingPass = fn(&SlotArray, usize, &ItemStack, u8) -> u8;

fn ordered_slots(ranges: &[SlotRange], from_end: bool) -> Box<dyn Iterator<Item = (&SlotArray, usize)> + '_> {
    if from_end {
        Box::new(ranges.iter().rev().flat_map(|range| (0..range.slots.len()).rev().map(move |index| (&range.slots, index))))
    } else {
        Box::new(ranges.iter().flat_map(|range| (0..range.slots.len()).map(move |index| (&range.slots, index))))
    }
}

fn merge_into(slots: &SlotArray, index: usize, item: &ItemStack, remaining: u8) -> u8 {
    loop {
        let Some(current) = slots.get(index) else {
            return remaining;
        };
        if current.is_empty() || !current.is_similar(item) {
            return remaining;
        }

        let space = current.max_stack_size().saturating_sub(current.amount());
        if space == 0 {
            return remaining;
        }

        let moved = space.min(remaining);
        let merged = current.with_amount(current.amount() + moved);
        if slots.compare_and_set(index, Some(&current), Some(Arc::new(merged))) {
            return remaining - moved;
        }
    }
}

fn place_into(slots: &SlotArray, index: usize, item: &ItemStack, remaining: u8) -> u8 {
    loop {
        let current = slots.get(index);
        if !is_empty_slot(current.as_ref()) {
            return remaining;
        }

        let placed = item.max_stack_size().min(remaining);
        if slots.compare_and_set(index, current.as_deref(), Some(Arc::new(item.with_amount(placed)))) {
            return remaining - placed;
        }
    }
}

fn take_from(slots: &SlotArray, index: usize, item: &ItemStack, remaining: u8) -> u8 {
    loop {
        let Some(current) = slots.get(index) else {
            return remaining;
        };
        if current.is_empty() || !current.is_similar(item) {
            return remaining;
        }

        let taken = current.amount().min(remaining);
        let replacement = if taken == current.amount() {
            None
        } else {
            Some(Arc::new(current.with_amount(current.amount() - taken)))
        };
        if slots.compare_and_set(index, Some(&current), replacement) {
            return remaining - taken;
        }
    }
}
