use std::sync::Arc;

use diorite_mc_protocol::play::clientbound::ContainerSetSlot;
use tracing::warn;

use super::{item_stack::{ItemStack, to_protocol_slot}, slot_array::SlotArray};

pub(crate) fn set_slot_packet(window_id: i8, slot: i16, item: Option<&Arc<ItemStack>>) -> ContainerSetSlot {
    ContainerSetSlot {
        window_id,
        slot,
        item: to_protocol_slot(item.map(|item| &**item)),
    }
}

/// Walks `slots` once, reporting every slot whose content viewers have not
/// seen yet. `known[i]` records whether viewers currently believe slot `i`
/// holds an item.
///
/// Stacks whose amount dropped to zero are cleared from their slot here.
/// Present stacks are reported when their dirty flag was set; the flag is
/// consumed by this call.
pub(crate) fn diff_slots(slots: &SlotArray, known: &mut [bool], mut changed: impl FnMut(usize, Option<&Arc<ItemStack>>)) {
    for (index, item) in slots.iter().enumerate() {
        match item {
            Some(item) if item.is_empty() => {
                if !slots.compare_and_set_instance(index, Some(&item), None) {
                    // Replaced since the read; the new stack is dirty and
                    // gets picked up by the next pass
                    warn!(index, "emptied stack was replaced concurrently");
                }
                known[index] = false;
                changed(index, None);
            },
            Some(item) => {
                if item.set_clean() {
                    changed(index, Some(&item));
                }
                known[index] = true;
            },
            None => {
                if std::mem::replace(&mut known[index], false) {
                    changed(index, None);
                }
            },
        }
    }
}

/// Marks every slot as seen, as done after sending the full contents.
pub(crate) fn mark_all_seen(slots: &SlotArray, known: &mut [bool]) {
    for (index, item) in slots.iter().enumerate() {
        known[index] = match item {
            Some(item) => {
                item.set_clean();
                !item.is_empty()
            },
            None => false,
        };
    }
}
