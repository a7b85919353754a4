use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
enum DragState {
    Idle,
    Dragging {
        right_click: bool,
        slots: Vec<usize>,
    },
}

/// Tracks a mouse drag across inventory slots.
///
/// A drag is opened by `start`, collects slots through `add_slot` and is
/// closed by `end` with the same button. There is no timeout: an unfinished
/// drag stays open until it is ended or the controller is dropped.
#[derive(Debug)]
pub struct DragController {
    state: Mutex<DragState>,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new()
    }
}

impl DragController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DragState::Idle),
        }
    }

    /// Fails if a drag is already in progress.
    pub fn start(&self, right_click: bool) -> bool {
        let mut state = self.state.lock();
        if *state != DragState::Idle {
            return false;
        }

        *state = DragState::Dragging {
            right_click,
            slots: Vec::new(),
        };
        true
    }

    /// Fails if no drag with this button is in progress, or the slot was
    /// already added to it.
    pub fn add_slot(&self, right_click: bool, slot: usize) -> bool {
        match &mut *self.state.lock() {
            DragState::Dragging { right_click: dragging_right, slots } if *dragging_right == right_click => {
                if slots.contains(&slot) {
                    false
                } else {
                    slots.push(slot);
                    true
                }
            },
            _ => false,
        }
    }

    /// Finishes the drag, returning the slots in the order they were added.
    /// Returns `None` if no drag with this button is in progress.
    pub fn end(&self, right_click: bool) -> Option<Vec<usize>> {
        let mut state = self.state.lock();
        match &*state {
            DragState::Dragging { right_click: dragging_right, .. } if *dragging_right == right_click => {},
            _ => return None,
        }

        match std::mem::replace(&mut *state, DragState::Idle) {
            DragState::Dragging { slots, .. } => Some(slots),
            DragState::Idle => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        *self.state.lock() != DragState::Idle
    }

    pub fn is_right_click(&self) -> Option<bool> {
        match &*self.state.lock() {
            DragState::Dragging { right_click, .. } => Some(*right_click),
            DragState::Idle => None,
        }
    }
}
