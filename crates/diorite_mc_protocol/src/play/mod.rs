pub mod clientbound;

/// Window id of a player's own inventory.
pub const PLAYER_WINDOW_ID: i8 = 0;
/// Window id used to address the item held on the cursor.
pub const CURSOR_WINDOW_ID: i8 = -1;
/// Slot index used to address the item held on the cursor.
pub const CURSOR_SLOT: i16 = -1;
/// Off-hand slot index inside the player window.
pub const OFF_HAND_SLOT: i16 = 45;
