use crate::entity::Entity;

/// Worker id of the thread driving the tick, as opposed to the rayon pool.
pub const DRIVER_WORKER: usize = 0;

/// Identifies the worker running the current piece of a tick.
///
/// Entities remember the worker that last ticked them. Code that wants to
/// send a player packets right away, from inside another entity's tick, asks
/// the context whether it [`owns`](TickContext::owns) that player; if not,
/// the work is queued for the player's own tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    worker: usize,
    tick: u64,
}

impl TickContext {
    pub fn new(worker: usize, tick: u64) -> Self {
        Self { worker, tick }
    }

    /// Context of the calling thread: rayon workers are numbered from 1,
    /// anything else is the driver.
    pub fn current(tick: u64) -> Self {
        let worker = rayon::current_thread_index().map_or(DRIVER_WORKER, |index| index + 1);
        Self::new(worker, tick)
    }

    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn owns(&self, entity: &Entity) -> bool {
        entity.last_tick_worker() == Some(self.worker)
    }
}
