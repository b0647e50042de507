//! Page-lifetime pointer position.
//!
//! A single slot holding the latest pointer coordinate, shared by every
//! consumer. There is no history and no queue: each move overwrites the
//! slot. The host listener is attached while at least one
//! [`PointerSubscription`] is alive and detached when the last one drops.

use glam::Vec2;
use std::{cell::RefCell, rc::Rc};
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    latest: Vec2,
    version: u64,
    subscribers: usize,
}

/// Shared handle to the pointer slot. Clones observe the same slot.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    slot: Rc<RefCell<Slot>>,
}

/// A consumer's view of the pointer slot.
#[derive(Debug)]
pub struct PointerSubscription {
    slot: Rc<RefCell<Slot>>,
    seen: u64,
}

impl PointerTracker {
    /// Creates a tracker reporting `(0, 0)` until the first move.
    pub fn new() -> Self {
        Self::default()
    }

    /// Host pointer-move notification, in page coordinates.
    ///
    /// Dropped while nobody is subscribed.
    pub fn notify_move(&self, page: Vec2) {
        let mut slot = self.slot.borrow_mut();
        if slot.subscribers == 0 {
            return;
        }
        slot.latest = page;
        slot.version += 1;
    }

    pub fn latest(&self) -> Vec2 {
        self.slot.borrow().latest
    }

    /// Registers a consumer, attaching the host listener if this is the first.
    pub fn subscribe(&self) -> PointerSubscription {
        let mut slot = self.slot.borrow_mut();
        slot.subscribers += 1;
        if slot.subscribers == 1 {
            debug!("pointer listener attached");
        }
        PointerSubscription {
            slot: Rc::clone(&self.slot),
            seen: slot.version,
        }
    }

    /// Whether the host listener is currently attached.
    pub fn is_listening(&self) -> bool {
        self.subscriber_count() > 0
    }

    pub fn subscriber_count(&self) -> usize {
        self.slot.borrow().subscribers
    }
}

impl PointerSubscription {
    pub fn latest(&self) -> Vec2 {
        self.slot.borrow().latest
    }

    /// Returns the latest position if it was published after the previous
    /// call (or after subscribing).
    pub fn changed(&mut self) -> Option<Vec2> {
        let slot = self.slot.borrow();
        if slot.version == self.seen {
            return None;
        }
        self.seen = slot.version;
        Some(slot.latest)
    }
}

impl Drop for PointerSubscription {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        slot.subscribers = slot.subscribers.saturating_sub(1);
        if slot.subscribers == 0 {
            debug!("pointer listener detached");
        }
    }
}
