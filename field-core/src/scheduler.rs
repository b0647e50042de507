//! Frame scheduling and timers.
//!
//! The engine never sleeps or spawns: it asks a [`Scheduler`] for the next
//! animation frame or a one-shot timeout and gets a handle back. The host
//! later calls the engine with that handle. Handles make cancellation
//! checkable: a callback whose handle is no longer pending is stale.

use std::time::Duration;
use tracing::trace;

/// Quiet time required after the last resize notification before the pool
/// is regenerated.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Identifies a requested animation frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Identifies a pending one-shot timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl FrameHandle {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl TimerHandle {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Host frame scheduler and timer primitives.
pub trait Scheduler {
    /// Requests one callback on the next display refresh.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancels a requested frame. Unknown handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Requests one callback after `delay`.
    fn set_timeout(&mut self, delay: Duration) -> TimerHandle;

    /// Cancels a pending timer. Unknown handles are ignored.
    fn clear_timeout(&mut self, handle: TimerHandle);
}

/// A [`Scheduler`] driven by an explicit clock.
///
/// Nothing fires on its own: the owner advances the clock and collects due
/// frames and timers, then dispatches them. Used by tests and by hosts that
/// already have a render loop of their own.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    next_id: u64,
    frames: Vec<FrameHandle>,
    timers: Vec<(TimerHandle, Duration)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Moves the clock forward to `now`. The clock never runs backwards.
    pub fn advance_to(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }

    /// Moves the clock forward by `dt`.
    pub fn advance_by(&mut self, dt: Duration) {
        self.now += dt;
    }

    /// Removes and returns the oldest requested frame.
    pub fn take_frame(&mut self) -> Option<FrameHandle> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    /// The oldest requested frame, left in place.
    pub fn peek_frame(&self) -> Option<FrameHandle> {
        self.frames.first().copied()
    }

    /// Removes and returns every timer whose deadline has passed, earliest first.
    pub fn take_due_timers(&mut self) -> Vec<TimerHandle> {
        let now = self.now;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.timers.drain(..).partition(|&(_, at)| at <= now);
        self.timers = pending;
        due.sort_by_key(|&(_, at)| at);
        due.into_iter().map(|(handle, _)| handle).collect()
    }

    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl Scheduler for ManualScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.frames.push(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.frames.retain(|&h| h != handle);
    }

    fn set_timeout(&mut self, delay: Duration) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        self.timers.push((handle, self.now + delay));
        handle
    }

    fn clear_timeout(&mut self, handle: TimerHandle) {
        self.timers.retain(|&(h, _)| h != handle);
    }
}

/// Coalesces bursts of triggers into one timer callback.
///
/// Each [`Debounce::trigger`] cancels the previously armed timer and arms a
/// new one, so only the last trigger of a burst survives to fire.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    pending: Option<TimerHandle>,
}

impl Debounce {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Re-arms the timer, cancelling the one armed before.
    pub fn trigger<C: Scheduler + ?Sized>(&mut self, scheduler: &mut C) -> TimerHandle {
        if let Some(old) = self.pending.take() {
            scheduler.clear_timeout(old);
        }
        let handle = scheduler.set_timeout(self.delay);
        self.pending = Some(handle);
        handle
    }

    /// Accepts a timer callback.
    ///
    /// Returns `true` only for the currently armed timer, which is then
    /// disarmed. Stale or foreign handles return `false`.
    pub fn fire(&mut self, handle: TimerHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            trace!(?handle, "stale debounce timer");
            false
        }
    }

    /// Cancels the armed timer, if any.
    pub fn cancel<C: Scheduler + ?Sized>(&mut self, scheduler: &mut C) {
        if let Some(handle) = self.pending.take() {
            scheduler.clear_timeout(handle);
        }
    }
}
