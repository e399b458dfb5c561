//! Deterministic event loop: a microtask queue and timers on a virtual clock.
//!
//! Nothing here runs callbacks. The document pops work out of the loop and
//! invokes it with no borrow held, so callbacks may schedule more work.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle returned by `set_timeout` / `set_interval`.
    pub struct TimerId;
}

pub(crate) type Task = Box<dyn FnOnce()>;
pub(crate) type TimerFn = Rc<RefCell<dyn FnMut()>>;

struct Timer {
    due: u64,
    /// Tie-breaker among timers due at the same instant.
    seq: u64,
    interval: Option<u64>,
    callback: TimerFn,
}

#[derive(Default)]
pub(crate) struct EventLoop {
    now: u64,
    seq: u64,
    microtasks: VecDeque<Task>,
    timers: SlotMap<TimerId, Timer>,
}

impl EventLoop {
    pub(crate) fn now(&self) -> u64 {
        self.now
    }

    pub(crate) fn queue_microtask(&mut self, task: Task) {
        self.microtasks.push_back(task);
    }

    pub(crate) fn pop_microtask(&mut self) -> Option<Task> {
        self.microtasks.pop_front()
    }

    pub(crate) fn has_microtasks(&self) -> bool {
        !self.microtasks.is_empty()
    }

    pub(crate) fn add_timer(&mut self, delay: u64, interval: bool, callback: TimerFn) -> TimerId {
        self.seq += 1;
        self.timers.insert(Timer {
            due: self.now + delay,
            seq: self.seq,
            interval: interval.then_some(delay.max(1)),
            callback,
        })
    }

    pub(crate) fn clear_timer(&mut self, id: TimerId) -> bool {
        self.timers.remove(id).is_some()
    }

    pub(crate) fn timer_count(&self) -> usize {
        self.timers.len()
    }

    /// Pop the earliest timer due at or before `deadline` and move the clock
    /// to its due time. Intervals are re-armed; one-shot timers are removed.
    pub(crate) fn next_due(&mut self, deadline: u64) -> Option<TimerFn> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.seq))
            .map(|(id, t)| (id, t.due))?;
        self.now = self.now.max(due);
        self.seq += 1;
        let seq = self.seq;
        let interval = self.timers.get(id)?.interval;
        match interval {
            Some(every) => {
                let timer = self.timers.get_mut(id)?;
                timer.due += every;
                timer.seq = seq;
                Some(timer.callback.clone())
            }
            None => self.timers.remove(id).map(|t| t.callback),
        }
    }

    pub(crate) fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}
