use tracing::trace;

use super::clock::{Clock, MonotonicClock};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Priming,
    Reveal,
    GoSignal,
    Round,
    Transition,
}

/// Identifies one countdown. `generation` tags the session that armed it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    pub id: u64,
    pub generation: u64,
    pub kind: TimerKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { handle: TimerHandle, remaining_ms: u64 },
    /// `deadline` is when the countdown ran out, which may be earlier than
    /// the poll that reported it.
    Expired { handle: TimerHandle, deadline: Mark },
}

impl TimerEvent {
    pub fn handle(&self) -> TimerHandle {
        match self {
            TimerEvent::Tick { handle, .. } | TimerEvent::Expired { handle, .. } => *handle,
        }
    }
}

/// A recorded instant for elapsed-time measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mark(u64);

impl Mark {
    pub fn at(ms: u64) -> Self {
        Mark(ms)
    }

    pub fn ms(&self) -> u64 {
        self.0
    }
}

struct Countdown {
    handle: TimerHandle,
    deadline: u64,
    tick_every: u64,
    next_tick: u64,
}

impl Countdown {
    /// When this countdown next wants attention, if it is due at `now`.
    fn due_at(&self, now: u64) -> Option<u64> {
        if now >= self.deadline {
            Some(self.deadline)
        } else if self.tick_every > 0 && now >= self.next_tick {
            Some(self.next_tick)
        } else {
            None
        }
    }
}

/// Countdown timers polled against a monotonic clock.
///
/// Events are pulled one at a time with [`TimerService::poll_next`] so that a
/// consumer reacting to one event can cancel others before they are delivered.
pub struct TimerService<C: Clock = MonotonicClock> {
    clock: C,
    countdowns: Vec<Countdown>,
    next_id: u64,
}

impl<C: Clock> TimerService<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            countdowns: Vec::new(),
            next_id: 1,
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    pub fn mark(&self) -> Mark {
        Mark(self.clock.now_ms())
    }

    pub fn elapsed_since(&self, mark: Mark) -> u64 {
        self.clock.now_ms().saturating_sub(mark.0)
    }

    /// Arms a countdown measured from `start`, which may lie in the past.
    /// `tick_every_ms == 0` disables ticks.
    pub fn start_countdown(
        &mut self,
        start: Mark,
        duration_ms: u64,
        tick_every_ms: u64,
        kind: TimerKind,
        generation: u64,
    ) -> TimerHandle {
        let start = start.ms();
        let handle = TimerHandle {
            id: self.next_id,
            generation,
            kind,
        };
        self.next_id += 1;
        self.countdowns.push(Countdown {
            handle,
            deadline: start + duration_ms,
            tick_every: tick_every_ms,
            next_tick: start + tick_every_ms,
        });
        trace!(id = handle.id, ?kind, duration_ms, "countdown armed");
        handle
    }

    /// Cancelling an expired or already cancelled handle does nothing.
    pub fn cancel(&mut self, handle: TimerHandle) {
        self.countdowns.retain(|c| c.handle.id != handle.id);
    }

    pub fn cancel_generation(&mut self, generation: u64) {
        self.countdowns.retain(|c| c.handle.generation != generation);
    }

    pub fn pending(&self) -> usize {
        self.countdowns.len()
    }

    /// Earliest due event, if any. Expiry removes the countdown; several
    /// missed ticks of one countdown coalesce into a single `Tick`.
    pub fn poll_next(&mut self) -> Option<TimerEvent> {
        let now = self.clock.now_ms();
        let (idx, _) = self
            .countdowns
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.due_at(now).map(|at| (i, (at, c.handle.id))))
            .min_by_key(|(_, key)| *key)?;

        if now >= self.countdowns[idx].deadline {
            let countdown = self.countdowns.remove(idx);
            return Some(TimerEvent::Expired {
                handle: countdown.handle,
                deadline: Mark(countdown.deadline),
            });
        }

        let countdown = &mut self.countdowns[idx];
        let missed = (now - countdown.next_tick) / countdown.tick_every + 1;
        countdown.next_tick += missed * countdown.tick_every;
        Some(TimerEvent::Tick {
            handle: countdown.handle,
            remaining_ms: countdown.deadline - now,
        })
    }
}
