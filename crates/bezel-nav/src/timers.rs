use bezel_events::TimerKind;
use std::collections::BTreeMap;

/// Repeating timers provided by the host event loop.
///
/// At most one timer of each kind is active. Scheduling a kind that is already
/// active replaces it.
pub trait TimerHost {
    fn schedule(&mut self, kind: TimerKind, period_ms: u32);
    fn cancel(&mut self, kind: TimerKind);
    fn is_active(&self, kind: TimerKind) -> bool;

    fn cancel_all(&mut self) {
        for kind in TimerKind::ALL {
            self.cancel(kind);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTimer {
    period_ms: u32,
    due_ms: u64,
}

/// In-memory timer host driven by a virtual clock. Used by tests, scripted
/// replays and hosts that pump timers themselves.
#[derive(Debug, Clone, Default)]
pub struct ManualTimers {
    now_ms: u64,
    active: BTreeMap<TimerKind, ActiveTimer>,
}

impl ManualTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn period(&self, kind: TimerKind) -> Option<u32> {
        self.active.get(&kind).map(|t| t.period_ms)
    }

    pub fn active(&self) -> impl Iterator<Item = TimerKind> + '_ {
        self.active.keys().copied()
    }

    /// Earliest due timer. Ties go to the lower `TimerKind`.
    pub fn next_due(&self) -> Option<(TimerKind, u64)> {
        self.active
            .iter()
            .min_by_key(|(kind, t)| (t.due_ms, **kind))
            .map(|(kind, t)| (*kind, t.due_ms))
    }

    /// Move the clock to the next due timer, re-arm it and report which fired.
    pub fn fire_next(&mut self) -> Option<TimerKind> {
        let (kind, due) = self.next_due()?;
        self.now_ms = due;
        if let Some(timer) = self.active.get_mut(&kind) {
            timer.due_ms = due + u64::from(timer.period_ms);
        }
        Some(kind)
    }

    /// Timers that fire within the next `ms` milliseconds, in firing order.
    ///
    /// The caller must feed each returned kind to the controller before
    /// relying on the timer set, since handlers cancel and reschedule. For an
    /// interleaved loop use [`ManualTimers::fire_next`] with [`Self::next_due`].
    pub fn advance(&mut self, ms: u64) -> Vec<TimerKind> {
        let until = self.now_ms.saturating_add(ms);
        let mut fired = Vec::new();
        while let Some((_, due)) = self.next_due()
            && due <= until
        {
            if let Some(kind) = self.fire_next() {
                fired.push(kind);
            }
        }
        self.now_ms = until;
        fired
    }
}

impl TimerHost for ManualTimers {
    fn schedule(&mut self, kind: TimerKind, period_ms: u32) {
        let period_ms = period_ms.max(1);
        tracing::trace!(?kind, period_ms, "Schedule timer");
        self.active.insert(
            kind,
            ActiveTimer {
                period_ms,
                due_ms: self.now_ms + u64::from(period_ms),
            },
        );
    }

    fn cancel(&mut self, kind: TimerKind) {
        if self.active.remove(&kind).is_some() {
            tracing::trace!(?kind, "Cancel timer");
        }
    }

    fn is_active(&self, kind: TimerKind) -> bool {
        self.active.contains_key(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_replaces_existing_timer() {
        let mut timers = ManualTimers::new();
        timers.schedule(TimerKind::Stop, 3000);
        timers.schedule(TimerKind::Stop, 100);
        assert_eq!(timers.period(TimerKind::Stop), Some(100));
        assert_eq!(timers.active().count(), 1);
    }

    #[test]
    fn test_fire_next_orders_by_due_time() {
        let mut timers = ManualTimers::new();
        timers.schedule(TimerKind::Stop, 3000);
        timers.schedule(TimerKind::Hover, 500);
        assert_eq!(timers.fire_next(), Some(TimerKind::Hover));
        assert_eq!(timers.now_ms(), 500);
        assert_eq!(timers.fire_next(), Some(TimerKind::Hover));
        timers.cancel(TimerKind::Hover);
        assert_eq!(timers.fire_next(), Some(TimerKind::Stop));
        assert_eq!(timers.now_ms(), 3000);
    }

    #[test]
    fn test_advance_repeats() {
        let mut timers = ManualTimers::new();
        timers.schedule(TimerKind::Dimmer, 40);
        let fired = timers.advance(130);
        assert_eq!(fired, vec![TimerKind::Dimmer; 3]);
        assert_eq!(timers.now_ms(), 130);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = ManualTimers::new();
        for kind in TimerKind::ALL {
            timers.schedule(kind, 10);
        }
        timers.cancel_all();
        assert!(timers.fire_next().is_none());
    }
}
