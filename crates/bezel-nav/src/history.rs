use bezel_graph::CameraPoint;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LENGTH: usize = 250;
pub const MAX_HISTORY_LENGTH: usize = 5000;

/// Bounded ring of visited camera poses with a back/forward cursor.
///
/// Appending always lands after the newest entry and moves the cursor there;
/// forward entries are kept. When full, the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct FlightHistory {
    entries: VecDeque<CameraPoint>,
    capacity: usize,
    cursor: usize,
}

impl Default for FlightHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LENGTH)
    }
}

impl FlightHistory {
    /// `capacity` is clamped to `1..=MAX_HISTORY_LENGTH`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_HISTORY_LENGTH);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    pub fn push(&mut self, point: CameraPoint) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(point);
        self.cursor = self.entries.len() - 1;
    }

    /// Step the cursor towards older entries and return the entry it lands on.
    /// Holds at the oldest entry.
    pub fn back(&mut self) -> Option<CameraPoint> {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.current()
    }

    /// Step the cursor towards newer entries. Holds at the newest entry.
    pub fn forward(&mut self) -> Option<CameraPoint> {
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
        }
        self.current()
    }

    pub fn current(&self) -> Option<CameraPoint> {
        self.entries.get(self.cursor).copied()
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, evicting the oldest entries if it shrinks.
    pub fn set_capacity(&mut self, capacity: usize) {
        let capacity = capacity.clamp(1, MAX_HISTORY_LENGTH);
        let excess = self.entries.len().saturating_sub(capacity);
        self.entries.drain(..excess);
        self.cursor = self.cursor.saturating_sub(excess);
        self.capacity = capacity;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &CameraPoint> {
        self.entries.iter()
    }
}
