use crate::core::race_event::RaceEvent;
use std::collections::VecDeque;

/// EventLog is the bounded race event history. The newest event is at the front, the oldest one
/// is dropped from the back once the capacity is exceeded.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<RaceEvent>,
    capacity: usize,
}

impl EventLog {
    pub fn new(capacity: usize) -> EventLog {
        EventLog {
            events: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, event: RaceEvent) {
        self.events.push_front(event);
        self.events.truncate(self.capacity);
    }

    /// recent returns the `n` newest events (all if `n` is `None`), newest first.
    pub fn recent(&self, n: Option<usize>) -> Vec<&RaceEvent> {
        let n = n.unwrap_or(self.events.len());
        self.events.iter().take(n).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaceEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::race_event::RaceEventKind;

    fn event(lap: u32) -> RaceEvent {
        RaceEvent::new(lap, lap as f64 * 80.0, RaceEventKind::RaceStart)
    }

    #[test]
    fn oldest_event_is_evicted() {
        let mut log = EventLog::new(3);
        for lap in 1..=4 {
            log.push(event(lap));
        }

        assert_eq!(log.len(), 3);
        let laps: Vec<u32> = log.recent(None).iter().map(|e| e.lap).collect();
        assert_eq!(laps, vec![4, 3, 2]);
    }

    #[test]
    fn recent_is_newest_first() {
        let mut log = EventLog::new(50);
        for lap in 1..=10 {
            log.push(event(lap));
        }

        let laps: Vec<u32> = log.recent(Some(2)).iter().map(|e| e.lap).collect();
        assert_eq!(laps, vec![10, 9]);
        assert_eq!(log.recent(Some(100)).len(), 10);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut log = EventLog::new(5);
        log.push(event(1));
        log.clear();
        assert!(log.is_empty());
        assert!(log.recent(None).is_empty());
    }
}
