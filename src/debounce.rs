//! Cooldown-gated violation state machine.
//!
//! Exit from cooldown is purely time-based: restoring compliance does not end
//! it early, and compliant frames never touch the timer.

use std::time::{Duration, Instant};

use crate::compliance::ComplianceVerdict;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Cooldown,
}

#[derive(Clone, Debug)]
pub struct ViolationDebouncer {
    cooldown: Duration,
    last_violation: Option<Instant>,
    violation_count: u64,
}

impl ViolationDebouncer {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_violation: None,
            violation_count: 0,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn violation_count(&self) -> u64 {
        self.violation_count
    }

    pub fn last_violation(&self) -> Option<Instant> {
        self.last_violation
    }

    pub fn state_at(&self, now: Instant) -> DebounceState {
        match self.last_violation {
            Some(last) if now.saturating_duration_since(last) <= self.cooldown => {
                DebounceState::Cooldown
            }
            _ => DebounceState::Idle,
        }
    }

    /// Feeds one verdict. Returns the sequence number when it opens a new event.
    pub fn observe(&mut self, verdict: &ComplianceVerdict, now: Instant) -> Option<u64> {
        if verdict.is_compliant || self.state_at(now) == DebounceState::Cooldown {
            return None;
        }
        self.violation_count += 1;
        self.last_violation = Some(now);
        Some(self.violation_count)
    }
}

impl Default for ViolationDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppe::PpeCategory;

    fn violation() -> ComplianceVerdict {
        ComplianceVerdict {
            is_compliant: false,
            missing_items: vec![PpeCategory::Helmet],
            ..ComplianceVerdict::skipped()
        }
    }

    #[test]
    fn first_violation_always_fires() {
        let mut debouncer = ViolationDebouncer::default();
        let t0 = Instant::now();
        assert_eq!(debouncer.state_at(t0), DebounceState::Idle);
        assert_eq!(debouncer.observe(&violation(), t0), Some(1));
        assert_eq!(debouncer.state_at(t0), DebounceState::Cooldown);
    }

    #[test]
    fn burst_inside_cooldown_counts_once() {
        let mut debouncer = ViolationDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        let events: Vec<_> = (0..30)
            .filter_map(|i| debouncer.observe(&violation(), t0 + Duration::from_millis(i * 90)))
            .collect();
        assert_eq!(events, vec![1]);
        assert_eq!(debouncer.violation_count(), 1);
    }

    #[test]
    fn boundary_requires_strictly_more_than_cooldown() {
        let cooldown = Duration::from_secs(3);
        let mut debouncer = ViolationDebouncer::new(cooldown);
        let t0 = Instant::now();
        assert_eq!(debouncer.observe(&violation(), t0), Some(1));
        assert_eq!(debouncer.observe(&violation(), t0 + cooldown), None);
        let later = t0 + cooldown + Duration::from_millis(1);
        assert_eq!(debouncer.observe(&violation(), later), Some(2));
    }

    #[test]
    fn compliant_frames_do_not_reset_timer() {
        let mut debouncer = ViolationDebouncer::new(Duration::from_secs(3));
        let t0 = Instant::now();
        debouncer.observe(&violation(), t0);
        let compliant = ComplianceVerdict::skipped();
        assert_eq!(debouncer.observe(&compliant, t0 + Duration::from_secs(1)), None);
        assert_eq!(debouncer.last_violation(), Some(t0));
        assert_eq!(
            debouncer.observe(&violation(), t0 + Duration::from_secs(2)),
            None
        );
        assert_eq!(
            debouncer.observe(&violation(), t0 + Duration::from_secs(4)),
            Some(2)
        );
    }
}
