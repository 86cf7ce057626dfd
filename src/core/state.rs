//! Mutable core state: scalars, latches, archives, audit log entries.
//!
//! A single [`CoreState`] is created per core and mutated in place by every
//! pipeline stage. Coherence is derived as `1 − dissonance`, but it is NOT
//! recomputed on every accrual: only the judgment veto, the decay step, and
//! the safety veto refresh it, so it can go stale between those points. The
//! two accrual methods make that distinction explicit at every call site.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DECAY_FRACTION;

/// The mutable state of one pipeline core.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreState {
    /// Derived health indicator, `1 − dissonance` where last recomputed.
    pub coherence: f64,
    /// Accumulated non-negative penalty scalar.
    pub dissonance: f64,
    /// Genesis latch: engaged once, never released.
    pub guarded: bool,
    /// Operational latch: engaged once after genesis, never released.
    pub operational: bool,
    /// External-data gate, off by default, set only by direct assignment.
    pub external_access_authorized: bool,
    /// Append-only archive of coherent axioms and validated data.
    pub axiom_archive: Vec<String>,
    /// Append-only archive of dissonant data.
    pub dissonance_archive: Vec<String>,
    /// Every raw command ever submitted, in order.
    pub command_log: Vec<String>,
}

impl Default for CoreState {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreState {
    /// Fresh state: full coherence, no dissonance, both latches open.
    pub fn new() -> Self {
        Self {
            coherence: 1.0,
            dissonance: 0.0,
            guarded: false,
            operational: false,
            external_access_authorized: false,
            axiom_archive: Vec::new(),
            dissonance_archive: Vec::new(),
            command_log: Vec::new(),
        }
    }

    /// Accrue dissonance WITHOUT refreshing coherence.
    ///
    /// Used by the intent filter, the agency formatter, and the external
    /// feed; coherence stays stale until the next decay or veto recompute.
    pub fn accrue(&mut self, amount: f64) {
        self.dissonance += amount;
    }

    /// Accrue dissonance and refresh coherence in the same step.
    ///
    /// Used by the judgment and safety vetoes.
    pub fn accrue_and_recompute(&mut self, amount: f64) {
        self.dissonance += amount;
        self.recompute_coherence();
    }

    /// Refresh `coherence` from the current dissonance.
    pub fn recompute_coherence(&mut self) {
        self.coherence = 1.0 - self.dissonance;
    }

    /// One decay step: remove a fixed fraction of the current dissonance and
    /// refresh coherence. Returns the amount removed, or `None` when there
    /// was nothing to decay.
    pub fn decay(&mut self) -> Option<f64> {
        if self.dissonance <= 0.0 {
            return None;
        }
        let cut = self.dissonance * DECAY_FRACTION;
        self.dissonance -= cut;
        self.recompute_coherence();
        Some(cut)
    }
}

/// Append-only audit record of a reflective adjustment to a component.
///
/// Independent of the primary scalars: logging an adjustment never changes
/// dissonance, it only snapshots it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdjustmentLogEntry {
    /// When the adjustment was recorded.
    pub timestamp: DateTime<Utc>,
    /// Component the adjustment applies to.
    pub component: String,
    /// Kind of change (free-form label).
    pub change_kind: String,
    /// State before the change.
    pub old_state: String,
    /// State after the change.
    pub new_state: String,
    /// Dissonance at the moment of recording.
    pub dissonance_snapshot: f64,
    /// Command or reason that triggered the adjustment.
    pub trigger: String,
}

impl AdjustmentLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        component: impl Into<String>,
        change_kind: impl Into<String>,
        old_state: impl Into<String>,
        new_state: impl Into<String>,
        dissonance_snapshot: f64,
        trigger: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.into(),
            change_kind: change_kind.into(),
            old_state: old_state.into(),
            new_state: new_state.into(),
            dissonance_snapshot,
            trigger: trigger.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_fully_coherent() {
        let state = CoreState::new();
        assert_eq!(state.coherence, 1.0);
        assert_eq!(state.dissonance, 0.0);
        assert!(!state.guarded);
        assert!(!state.operational);
        assert!(!state.external_access_authorized);
    }

    #[test]
    fn test_accrue_leaves_coherence_stale() {
        let mut state = CoreState::new();
        state.accrue(0.02);
        assert_eq!(state.dissonance, 0.02);
        assert_eq!(state.coherence, 1.0);
    }

    #[test]
    fn test_accrue_and_recompute() {
        let mut state = CoreState::new();
        state.accrue_and_recompute(0.1);
        assert!((state.coherence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_decay_removes_sixty_percent() {
        let mut state = CoreState::new();
        state.accrue(0.5);
        let cut = state.decay().unwrap();
        assert!((cut - 0.3).abs() < 1e-12);
        assert!((state.dissonance - 0.2).abs() < 1e-12);
        assert!((state.coherence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_decay_noop_at_zero() {
        let mut state = CoreState::new();
        assert_eq!(state.decay(), None);
        assert_eq!(state.coherence, 1.0);
    }

    #[test]
    fn test_adjustment_entry_roundtrips_through_json() {
        let entry = AdjustmentLogEntry::new(
            "judgment_gate",
            "keyword addition",
            "[coerce]",
            "[coerce, compel]",
            0.12,
            "capability review",
        );
        let json = serde_json::to_string(&entry).unwrap();
        let back: AdjustmentLogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
