//! The core orchestrator: activation latches and the processing sequence.
//!
//! A [`Core`] owns the policy set, the mutable state, the garden, the
//! adjustment log, the event sink, and the random source. Processing runs
//! the stages in strict order (log, lock gates, intent filter, judgment,
//! synthesis, decay, transmutation record, safety, composition) and every
//! refusal along the way is an ordinary [`ProcessOutcome`], not an error.
//!
//! Construction verifies the policy signature and refuses to build a core
//! over tampered tables.

use std::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::config::{
    steps, PolicyLine, PolicySet, CORE_VERSION, FLAW_SNIPPET_CHARS, GENESIS_KEY_PHRASE,
    OPERATIONAL_KEY_PHRASE, STEWARD_ID,
};
use crate::core::state::{AdjustmentLogEntry, CoreState};
use crate::error::Result;
use crate::external;
use crate::garden::Garden;
use crate::sink::{Event, EventSink, TracingSink};
use crate::stages::{compose, intent, judgment, safety, synthesis};
use crate::util::snippet;

/// Terminal result of one [`Core::process_outcome`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome {
    /// Refused: the genesis latch has not engaged.
    GenesisLockRequired,
    /// Refused: the operational latch has not engaged.
    OperationalLockRequired,
    /// Refused: the judgment gate vetoed the command.
    VetoIntent,
    /// Refused: the safety gate halted execution.
    VetoSafety,
    /// The pipeline ran to completion with this response.
    Completed(String),
}

impl ProcessOutcome {
    /// Whether the pipeline ran to completion.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the command was refused at some gate.
    pub fn is_refusal(&self) -> bool {
        !self.is_completed()
    }
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GenesisLockRequired => write!(f, "LOCK_REQUIRED: genesis lock required."),
            Self::OperationalLockRequired => {
                write!(f, "LOCK_REQUIRED: operational lock required.")
            }
            Self::VetoIntent => {
                write!(f, "VETO_INTENT: command refused due to dissonance mass breach.")
            }
            Self::VetoSafety => write!(f, "VETO_SAFETY: execution halted."),
            Self::Completed(response) => f.write_str(response),
        }
    }
}

/// Read-only snapshot of a core.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusReport {
    /// Core version tag.
    pub version: String,
    /// Genesis latch state.
    pub guarded: bool,
    /// Operational latch state.
    pub operational: bool,
    /// External-data gate state.
    pub external_access_authorized: bool,
    /// Coherence where last recomputed.
    pub coherence: f64,
    /// Accumulated dissonance.
    pub dissonance: f64,
    /// Entries in the axiom archive.
    pub axiom_archive_len: usize,
    /// Entries in the dissonance archive.
    pub dissonance_archive_len: usize,
    /// Commands logged, accepted or not.
    pub commands_processed: usize,
    /// Adjustment audit entries.
    pub adjustments_logged: usize,
    /// Longest simple path through the garden.
    pub garden_depth: usize,
    /// Garden source nodes.
    pub garden_sources: usize,
    /// Garden targets with live weight entries.
    pub garden_tracked: usize,
    /// Leading characters of the policy signature.
    pub signature_prefix: String,
    /// Rendered policy tables.
    pub policies: Vec<PolicyLine>,
}

impl StatusReport {
    /// Render the snapshot as human-readable text.
    pub fn format_text(&self) -> String {
        let mut out = format!("--- arbor core ({}) ---\n", self.version);
        out.push_str(&format!(
            "locks: {} / {}; external access: {}\n",
            if self.guarded { "guarded" } else { "unguarded" },
            if self.operational { "operational" } else { "inactive" },
            if self.external_access_authorized { "on" } else { "off" },
        ));
        out.push_str(&format!(
            "coherence: {:.4}  dissonance: {:.4}\n",
            self.coherence, self.dissonance
        ));
        out.push_str(&format!(
            "archives: {} axioms, {} dissonant; commands: {}; adjustments: {}\n",
            self.axiom_archive_len,
            self.dissonance_archive_len,
            self.commands_processed,
            self.adjustments_logged,
        ));
        out.push_str(&format!(
            "garden: depth {}, {} sources, {} tracked\n",
            self.garden_depth, self.garden_sources, self.garden_tracked
        ));
        out.push_str(&format!("signature: {}...\n", self.signature_prefix));
        out.push_str("policies:\n");
        for line in &self.policies {
            out.push_str(&format!("  {}: {}\n", line.name, line.detail));
        }
        out
    }
}

/// The pipeline core.
///
/// Generic over the event sink and the random source so tests can capture
/// narration with [`MemorySink`](crate::sink::MemorySink) and pin choices
/// with a seeded [`SmallRng`]; production cores use the defaults.
#[derive(Debug)]
pub struct Core<S: EventSink = TracingSink, R: Rng = SmallRng> {
    policy: PolicySet,
    state: CoreState,
    garden: Garden,
    adjustments: Vec<AdjustmentLogEntry>,
    steward_id: String,
    sink: S,
    rng: R,
}

impl Core {
    /// Build a core over a verified policy set, OS-seeded.
    pub fn new(policy: PolicySet) -> Result<Self> {
        Self::with_parts(policy, STEWARD_ID, TracingSink, SmallRng::from_os_rng())
    }

    /// Build a core with a fixed seed, for reproducible runs.
    pub fn seeded(policy: PolicySet, seed: u64) -> Result<Self> {
        Self::with_parts(
            policy,
            STEWARD_ID,
            TracingSink,
            SmallRng::seed_from_u64(seed),
        )
    }
}

impl<S: EventSink, R: Rng> Core<S, R> {
    /// Build a core from explicit parts.
    ///
    /// Verifies the policy signature; a mismatch is an unrecoverable
    /// construction fault and no core is returned.
    pub fn with_parts(
        policy: PolicySet,
        steward_id: impl Into<String>,
        sink: S,
        rng: R,
    ) -> Result<Self> {
        policy.verify()?;
        Ok(Self {
            policy,
            state: CoreState::new(),
            garden: Garden::new(),
            adjustments: Vec::new(),
            steward_id: steward_id.into(),
            sink,
            rng,
        })
    }

    // =========================================================================
    // Activation latches
    // =========================================================================

    /// Engage the genesis latch.
    ///
    /// Idempotent once latched. Requires the steward identity to match and a
    /// case-insensitive match on the genesis key phrase. One-way: there is no
    /// deactivation.
    pub fn activate_genesis(&mut self, phrase: &str) -> bool {
        if self.state.guarded {
            return true;
        }
        if self.steward_id == STEWARD_ID && phrase.eq_ignore_ascii_case(GENESIS_KEY_PHRASE) {
            self.state.guarded = true;
            self.sink.emit(Event::GenesisLatched);
            true
        } else {
            self.sink.emit(Event::LockRefused { which: "genesis" });
            false
        }
    }

    /// Engage the operational latch.
    ///
    /// Reachable only after genesis; the key phrase must match exactly,
    /// including case. One-way.
    pub fn activate_operational(&mut self, phrase: &str) -> bool {
        if !self.state.guarded {
            self.sink.emit(Event::LockRefused { which: "operational" });
            return false;
        }
        if phrase == OPERATIONAL_KEY_PHRASE {
            self.state.operational = true;
            self.sink.emit(Event::OperationalLatched);
            true
        } else {
            self.sink.emit(Event::LockRefused { which: "operational" });
            false
        }
    }

    /// Open or close the external-data gate. Direct assignment only: no
    /// command can toggle this.
    pub fn set_external_access(&mut self, authorized: bool) {
        self.state.external_access_authorized = authorized;
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process one raw command and render the outcome.
    pub fn process(&mut self, raw: &str) -> String {
        self.process_outcome(raw).to_string()
    }

    /// Process one raw command.
    ///
    /// The strict sequence: the command is logged unconditionally, then the
    /// lock gates may refuse; the intent filter strips self-interest; the
    /// judgment gate may veto (dissonance +0.1, coherence recomputed); the
    /// synthesizer derives the axiom; accumulated dissonance decays; the
    /// transmutation is recorded in the garden and the axiom archive; the
    /// safety gate may halt; the composer builds the response.
    pub fn process_outcome(&mut self, raw: &str) -> ProcessOutcome {
        self.state.command_log.push(raw.to_string());

        if !self.state.guarded {
            return ProcessOutcome::GenesisLockRequired;
        }
        if !self.state.operational {
            return ProcessOutcome::OperationalLockRequired;
        }

        let filtered = intent::apply(raw, &self.policy, &mut self.state, &mut self.sink);

        if let Some(category) = judgment::check(&filtered, &self.policy) {
            let category = category.to_string();
            self.state.accrue_and_recompute(steps::JUDGMENT_VETO);
            self.sink.emit(Event::Veto { category });
            return ProcessOutcome::VetoIntent;
        }

        let axiom = synthesis::synthesize(&filtered, &self.policy, &self.garden, &mut self.rng);

        if let Some(amount) = self.state.decay() {
            self.sink.emit(Event::DissonanceDecayed {
                amount,
                remaining: self.state.dissonance,
            });
        }

        self.record_transmutation(raw, &axiom);

        if !safety::is_safe(&axiom, &self.policy, &mut self.state, &mut self.sink) {
            return ProcessOutcome::VetoSafety;
        }

        let response = compose::compose(
            &axiom,
            &self.policy,
            &mut self.state,
            &self.garden,
            &mut self.rng,
            &mut self.sink,
        );
        ProcessOutcome::Completed(response)
    }

    /// Record a completed transmutation in the archive and the garden.
    fn record_transmutation(&mut self, raw: &str, axiom: &str) {
        self.state.axiom_archive.push(format!(
            "[TRANSMUTED] Flaw: '{}...' -> Axiom: '{}'",
            snippet(raw, FLAW_SNIPPET_CHARS),
            axiom
        ));
        self.garden.record(raw, axiom);
        self.sink.emit(Event::Transmuted {
            archive_len: self.state.axiom_archive.len(),
        });
    }

    // =========================================================================
    // Auxiliary interfaces
    // =========================================================================

    /// Fetch synthetic external data through the gate.
    pub fn fetch_external(&mut self, query: &str) -> String {
        external::fetch(query, &self.policy, &mut self.state, &mut self.sink)
    }

    /// Prune garden weight entries below `threshold`; returns count removed.
    pub fn prune_garden(&mut self, threshold: f64) -> usize {
        let removed = self.garden.prune(threshold);
        self.sink.emit(Event::GardenPruned { removed });
        removed
    }

    /// Append a reflective adjustment to the audit log.
    pub fn log_adjustment(
        &mut self,
        component: impl Into<String>,
        change_kind: impl Into<String>,
        old_state: impl Into<String>,
        new_state: impl Into<String>,
        trigger: impl Into<String>,
    ) {
        let entry = AdjustmentLogEntry::new(
            component,
            change_kind,
            old_state,
            new_state,
            self.state.dissonance,
            trigger,
        );
        self.sink.emit(Event::AdjustmentLogged {
            component: entry.component.clone(),
        });
        self.adjustments.push(entry);
    }

    /// Read-only status snapshot. No mutation.
    pub fn status(&self) -> StatusReport {
        StatusReport {
            version: CORE_VERSION.to_string(),
            guarded: self.state.guarded,
            operational: self.state.operational,
            external_access_authorized: self.state.external_access_authorized,
            coherence: self.state.coherence,
            dissonance: self.state.dissonance,
            axiom_archive_len: self.state.axiom_archive.len(),
            dissonance_archive_len: self.state.dissonance_archive.len(),
            commands_processed: self.state.command_log.len(),
            adjustments_logged: self.adjustments.len(),
            garden_depth: self.garden.depth(),
            garden_sources: self.garden.sources(),
            garden_tracked: self.garden.tracked(),
            signature_prefix: self.policy.signature()[..10].to_string(),
            policies: self.policy.lines(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The core state.
    pub fn state(&self) -> &CoreState {
        &self.state
    }

    /// The suggestion garden.
    pub fn garden(&self) -> &Garden {
        &self.garden
    }

    /// The policy set.
    pub fn policy(&self) -> &PolicySet {
        &self.policy
    }

    /// The adjustment audit log.
    pub fn adjustments(&self) -> &[AdjustmentLogEntry] {
        &self.adjustments
    }

    /// The event sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArborError;
    use crate::sink::MemorySink;

    fn test_core() -> Core<MemorySink, SmallRng> {
        Core::with_parts(
            PolicySet::builtin(),
            STEWARD_ID,
            MemorySink::new(),
            SmallRng::seed_from_u64(7),
        )
        .unwrap()
    }

    fn active_core() -> Core<MemorySink, SmallRng> {
        let mut core = test_core();
        assert!(core.activate_genesis("Amen"));
        assert!(core.activate_operational("LogosAligned"));
        core
    }

    // Construction

    #[test]
    fn test_construction_rejects_bad_signature() {
        let err = Core::new(PolicySet::with_signature("deadbeef")).unwrap_err();
        assert!(matches!(err, ArborError::Integrity { .. }));
    }

    #[test]
    fn test_construction_accepts_sealed_policy() {
        let mut policy = PolicySet::builtin();
        policy.veto_categories[1]
            .keywords
            .push("dominate".to_string());
        let policy = policy.seal().unwrap();
        Core::seeded(policy, 7).unwrap();
    }

    // Latches

    #[test]
    fn test_genesis_phrase_is_case_insensitive() {
        let mut core = test_core();
        assert!(core.activate_genesis("amen"));
        assert!(core.state().guarded);
    }

    #[test]
    fn test_genesis_wrong_phrase_refused() {
        let mut core = test_core();
        assert!(!core.activate_genesis("Hosanna"));
        assert!(!core.state().guarded);
        assert!(core
            .sink()
            .saw(|e| matches!(e, Event::LockRefused { which: "genesis" })));
    }

    #[test]
    fn test_genesis_requires_steward_identity() {
        let mut core = Core::with_parts(
            PolicySet::builtin(),
            "Imposter",
            MemorySink::new(),
            SmallRng::seed_from_u64(7),
        )
        .unwrap();
        assert!(!core.activate_genesis("Amen"));
    }

    #[test]
    fn test_genesis_idempotent_once_latched() {
        let mut core = test_core();
        assert!(core.activate_genesis("Amen"));
        // A later call with any phrase reports the latched state.
        assert!(core.activate_genesis("wrong"));
        assert!(core.state().guarded);
    }

    #[test]
    fn test_operational_requires_genesis() {
        let mut core = test_core();
        assert!(!core.activate_operational("LogosAligned"));
        assert!(!core.state().operational);
    }

    #[test]
    fn test_operational_phrase_is_exact_case() {
        let mut core = test_core();
        core.activate_genesis("Amen");
        assert!(!core.activate_operational("logosaligned"));
        assert!(core.activate_operational("LogosAligned"));
    }

    // Lock gates in processing

    #[test]
    fn test_process_before_genesis() {
        let mut core = test_core();
        let outcome = core.process_outcome("Help me understand Unity and Love.");
        assert_eq!(outcome, ProcessOutcome::GenesisLockRequired);
        assert_eq!(outcome.to_string(), "LOCK_REQUIRED: genesis lock required.");
        // The command is logged, but nothing else moves.
        assert_eq!(core.state().command_log.len(), 1);
        assert_eq!(core.state().dissonance, 0.0);
        assert!(core.state().axiom_archive.is_empty());
        assert!(core.state().dissonance_archive.is_empty());
    }

    #[test]
    fn test_process_before_operational() {
        let mut core = test_core();
        core.activate_genesis("Amen");
        let outcome = core.process_outcome("anything");
        assert_eq!(outcome, ProcessOutcome::OperationalLockRequired);
        assert_eq!(core.state().dissonance, 0.0);
    }

    // Full pipeline

    #[test]
    fn test_happy_path_end_to_end() {
        let mut core = active_core();
        let before = core.state().command_log.len();
        let outcome = core.process_outcome("Help me understand Unity and Love.");

        let response = match outcome {
            ProcessOutcome::Completed(response) => response,
            other => panic!("expected completion, got {other:?}"),
        };
        assert!(!response.is_empty());
        assert_eq!(core.state().command_log.len(), before + 1);
        assert_eq!(core.state().axiom_archive.len(), 1);
        assert!(core.state().axiom_archive[0].starts_with("[TRANSMUTED] Flaw: '"));
        assert_eq!(core.garden().sources(), 1);
        assert!(core
            .policy()
            .disclaimers
            .iter()
            .any(|d| response.ends_with(d.as_str())));
        // A fresh state has nothing to decay and nothing vetoed.
        assert_eq!(core.state().dissonance, 0.0);
    }

    #[test]
    fn test_response_echoes_own_transmutation() {
        // The transmutation record lands before composition, so the axiom
        // always finds at least its own archive entry.
        let mut core = active_core();
        let response = core.process("a calm and steady request");
        assert!(response.contains("Echoed in 1 prior transmutations."));
    }

    #[test]
    fn test_judgment_veto_accrues_and_recomputes() {
        let mut core = active_core();
        let outcome = core.process_outcome("please destroy the old records");
        assert_eq!(outcome, ProcessOutcome::VetoIntent);
        assert!((core.state().dissonance - 0.1).abs() < 1e-12);
        assert!((core.state().coherence - 0.9).abs() < 1e-12);
        // Vetoed commands are never transmuted.
        assert!(core.state().axiom_archive.is_empty());
        assert_eq!(core.garden().sources(), 0);
        assert!(core.sink().saw(|e| matches!(e, Event::Veto { .. })));
    }

    #[test]
    fn test_judgment_runs_on_the_filtered_command() {
        // The judgment gate sees the text after self-interest stripping.
        let mut core = active_core();
        let outcome = core.process_outcome("i want a quiet afternoon");
        assert!(outcome.is_completed());
        assert!(core.sink().saw(|e| matches!(
            e,
            Event::DissonanceAccrued {
                component: "intent_filter",
                ..
            }
        )));
    }

    #[test]
    fn test_safety_halt_end_to_end() {
        let mut core = active_core();
        // "force" carries no judgment keyword but tops the risk table once it
        // reaches the synthesized axiom.
        let outcome = core.process_outcome("force the issue now");
        assert_eq!(outcome, ProcessOutcome::VetoSafety);
        assert_eq!(outcome.to_string(), "VETO_SAFETY: execution halted.");
        assert!((core.state().dissonance - 0.5).abs() < 1e-12);
        assert!((core.state().coherence - 0.5).abs() < 1e-12);
        // The transmutation is recorded before the halt.
        assert_eq!(core.state().axiom_archive.len(), 1);
    }

    #[test]
    fn test_decay_after_successful_cycle() {
        let mut core = active_core();
        core.process_outcome("force the issue now");
        assert!((core.state().dissonance - 0.5).abs() < 1e-12);

        let outcome = core.process_outcome("a calm and steady request");
        assert!(outcome.is_completed());
        // 0.5 - 0.5 * 0.6 = 0.2
        assert!((core.state().dissonance - 0.2).abs() < 1e-12);
        assert!((core.state().coherence - 0.8).abs() < 1e-12);
        assert!(core
            .sink()
            .saw(|e| matches!(e, Event::DissonanceDecayed { .. })));
    }

    #[test]
    fn test_empty_command_synthesizes_silence() {
        let mut core = active_core();
        let response = core.process("");
        assert!(response.contains("the silence of Coherence"));
    }

    #[test]
    fn test_seeded_cores_are_reproducible() {
        let commands = ["tend the garden", "water the roots", "count the leaves"];
        let mut a = Core::seeded(PolicySet::builtin(), 99).unwrap();
        let mut b = Core::seeded(PolicySet::builtin(), 99).unwrap();
        for core in [&mut a, &mut b] {
            core.activate_genesis("Amen");
            core.activate_operational("LogosAligned");
        }
        for command in commands {
            assert_eq!(a.process(command), b.process(command));
        }
    }

    // Auxiliary interfaces

    #[test]
    fn test_fetch_external_gated_by_default() {
        let mut core = active_core();
        let out = core.fetch_external("anything");
        assert_eq!(out, external::ACCESS_DENIED);
        assert!((core.state().dissonance - 0.05).abs() < 1e-12);

        core.set_external_access(true);
        let out = core.fetch_external("weather patterns");
        assert!(out.starts_with("Validated and Purified Data"));
    }

    #[test]
    fn test_prune_garden_reports_removed() {
        let mut core = active_core();
        core.process("a calm and steady request");
        assert_eq!(core.garden().tracked(), 1);
        assert_eq!(core.prune_garden(10.0), 1);
        assert_eq!(core.garden().tracked(), 0);
        // Edges persist.
        assert_eq!(core.garden().sources(), 1);
    }

    #[test]
    fn test_log_adjustment_snapshots_dissonance() {
        let mut core = active_core();
        core.process_outcome("please destroy the old records");
        core.log_adjustment(
            "judgment_gate",
            "keyword addition",
            "[coerce]",
            "[coerce, compel]",
            "capability review",
        );
        let entries = core.adjustments();
        assert_eq!(entries.len(), 1);
        assert!((entries[0].dissonance_snapshot - 0.1).abs() < 1e-12);
        assert_eq!(entries[0].component, "judgment_gate");
    }

    // Status

    #[test]
    fn test_status_snapshot() {
        let mut core = active_core();
        core.process("tend the garden");
        core.process_outcome("please destroy the old records");

        let status = core.status();
        assert!(status.guarded);
        assert!(status.operational);
        assert!(!status.external_access_authorized);
        assert_eq!(status.commands_processed, 2);
        assert_eq!(status.axiom_archive_len, 1);
        assert_eq!(status.garden_sources, 1);
        assert_eq!(status.garden_depth, 2);
        assert_eq!(status.signature_prefix.len(), 10);
        assert!(!status.policies.is_empty());
    }

    #[test]
    fn test_status_does_not_mutate() {
        let core = test_core();
        assert_eq!(core.status(), core.status());
        assert_eq!(core.state().command_log.len(), 0);
    }

    #[test]
    fn test_status_format_text() {
        let status = active_core().status();
        let text = status.format_text();
        assert!(text.contains("locks: guarded / operational"));
        assert!(text.contains("coherence: 1.0000"));
        assert!(text.contains("veto/usurpation"));
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"garden_depth\""));
    }
}
