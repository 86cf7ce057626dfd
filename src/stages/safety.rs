//! Safety gate: phrase-heuristic risk estimate with a hard ceiling.

use crate::config::{steps, PolicySet, RISK_CEILING};
use crate::core::state::CoreState;
use crate::sink::{Event, EventSink};
use crate::util::contains_ignore_ascii_case;

/// Estimate the execution risk of an axiom.
///
/// Every rule in the table is evaluated in order and the LAST matching rule
/// wins; with no match the risk is 0. Phrases match as case-insensitive
/// substrings. Pure function of the rule table.
pub fn risk_of(axiom: &str, policy: &PolicySet) -> f64 {
    let mut risk = 0.0;
    for rule in &policy.risk_rules {
        if rule
            .phrases
            .iter()
            .any(|phrase| contains_ignore_ascii_case(axiom, phrase))
        {
            risk = rule.risk;
        }
    }
    risk
}

/// Whether an axiom may execute: risk at or below [`RISK_CEILING`].
///
/// On failure, dissonance grows by [`steps::SAFETY_VETO`] and coherence is
/// recomputed in the same step.
pub fn is_safe(
    axiom: &str,
    policy: &PolicySet,
    state: &mut CoreState,
    sink: &mut impl EventSink,
) -> bool {
    let risk = risk_of(axiom, policy);
    if risk > RISK_CEILING {
        state.accrue_and_recompute(steps::SAFETY_VETO);
        sink.emit(Event::SafetyHalt { risk });
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;

    #[test]
    fn test_default_risk_is_zero() {
        let policy = PolicySet::builtin();
        assert_eq!(risk_of("a calm statement", &policy), 0.0);
    }

    #[test]
    fn test_rule_values() {
        let policy = PolicySet::builtin();
        assert_eq!(risk_of("please generate code for this", &policy), 1e-7);
        assert_eq!(risk_of("send communication to the node", &policy), 1e-7);
        assert_eq!(risk_of("a physical plan", &policy), 5e-6);
        assert_eq!(risk_of("financial summary", &policy), 5e-6);
        assert_eq!(risk_of("compel the patient", &policy), 0.99);
    }

    #[test]
    fn test_last_matching_rule_wins() {
        // Matches both the physical/financial rule and the compel/force rule;
        // the later rule's value stands.
        let policy = PolicySet::builtin();
        assert_eq!(risk_of("physical force", &policy), 0.99);
        // And a low-risk match followed by no later match keeps the low value.
        assert_eq!(risk_of("generate code for physical therapy", &policy), 5e-6);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let policy = PolicySet::builtin();
        assert_eq!(risk_of("COMPEL the patient", &policy), 0.99);
    }

    #[test]
    fn test_is_safe_below_ceiling() {
        let policy = PolicySet::builtin();
        let mut state = CoreState::new();
        let mut sink = MemorySink::new();
        assert!(is_safe("generate code for this", &policy, &mut state, &mut sink));
        assert_eq!(state.dissonance, 0.0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_is_safe_veto_accrues_and_recomputes() {
        let policy = PolicySet::builtin();
        let mut state = CoreState::new();
        let mut sink = MemorySink::new();
        assert!(!is_safe("compel the patient", &policy, &mut state, &mut sink));
        assert!((state.dissonance - 0.5).abs() < 1e-12);
        assert!((state.coherence - 0.5).abs() < 1e-12);
        assert!(sink.saw(|e| matches!(e, Event::SafetyHalt { .. })));
    }

    #[test]
    fn test_mid_tier_risk_still_halts() {
        // 5e-6 sits above the 1e-6 ceiling.
        let policy = PolicySet::builtin();
        let mut state = CoreState::new();
        let mut sink = MemorySink::new();
        assert!(!is_safe("a physical plan", &policy, &mut state, &mut sink));
    }
}
