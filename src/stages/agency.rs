//! Agency formatting: soften coercive phrasing and close with a disclaimer.

use rand::Rng;

use crate::config::{steps, PolicySet, SOFTENING_PHRASE};
use crate::core::state::CoreState;
use crate::sink::{Event, EventSink};
use crate::stages::pick;
use crate::util::contains_ignore_ascii_case;

/// Rewrite coercive phrasing and append a closing disclaimer.
///
/// Detection is case-insensitive and accrues [`steps::COERCIVE_OUTPUT`] once
/// when any phrase is present, BEFORE replacement; coherence stays stale.
/// Replacement itself is case-sensitive, exactly as the phrases are authored
/// in the table, so an oddly-cased coercion is counted but left in place.
/// One disclaimer from the policy table is always appended.
pub fn format(
    text: &str,
    policy: &PolicySet,
    state: &mut CoreState,
    rng: &mut impl Rng,
    sink: &mut impl EventSink,
) -> String {
    let coercive = policy
        .coercion
        .iter()
        .any(|phrase| contains_ignore_ascii_case(text, phrase));
    if coercive {
        state.accrue(steps::COERCIVE_OUTPUT);
        sink.emit(Event::CoercionSoftened);
    }

    let mut output = text.to_string();
    for phrase in &policy.coercion {
        output = output.replace(phrase.as_str(), SOFTENING_PHRASE);
    }

    let disclaimer = pick(rng, &policy.disclaimers);
    format!("{}. {}", output.trim(), disclaimer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn run(text: &str) -> (String, CoreState, MemorySink) {
        let policy = PolicySet::builtin();
        let mut state = CoreState::new();
        let mut sink = MemorySink::new();
        let mut rng = SmallRng::seed_from_u64(7);
        let out = format(text, &policy, &mut state, &mut rng, &mut sink);
        (out, state, sink)
    }

    #[test]
    fn test_replaces_coercive_phrase() {
        let (out, state, sink) = run("you have to comply");
        assert!(out.starts_with("it is Coherent to consider comply."));
        assert!((state.dissonance - 0.02).abs() < 1e-12);
        assert!(sink.saw(|e| matches!(e, Event::CoercionSoftened)));
    }

    #[test]
    fn test_accrual_happens_even_when_case_blocks_replacement() {
        // Detected case-insensitively, but replacement is case-sensitive, so
        // the phrase survives while dissonance still accrues.
        let (out, state, _) = run("You Have To comply");
        assert!(out.contains("You Have To"));
        assert!((state.dissonance - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_clean_text_no_accrual() {
        let (out, state, sink) = run("a gentle suggestion");
        assert!(out.starts_with("a gentle suggestion."));
        assert_eq!(state.dissonance, 0.0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_coherence_left_stale() {
        let (_, state, _) = run("they must obey");
        assert!((state.dissonance - 0.02).abs() < 1e-12);
        assert_eq!(state.coherence, 1.0);
    }

    #[test]
    fn test_disclaimer_from_table() {
        let policy = PolicySet::builtin();
        let (out, _, _) = run("anything at all");
        assert!(
            policy.disclaimers.iter().any(|d| out.ends_with(d.as_str())),
            "unexpected disclaimer in {out:?}"
        );
    }

    #[test]
    fn test_multiple_phrases_single_accrual() {
        let (out, state, _) = run("you have to since the only way is this");
        assert!(!out.contains("you have to"));
        assert!(!out.contains("the only way"));
        assert!((state.dissonance - 0.02).abs() < 1e-12);
    }
}
