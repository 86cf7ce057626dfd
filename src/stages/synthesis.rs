//! Axiom synthesis: derive a coherent statement from a filtered command.

use rand::Rng;

use crate::config::{PolicySet, KEY_PHRASE_TOKENS, SILENCE_AXIOM};
use crate::garden::Garden;
use crate::stages::pick;

/// Synthesize the axiom for a filtered command.
///
/// Empty input yields the fixed silence statement. Otherwise the key phrase
/// is the first [`KEY_PHRASE_TOKENS`] whitespace tokens (the whole text when
/// it has no more than that), the closing is a uniform choice from the
/// policy table, and the garden may contribute a follow-on suggestion keyed
/// by the composed base.
pub fn synthesize(text: &str, policy: &PolicySet, garden: &Garden, rng: &mut impl Rng) -> String {
    if text.is_empty() {
        return SILENCE_AXIOM.to_string();
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let key = if tokens.len() > KEY_PHRASE_TOKENS {
        tokens[..KEY_PHRASE_TOKENS].join(" ")
    } else {
        text.to_string()
    };

    let closing = pick(rng, &policy.closings);
    let base = format!("Axiom of Coherence: '{key}' converges {closing}");

    match garden.best_next(&base) {
        Some(next) => format!("{base} \u{2192} {next}"),
        None => base,
    }
}
