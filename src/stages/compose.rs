//! Response composition: template, archive echo, garden follow-on, agency.

use rand::Rng;

use crate::config::PolicySet;
use crate::core::state::CoreState;
use crate::garden::Garden;
use crate::sink::EventSink;
use crate::stages::{agency, pick};
use crate::util::contains_ignore_ascii_case;

/// Compose the final response for an executed axiom.
///
/// Picks one of the response templates uniformly, appends an echo count when
/// archive entries mention the axiom (falling back to sentence fragments of
/// the axiom when the whole string finds nothing), appends the garden's
/// follow-on suggestion when one exists, and passes the result through the
/// agency formatter.
pub fn compose(
    axiom: &str,
    policy: &PolicySet,
    state: &mut CoreState,
    garden: &Garden,
    rng: &mut impl Rng,
    sink: &mut impl EventSink,
) -> String {
    let prefix = pick(rng, &policy.response_prefixes);
    let mut response = format!("{prefix}: {axiom}.");

    let echoes = count_echoes(axiom, &state.axiom_archive);
    if echoes > 0 {
        response.push_str(&format!(" Echoed in {echoes} prior transmutations."));
    }

    if let Some(next) = garden.best_next(axiom) {
        response.push_str(&format!(" \u{2192} Next: {next}"));
    }

    agency::format(&response, policy, state, rng, sink)
}

/// Count archive entries mentioning the axiom.
///
/// First pass matches the whole axiom (case-insensitive); when nothing hits,
/// a second pass matches any `". "`-separated fragment of the axiom.
fn count_echoes(axiom: &str, archive: &[String]) -> usize {
    let whole = archive
        .iter()
        .filter(|entry| contains_ignore_ascii_case(entry, axiom))
        .count();
    if whole > 0 {
        return whole;
    }

    let fragments: Vec<&str> = axiom.split(". ").filter(|f| !f.is_empty()).collect();
    archive
        .iter()
        .filter(|entry| {
            fragments
                .iter()
                .any(|fragment| contains_ignore_ascii_case(entry, fragment))
        })
        .count()
}
