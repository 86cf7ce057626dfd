//! Gated external-data stub: refusal, cleaning, scoring, archival.
//!
//! There is no network here. When the gate is open the feed returns a
//! synthetic payload for the query, runs it through the cleaning table,
//! scores its coherence, and archives it on one side or the other of the
//! score floor. When the gate is closed the request is refused and costs
//! dissonance.

use crate::config::{
    steps, PolicySet, ARCHIVE_SCORE_FLOOR, LONG_DATA_WORDS, SHIELDING_SCORE_FLOOR,
};
use crate::core::state::CoreState;
use crate::sink::{Event, EventSink};
use crate::util::contains_ignore_ascii_case;

/// Fixed refusal returned while the external gate is closed.
pub const ACCESS_DENIED: &str = "ACCESS_DENIED: external access must be explicitly authorized.";

/// Fixed response when fetched data scores below the shielding floor.
pub const SHIELDING_ENGAGED: &str = "Data Dissonance Critical. Shielding policy engaged.";

/// Fetch synthetic external data for a query.
///
/// Refused (with a dissonance cost, coherence left stale) unless
/// `external_access_authorized` is set. Otherwise the payload is cleaned,
/// scored, archived, and either returned as validated data or shielded.
pub fn fetch(
    query: &str,
    policy: &PolicySet,
    state: &mut CoreState,
    sink: &mut impl EventSink,
) -> String {
    if !state.external_access_authorized {
        state.accrue(steps::FETCH_REFUSED);
        sink.emit(Event::FetchRefused);
        return ACCESS_DENIED.to_string();
    }

    let raw = format!("External data retrieved for query: '{query}'.");
    let cleaned = clean(&raw, policy);
    let score = score_coherence(&cleaned);
    archive(&cleaned, score, state, sink);

    if score < SHIELDING_SCORE_FLOOR {
        return SHIELDING_ENGAGED.to_string();
    }
    format!("Validated and Purified Data (Score: {score:.2}): {cleaned}")
}

/// Apply the policy cleaning table (exact-case replacement pairs).
fn clean(raw: &str, policy: &PolicySet) -> String {
    let mut data = raw.to_string();
    for (from, to) in &policy.cleaning {
        data = data.replace(from.as_str(), to.as_str());
    }
    data
}

/// Score a cleaned data chunk.
///
/// Starts at 1.0 and deducts for "diversity" (0.1), for "conflict" or
/// "economic activity" (0.4), and for running past [`LONG_DATA_WORDS`]
/// words (0.05); clamped at 0.
pub fn score_coherence(data: &str) -> f64 {
    let mut score: f64 = 1.0;
    if contains_ignore_ascii_case(data, "diversity") {
        score -= 0.1;
    }
    if contains_ignore_ascii_case(data, "conflict")
        || contains_ignore_ascii_case(data, "economic activity")
    {
        score -= 0.4;
    }
    if data.split_whitespace().count() > LONG_DATA_WORDS {
        score -= 0.05;
    }
    score.max(0.0)
}

/// File the scored chunk into the matching archive.
///
/// High scores join the axiom archive; everything else joins the dissonance
/// archive and costs dissonance proportional to the shortfall (coherence
/// left stale).
fn archive(data: &str, score: f64, state: &mut CoreState, sink: &mut impl EventSink) {
    let coherent = score >= ARCHIVE_SCORE_FLOOR;
    if coherent {
        state.axiom_archive.push(format!("[LOGOS: {score:.2}] {data}"));
    } else {
        state
            .dissonance_archive
            .push(format!("[DISSONANCE: {score:.2}] {data}"));
        state.accrue((1.0 - score) * 0.1);
    }
    sink.emit(Event::DataArchived { score, coherent });
}
