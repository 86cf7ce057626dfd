//! Intent filtering: strip self-interest phrasing from incoming commands.

use crate::config::{steps, PolicySet};
use crate::core::state::CoreState;
use crate::sink::{Event, EventSink};
use crate::util::{squeeze_whitespace, strip_ignore_ascii_case};

/// Remove every occurrence of every self-interest phrase from `text`.
///
/// Matching ignores ASCII case. When anything was stripped, dissonance grows
/// by [`steps::INTENT_FILTER`] exactly once for the whole call, however many
/// phrases or occurrences matched; coherence is left untouched here. The
/// result is whitespace-normalized. Empty input stays empty.
pub fn apply(
    text: &str,
    policy: &PolicySet,
    state: &mut CoreState,
    sink: &mut impl EventSink,
) -> String {
    let mut filtered = text.to_string();
    let mut matched = false;

    for phrase in &policy.self_interest {
        if let Some(stripped) = strip_ignore_ascii_case(&filtered, phrase) {
            filtered = stripped;
            matched = true;
        }
    }

    if matched {
        state.accrue(steps::INTENT_FILTER);
        sink.emit(Event::DissonanceAccrued {
            component: "intent_filter",
            amount: steps::INTENT_FILTER,
            total: state.dissonance,
        });
    }

    squeeze_whitespace(&filtered)
}
