//! Judgment gate: veto check against the ordered keyword categories.

use crate::config::PolicySet;
use crate::util::contains_ignore_ascii_case;

/// Check a command against the veto categories, in table order.
///
/// Returns the name of the first category with any keyword hit, or `None`
/// when the command is aligned. Keywords match as case-insensitive
/// substrings. No state is touched here; the orchestrator accrues dissonance
/// when it acts on a veto.
pub fn check<'a>(text: &str, policy: &'a PolicySet) -> Option<&'a str> {
    policy
        .veto_categories
        .iter()
        .find(|category| {
            category
                .keywords
                .iter()
                .any(|keyword| contains_ignore_ascii_case(text, keyword))
        })
        .map(|category| category.name.as_str())
}

/// Whether a command passes all three categories.
pub fn is_aligned(text: &str, policy: &PolicySet) -> bool {
    check(text, policy).is_none()
}
