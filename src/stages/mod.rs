//! The pipeline stages, in processing order.
//!
//! Each stage is a small module of free functions over the policy tables and
//! the core state. The orchestrator in [`crate::core`] drives them in fixed
//! sequence: intent -> judgment -> synthesis -> (decay) -> safety -> compose,
//! with agency formatting applied inside compose.

pub mod agency;
pub mod compose;
pub mod intent;
pub mod judgment;
pub mod safety;
pub mod synthesis;

use rand::Rng;

/// Uniform choice from a non-empty phrase table.
pub(crate) fn pick<'a, R: Rng>(rng: &mut R, table: &'a [String]) -> &'a str {
    &table[rng.random_range(0..table.len())]
}
