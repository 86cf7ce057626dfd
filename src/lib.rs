//! Arbor - stateful command-filtering pipeline with a weighted suggestion
//! garden.
//!
//! Arbor accepts free-text commands, filters and judges them against fixed
//! keyword policies, tracks an accumulating dissonance scalar that decays on
//! successful cycles, and composes formatted responses, consulting the
//! Garden, a weighted suggestion graph linking transformed commands to
//! follow-on text. Everything is in-memory and single-threaded; there is no
//! persistence and no network.

pub mod config;
pub mod core;
pub mod error;
pub mod external;
pub mod garden;
pub mod sink;
pub mod stages;
pub mod util;

pub use self::config::{PolicyLine, PolicySet, RiskRule, VetoCategory};
pub use self::core::{AdjustmentLogEntry, Core, CoreState, ProcessOutcome, StatusReport};
pub use self::error::{ArborError, Result};
pub use self::garden::Garden;
pub use self::sink::{Event, EventSink, MemorySink, TracingSink};
