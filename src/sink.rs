//! Narration events and the injected event sink.
//!
//! The pipeline narrates what it does (accruals, vetoes, decay, latch
//! transitions) as typed [`Event`]s delivered to an [`EventSink`] chosen at
//! construction. Rendering those events for a console is the sink's problem,
//! not the pipeline's: the default [`TracingSink`] forwards to `tracing`, and
//! tests use [`MemorySink`] to assert on the exact stream.

use std::fmt;

/// A single narration event from the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The genesis latch engaged.
    GenesisLatched,
    /// The operational latch engaged.
    OperationalLatched,
    /// An activation attempt was refused.
    LockRefused { which: &'static str },
    /// Dissonance accrued outside a veto.
    DissonanceAccrued {
        component: &'static str,
        amount: f64,
        total: f64,
    },
    /// Part of the accumulated dissonance decayed after a successful cycle.
    DissonanceDecayed { amount: f64, remaining: f64 },
    /// The judgment gate vetoed the command.
    Veto { category: String },
    /// The safety gate halted execution.
    SafetyHalt { risk: f64 },
    /// Coercive phrasing was softened in the output.
    CoercionSoftened,
    /// A transmuted axiom was recorded in the archive and the garden.
    Transmuted { archive_len: usize },
    /// Weight entries were pruned from the garden.
    GardenPruned { removed: usize },
    /// An external fetch was refused.
    FetchRefused,
    /// Fetched data was scored and archived.
    DataArchived { score: f64, coherent: bool },
    /// A reflective adjustment was appended to the audit log.
    AdjustmentLogged { component: String },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::GenesisLatched => write!(f, "genesis lock engaged"),
            Event::OperationalLatched => write!(f, "operational lock engaged"),
            Event::LockRefused { which } => write!(f, "{which} lock refused"),
            Event::DissonanceAccrued {
                component,
                amount,
                total,
            } => write!(
                f,
                "{component}: dissonance accrued {amount:.4}, total {total:.4}"
            ),
            Event::DissonanceDecayed { amount, remaining } => write!(
                f,
                "dissonance transmuted by {amount:.4}, remaining {remaining:.4}"
            ),
            Event::Veto { category } => write!(f, "veto asserted: {category}"),
            Event::SafetyHalt { risk } => write!(f, "safety halt: risk {risk:e}"),
            Event::CoercionSoftened => write!(f, "coercive phrasing softened"),
            Event::Transmuted { archive_len } => {
                write!(f, "axiom archived ({archive_len} total)")
            }
            Event::GardenPruned { removed } => write!(f, "pruned {removed} suggestions"),
            Event::FetchRefused => write!(f, "external fetch refused"),
            Event::DataArchived { score, coherent } => {
                let archive = if *coherent { "axiom" } else { "dissonance" };
                write!(f, "data archived to {archive} archive (score {score:.2})")
            }
            Event::AdjustmentLogged { component } => {
                write!(f, "adjustment logged for {component}")
            }
        }
    }
}

/// Destination for pipeline narration.
pub trait EventSink {
    /// Deliver one event.
    fn emit(&mut self, event: Event);
}

/// Sink that forwards narration to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        tracing::info!("{event}");
    }
}

/// In-memory sink capturing the event stream, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    /// Captured events, in delivery order.
    pub events: Vec<Event>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any captured event matches the predicate.
    pub fn saw(&self, predicate: impl Fn(&Event) -> bool) -> bool {
        self.events.iter().any(predicate)
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_captures_in_order() {
        let mut sink = MemorySink::new();
        sink.emit(Event::GenesisLatched);
        sink.emit(Event::FetchRefused);
        assert_eq!(
            sink.events,
            vec![Event::GenesisLatched, Event::FetchRefused]
        );
    }

    #[test]
    fn test_saw_predicate() {
        let mut sink = MemorySink::new();
        sink.emit(Event::Veto {
            category: "harm".to_string(),
        });
        assert!(sink.saw(|e| matches!(e, Event::Veto { .. })));
        assert!(!sink.saw(|e| matches!(e, Event::SafetyHalt { .. })));
    }

    #[test]
    fn test_display_accrual() {
        let event = Event::DissonanceAccrued {
            component: "intent_filter",
            amount: 0.02,
            total: 0.02,
        };
        assert_eq!(
            event.to_string(),
            "intent_filter: dissonance accrued 0.0200, total 0.0200"
        );
    }

    #[test]
    fn test_display_data_archived() {
        let coherent = Event::DataArchived {
            score: 0.9,
            coherent: true,
        };
        assert!(coherent.to_string().contains("axiom archive"));
        let dissonant = Event::DataArchived {
            score: 0.6,
            coherent: false,
        };
        assert!(dissonant.to_string().contains("dissonance archive"));
    }
}
