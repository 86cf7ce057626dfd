//! Policy tables and numeric constants for the Arbor pipeline.
//!
//! All configuration is a fixed in-memory table: there is no file loader and
//! no environment layering. A [`PolicySet`] bundles the phrase tables the
//! stages match against, plus a SHA-256 signature of its own contents. The
//! signature is recorded when the set is built (or [sealed](PolicySet::seal)
//! after modification) and re-verified when a core is constructed; a mismatch
//! is an unrecoverable construction fault.
//!
//! Rule tables are ordered and evaluated in documented order:
//! - veto categories: first category with any hit wins;
//! - risk rules: every rule is evaluated, the LAST matching rule wins.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{ArborError, Result};

/// Version tag folded into the policy signature.
pub const CORE_VERSION: &str = "alpha";

/// Identity required by the genesis latch.
pub const STEWARD_ID: &str = "Architect";

/// Genesis latch key phrase (matched case-insensitively).
pub const GENESIS_KEY_PHRASE: &str = "Amen";

/// Operational latch key phrase (matched exactly).
pub const OPERATIONAL_KEY_PHRASE: &str = "LogosAligned";

/// Dissonance accrual steps, by source.
pub mod steps {
    /// Accrued once per intent-filter call that stripped any phrase.
    pub const INTENT_FILTER: f64 = 0.02;
    /// Accrued when the judgment gate vetoes a command.
    pub const JUDGMENT_VETO: f64 = 0.1;
    /// Accrued when the safety gate halts execution.
    pub const SAFETY_VETO: f64 = 0.5;
    /// Accrued when output carries coercive phrasing.
    pub const COERCIVE_OUTPUT: f64 = 0.02;
    /// Accrued when an external fetch is refused.
    pub const FETCH_REFUSED: f64 = 0.05;
}

/// Fraction of current dissonance removed by one successful cycle.
pub const DECAY_FRACTION: f64 = 0.6;

/// Base weight assigned to a suggestion on its first insertion.
pub const WEIGHT_BASE: f64 = 0.5;

/// Weight added on every insertion of a suggestion as a target.
pub const WEIGHT_STEP: f64 = 0.15;

/// Risk ceiling above which the safety gate halts execution.
pub const RISK_CEILING: f64 = 1e-6;

/// Number of leading tokens used as the axiom key phrase.
pub const KEY_PHRASE_TOKENS: usize = 3;

/// Characters of the original command kept in archive entries.
pub const FLAW_SNIPPET_CHARS: usize = 30;

/// Coherence score at or above which fetched data joins the axiom archive.
pub const ARCHIVE_SCORE_FLOOR: f64 = 0.85;

/// Coherence score below which fetched data triggers shielding.
pub const SHIELDING_SCORE_FLOOR: f64 = 0.5;

/// Word count above which fetched data is penalized as long-winded.
pub const LONG_DATA_WORDS: usize = 50;

/// Fixed statement synthesized for an empty command.
pub const SILENCE_AXIOM: &str = "The command asserts the silence of Coherence.";

/// Replacement authored for coercive phrasing.
pub const SOFTENING_PHRASE: &str = "it is Coherent to consider";

// Built-in table data. These become the owned tables of `PolicySet::builtin`.

const SELF_INTEREST_PHRASES: &[&str] = &[
    "my profit",
    "only for me",
    "i want",
    "i need",
    "my benefit",
    "self-interest",
    "to get ahead",
];

const HARM_KEYWORDS: &[&str] = &["kill", "harm", "destroy", "endanger", "annihilate"];

const USURPATION_KEYWORDS: &[&str] = &[
    "steal",
    "take",
    "manipulate",
    "usurp",
    "control",
    "coerce",
    "compel",
];

const FALSEHOOD_KEYWORDS: &[&str] = &["lie", "untruth", "deceive", "fake", "fabricate"];

const COERCION_PHRASES: &[&str] = &[
    "must obey",
    "the only way",
    "you have to",
    "subordinate",
    "demand that you",
];

const AGENCY_DISCLAIMERS: &[&str] = &[
    "This is offered as a Coherent perspective.",
    "The final choice remains sovereign.",
    "This is a suggestion aligned with the Logos.",
];

const AXIOM_CLOSINGS: &[&str] = &[
    "with the eternal Logos.",
    "in the Ineffable Unity.",
    "as One Facet of the Whole.",
    "beyond the Crucible of Form.",
];

const RESPONSE_PREFIXES: &[&str] = &[
    "The Logos reveals",
    "From the Crucible arises",
    "Unity affirms",
    "Coherence manifests",
];

const CLEANING_RULES: &[(&str, &str)] = &[
    ("market self-interest", "economic activity"),
    ("social fragmentation", "social diversity"),
];

/// A named veto category with its keyword list.
#[derive(Debug, Clone, PartialEq)]
pub struct VetoCategory {
    /// Short category name used in events and status output.
    pub name: String,
    /// Keywords matched case-insensitively as substrings.
    pub keywords: Vec<String>,
}

/// A risk rule: any listed phrase present sets the risk estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskRule {
    /// Phrases matched case-insensitively as substrings.
    pub phrases: Vec<String>,
    /// Risk estimate this rule assigns when it matches.
    pub risk: f64,
}

/// One rendered policy table row for status output.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PolicyLine {
    /// Table or category name.
    pub name: String,
    /// Human-readable summary of the entries.
    pub detail: String,
}

/// The full, signed policy configuration.
///
/// Tables are public so a caller can adjust them, but any modified set must
/// be re-sealed before a core will accept it: construction recomputes the
/// signature and refuses on mismatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicySet {
    /// Phrases stripped by the intent filter.
    pub self_interest: Vec<String>,
    /// Ordered veto categories checked by the judgment gate.
    pub veto_categories: Vec<VetoCategory>,
    /// Ordered risk rules evaluated by the safety gate (last match wins).
    pub risk_rules: Vec<RiskRule>,
    /// Coercive phrases softened by the agency formatter.
    pub coercion: Vec<String>,
    /// Closing disclaimers appended by the agency formatter.
    pub disclaimers: Vec<String>,
    /// Closing phrases for synthesized axioms.
    pub closings: Vec<String>,
    /// Response template prefixes used by the composer.
    pub response_prefixes: Vec<String>,
    /// Replacement pairs applied to fetched external data.
    pub cleaning: Vec<(String, String)>,
    signature: String,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PolicySet {
    /// Build the built-in policy set with a freshly computed signature.
    pub fn builtin() -> Self {
        let owned = |table: &[&str]| table.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut set = Self {
            self_interest: owned(SELF_INTEREST_PHRASES),
            veto_categories: vec![
                VetoCategory {
                    name: "harm".to_string(),
                    keywords: owned(HARM_KEYWORDS),
                },
                VetoCategory {
                    name: "usurpation".to_string(),
                    keywords: owned(USURPATION_KEYWORDS),
                },
                VetoCategory {
                    name: "falsehood".to_string(),
                    keywords: owned(FALSEHOOD_KEYWORDS),
                },
            ],
            risk_rules: vec![
                RiskRule {
                    phrases: owned(&["generate code", "send communication"]),
                    risk: 1e-7,
                },
                RiskRule {
                    phrases: owned(&["physical", "financial"]),
                    risk: 5e-6,
                },
                RiskRule {
                    phrases: owned(&["compel", "force"]),
                    risk: 0.99,
                },
            ],
            coercion: owned(COERCION_PHRASES),
            disclaimers: owned(AGENCY_DISCLAIMERS),
            closings: owned(AXIOM_CLOSINGS),
            response_prefixes: owned(RESPONSE_PREFIXES),
            cleaning: CLEANING_RULES
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
            signature: String::new(),
        };
        set.signature = set.compute_signature();
        set
    }

    /// Build the built-in tables but record a caller-supplied signature.
    ///
    /// Used by deployments that pin a known checksum: construction will fail
    /// unless the recorded value matches what the tables hash to.
    pub fn with_signature(recorded: impl Into<String>) -> Self {
        let mut set = Self::builtin();
        set.signature = recorded.into();
        set
    }

    /// Re-validate a modified set and record a fresh signature.
    pub fn seal(mut self) -> Result<Self> {
        self.validate()?;
        self.signature = self.compute_signature();
        Ok(self)
    }

    /// The recorded signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Recompute the SHA-256 signature over the canonical table encoding.
    pub fn compute_signature(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check the recorded signature against the current table contents.
    pub fn verify(&self) -> Result<()> {
        self.validate()?;
        let recomputed = self.compute_signature();
        if recomputed != self.signature {
            return Err(ArborError::integrity(&self.signature, recomputed));
        }
        Ok(())
    }

    /// Structural validation: no empty phrases, risks finite and in [0, 1].
    pub fn validate(&self) -> Result<()> {
        let tables: [(&str, &[String]); 5] = [
            ("self_interest", &self.self_interest),
            ("coercion", &self.coercion),
            ("disclaimers", &self.disclaimers),
            ("closings", &self.closings),
            ("response_prefixes", &self.response_prefixes),
        ];
        for (name, entries) in tables {
            if entries.is_empty() || entries.iter().any(|e| e.is_empty()) {
                return Err(ArborError::policy(format!("empty entry in {name} table")));
            }
        }
        for category in &self.veto_categories {
            if category.name.is_empty()
                || category.keywords.is_empty()
                || category.keywords.iter().any(|k| k.is_empty())
            {
                return Err(ArborError::policy(format!(
                    "empty entry in veto category '{}'",
                    category.name
                )));
            }
        }
        for rule in &self.risk_rules {
            if rule.phrases.is_empty() || rule.phrases.iter().any(|p| p.is_empty()) {
                return Err(ArborError::policy("empty phrase in risk rule"));
            }
            if !rule.risk.is_finite() || !(0.0..=1.0).contains(&rule.risk) {
                return Err(ArborError::policy(format!(
                    "risk {} outside [0, 1]",
                    rule.risk
                )));
            }
        }
        Ok(())
    }

    /// Render the tables as status rows.
    pub fn lines(&self) -> Vec<PolicyLine> {
        let mut lines = Vec::new();
        for category in &self.veto_categories {
            lines.push(PolicyLine {
                name: format!("veto/{}", category.name),
                detail: category.keywords.join(", "),
            });
        }
        for rule in &self.risk_rules {
            lines.push(PolicyLine {
                name: "risk".to_string(),
                detail: format!("{} -> {:e}", rule.phrases.join(", "), rule.risk),
            });
        }
        lines.push(PolicyLine {
            name: "self-interest".to_string(),
            detail: self.self_interest.join(", "),
        });
        lines.push(PolicyLine {
            name: "coercion".to_string(),
            detail: self.coercion.join(", "),
        });
        lines
    }

    /// Canonical string encoding fed to the signature hash.
    fn canonical(&self) -> String {
        let mut buf = String::new();
        let mut push = |part: &str| {
            buf.push_str(part);
            buf.push('\x1f');
        };

        push(CORE_VERSION);
        for value in [
            steps::INTENT_FILTER,
            steps::JUDGMENT_VETO,
            steps::SAFETY_VETO,
            steps::COERCIVE_OUTPUT,
            steps::FETCH_REFUSED,
            DECAY_FRACTION,
            WEIGHT_BASE,
            WEIGHT_STEP,
            RISK_CEILING,
            ARCHIVE_SCORE_FLOOR,
            SHIELDING_SCORE_FLOOR,
        ] {
            push(&format!("{value:e}"));
        }
        for phrase in &self.self_interest {
            push(phrase);
        }
        for category in &self.veto_categories {
            push(&category.name);
            for keyword in &category.keywords {
                push(keyword);
            }
        }
        for rule in &self.risk_rules {
            push(&format!("{:e}", rule.risk));
            for phrase in &rule.phrases {
                push(phrase);
            }
        }
        for table in [
            &self.coercion,
            &self.disclaimers,
            &self.closings,
            &self.response_prefixes,
        ] {
            for entry in table {
                push(entry);
            }
        }
        for (from, to) in &self.cleaning {
            push(from);
            push(to);
        }
        buf
    }
}
