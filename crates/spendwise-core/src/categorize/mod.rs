//! Transaction categorization
//!
//! Custom rules, learned patterns, an amount-band heuristic and the static
//! taxonomy combine into one [`CategorizationEngine`].

mod engine;
pub mod heuristic;
pub mod learned;
pub mod rules;

pub use engine::{
    CategorizationEngine, LearningOutcome, NoAdjustment, PreferenceAdjuster, KEYWORD_CONFIDENCE,
    MERCHANT_CONFIDENCE,
};
pub use learned::{find_learned_pattern, PatternMatchKind};
pub use rules::find_matching_rule;
