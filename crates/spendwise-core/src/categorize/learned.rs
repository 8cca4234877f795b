//! Learned per-user merchant patterns
//!
//! Patterns are created the first time a user corrects a merchant and
//! strengthened by every confirming correction. Lookup tries, in order:
//! exact normalized merchant, fuzzy merchant (normalized Levenshtein ratio
//! above the configured threshold), then amount-window containment for
//! transactions sharing the pattern's description hint.

use chrono::{DateTime, Utc};

use crate::config::CategorizationConfig;
use crate::models::{AmountRange, CategoryLabel, Transaction, UserPattern};

/// How a learned pattern was found for a transaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatternMatchKind {
    ExactMerchant,
    FuzzyMerchant { similarity: f64 },
    AmountRange,
}

#[derive(Debug, Clone, Copy)]
pub struct LearnedMatch<'p> {
    pub pattern: &'p UserPattern,
    pub kind: PatternMatchKind,
}

/// Similarity in [0, 1] between two normalized merchant keys
fn key_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b)
}

/// Find the learned pattern that applies to a transaction, if any
pub fn find_learned_pattern<'p>(
    patterns: &'p [UserPattern],
    tx: &Transaction,
    fuzzy_threshold: f64,
) -> Option<LearnedMatch<'p>> {
    let key = tx.merchant_key();

    if !key.is_empty() {
        if let Some(pattern) = patterns.iter().find(|p| p.merchant_key == key) {
            return Some(LearnedMatch {
                pattern,
                kind: PatternMatchKind::ExactMerchant,
            });
        }

        let best_fuzzy = patterns
            .iter()
            .map(|p| (p, key_similarity(&p.merchant_key, &key)))
            .filter(|(_, similarity)| *similarity > fuzzy_threshold)
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some((pattern, similarity)) = best_fuzzy {
            return Some(LearnedMatch {
                pattern,
                kind: PatternMatchKind::FuzzyMerchant { similarity },
            });
        }
    }

    let text = tx.search_text();
    patterns
        .iter()
        .filter(|p| {
            let in_window = p
                .amount_range
                .map(|r| r.contains(tx.amount))
                .unwrap_or(false);
            let hinted = p
                .description_hint
                .as_deref()
                .map(|h| !h.is_empty() && text.contains(h))
                .unwrap_or(false);
            in_window && hinted
        })
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|pattern| LearnedMatch {
            pattern,
            kind: PatternMatchKind::AmountRange,
        })
}

fn round_confidence(value: f64) -> f64 {
    ((value * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Create or strengthen the pattern for a corrected transaction
///
/// The amount window is always centred on the corrected transaction.
/// Confirming the same category raises confidence by the configured step
/// (capped at 1.0); correcting to a different category retargets the
/// pattern and restarts its count.
pub fn learn_pattern(
    existing: Option<&UserPattern>,
    tx: &Transaction,
    label: &CategoryLabel,
    config: &CategorizationConfig,
    now: DateTime<Utc>,
) -> UserPattern {
    let window = AmountRange::around(tx.amount, config.pattern_amount_tolerance);
    let hint = Some(tx.description.trim().to_lowercase()).filter(|d| !d.is_empty());

    match existing {
        Some(pattern)
            if pattern.category == label.category && pattern.subcategory == label.subcategory =>
        {
            UserPattern {
                merchant: tx.merchant.clone(),
                merchant_key: pattern.merchant_key.clone(),
                amount_range: Some(window),
                description_hint: hint.or_else(|| pattern.description_hint.clone()),
                category: pattern.category.clone(),
                subcategory: pattern.subcategory.clone(),
                confidence: round_confidence(pattern.confidence + config.pattern_confidence_step),
                usage_count: pattern.usage_count.saturating_add(1),
                last_used_at: now,
            }
        }
        _ => UserPattern {
            merchant: tx.merchant.clone(),
            merchant_key: tx.merchant_key(),
            amount_range: Some(window),
            description_hint: hint,
            category: label.category.clone(),
            subcategory: label.subcategory.clone(),
            confidence: round_confidence(config.initial_pattern_confidence),
            usage_count: 1,
            last_used_at: now,
        },
    }
}
