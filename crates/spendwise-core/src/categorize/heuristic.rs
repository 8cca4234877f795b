//! Amount-band heuristic classifier
//!
//! A small deterministic model used as a weak fallback signal. It looks for
//! generic merchant-type cue words ("kitchen", "mart", "inn", ...) that the
//! keyword table does not carry and combines them with the amount band:
//! large amounts lean toward durable goods, small amounts toward everyday
//! and food spending. It stays silent when no cue word is present so that
//! unknown merchants fall through to the "Other" fallback.

use crate::taxonomy::Taxonomy;

/// Confidence ceiling for anything this classifier produces
pub const MAX_HEURISTIC_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountBand {
    /// Under $20
    Small,
    /// $20 to $150
    Medium,
    /// $150 to $1000
    Large,
    /// $1000 and over
    Major,
}

impl AmountBand {
    pub fn of(amount: f64) -> Self {
        if amount < 20.0 {
            Self::Small
        } else if amount < 150.0 {
            Self::Medium
        } else if amount < 1000.0 {
            Self::Large
        } else {
            Self::Major
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cue {
    Dining,
    Retail,
    Lodging,
    Fuel,
}

const CUE_WORDS: &[(&str, Cue)] = &[
    ("kitchen", Cue::Dining),
    ("eatery", Cue::Dining),
    ("bbq", Cue::Dining),
    ("noodle", Cue::Dining),
    ("noodles", Cue::Dining),
    ("bakery", Cue::Dining),
    ("deli", Cue::Dining),
    ("cantina", Cue::Dining),
    ("taqueria", Cue::Dining),
    ("wings", Cue::Dining),
    ("ramen", Cue::Dining),
    ("pho", Cue::Dining),
    ("store", Cue::Retail),
    ("shop", Cue::Retail),
    ("mart", Cue::Retail),
    ("outlet", Cue::Retail),
    ("depot", Cue::Retail),
    ("emporium", Cue::Retail),
    ("boutique", Cue::Retail),
    ("supply", Cue::Retail),
    ("goods", Cue::Retail),
    ("inn", Cue::Lodging),
    ("lodge", Cue::Lodging),
    ("suites", Cue::Lodging),
    ("hostel", Cue::Lodging),
    ("petro", Cue::Fuel),
    ("petroleum", Cue::Fuel),
    ("fuels", Cue::Fuel),
];

/// Prior table: (cue, band) → (category, subcategory, weight)
fn prior(cue: Cue, band: AmountBand) -> (&'static str, &'static str, f64) {
    use AmountBand::*;
    match (cue, band) {
        (Cue::Dining, Small) => ("Food & Dining", "Fast Food", 0.6),
        (Cue::Dining, Medium) => ("Food & Dining", "Restaurants", 0.6),
        (Cue::Dining, Large) => ("Food & Dining", "Restaurants", 0.4),
        (Cue::Dining, Major) => ("Food & Dining", "Restaurants", 0.3),
        (Cue::Retail, Small) => ("Food & Dining", "Groceries", 0.45),
        (Cue::Retail, Medium) => ("Shopping", "General Merchandise", 0.5),
        (Cue::Retail, Large) => ("Shopping", "Electronics", 0.5),
        (Cue::Retail, Major) => ("Housing", "Furniture", 0.55),
        (Cue::Lodging, Small) => ("Travel", "Hotel", 0.3),
        (Cue::Lodging, Medium | Large) => ("Travel", "Hotel", 0.6),
        (Cue::Lodging, Major) => ("Travel", "Vacation", 0.6),
        (Cue::Fuel, Small | Medium) => ("Transportation", "Gas & Fuel", 0.6),
        (Cue::Fuel, Large | Major) => ("Transportation", "Auto Service", 0.35),
    }
}

/// A weak category guess
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicGuess {
    pub category: &'static str,
    pub subcategory: &'static str,
    pub confidence: f64,
}

/// Classify from merchant/description cue words and the amount band
pub fn classify(text: &str, amount: f64, taxonomy: &Taxonomy) -> Option<HeuristicGuess> {
    let band = AmountBand::of(amount);
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    CUE_WORDS
        .iter()
        .filter(|(word, _)| tokens.contains(word))
        .map(|&(_, cue)| {
            let (category, subcategory, weight) = prior(cue, band);
            let baseline = taxonomy.find(category).map(|c| c.confidence).unwrap_or(1.0);
            HeuristicGuess {
                category,
                subcategory,
                confidence: (weight * baseline).min(MAX_HEURISTIC_CONFIDENCE),
            }
        })
        .max_by(|a, b| {
            a.confidence
                .partial_cmp(&b.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
}
