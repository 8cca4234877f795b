//! Engine configuration
//!
//! All thresholds used by categorization, analysis and the pipeline live
//! here. Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/spendwise/config/spendwise.toml)
//! 2. Embedded defaults (compiled into binary)
//!
//! Every key is optional; missing keys keep the built-in default.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/spendwise.toml");

#[derive(Debug, Clone, PartialEq)]
pub struct CategorizationConfig {
    pub fuzzy_match_threshold: f64,
    pub auto_rule_threshold: u32,
    pub auto_rule_priority: i32,
    pub learned_confidence_threshold: f64,
    pub initial_pattern_confidence: f64,
    pub pattern_confidence_step: f64,
    pub pattern_amount_tolerance: f64,
    pub bulk_amount_similarity: f64,
}

impl Default for CategorizationConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: 0.8,
            auto_rule_threshold: 3,
            auto_rule_priority: 100,
            learned_confidence_threshold: 0.9,
            initial_pattern_confidence: 0.8,
            pattern_confidence_step: 0.15,
            pattern_amount_tolerance: 0.2,
            bulk_amount_similarity: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Prior transactions in a category needed before velocity is judged
    pub min_velocity_history: usize,
    pub velocity_sigma: f64,
    /// Velocity overshoot (percent above the upper bound) that counts as high severity
    pub high_severity_percent: f64,
    pub trend_window: usize,
    pub trend_threshold: f64,
    pub forecast_adjustment: f64,
    pub forecast_min_history: usize,
    pub pattern_window_days: i64,
    pub recurring_min_count: usize,
    pub recurring_high_count: usize,
    pub unusual_sigma: f64,
    pub category_share_threshold: f64,
    pub opportunity_min_spend: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_velocity_history: 3,
            velocity_sigma: 2.0,
            high_severity_percent: 200.0,
            trend_window: 10,
            trend_threshold: 0.10,
            forecast_adjustment: 0.15,
            forecast_min_history: 10,
            pattern_window_days: 90,
            recurring_min_count: 3,
            recurring_high_count: 5,
            unusual_sigma: 3.0,
            category_share_threshold: 0.30,
            opportunity_min_spend: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub batch_chunk_size: usize,
    /// Merchant frequency above which a recurring trigger fires
    pub recurring_trigger_frequency: usize,
    pub high_value_threshold: f64,
    /// Merchant repeat count reported in batch insights
    pub batch_repeat_threshold: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_chunk_size: 5,
            recurring_trigger_frequency: 3,
            high_value_threshold: 500.0,
            batch_repeat_threshold: 2,
        }
    }
}

/// Full engine configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    pub categorization: CategorizationConfig,
    pub analysis: AnalysisConfig,
    pub pipeline: PipelineConfig,
}

impl EngineConfig {
    /// Load config (explicit path, then data-dir override, then embedded default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = override_path
            .map(Path::to_path_buf)
            .or_else(default_config_path)
            .filter(|p| p.exists());

        match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&content)
            }
            None => Self::from_toml(DEFAULT_CONFIG),
        }
    }

    /// Parse config from TOML content, layering it over the defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

        let mut config = Self::default();

        macro_rules! apply {
            ($section:expr, $target:expr, [$($field:ident),* $(,)?]) => {
                if let Some(section) = $section {
                    $(
                        if let Some(value) = section.$field {
                            $target.$field = value;
                        }
                    )*
                }
            };
        }

        apply!(
            raw.categorization,
            config.categorization,
            [
                fuzzy_match_threshold,
                auto_rule_threshold,
                auto_rule_priority,
                learned_confidence_threshold,
                initial_pattern_confidence,
                pattern_confidence_step,
                pattern_amount_tolerance,
                bulk_amount_similarity,
            ]
        );
        apply!(
            raw.analysis,
            config.analysis,
            [
                min_velocity_history,
                velocity_sigma,
                high_severity_percent,
                trend_window,
                trend_threshold,
                forecast_adjustment,
                forecast_min_history,
                pattern_window_days,
                recurring_min_count,
                recurring_high_count,
                unusual_sigma,
                category_share_threshold,
                opportunity_min_spend,
            ]
        );
        apply!(
            raw.pipeline,
            config.pipeline,
            [
                batch_chunk_size,
                recurring_trigger_frequency,
                high_value_threshold,
                batch_repeat_threshold,
            ]
        );

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let c = &self.categorization;
        for (name, value) in [
            ("fuzzy_match_threshold", c.fuzzy_match_threshold),
            ("learned_confidence_threshold", c.learned_confidence_threshold),
            ("initial_pattern_confidence", c.initial_pattern_confidence),
            ("pattern_confidence_step", c.pattern_confidence_step),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{} must be within 0..=1", name)));
            }
        }
        if self.pipeline.batch_chunk_size == 0 {
            return Err(Error::Config("batch_chunk_size must be at least 1".into()));
        }
        if self.analysis.trend_window == 0 {
            return Err(Error::Config("trend_window must be at least 1".into()));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("spendwise").join("config").join("spendwise.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    categorization: Option<RawCategorization>,
    analysis: Option<RawAnalysis>,
    pipeline: Option<RawPipeline>,
}

#[derive(Debug, Deserialize)]
struct RawCategorization {
    fuzzy_match_threshold: Option<f64>,
    auto_rule_threshold: Option<u32>,
    auto_rule_priority: Option<i32>,
    learned_confidence_threshold: Option<f64>,
    initial_pattern_confidence: Option<f64>,
    pattern_confidence_step: Option<f64>,
    pattern_amount_tolerance: Option<f64>,
    bulk_amount_similarity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    min_velocity_history: Option<usize>,
    velocity_sigma: Option<f64>,
    high_severity_percent: Option<f64>,
    trend_window: Option<usize>,
    trend_threshold: Option<f64>,
    forecast_adjustment: Option<f64>,
    forecast_min_history: Option<usize>,
    pattern_window_days: Option<i64>,
    recurring_min_count: Option<usize>,
    recurring_high_count: Option<usize>,
    unusual_sigma: Option<f64>,
    category_share_threshold: Option<f64>,
    opportunity_min_spend: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawPipeline {
    batch_chunk_size: Option<usize>,
    recurring_trigger_frequency: Option<usize>,
    high_value_threshold: Option<f64>,
    batch_repeat_threshold: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_matches_builtin() {
        let config = EngineConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_toml(
            r#"
            [categorization]
            auto_rule_threshold = 5

            [pipeline]
            high_value_threshold = 1000.0
            "#,
        )
        .unwrap();
        assert_eq!(config.categorization.auto_rule_threshold, 5);
        assert_eq!(config.categorization.fuzzy_match_threshold, 0.8);
        assert_eq!(config.pipeline.high_value_threshold, 1000.0);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(EngineConfig::from_toml("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = EngineConfig::from_toml("[categorization]\nfuzzy_match_threshold = 1.5\n");
        assert!(matches!(err, Err(Error::Config(_))));

        let err = EngineConfig::from_toml("[pipeline]\nbatch_chunk_size = 0\n");
        assert!(err.is_err());

        assert!(EngineConfig::from_toml("not = [valid").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[analysis]\npattern_window_days = 30\n").unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.analysis.pattern_window_days, 30);
    }
}
