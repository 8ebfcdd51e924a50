//! Configuration and constants for the analytics engines and the CLI.

use super::error::ConfigError;
use crate::graph::SimulationConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Current report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Minimum visible width of a timeline bar, in percent of the window
pub const MIN_BAR_WIDTH_PERCENT: f64 = 0.5;

/// Window length used when every span starts and ends at the same instant
pub const DEGENERATE_WINDOW_MS: f64 = 1e-6;

/// Fallback price per 1000 tokens when the model is absent or unknown
pub const DEFAULT_RATE_PER_1K: f64 = 0.002;

/// Built-in price table, USD per 1000 tokens
pub const MODEL_RATES_PER_1K: &[(&str, f64)] = &[
    ("gpt-4", 0.03),
    ("gpt-4-32k", 0.06),
    ("gpt-4-turbo", 0.01),
    ("gpt-4o", 0.005),
    ("gpt-4o-mini", 0.00015),
    ("gpt-3.5-turbo", 0.002),
    ("claude-3-opus", 0.015),
    ("claude-3-sonnet", 0.003),
    ("claude-3-5-sonnet", 0.003),
    ("claude-3-haiku", 0.00025),
];

// Attribute keys that may carry the model identifier, checked in order
pub const MODEL_ATTRIBUTE_KEYS: &[&str] = &["model", "model_name"];

/// Number of individually most expensive spans kept in a cost breakdown
pub const TOP_COST_SPANS: usize = 5;

/// Number of span-name duration changes kept in a diff report
pub const TOP_NAME_DIFFS: usize = 10;

/// Duration assumed for graph node sizing when a span carries no timing at all
pub const DEFAULT_NODE_DURATION_MS: f64 = 100.0;

/// Largest force simulation tick bound accepted from config or the command line
pub const MAX_SIMULATION_TICKS: usize = 100_000;

// Graph node radius bounds (render units)
pub const NODE_SIZE_MIN: f64 = 15.0;
pub const NODE_SIZE_MAX: f64 = 40.0;

/// Upper-exclusive duration bucket bounds in milliseconds; the last bucket is open-ended
pub const DURATION_BUCKET_BOUNDS_MS: [f64; 6] = [10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0];

/// Pricing section of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Rate applied when a span's model is missing or unknown
    pub default_rate: f64,

    /// Extra or overriding per-model rates (USD per 1000 tokens)
    pub models: HashMap<String, f64>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_rate: DEFAULT_RATE_PER_1K,
            models: HashMap::new(),
        }
    }
}

/// Report sizing section of the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub top_cost_spans: usize,
    pub top_name_diffs: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_cost_spans: TOP_COST_SPANS,
            top_name_diffs: TOP_NAME_DIFFS,
        }
    }
}

/// Complete analytics configuration
///
/// Every section is optional in the TOML file; absent sections use defaults.
///
/// ```toml
/// [pricing]
/// default_rate = 0.001
///
/// [pricing.models]
/// "my-finetune" = 0.012
///
/// [simulation]
/// width = 1200.0
/// max_ticks = 150
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub pricing: PricingConfig,
    pub simulation: SimulationConfig,
    pub report: ReportConfig,
}

impl AnalyticsConfig {
    /// Reject values the engines cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("pricing.default_rate", self.pricing.default_rate)?;
        for (model, rate) in &self.pricing.models {
            check_rate(&format!("pricing.models.{}", model), *rate)?;
        }

        let sim = &self.simulation;
        let viewport_ok = sim.width.is_finite()
            && sim.height.is_finite()
            && sim.width > 0.0
            && sim.height > 0.0;
        if !viewport_ok {
            return Err(ConfigError::InvalidValue(
                "simulation viewport must be positive".to_string(),
            ));
        }
        if !(sim.link_distance.is_finite()
            && sim.collision_distance.is_finite()
            && sim.link_distance >= 0.0
            && sim.collision_distance >= 0.0)
        {
            return Err(ConfigError::InvalidValue(
                "simulation distances cannot be negative".to_string(),
            ));
        }
        if !sim.charge_strength.is_finite() {
            return Err(ConfigError::InvalidValue(format!(
                "simulation.charge_strength must be finite, got {}",
                sim.charge_strength
            )));
        }
        if !(0.0..=1.0).contains(&sim.velocity_decay) {
            return Err(ConfigError::InvalidValue(format!(
                "simulation.velocity_decay must be within [0, 1], got {}",
                sim.velocity_decay
            )));
        }
        check_unit_open("simulation.alpha_decay", sim.alpha_decay)?;
        check_unit_open("simulation.alpha_min", sim.alpha_min)?;
        if sim.max_ticks > MAX_SIMULATION_TICKS {
            return Err(ConfigError::InvalidValue(format!(
                "simulation.max_ticks is too large (max {})",
                MAX_SIMULATION_TICKS
            )));
        }

        if self.report.top_cost_spans == 0 || self.report.top_name_diffs == 0 {
            return Err(ConfigError::InvalidValue(
                "report top-k sizes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_rate(key: &str, rate: f64) -> Result<(), ConfigError> {
    if rate.is_finite() && rate >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be a non-negative number, got {}",
            key, rate
        )))
    }
}

fn check_unit_open(key: &str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "{} must be within (0, 1), got {}",
            key, value
        )))
    }
}

/// Load analytics configuration from a TOML file
///
/// # Errors
/// * `ConfigError::ReadFailed` - If file cannot be read
/// * `ConfigError::ParseFailed` - If TOML is invalid
/// * `ConfigError::InvalidValue` - If a value is out of range
pub fn load_config(path: impl AsRef<Path>) -> Result<AnalyticsConfig, ConfigError> {
    let path = path.as_ref();
    debug!("Loading analytics config from: {}", path.display());

    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parse and validate analytics configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AnalyticsConfig, ConfigError> {
    let config: AnalyticsConfig = toml::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.pricing.default_rate, DEFAULT_RATE_PER_1K);
        assert!(config.pricing.models.is_empty());
        assert_eq!(config.report.top_cost_spans, TOP_COST_SPANS);
        assert_eq!(config.simulation.max_ticks, SimulationConfig::default().max_ticks);
    }

    #[test]
    fn test_partial_config() {
        let config = parse_config(
            r#"
            [pricing]
            default_rate = 0.001

            [pricing.models]
            "my-finetune" = 0.012

            [simulation]
            width = 1200.0
            "#,
        )
        .unwrap();

        assert_eq!(config.pricing.default_rate, 0.001);
        assert_eq!(config.pricing.models.get("my-finetune"), Some(&0.012));
        assert_eq!(config.simulation.width, 1200.0);
        assert_eq!(config.simulation.height, SimulationConfig::default().height);
    }

    #[test]
    fn test_negative_rate_rejected() {
        let result = parse_config("[pricing.models]\n\"gpt-4\" = -1.0\n");
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let result = parse_config("[report]\ntop_cost_spans = 0\n");
        assert!(result.is_err());
    }

    fn assert_invalid(toml: &str) {
        let result = parse_config(toml);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue(_))),
            "accepted: {}",
            toml
        );
    }

    #[test]
    fn test_velocity_decay_out_of_range_rejected() {
        assert_invalid("[simulation]\nvelocity_decay = -5.0\n");
        assert_invalid("[simulation]\nvelocity_decay = 1.5\n");
        assert_invalid("[simulation]\nvelocity_decay = nan\n");
    }

    #[test]
    fn test_alpha_decay_out_of_range_rejected() {
        assert_invalid("[simulation]\nalpha_decay = 0.0\n");
        assert_invalid("[simulation]\nalpha_decay = 1.0\n");
        assert_invalid("[simulation]\nalpha_decay = -0.1\n");
    }

    #[test]
    fn test_alpha_min_out_of_range_rejected() {
        assert_invalid("[simulation]\nalpha_min = 0.0\n");
        assert_invalid("[simulation]\nalpha_min = 2.0\n");
    }

    #[test]
    fn test_non_finite_charge_rejected() {
        assert_invalid("[simulation]\ncharge_strength = inf\n");
        assert_invalid("[simulation]\ncharge_strength = -inf\n");
        assert_invalid("[simulation]\ncharge_strength = nan\n");
    }

    #[test]
    fn test_max_ticks_capped() {
        assert_invalid(&format!(
            "[simulation]\nmax_ticks = {}\n",
            MAX_SIMULATION_TICKS + 1
        ));
        let config = parse_config(&format!(
            "[simulation]\nmax_ticks = {}\n",
            MAX_SIMULATION_TICKS
        ))
        .unwrap();
        assert_eq!(config.simulation.max_ticks, MAX_SIMULATION_TICKS);
    }

    #[test]
    fn test_default_simulation_config_is_valid() {
        let config = AnalyticsConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let result = parse_config("[pricing\n");
        assert!(matches!(result, Err(ConfigError::ParseFailed(_))));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/vizpath.toml");
        assert!(matches!(result, Err(ConfigError::ReadFailed(_))));
    }
}
