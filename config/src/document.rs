//! The canonical configuration document: loaded from a base TOML file and
//! layered with environment overrides, per `spec.md` §6 and
//! `SPEC_FULL.md` §4.5.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Morphic operating modes named in `spec.md` §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphicMode {
    Default,
    AlphaPush,
    Conservative,
    AggressiveSniper,
    CapitalPreservation,
    HighVolatilityDefense,
    ConservativeBuffer,
}

impl Default for MorphicMode {
    fn default() -> Self {
        MorphicMode::Default
    }
}

impl MorphicMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MorphicMode::Default => "default",
            MorphicMode::AlphaPush => "alpha_push",
            MorphicMode::Conservative => "conservative",
            MorphicMode::AggressiveSniper => "aggressive_sniper",
            MorphicMode::CapitalPreservation => "capital_preservation",
            MorphicMode::HighVolatilityDefense => "high_volatility_defense",
            MorphicMode::ConservativeBuffer => "conservative_buffer",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        parse_morphic_mode(raw)
    }
}

impl std::fmt::Display for MorphicMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric thresholds named throughout `spec.md` §4 (e.g.
/// `TRUSTWORTHINESS_THRESHOLD`, `MAX_POSITION_SIZE`), stored generically
/// since their values are tenant- and deployment-specific while the
/// defaults live in `SPEC_FULL.md` §9. Individual crates look theirs up
/// by name and fall back to the pinned default when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides(BTreeMap<String, f64>);

impl ThresholdOverrides {
    pub fn get(&self, name: &str, default: f64) -> f64 {
        self.0.get(name).copied().unwrap_or(default)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }
}

/// The canonical configuration document, per `spec.md` §6
/// "Environment / configuration".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitanConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub database_url: String,
    pub symbol: String,
    #[serde(default)]
    pub morphic_mode: MorphicMode,
    #[serde(default)]
    pub chaos_mode: bool,
    pub tenant: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub thresholds: ThresholdOverrides,
}

impl TitanConfig {
    /// Parses the base document from TOML.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Layers environment overrides onto a parsed base document.
    /// `getenv` is injected so tests and the CLI don't have to share
    /// process-global `std::env` state.
    pub fn apply_env_overrides<F>(&mut self, getenv: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = getenv("REDIS_HOST") {
            self.redis_host = v;
        }
        if let Some(v) = getenv("REDIS_PORT") {
            if let Ok(port) = v.parse() {
                self.redis_port = port;
            }
        }
        if let Some(v) = getenv("DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = getenv("SYMBOL") {
            self.symbol = v;
        }
        if let Some(v) = getenv("MORPHIC_MODE") {
            if let Some(mode) = parse_morphic_mode(&v) {
                self.morphic_mode = mode;
            }
        }
        if let Some(v) = getenv("CHAOS_MODE") {
            self.chaos_mode = v.eq_ignore_ascii_case("on");
        }
    }
}

pub fn parse_morphic_mode(raw: &str) -> Option<MorphicMode> {
    match raw {
        "default" => Some(MorphicMode::Default),
        "alpha_push" => Some(MorphicMode::AlphaPush),
        "conservative" => Some(MorphicMode::Conservative),
        "aggressive_sniper" => Some(MorphicMode::AggressiveSniper),
        "capital_preservation" => Some(MorphicMode::CapitalPreservation),
        "high_volatility_defense" => Some(MorphicMode::HighVolatilityDefense),
        "conservative_buffer" => Some(MorphicMode::ConservativeBuffer),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const BASE: &str = r#"
        redis_host = "localhost"
        redis_port = 6379
        database_url = "postgres://localhost/titan"
        symbol = "BTC-USD"
        tenant = "acme"
    "#;

    #[test]
    fn parses_base_document_with_defaults() {
        let config = TitanConfig::from_toml(BASE).unwrap();
        assert_eq!(config.morphic_mode, MorphicMode::Default);
        assert!(!config.chaos_mode);
        assert_eq!(config.client_id, None);
    }

    #[test]
    fn env_overrides_layer_on_top_of_base() {
        let mut config = TitanConfig::from_toml(BASE).unwrap();
        let mut env = HashMap::new();
        env.insert("MORPHIC_MODE".to_string(), "alpha_push".to_string());
        env.insert("CHAOS_MODE".to_string(), "on".to_string());
        config.apply_env_overrides(|k| env.get(k).cloned());
        assert_eq!(config.morphic_mode, MorphicMode::AlphaPush);
        assert!(config.chaos_mode);
        assert_eq!(config.redis_host, "localhost", "unset overrides leave base value");
    }

    #[test]
    fn unrecognized_morphic_mode_override_is_ignored() {
        let mut config = TitanConfig::from_toml(BASE).unwrap();
        let mut env = HashMap::new();
        env.insert("MORPHIC_MODE".to_string(), "nonsense".to_string());
        config.apply_env_overrides(|k| env.get(k).cloned());
        assert_eq!(config.morphic_mode, MorphicMode::Default);
    }

    #[test]
    fn threshold_overrides_fall_back_to_caller_supplied_default() {
        let overrides = ThresholdOverrides::default();
        assert_eq!(overrides.get("TRUSTWORTHINESS_THRESHOLD", 0.55), 0.55);
    }
}
