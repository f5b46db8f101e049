//! Serializable backtest configuration.
//!
//! A run is described by one TOML file with a `[backtest]` and a
//! `[strategy]` section; `[costs]`, `[context]` and `[risk]` are optional.
//! Leaving out `[costs]` means frictionless execution, leaving out
//! `[context]` disables the higher-timeframe filter, leaving out `[risk]`
//! skips the limit report. The config is validated once on load and hashed
//! into a content-addressed run id for artifact directories.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stepback_core::{BracketParams, CombineRule, CostParams, RiskLimits, Timeframe};

/// Errors raised while reading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

/// Full configuration for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub strategy: StrategySection,
    #[serde(default)]
    pub costs: CostParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLimits>,
}

/// Data source and capital.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    /// Path to the execution-timeframe CSV.
    pub csv: PathBuf,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
}

fn default_initial_capital() -> f64 {
    1.0
}

/// Which simulator runs and with what parameters.
///
/// Threshold mode reads only `ma_window`; the bracket fields keep their
/// defaults and are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySection {
    pub mode: Mode,
    #[serde(flatten)]
    pub params: BracketParams,
}

/// Simulator mode selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Threshold,
    AtrBracket,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Threshold => write!(f, "threshold"),
            Mode::AtrBracket => write!(f, "atr_bracket"),
        }
    }
}

/// Higher-timeframe trend filter settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextSection {
    /// Timeframes the execution bars are resampled into, one filter each.
    pub timeframes: Vec<Timeframe>,
    #[serde(default = "default_context_ma_window")]
    pub ma_window: usize,
    #[serde(default)]
    pub combine: CombineRule,
}

fn default_context_ma_window() -> usize {
    10
}

impl BacktestConfig {
    /// Read and validate a configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter once, before any data is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let capital = self.backtest.initial_capital;
        if !capital.is_finite() || capital <= 0.0 {
            return Err(invalid(format!(
                "initial_capital must be positive and finite, got {capital}"
            )));
        }

        let params = &self.strategy.params;
        if params.ma_window == 0 {
            return Err(invalid("strategy ma_window must be at least 1"));
        }
        if self.strategy.mode == Mode::AtrBracket {
            if params.atr_window == 0 {
                return Err(invalid("strategy atr_window must be at least 1"));
            }
            if params.sl_atr <= 0.0 || params.tp_atr <= 0.0 {
                return Err(invalid(format!(
                    "sl_atr and tp_atr must be positive, got {} and {}",
                    params.sl_atr, params.tp_atr
                )));
            }
        }

        if self.costs.commission_per_trade < 0.0
            || self.costs.slippage_bps < 0.0
            || self.costs.spread_bps < 0.0
        {
            return Err(invalid("cost parameters must be non-negative"));
        }

        if let Some(context) = &self.context {
            if context.timeframes.is_empty() {
                return Err(invalid("context timeframes must not be empty"));
            }
            if context.ma_window == 0 {
                return Err(invalid("context ma_window must be at least 1"));
            }
        }

        if let Some(risk) = &self.risk {
            if !risk.max_drawdown.is_finite() || risk.max_drawdown > 0.0 {
                return Err(invalid(format!(
                    "max_drawdown is a floor and must be <= 0, got {}",
                    risk.max_drawdown
                )));
            }
        }

        Ok(())
    }

    /// Content-addressed run identifier: blake3 over the JSON form.
    ///
    /// Two identical configs always hash to the same id, so artifact
    /// directories are stable across re-runs.
    pub fn run_id(&self) -> String {
        let json = serde_json::to_string(self).expect("config serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        reason: reason.into(),
    }
}
