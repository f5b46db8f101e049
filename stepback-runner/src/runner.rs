//! Backtest runner — wires the loader, indicators, context filter and
//! simulators together.
//!
//! Two entry points:
//! - `run_backtest()`: loads the CSV named by the config, then runs.
//! - `run_backtest_on()`: takes pre-loaded bars. Used by tests, benches and
//!   the diagnostic commands to avoid re-reading files.

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stepback_core::indicators::{atr, sma};
use stepback_core::{
    align_to_execution, combine, enforce_risk_limits, resample, run_atr_bracket, run_threshold,
    trend_flag, Bar, IndicatorColumns, RiskReport, SimError, SimOutput,
};

use crate::config::{BacktestConfig, ConfigError, ContextSection, Mode};
use crate::loader::{load_csv, LoadError};
use crate::summary::RunSummary;
use crate::synth::dataset_hash;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("no bars left to simulate")]
    NoBars,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Serializable report of one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: String,
    pub dataset_hash: String,
    pub mode: String,
    pub initial_capital: f64,
    /// Bars loaded at the execution timeframe.
    pub bar_count: usize,
    /// Bars actually simulated; shorter than `bar_count` when the context
    /// filter truncated the run to a common prefix.
    pub bars_used: usize,
    /// Fraction of simulated bars the context filter permitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_coverage: Option<f64>,
    pub summary: RunSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskReport>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A finished run: the report plus the full per-bar columns.
///
/// The columns are kept out of the report so `report.json` stays small;
/// they are persisted separately as `equity.csv`.
#[derive(Debug, Clone)]
pub struct BacktestRun {
    pub report: BacktestReport,
    /// Timestamps of the simulated bars, same length as the output columns.
    pub times: Vec<DateTime<Utc>>,
    pub output: SimOutput,
}

/// Run a backtest end to end from a validated config.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestRun, RunError> {
    let bars = load_csv(&config.backtest.csv)?;
    run_backtest_on(&bars, config)
}

/// Run a backtest on pre-loaded bars — no I/O.
pub fn run_backtest_on(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestRun, RunError> {
    let params = &config.strategy.params;
    let initial = config.backtest.initial_capital;

    let mut columns = IndicatorColumns::new();
    columns.insert_ma(params.ma_window, sma(bars, params.ma_window));
    if config.strategy.mode == Mode::AtrBracket {
        columns.insert_atr(params.atr_window, atr(bars, params.atr_window));
    }

    let filter = config
        .context
        .as_ref()
        .map(|context| build_context_filter(bars, context));

    let output = match config.strategy.mode {
        Mode::Threshold => run_threshold(
            bars,
            &columns,
            params.ma_window,
            filter.as_deref(),
            &config.costs,
            initial,
        )?,
        Mode::AtrBracket => run_atr_bracket(
            bars,
            &columns,
            params,
            filter.as_deref(),
            &config.costs,
            initial,
        )?,
    };

    if output.is_empty() {
        return Err(RunError::NoBars);
    }

    let context_coverage = config.context.as_ref().map(|_| {
        let permitted = output.context_ok.iter().filter(|&&ok| ok == 1).count();
        permitted as f64 / output.len() as f64
    });
    let risk = config
        .risk
        .map(|limits| enforce_risk_limits(&output, &limits));

    let report = BacktestReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        dataset_hash: dataset_hash(bars),
        mode: config.strategy.mode.to_string(),
        initial_capital: initial,
        bar_count: bars.len(),
        bars_used: output.len(),
        context_coverage,
        summary: RunSummary::compute(&output, initial),
        risk,
    };
    let times = bars[..output.len()].iter().map(|b| b.time).collect();

    Ok(BacktestRun {
        report,
        times,
        output,
    })
}

/// Build the combined higher-timeframe permission filter.
///
/// Each configured timeframe is resampled, trend-flagged and aligned back
/// to the execution bars independently (in parallel), then the per-frame
/// filters merge under the configured rule.
pub fn build_context_filter(bars: &[Bar], context: &ContextSection) -> Vec<u8> {
    let filters: Vec<Vec<u8>> = context
        .timeframes
        .par_iter()
        .map(|&tf| {
            let coarse = resample(bars, tf);
            let flags = trend_flag(&coarse, context.ma_window);
            align_to_execution(bars, &coarse, &flags)
        })
        .collect();
    combine(&filters, context.combine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BacktestSection, StrategySection};
    use crate::synth::synthetic_bars;
    use stepback_core::{BracketParams, CombineRule, CostParams, RiskLimits, Timeframe};

    fn threshold_config() -> BacktestConfig {
        BacktestConfig {
            backtest: BacktestSection {
                csv: "unused.csv".into(),
                initial_capital: 1_000.0,
            },
            strategy: StrategySection {
                mode: Mode::Threshold,
                params: BracketParams {
                    ma_window: 12,
                    ..BracketParams::default()
                },
            },
            costs: CostParams::frictionless(),
            context: None,
            risk: None,
        }
    }

    #[test]
    fn threshold_run_fills_the_report() {
        let bars = synthetic_bars("runner", 400, Timeframe::M5);
        let config = threshold_config();
        let run = run_backtest_on(&bars, &config).unwrap();

        assert_eq!(run.report.bar_count, 400);
        assert_eq!(run.report.bars_used, 400);
        assert_eq!(run.report.mode, "threshold");
        assert_eq!(run.report.summary.bars_used, 400);
        assert_eq!(run.times.len(), 400);
        assert!(run.report.context_coverage.is_none());
        assert!(run.report.risk.is_none());
        assert_eq!(run.report.run_id, config.run_id());
        assert_eq!(run.report.dataset_hash, dataset_hash(&bars));
    }

    #[test]
    fn bracket_run_uses_the_atr_column() {
        let bars = synthetic_bars("runner", 400, Timeframe::M5);
        let mut config = threshold_config();
        config.strategy.mode = Mode::AtrBracket;
        let run = run_backtest_on(&bars, &config).unwrap();

        assert_eq!(run.report.mode, "atr_bracket");
        assert_eq!(run.output.len(), 400);
    }

    #[test]
    fn context_filter_spans_all_bars_and_reports_coverage() {
        let bars = synthetic_bars("runner", 600, Timeframe::M5);
        let mut config = threshold_config();
        config.context = Some(ContextSection {
            timeframes: vec![Timeframe::M30, Timeframe::H1],
            ma_window: 5,
            combine: CombineRule::All,
        });
        let run = run_backtest_on(&bars, &config).unwrap();

        // The filter spans every execution bar, so nothing truncates.
        assert_eq!(run.report.bars_used, 600);
        let coverage = run.report.context_coverage.unwrap();
        assert!((0.0..=1.0).contains(&coverage));

        let filter = build_context_filter(&bars, config.context.as_ref().unwrap());
        let permitted = filter.iter().filter(|&&ok| ok == 1).count();
        assert!((coverage - permitted as f64 / 600.0).abs() < 1e-12);
    }

    #[test]
    fn combined_filter_is_elementwise_and_of_single_frames() {
        let bars = synthetic_bars("runner", 600, Timeframe::M5);
        let single = |tf| ContextSection {
            timeframes: vec![tf],
            ma_window: 5,
            combine: CombineRule::All,
        };
        let m30 = build_context_filter(&bars, &single(Timeframe::M30));
        let h1 = build_context_filter(&bars, &single(Timeframe::H1));
        let both = build_context_filter(
            &bars,
            &ContextSection {
                timeframes: vec![Timeframe::M30, Timeframe::H1],
                ma_window: 5,
                combine: CombineRule::All,
            },
        );
        for i in 0..both.len() {
            assert_eq!(both[i], m30[i] & h1[i]);
        }
    }

    #[test]
    fn risk_section_produces_a_report() {
        let bars = synthetic_bars("runner", 400, Timeframe::M5);
        let mut config = threshold_config();
        config.risk = Some(RiskLimits {
            max_trades: 10_000,
            max_drawdown: -0.99,
        });
        let run = run_backtest_on(&bars, &config).unwrap();

        let risk = run.report.risk.unwrap();
        assert!(risk.passed);
        assert_eq!(risk.trades, run.output.trade_count());
    }

    #[test]
    fn empty_bars_are_refused() {
        let config = threshold_config();
        let err = run_backtest_on(&[], &config).unwrap_err();
        assert!(matches!(err, RunError::NoBars));
    }
}
