//! stepback-core — deterministic long-only backtesting engine.
//!
//! Pure domain logic with no I/O: OHLCV bars and timeframes, downsampling,
//! rolling indicators (SMA, ATR), higher-timeframe context filters with
//! as-of alignment, two bar-by-bar execution simulators (simple threshold
//! and ATR bracket), a per-event cost model, compounded equity, and risk
//! limit checks.
//!
//! Everything operates on plain slices and returns owned vectors; the
//! orchestration layer (`stepback-runner`) owns configuration, file I/O,
//! and reporting.

pub mod bar;
pub mod context;
pub mod indicators;
pub mod resample;
pub mod risk;
pub mod sim;
pub mod timeframe;

pub use bar::Bar;
pub use context::{align_to_execution, combine, trend_flag, CombineRule};
pub use resample::resample;
pub use risk::{enforce_risk_limits, RiskLimits, RiskReport};
pub use sim::{
    run_atr_bracket, run_threshold, BracketParams, CostParams, IndicatorColumns, SimError,
    SimOutput,
};
pub use timeframe::Timeframe;
