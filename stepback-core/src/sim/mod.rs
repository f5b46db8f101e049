//! Bar-by-bar execution simulators.
//!
//! Two modes share one output shape and one settlement pipeline:
//!
//! - [`run_threshold`] — long while close is above its moving average.
//! - [`run_atr_bracket`] — ATR-sized stop/target brackets with a re-entry
//!   cooldown.
//!
//! Indicator series arrive precomputed through [`IndicatorColumns`] and are
//! resolved once, before the bar loop; a missing window or a length
//! mismatch is a [`SimError`] raised up front. Returns are applied with a
//! one-bar shift (the previous bar's exposure earns the current bar's
//! close-to-close return), costs are charged per exposure change, and
//! equity compounds multiplicatively.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::bar::Bar;

pub mod bracket;
pub mod costs;
pub mod equity;
pub mod threshold;

pub use bracket::{run_atr_bracket, BracketParams};
pub use costs::{apply_costs, CostParams};
pub use equity::equity_curve;
pub use threshold::run_threshold;

/// Configuration errors detected before any bar is processed.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("no moving-average column registered for window {window}")]
    MissingMa { window: usize },
    #[error("no ATR column registered for window {window}")]
    MissingAtr { window: usize },
    #[error("column {name} has {actual} values for {expected} bars")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },
}

/// Precomputed indicator series keyed by window.
///
/// The simulators resolve exactly the windows their parameters name, once,
/// and validate each column's length against the bar count. Registering a
/// column does not validate it; resolution does.
#[derive(Debug, Clone, Default)]
pub struct IndicatorColumns {
    ma: BTreeMap<usize, Vec<f64>>,
    atr: BTreeMap<usize, Vec<f64>>,
}

impl IndicatorColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_ma(&mut self, window: usize, values: Vec<f64>) {
        self.ma.insert(window, values);
    }

    pub fn insert_atr(&mut self, window: usize, values: Vec<f64>) {
        self.atr.insert(window, values);
    }

    pub(crate) fn resolve_ma(&self, window: usize, bar_count: usize) -> Result<&[f64], SimError> {
        let values = self.ma.get(&window).ok_or(SimError::MissingMa { window })?;
        check_length("ma", window, values, bar_count)?;
        Ok(values)
    }

    pub(crate) fn resolve_atr(&self, window: usize, bar_count: usize) -> Result<&[f64], SimError> {
        let values = self.atr.get(&window).ok_or(SimError::MissingAtr { window })?;
        check_length("atr", window, values, bar_count)?;
        Ok(values)
    }
}

fn check_length(
    kind: &str,
    window: usize,
    values: &[f64],
    bar_count: usize,
) -> Result<(), SimError> {
    if values.len() != bar_count {
        return Err(SimError::ColumnLength {
            name: format!("{kind}_{window}"),
            expected: bar_count,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Per-bar output columns of a simulation run.
///
/// All vectors share one length: the number of bars actually processed,
/// which is the full input length unless a shorter context filter
/// truncated the run to the common prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct SimOutput {
    /// 0/1 position after the bar's decisions.
    pub exposure: Vec<u8>,
    /// The permission flag the bar saw (all 1 without a filter).
    pub context_ok: Vec<u8>,
    /// Previous bar's exposure times the bar's close-to-close return.
    pub raw_return: Vec<f64>,
    /// True where exposure differs from the previous bar (never at bar 0).
    pub position_change: Vec<bool>,
    /// Raw return minus the per-event cost on change bars.
    pub net_return: Vec<f64>,
    /// Compounded equity after the bar.
    pub equity: Vec<f64>,
}

impl SimOutput {
    pub fn len(&self) -> usize {
        self.exposure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exposure.is_empty()
    }

    /// Number of exposure changes (entries plus exits).
    pub fn trade_count(&self) -> usize {
        self.position_change.iter().filter(|&&c| c).count()
    }

    /// Last equity value, or `initial` for an empty run.
    pub fn final_equity(&self, initial: f64) -> f64 {
        self.equity.last().copied().unwrap_or(initial)
    }
}

/// Close-to-close simple returns; index 0 is 0.
pub(crate) fn close_returns(bars: &[Bar]) -> Vec<f64> {
    let mut ret = vec![0.0; bars.len()];
    for t in 1..bars.len() {
        ret[t] = bars[t].close / bars[t - 1].close - 1.0;
    }
    ret
}

/// Bars actually processed: the common prefix of bars and filter.
pub(crate) fn effective_len(bar_count: usize, context: Option<&[u8]>) -> usize {
    match context {
        Some(filter) => bar_count.min(filter.len()),
        None => bar_count,
    }
}

/// Settle an exposure series into the full output columns.
///
/// Returns use the one-bar shift, so the bar that opens a position
/// contributes nothing yet; bar 0 is never a change event.
pub(crate) fn finish(
    bars: &[Bar],
    exposure: Vec<u8>,
    context_ok: Vec<u8>,
    costs: &CostParams,
    initial_capital: f64,
) -> SimOutput {
    let n = exposure.len();
    debug_assert!(n <= bars.len());
    debug_assert_eq!(context_ok.len(), n);

    let ret = close_returns(&bars[..n]);
    let mut raw_return = vec![0.0; n];
    let mut position_change = vec![false; n];
    for t in 1..n {
        raw_return[t] = f64::from(exposure[t - 1]) * ret[t];
        position_change[t] = exposure[t] != exposure[t - 1];
    }
    let net_return = apply_costs(&raw_return, &position_change, costs);
    let equity = equity_curve(&net_return, initial_capital);

    SimOutput {
        exposure,
        context_ok,
        raw_return,
        position_change,
        net_return,
        equity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn resolve_missing_ma_errors() {
        let columns = IndicatorColumns::new();
        let err = columns.resolve_ma(20, 10).unwrap_err();
        assert!(matches!(err, SimError::MissingMa { window: 20 }));
    }

    #[test]
    fn resolve_missing_atr_errors() {
        let mut columns = IndicatorColumns::new();
        columns.insert_atr(14, vec![1.0; 10]);
        let err = columns.resolve_atr(7, 10).unwrap_err();
        assert!(matches!(err, SimError::MissingAtr { window: 7 }));
    }

    #[test]
    fn resolve_checks_length() {
        let mut columns = IndicatorColumns::new();
        columns.insert_ma(5, vec![1.0; 9]);
        let err = columns.resolve_ma(5, 10).unwrap_err();
        match err {
            SimError::ColumnLength {
                name,
                expected,
                actual,
            } => {
                assert_eq!(name, "ma_5");
                assert_eq!(expected, 10);
                assert_eq!(actual, 9);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn resolve_window_is_exact() {
        // A column for window 10 must not satisfy a request for window 20.
        let mut columns = IndicatorColumns::new();
        columns.insert_ma(10, vec![1.0; 4]);
        assert!(matches!(
            columns.resolve_ma(20, 4),
            Err(SimError::MissingMa { window: 20 })
        ));
    }

    #[test]
    fn close_returns_basic() {
        let bars = make_bars(&[100.0, 110.0, 99.0]);
        let ret = close_returns(&bars);
        assert_eq!(ret[0], 0.0);
        assert!((ret[1] - 0.1).abs() < 1e-12);
        assert!((ret[2] - (99.0 / 110.0 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn effective_len_truncates_to_shorter_side() {
        assert_eq!(effective_len(10, None), 10);
        assert_eq!(effective_len(10, Some(&[1u8; 6])), 6);
        assert_eq!(effective_len(4, Some(&[1u8; 6])), 4);
    }

    #[test]
    fn finish_applies_one_bar_shift() {
        let bars = make_bars(&[100.0, 110.0, 121.0]);
        let out = finish(
            &bars,
            vec![1, 1, 0],
            vec![1, 1, 1],
            &CostParams::frictionless(),
            1.0,
        );
        // Bar 0 earns nothing even though exposure is already 1.
        assert_eq!(out.raw_return[0], 0.0);
        assert!((out.raw_return[1] - 0.1).abs() < 1e-12);
        // Bar 2 still earns: the previous bar was long.
        assert!((out.raw_return[2] - 0.1).abs() < 1e-12);
        assert_eq!(out.position_change, vec![false, false, true]);
        assert_eq!(out.trade_count(), 1);
    }

    #[test]
    fn empty_output_final_equity_falls_back() {
        let out = finish(&[], Vec::new(), Vec::new(), &CostParams::frictionless(), 250.0);
        assert!(out.is_empty());
        assert_eq!(out.final_equity(250.0), 250.0);
    }
}
