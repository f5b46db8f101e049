//! Performance summary for a finished backtest.
//!
//! Every metric here is a pure function of the simulator output, so the
//! same numbers can be recomputed from a saved equity curve without
//! re-running the simulation.

use serde::{Deserialize, Serialize};

use stepback_core::SimOutput;

/// Headline numbers for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_equity: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub trade_count: usize,
    pub bars_used: usize,
}

impl RunSummary {
    /// Compute all metrics from a simulator output.
    pub fn compute(output: &SimOutput, initial_capital: f64) -> Self {
        Self {
            final_equity: final_equity(&output.equity, initial_capital),
            max_drawdown: max_drawdown(&output.equity),
            win_rate: win_rate(&output.net_return),
            profit_factor: profit_factor(&output.net_return),
            trade_count: output.trade_count(),
            bars_used: output.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────────────

/// Last point of the equity curve, or `initial` when the curve is empty.
pub fn final_equity(equity: &[f64], initial: f64) -> f64 {
    equity.last().copied().unwrap_or(initial)
}

/// Worst peak-to-trough decline of the equity curve, as a fraction.
///
/// Always `<= 0.0`; a curve that never dips below a prior peak reports 0.0.
/// Returns 0.0 for an empty curve.
pub fn max_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst: f64 = 0.0;

    for &e in equity {
        if e > peak {
            peak = e;
        }
        let dd = e / peak - 1.0;
        if dd < worst {
            worst = dd;
        }
    }
    worst
}

/// Fraction of bars with a strictly positive net return.
///
/// The denominator is every bar in the series, flat bars included.
/// Returns 0.0 for an empty series.
pub fn win_rate(net_returns: &[f64]) -> f64 {
    if net_returns.is_empty() {
        return 0.0;
    }
    let winners = net_returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / net_returns.len() as f64
}

/// Gross gains divided by gross losses over the per-bar net returns.
///
/// With gains and no losses the ratio is `f64::INFINITY`; with no gains
/// it is 0.0, losses or not.
pub fn profit_factor(net_returns: &[f64]) -> f64 {
    let gains: f64 = net_returns.iter().filter(|&&r| r > 0.0).sum();
    let losses: f64 = net_returns.iter().filter(|&&r| r < 0.0).map(|r| -r).sum();

    if gains == 0.0 {
        0.0
    } else if losses == 0.0 {
        f64::INFINITY
    } else {
        gains / losses
    }
}
