//! Risk limit checks over a completed run.
//!
//! Evaluation never fails and never mutates the run; it reports, and the
//! caller decides what a failed verdict means.

use serde::{Deserialize, Serialize};

use crate::sim::SimOutput;

/// Ceilings a finished run is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Maximum number of exposure changes (entries plus exits).
    pub max_trades: usize,
    /// Worst tolerated drawdown as a non-positive fraction (-0.2 = 20%).
    pub max_drawdown: f64,
}

/// Outcome of the risk checks, observed values included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskReport {
    pub trades: usize,
    pub drawdown: f64,
    pub max_trades_ok: bool,
    pub max_drawdown_ok: bool,
    pub passed: bool,
}

/// Check a finished run against `limits`.
///
/// The drawdown check passes when the observed worst drawdown is at or
/// above the configured floor (both are non-positive).
pub fn enforce_risk_limits(output: &SimOutput, limits: &RiskLimits) -> RiskReport {
    let trades = output.trade_count();
    let drawdown = worst_drawdown(&output.equity);
    let max_trades_ok = trades <= limits.max_trades;
    let max_drawdown_ok = drawdown >= limits.max_drawdown;
    RiskReport {
        trades,
        drawdown,
        max_trades_ok,
        max_drawdown_ok,
        passed: max_trades_ok && max_drawdown_ok,
    }
}

/// Minimum of `equity / running_peak - 1` over the curve; 0 when empty.
fn worst_drawdown(equity: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &e in equity {
        peak = peak.max(e);
        worst = worst.min(e / peak - 1.0);
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_with(exposure: Vec<u8>, equity: Vec<f64>) -> SimOutput {
        let n = exposure.len();
        let mut position_change = vec![false; n];
        for t in 1..n {
            position_change[t] = exposure[t] != exposure[t - 1];
        }
        SimOutput {
            exposure,
            context_ok: vec![1; n],
            raw_return: vec![0.0; n],
            position_change,
            net_return: vec![0.0; n],
            equity,
        }
    }

    #[test]
    fn passes_inside_both_limits() {
        let out = output_with(vec![0, 1, 1, 0], vec![1.0, 1.0, 1.05, 1.02]);
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 5,
                max_drawdown: -0.2,
            },
        );
        assert!(report.max_trades_ok);
        assert!(report.max_drawdown_ok);
        assert!(report.passed);
        assert_eq!(report.trades, 2);
    }

    #[test]
    fn too_many_trades_fails_only_that_check() {
        let out = output_with(vec![0, 1, 0, 1, 0], vec![1.0; 5]);
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 3,
                max_drawdown: -0.5,
            },
        );
        assert_eq!(report.trades, 4);
        assert!(!report.max_trades_ok);
        assert!(report.max_drawdown_ok);
        assert!(!report.passed);
    }

    #[test]
    fn deep_drawdown_fails() {
        let out = output_with(vec![0, 1, 1, 1], vec![1.0, 1.5, 0.9, 1.0]);
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 10,
                max_drawdown: -0.2,
            },
        );
        // Peak 1.5 to trough 0.9 is a 40% drawdown.
        assert!((report.drawdown - (0.9 / 1.5 - 1.0)).abs() < 1e-12);
        assert!(!report.max_drawdown_ok);
        assert!(!report.passed);
    }

    #[test]
    fn drawdown_exactly_at_floor_passes() {
        let out = output_with(vec![0, 0], vec![1.0, 0.8]);
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 10,
                max_drawdown: -0.2,
            },
        );
        assert!((report.drawdown + 0.2).abs() < 1e-12);
        assert!(report.max_drawdown_ok);
    }

    #[test]
    fn empty_run_passes_by_default() {
        let out = output_with(Vec::new(), Vec::new());
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 0,
                max_drawdown: -0.1,
            },
        );
        assert_eq!(report.trades, 0);
        assert_eq!(report.drawdown, 0.0);
        assert!(report.passed);
    }

    #[test]
    fn monotone_equity_has_zero_drawdown() {
        let out = output_with(vec![1; 4], vec![1.0, 1.1, 1.2, 1.3]);
        let report = enforce_risk_limits(
            &out,
            &RiskLimits {
                max_trades: 10,
                max_drawdown: 0.0,
            },
        );
        assert_eq!(report.drawdown, 0.0);
        assert!(report.max_drawdown_ok);
    }
}
