//! Per-event transaction costs applied in return space.

use serde::{Deserialize, Serialize};

/// Friction charged whenever exposure changes.
///
/// `commission_per_trade` is already a return-space fraction; the bps
/// fields convert at 1 bp = 0.0001. Entries and exits pay the same charge,
/// independent of price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostParams {
    pub commission_per_trade: f64,
    pub slippage_bps: f64,
    pub spread_bps: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self::frictionless()
    }
}

impl CostParams {
    pub fn frictionless() -> Self {
        Self {
            commission_per_trade: 0.0,
            slippage_bps: 0.0,
            spread_bps: 0.0,
        }
    }

    /// Total return-space charge per exposure change.
    pub fn per_event(&self) -> f64 {
        self.commission_per_trade + (self.slippage_bps + self.spread_bps) / 10_000.0
    }
}

/// Subtract the per-event charge from `raw` on each change bar.
///
/// With all-zero parameters the output equals `raw` exactly.
pub fn apply_costs(raw: &[f64], changes: &[bool], params: &CostParams) -> Vec<f64> {
    assert_eq!(raw.len(), changes.len(), "one change flag per return");
    let per_event = params.per_event();
    raw.iter()
        .zip(changes)
        .map(|(&r, &changed)| if changed { r - per_event } else { r })
        .collect()
}
