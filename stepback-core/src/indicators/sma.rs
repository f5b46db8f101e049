//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices; first valid value at index `window - 1`.

use crate::bar::Bar;
use crate::indicators::rolling_mean;

/// Rolling mean of closes over `window` bars.
pub fn sma(bars: &[Bar], window: usize) -> Vec<f64> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    rolling_mean(&closes, window)
}
