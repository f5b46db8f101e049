//! Average True Range (ATR).
//!
//! True range folds the gap from the previous close into the bar's range.
//! ATR here is the plain rolling mean of true range over the window, not
//! the Wilder-smoothed variant; warm-up prefix is NaN.

use crate::bar::Bar;
use crate::indicators::rolling_mean;

/// True range per bar: `max(high - low, |high - prev_close|, |low - prev_close|)`.
///
/// The first bar has no previous close and uses `high - low`.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            let hl = bar.high - bar.low;
            if i == 0 {
                hl
            } else {
                let prev_close = bars[i - 1].close;
                hl.max((bar.high - prev_close).abs())
                    .max((bar.low - prev_close).abs())
            }
        })
        .collect()
}

/// Rolling mean of true range over `window` bars.
pub fn atr(bars: &[Bar], window: usize) -> Vec<f64> {
    rolling_mean(&true_range(bars), window)
}
