//! Trend regime flags.

use crate::bar::Bar;
use crate::indicators::sma;

/// 1 where close is strictly above its `ma_window` SMA, else 0.
///
/// During the SMA warm-up the comparison is against NaN and yields 0.
pub fn trend_flag(bars: &[Bar], ma_window: usize) -> Vec<u8> {
    let ma = sma(bars, ma_window);
    bars.iter()
        .zip(ma.iter())
        .map(|(bar, &m)| u8::from(bar.close > m))
        .collect()
}
