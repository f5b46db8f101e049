//! OHLCV downsampling to coarser timeframes.
//!
//! Buckets are left-closed and left-labelled: an M5 bar stamped 12:07 falls
//! into the 12:00 bucket at M15, and the output bar is stamped 12:00.
//! Buckets with no input bars simply do not appear; gaps are not filled.

use crate::bar::Bar;
use crate::timeframe::Timeframe;

/// Downsample `bars` (sorted ascending by time) into `tf` buckets.
///
/// Aggregation per bucket: open = first, high = max, low = min,
/// close = last, volume = sum. `spread` and `real_volume` are dropped.
pub fn resample(bars: &[Bar], tf: Timeframe) -> Vec<Bar> {
    let mut out: Vec<Bar> = Vec::new();
    for bar in bars {
        let bucket = tf.floor(bar.time);
        debug_assert!(
            out.last().map_or(true, |agg| agg.time <= bucket),
            "resample input must be sorted by time"
        );
        match out.last_mut() {
            Some(agg) if agg.time == bucket => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => out.push(Bar {
                time: bucket,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
                spread: None,
                real_volume: None,
            }),
        }
    }
    out
}
