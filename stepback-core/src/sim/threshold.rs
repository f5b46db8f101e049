//! Simple threshold mode: long while close is above its moving average.

use crate::bar::Bar;
use crate::sim::{self, CostParams, IndicatorColumns, SimError, SimOutput};

/// Run the threshold simulator.
///
/// Exposure at each bar is 1 iff the close is strictly above the
/// `ma_window` moving average and the context filter (all ones when
/// absent) permits the bar. A NaN average (warm-up) compares false, so
/// exposure stays 0 until the window fills. A filter shorter than the bar
/// series truncates the run to the common prefix.
pub fn run_threshold(
    bars: &[Bar],
    columns: &IndicatorColumns,
    ma_window: usize,
    context: Option<&[u8]>,
    costs: &CostParams,
    initial_capital: f64,
) -> Result<SimOutput, SimError> {
    let ma = columns.resolve_ma(ma_window, bars.len())?;
    let n = sim::effective_len(bars.len(), context);

    let mut exposure = Vec::with_capacity(n);
    let mut context_ok = Vec::with_capacity(n);
    for t in 0..n {
        let ok = context.map_or(1, |f| f[t]);
        let long = ok == 1 && bars[t].close > ma[t];
        context_ok.push(ok);
        exposure.push(u8::from(long));
    }
    Ok(sim::finish(bars, exposure, context_ok, costs, initial_capital))
}
