//! ATR bracket mode: stop/target exits with a re-entry cooldown.
//!
//! State is threaded through a pure per-bar transition. Bar 0 seeds the
//! fold flat; decisions start at bar 1. Within a bar the order is fixed:
//! the cooldown ticks down, an undefined ATR freezes the position, an exit
//! is checked before any entry, and a bar that exited never re-enters.

use serde::{Deserialize, Serialize};

use crate::bar::Bar;
use crate::sim::{self, CostParams, IndicatorColumns, SimError, SimOutput};

/// Parameters for the ATR bracket simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BracketParams {
    /// Entry filter window: enter only while close is above this SMA.
    pub ma_window: usize,
    /// ATR window used to size the bracket.
    pub atr_window: usize,
    /// Stop distance in ATR multiples below the entry close.
    pub sl_atr: f64,
    /// Target distance in ATR multiples above the entry close.
    pub tp_atr: f64,
    /// Bars until re-entry is allowed again after an exit.
    pub cooldown_bars: u32,
}

impl Default for BracketParams {
    fn default() -> Self {
        Self {
            ma_window: 20,
            atr_window: 14,
            sl_atr: 1.5,
            tp_atr: 2.0,
            cooldown_bars: 3,
        }
    }
}

/// Open position with its protective levels, or flat.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Position {
    Flat,
    Long { stop: f64, target: f64 },
}

/// Fold state carried across bars.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BracketState {
    position: Position,
    cooldown: u32,
}

impl BracketState {
    fn flat() -> Self {
        Self {
            position: Position::Flat,
            cooldown: 0,
        }
    }

    fn exposure(&self) -> u8 {
        u8::from(matches!(self.position, Position::Long { .. }))
    }
}

/// One bar's inputs to the transition.
#[derive(Debug, Clone, Copy)]
struct Row {
    close: f64,
    high: f64,
    low: f64,
    ma: f64,
    atr: f64,
    context_ok: bool,
}

/// Pure per-bar transition.
///
/// The cooldown decrements even on undefined-ATR bars; everything else
/// requires a defined ATR. Exit is an intrabar touch against the bar's
/// low/high. Entry requires flat, no exit this bar, zero cooldown, context
/// permission, and close strictly above the moving average (NaN compares
/// false).
fn step(state: BracketState, row: Row, params: &BracketParams) -> BracketState {
    let mut next = state;
    if next.cooldown > 0 {
        next.cooldown -= 1;
    }
    if row.atr.is_nan() {
        return next;
    }

    let mut exited = false;
    if let Position::Long { stop, target } = next.position {
        if row.low <= stop || row.high >= target {
            next.position = Position::Flat;
            next.cooldown = params.cooldown_bars;
            exited = true;
        }
    }

    if !exited
        && next.position == Position::Flat
        && next.cooldown == 0
        && row.context_ok
        && row.close > row.ma
    {
        next.position = Position::Long {
            stop: row.close - params.sl_atr * row.atr,
            target: row.close + params.tp_atr * row.atr,
        };
    }

    next
}

/// Run the ATR bracket simulator.
///
/// Requires both the `ma_window` and `atr_window` columns; either missing
/// is a configuration error. A context filter shorter than the bar series
/// truncates the run to the common prefix.
pub fn run_atr_bracket(
    bars: &[Bar],
    columns: &IndicatorColumns,
    params: &BracketParams,
    context: Option<&[u8]>,
    costs: &CostParams,
    initial_capital: f64,
) -> Result<SimOutput, SimError> {
    let ma = columns.resolve_ma(params.ma_window, bars.len())?;
    let atr = columns.resolve_atr(params.atr_window, bars.len())?;
    let n = sim::effective_len(bars.len(), context);

    let mut exposure = Vec::with_capacity(n);
    let mut context_ok = Vec::with_capacity(n);
    let mut state = BracketState::flat();
    for t in 0..n {
        let ok = context.map_or(1, |f| f[t]);
        context_ok.push(ok);
        if t == 0 {
            exposure.push(state.exposure());
            continue;
        }
        let row = Row {
            close: bars[t].close,
            high: bars[t].high,
            low: bars[t].low,
            ma: ma[t],
            atr: atr[t],
            context_ok: ok == 1,
        };
        state = step(state, row, params);
        exposure.push(state.exposure());
    }
    Ok(sim::finish(bars, exposure, context_ok, costs, initial_capital))
}
