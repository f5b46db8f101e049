//! Backward as-of alignment of context flags onto execution bars.

use crate::bar::Bar;

/// For each execution bar, the flag of the most recent context bar at or
/// before it.
///
/// Execution bars earlier than every context bar get 0: missing context
/// never grants permission. Context bars after an execution bar are never
/// consulted, so a coarser-timeframe flag only becomes visible once its
/// bucket has opened.
///
/// Both series must be sorted ascending by time; `flags` carries one entry
/// per context bar.
pub fn align_to_execution(exec: &[Bar], context: &[Bar], flags: &[u8]) -> Vec<u8> {
    assert_eq!(context.len(), flags.len(), "one flag per context bar");
    debug_assert!(
        exec.windows(2).all(|w| w[0].time <= w[1].time),
        "execution bars must be sorted by time"
    );
    debug_assert!(
        context.windows(2).all(|w| w[0].time <= w[1].time),
        "context bars must be sorted by time"
    );

    let mut out = Vec::with_capacity(exec.len());
    let mut next = 0usize;
    let mut current = 0u8;
    for bar in exec {
        while next < context.len() && context[next].time <= bar.time {
            current = flags[next];
            next += 1;
        }
        out.push(current);
    }
    out
}
