//! Compounded equity from net returns.

/// Cumulative product: `equity[t] = initial * prod_{i<=t} (1 + net[i])`.
///
/// Empty input gives an empty curve. No clamping: a net return below -100%
/// sends equity negative rather than pinning it at zero.
pub fn equity_curve(net_returns: &[f64], initial_capital: f64) -> Vec<f64> {
    let mut equity = Vec::with_capacity(net_returns.len());
    let mut acc = initial_capital;
    for &r in net_returns {
        acc *= 1.0 + r;
        equity.push(acc);
    }
    equity
}
