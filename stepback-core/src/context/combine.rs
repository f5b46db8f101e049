//! Combining several aligned permission filters into one.

use serde::{Deserialize, Serialize};

/// How multiple context filters merge into a single permission series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    /// Permit only where every filter permits.
    #[default]
    All,
    /// Permit where a strict majority of filters permit (ties deny).
    Majority,
}

/// Element-wise combination of 0/1 filters.
///
/// All filters must share one length; with no filters the result is empty.
pub fn combine(filters: &[Vec<u8>], rule: CombineRule) -> Vec<u8> {
    let Some(first) = filters.first() else {
        return Vec::new();
    };
    assert!(
        filters.iter().all(|f| f.len() == first.len()),
        "filters must share one length"
    );

    let n = filters.len();
    (0..first.len())
        .map(|i| {
            let votes = filters.iter().filter(|f| f[i] == 1).count();
            let ok = match rule {
                CombineRule::All => votes == n,
                CombineRule::Majority => 2 * votes > n,
            };
            u8::from(ok)
        })
        .collect()
}
