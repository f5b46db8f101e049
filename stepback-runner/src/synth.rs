//! Deterministic synthetic bar series.
//!
//! Used for fixtures and benchmarks when no venue export is at hand. The
//! generator is seeded from a label, so the same label always produces the
//! same series and results stay reproducible across machines.

use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stepback_core::{Bar, Timeframe};

/// Generate `n` bars of a seeded geometric random walk.
///
/// The seed is `blake3(label)`, so distinct labels give distinct series
/// and equal labels give identical ones. Prices start at 100.0, bar times
/// start at 2024-01-01 00:00 UTC and step by the timeframe.
pub fn synthetic_bars(label: &str, n: usize, tf: Timeframe) -> Vec<Bar> {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let step = tf.duration();

    let mut bars = Vec::with_capacity(n);
    let mut price = 100.0_f64;

    for i in 0..n {
        let bar_return: f64 = rng.gen_range(-0.003..0.003);
        let open = price;
        let close = price * (1.0 + bar_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
        let volume = rng.gen_range(100.0..5_000.0_f64).round();

        bars.push(Bar {
            time: start + step * i as i32,
            open,
            high,
            low,
            close,
            volume,
            spread: None,
            real_volume: None,
        });

        price = close;
    }

    bars
}

/// Deterministic BLAKE3 hash over a bar series, hex-encoded.
///
/// Covers the timestamp and every numeric field in order, using
/// little-endian bytes so the hash is identical across platforms.
pub fn dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(&bar.time.timestamp().to_le_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}
