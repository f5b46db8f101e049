//! Higher-timeframe context filters.
//!
//! The pipeline per context timeframe is resample → [`trend_flag`] →
//! [`align_to_execution`]; [`combine`] then merges the aligned filters
//! into the single 0/1 permission series the simulators consume.

pub mod align;
pub mod combine;
pub mod regime;

pub use align::align_to_execution;
pub use combine::{combine, CombineRule};
pub use regime::trend_flag;
