//! stepback-runner — backtest orchestration around `stepback-core`.
//!
//! This crate owns everything with a side effect:
//! - CSV bar loading and writing
//! - TOML run configuration with content-addressed run ids
//! - The end-to-end runner (indicators, context filter, simulation)
//! - Performance summaries
//! - JSON/CSV artifact persistence
//! - Deterministic synthetic fixtures

pub mod config;
pub mod loader;
pub mod report;
pub mod runner;
pub mod summary;
pub mod synth;

pub use config::{BacktestConfig, ConfigError, ContextSection, Mode};
pub use loader::{load_csv, write_csv, LoadError};
pub use report::{load_report, save_artifacts};
pub use runner::{
    build_context_filter, run_backtest, run_backtest_on, BacktestReport, BacktestRun, RunError,
    SCHEMA_VERSION,
};
pub use summary::RunSummary;
pub use synth::{dataset_hash, synthetic_bars};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_is_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<BacktestReport>();
        assert_sync::<BacktestReport>();
        assert_send::<BacktestRun>();
        assert_sync::<BacktestRun>();
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
    }

    #[test]
    fn errors_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
