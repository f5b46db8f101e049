//! Artifact persistence — JSON report and equity-curve CSV.
//!
//! Every run saves into its own content-addressed directory, so re-running
//! the same config overwrites the same artifacts instead of piling up
//! timestamped copies. Persisted JSON carries a `schema_version`; unknown
//! versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::runner::{BacktestReport, BacktestRun, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize report to JSON")
}

/// Deserialize a report from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── Equity CSV ─────────────────────────────────────────────────────

/// Render the per-bar columns as `time,exposure,net_return,equity`.
///
/// Numbers are written in full round-trip precision so the metrics can be
/// recomputed from the artifact alone.
pub fn export_equity_csv(run: &BacktestRun) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["time", "exposure", "net_return", "equity"])?;
    for i in 0..run.output.len() {
        wtr.write_record([
            &run.times[i].to_rfc3339(),
            &run.output.exposure[i].to_string(),
            &run.output.net_return[i].to_string(),
            &run.output.equity[i].to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact pair for a single run.
///
/// Creates `<output_dir>/<run-id prefix>/` containing `report.json` and
/// `equity.csv`, and returns the created directory.
pub fn save_artifacts(run: &BacktestRun, output_dir: &Path) -> Result<PathBuf> {
    let short_id: String = run.report.run_id.chars().take(16).collect();
    let run_dir = output_dir.join(short_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(&run.report)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(run)?)?;

    Ok(run_dir)
}

/// Load a report back from an artifact directory.
///
/// Rejects unknown schema versions.
pub fn load_report(dir: &Path) -> Result<BacktestReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
