//! stepback CLI — run backtests, resample venue exports, generate fixtures.
//!
//! Commands:
//! - `run` — execute a backtest from a TOML config file and save artifacts
//! - `resample` — downsample an execution-timeframe CSV into coarser frames
//! - `diagnose` — report per-timeframe trend-filter coverage for a dataset
//! - `synth` — write a deterministic synthetic OHLCV fixture

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use stepback_core::{
    align_to_execution, combine, resample, trend_flag, Bar, CombineRule, Timeframe,
};
use stepback_runner::runner::run_backtest;
use stepback_runner::{loader, save_artifacts, synth, BacktestConfig, BacktestReport};

#[derive(Parser)]
#[command(name = "stepback", about = "stepback CLI — offline trading-rule backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to the TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only, skip writing artifacts.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Downsample an execution-timeframe CSV into coarser frames.
    Resample {
        /// Input CSV at the execution timeframe.
        #[arg(long)]
        input: PathBuf,

        /// Directory for the resampled CSVs.
        #[arg(long)]
        out_dir: PathBuf,

        /// Target timeframes, comma-separated (e.g. M15,H1).
        #[arg(long, value_delimiter = ',', default_value = "M15,M30,H1,H4")]
        timeframes: Vec<String>,
    },
    /// Report per-timeframe trend-filter coverage for a dataset.
    Diagnose {
        /// Input CSV at the execution timeframe.
        #[arg(long)]
        input: PathBuf,

        /// Context timeframes, comma-separated.
        #[arg(long, value_delimiter = ',', default_value = "M15,M30,H1,H4")]
        timeframes: Vec<String>,

        /// Trend moving-average window on each context frame.
        #[arg(long, default_value_t = 10)]
        ma_window: usize,
    },
    /// Write a deterministic synthetic OHLCV fixture.
    Synth {
        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,

        /// Number of bars to generate.
        #[arg(long, default_value_t = 2000)]
        bars: usize,

        /// Bar timeframe.
        #[arg(long, default_value = "M5")]
        timeframe: String,

        /// Seed label; equal labels reproduce equal series.
        #[arg(long, default_value = "demo")]
        label: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            output_dir,
            no_artifacts,
        } => run_cmd(&config, &output_dir, no_artifacts),
        Commands::Resample {
            input,
            out_dir,
            timeframes,
        } => run_resample(&input, &out_dir, &timeframes),
        Commands::Diagnose {
            input,
            timeframes,
            ma_window,
        } => run_diagnose(&input, &timeframes, ma_window),
        Commands::Synth {
            out,
            bars,
            timeframe,
            label,
        } => run_synth(&out, bars, &timeframe, &label),
    }
}

fn run_cmd(config_path: &Path, output_dir: &Path, no_artifacts: bool) -> Result<()> {
    let config = BacktestConfig::from_file(config_path)
        .with_context(|| format!("failed to load config {}", config_path.display()))?;
    let run = run_backtest(&config)?;

    if run.report.bars_used < run.report.bar_count {
        eprintln!(
            "WARNING: run truncated to {} of {} bars",
            run.report.bars_used, run.report.bar_count
        );
    }

    print_summary(&run.report);

    if !no_artifacts {
        let run_dir = save_artifacts(&run, output_dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }

    Ok(())
}

fn run_resample(input: &Path, out_dir: &Path, timeframes: &[String]) -> Result<()> {
    let frames = parse_timeframes(timeframes)?;
    let bars = loader::load_csv(input)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bars");

    println!("Loaded {} bars from {}", bars.len(), input.display());
    for &tf in &frames {
        let coarse = resample(&bars, tf);
        let path = out_dir.join(format!("{stem}_{}.csv", tf.label().to_lowercase()));
        loader::write_csv(&path, &coarse)?;
        println!("  {} -> {} bars", path.display(), coarse.len());
    }

    Ok(())
}

fn run_diagnose(input: &Path, timeframes: &[String], ma_window: usize) -> Result<()> {
    let frames = parse_timeframes(timeframes)?;
    let bars = loader::load_csv(input)?;

    println!("Dataset:   {} ({} bars)", input.display(), bars.len());
    println!("MA window: {ma_window}");
    println!();
    println!("{:<10} {:>10} {:>10}", "Frame", "Bars", "Coverage");
    println!("{}", "-".repeat(32));

    let mut filters: Vec<Vec<u8>> = Vec::with_capacity(frames.len());
    for &tf in &frames {
        let coarse = resample(&bars, tf);
        let flags = trend_flag(&coarse, ma_window);
        let filter = align_to_execution(&bars, &coarse, &flags);
        println!(
            "{:<10} {:>10} {:>9.1}%",
            tf.label(),
            coarse.len(),
            percent_permitted(&filter)
        );
        filters.push(filter);
    }

    println!("{}", "-".repeat(32));
    let all = combine(&filters, CombineRule::All);
    let majority = combine(&filters, CombineRule::Majority);
    println!(
        "{:<10} {:>10} {:>9.1}%",
        "all",
        "-",
        percent_permitted(&all)
    );
    println!(
        "{:<10} {:>10} {:>9.1}%",
        "majority",
        "-",
        percent_permitted(&majority)
    );

    Ok(())
}

fn run_synth(out: &Path, bars: usize, timeframe: &str, label: &str) -> Result<()> {
    if bars == 0 {
        bail!("--bars must be at least 1");
    }
    let tf: Timeframe = timeframe.parse()?;
    let series: Vec<Bar> = synth::synthetic_bars(label, bars, tf);
    loader::write_csv(out, &series)?;

    println!("Wrote {} {} bars to {}", series.len(), tf.label(), out.display());
    println!("Label:        {label}");
    println!("Dataset hash: {}", &synth::dataset_hash(&series)[..16]);
    Ok(())
}

fn parse_timeframes(raw: &[String]) -> Result<Vec<Timeframe>> {
    if raw.is_empty() {
        bail!("at least one timeframe is required");
    }
    let mut frames = Vec::with_capacity(raw.len());
    for s in raw {
        frames.push(s.parse::<Timeframe>()?);
    }
    Ok(frames)
}

fn percent_permitted(filter: &[u8]) -> f64 {
    if filter.is_empty() {
        return 0.0;
    }
    let permitted = filter.iter().filter(|&&ok| ok == 1).count();
    permitted as f64 / filter.len() as f64 * 100.0
}

fn print_summary(report: &BacktestReport) {
    println!();
    println!("=== Backtest Result ===");
    println!("Mode:           {}", report.mode);
    println!("Run ID:         {}", &report.run_id[..16]);
    println!(
        "Bars:           {} loaded, {} simulated",
        report.bar_count, report.bars_used
    );
    if let Some(coverage) = report.context_coverage {
        println!("Context:        {:.1}% permitted", coverage * 100.0);
    }
    println!("Trades:         {}", report.summary.trade_count);
    println!();
    println!("--- Performance ---");
    println!("Final Equity:   {:.4}", report.summary.final_equity);
    println!(
        "Max Drawdown:   {:.2}%",
        report.summary.max_drawdown * 100.0
    );
    println!("Win Rate:       {:.1}%", report.summary.win_rate * 100.0);
    println!("Profit Factor:  {:.2}", report.summary.profit_factor);
    if let Some(risk) = &report.risk {
        println!();
        println!("--- Risk Limits ---");
        println!(
            "Trades:         {} ({})",
            risk.trades,
            ok_label(risk.max_trades_ok)
        );
        println!(
            "Drawdown:       {:.2}% ({})",
            risk.drawdown * 100.0,
            ok_label(risk.max_drawdown_ok)
        );
        println!(
            "Verdict:        {}",
            if risk.passed { "PASSED" } else { "FAILED" }
        );
    }
    println!();
}

fn ok_label(ok: bool) -> &'static str {
    if ok {
        "within limit"
    } else {
        "limit exceeded"
    }
}
