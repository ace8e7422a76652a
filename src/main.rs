mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;

use cli::Cli;
use trackscan::config::{self, Config};
use trackscan::{AnalysisReport, Analyzer, AudioSource};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut config = match discover_config(cli.config.clone()) {
        Some(path) => {
            let cfg = config::load_config(&path)?;
            log::info!("Loaded config from {}", path.display());
            cfg
        }
        None => Config::default(),
    };
    if let Some(secs) = cli.timeout {
        config.fetch.timeout_secs = secs;
    }

    if let Some(jobs) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .context("Failed to configure worker pool")?;
    }

    let analyzer = Analyzer::new(config).context("Invalid configuration")?;
    log::info!(
        "Analyzing {} source(s) at {}Hz (n_fft={}, hop={})",
        cli.sources.len(),
        analyzer.config().analysis.sample_rate,
        analyzer.config().analysis.n_fft,
        analyzer.config().analysis.hop_length
    );
    let reports = analyze_all(&analyzer, &cli.sources);

    let json = if reports.len() == 1 {
        to_json(&reports[0], cli.pretty)?
    } else {
        to_json(&reports, cli.pretty)?
    };

    match cli.output {
        Some(ref path) => {
            std::fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    if failed > 0 {
        log::warn!("{} of {} analyses failed", failed, reports.len());
        std::process::exit(1);
    }
    Ok(())
}

/// Explicit `--config` path, or auto-detect trackscan.toml / global config.
fn discover_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| {
        let local = PathBuf::from("trackscan.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("trackscan").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("trackscan").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    })
}

/// Reports come back in input order regardless of completion order.
fn analyze_all(analyzer: &Analyzer, sources: &[String]) -> Vec<AnalysisReport> {
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} sources ({eta} remaining)")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let reports = sources
        .par_iter()
        .map(|raw| {
            let report = match raw.parse::<AudioSource>() {
                Ok(source) => analyzer.analyze(&source),
                Err(err) => {
                    log::error!("{}", err);
                    AnalysisReport::Failure {
                        error: err.to_string(),
                    }
                }
            };
            pb.inc(1);
            report
        })
        .collect();

    pb.finish_with_message("Analysis complete");
    reports
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
