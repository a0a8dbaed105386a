use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use visual_diff::core_modules::utils::image_helper::image_helper;
use visual_diff::{CompareConfig, ComparisonReport, PollPolicy, compare_images};

/// visual_diff_cli: compare a base image against a current capture
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Base (reference) image: a file path or a data URL
    #[clap(short, long)]
    base: String,

    /// Current image to check against the base: a file path or a data URL
    #[clap(short, long)]
    current: String,

    /// Where to write the highlighted diff as PNG
    #[clap(short, long)]
    diff_output: Option<PathBuf>,

    /// Fraction of pixels allowed to differ, strictly between 0 and 1
    #[clap(long, default_value_t = 0.05)]
    amount_threshold: f64,

    /// Per-channel HSL tolerance for two pixels to match, strictly between 0 and 1
    #[clap(long, default_value_t = 0.1)]
    pixel_threshold: f64,

    /// How many times to check whether both images have loaded
    #[clap(long, default_value_t = 30)]
    max_attempts: u32,

    /// Milliseconds between load checks
    #[clap(long, default_value_t = 100)]
    poll_interval_ms: u64,
}

impl Args {
    fn compare_config(&self) -> Result<CompareConfig> {
        let config = CompareConfig {
            amount_diff_threshold: self.amount_threshold,
            pixel_dist_threshold: self.pixel_threshold,
            poll_policy: PollPolicy::from_millis(self.poll_interval_ms, self.max_attempts)?,
        };
        config.validate()?;
        Ok(config)
    }
}

async fn run(args: &Args) -> Result<ComparisonReport> {
    let config = args.compare_config().context("Invalid comparison options")?;
    let report = compare_images(&args.base, &args.current, config)
        .await
        .context("Image comparison failed")?;

    if let Some(path) = &args.diff_output {
        image_helper::save(path, &report.result.diff_buffer)
            .with_context(|| format!("Failed to write diff image to {}", path.display()))?;
        info!("diff image written to {}", path.display());
    }

    Ok(report)
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args).await {
        Ok(report) if report.passed() => {
            println!("{}", report.message);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            println!(
                "The current image was evaluated as different from the base image.\n\n{}",
                report.message
            );
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_library_config() {
        let args = Args::parse_from(["visual_diff_cli", "--base", "a.png", "--current", "b.png"]);
        assert_eq!(args.compare_config().unwrap(), CompareConfig::default());
        assert!(args.diff_output.is_none());
    }

    #[test]
    fn rejects_out_of_range_thresholds() {
        let args = Args::parse_from([
            "visual_diff_cli",
            "-b",
            "a.png",
            "-c",
            "b.png",
            "--pixel-threshold",
            "1.5",
        ]);
        assert!(args.compare_config().is_err());
    }

    #[test]
    fn rejects_a_zero_attempt_budget() {
        let args = Args::parse_from([
            "visual_diff_cli",
            "-b",
            "a.png",
            "-c",
            "b.png",
            "--max-attempts",
            "0",
        ]);
        assert!(args.compare_config().is_err());
    }
}
