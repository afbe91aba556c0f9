use anyhow::{Context, bail};
use clap::Parser;
use log::{error, info};
use shotsync::{S3Config, ScreenshotSync, SyncOptions, TransferReport, cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = cli::Cli::parse();

    // Missing connection settings stop the process before anything else runs.
    let config = S3Config::from_env().context("Invalid storage configuration")?;
    let options = SyncOptions::default()
        .with_concurrency(args.concurrency)
        .with_extensions(&args.extensions);
    let sync = ScreenshotSync::connect(&config, options)?;

    let report = match args.command {
        cli::Commands::Check => {
            sync.check_access().await?;
            println!("✅ Bucket {} is accessible", config.bucket_name);
            return Ok(());
        }
        cli::Commands::Upload { remote_dir, folder } => {
            sync.upload_new_screenshots(&remote_dir, &folder).await?
        }
        cli::Commands::Download { remote_dir, output } => {
            sync.download_screenshots(&remote_dir, &output).await
        }
    };

    print_report(&report, args.json)?;

    if !report.is_success() {
        bail!(
            "{} of {} transfer(s) failed",
            report.failed().count(),
            report.outcomes.len()
        );
    }
    Ok(())
}

fn print_report(report: &TransferReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(reason) = &report.aborted {
        error!("Nothing transferred: {}", reason);
    }
    for outcome in report.failed() {
        error!("❌ {}", outcome.item.key);
    }
    info!(
        "{} file(s), {} bytes transferred for {}",
        report.succeeded().count(),
        report.total_bytes(),
        report.remote_dir
    );
    Ok(())
}
