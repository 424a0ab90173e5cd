use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::debug;

use super::truncate;
use crate::args::ConvertOptions;
use spotaudio_core::{
    config::Config,
    pipeline::{validate_request, ConversionEvent, ConversionReport, ConversionRequest, Converter},
};

pub async fn run(url: &str, options: &ConvertOptions, config: Config) -> Result<()> {
    let request = ConversionRequest {
        playlist_url: url.to_string(),
        output_dir: config.output.directory.clone(),
        dry_run: options.dry_run,
    };

    debug!(
        "Output: {} ({})",
        request.output_dir.display(),
        config.output.format
    );

    // Bad input is reported before credentials or tools are looked at
    if let Err((_, status)) = validate_request(&request) {
        anyhow::bail!("{}", status);
    }

    // Create progress channel
    let (tx, mut rx) = mpsc::channel(32);
    let converter = Converter::from_config(&config, request.dry_run, tx)?;

    // The conversion runs on its own task; this one only renders progress
    let conversion = tokio::spawn(async move { converter.run(&request).await });

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?
        .progress_chars("=>-"),
    );

    while let Some(event) = rx.recv().await {
        match event {
            ConversionEvent::Status(line) => pb.println(line),
            ConversionEvent::PlaylistLoaded { total } => {
                pb.set_length(total as u64);
                pb.set_position(0);
                pb.enable_steady_tick(std::time::Duration::from_millis(100));
            }
            ConversionEvent::Searching { index, track, .. } => {
                pb.set_position((index - 1) as u64);
                pb.set_message(format!("Searching: {}", truncate(&track.to_string(), 40)));
            }
            ConversionEvent::Matched { index, .. } => pb.set_position(index as u64),
            ConversionEvent::Downloading { index, total, title } => {
                pb.set_length(total as u64);
                pb.set_position((index - 1) as u64);
                pb.set_message(format!("Downloading: {}", truncate(&title, 40)));
            }
            ConversionEvent::Saved { index, .. } => pb.set_position(index as u64),
            ConversionEvent::Skipped(skipped) => {
                pb.println(format!("  skipped {}: {}", skipped.title, skipped.reason));
            }
            ConversionEvent::Finished(_) => pb.finish_and_clear(),
        }
    }

    let report = conversion.await?;
    print_summary(&report, options.dry_run);

    if report.outcome.is_success() {
        Ok(())
    } else {
        anyhow::bail!("{}", report.status)
    }
}

fn print_summary(report: &ConversionReport, dry_run: bool) {
    if dry_run {
        println!();
        for video in &report.matches {
            println!("  {}  ->  {}", video.title, video.url);
        }
        return;
    }

    if report.tracks == 0 {
        return;
    }

    println!(
        "\n{} of {} tracks saved ({:.1}s)",
        report.files.len(),
        report.tracks,
        report.duration.as_secs_f32()
    );
    for path in &report.files {
        println!("  {}", path.display());
    }
}
