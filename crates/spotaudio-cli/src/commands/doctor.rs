use anyhow::Result;
use std::path::Path;
use std::process::Command;

use spotaudio_core::config::default_config_path;
use spotaudio_core::Config;

pub async fn run(config: &Config) -> Result<()> {
    println!("spotaudio dependency check\n");

    let mut all_ok = true;

    // Check yt-dlp
    print!("yt-dlp:        ");
    match config.yt_dlp_path() {
        Ok(path) => match tool_version(&path, "--version") {
            Some(v) => println!("OK ({})", v),
            None => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) => {
            println!("NOT FOUND");
            println!("               Install with: pip install yt-dlp");
            all_ok = false;
        }
    }

    // Check FFmpeg
    print!("ffmpeg:        ");
    match config.ffmpeg_path() {
        Ok(path) => match tool_version(&path, "-version") {
            Some(first_line) => {
                // Extract just version number
                let version_part = first_line.split_whitespace().nth(2).unwrap_or("unknown");
                println!("OK ({})", version_part);
            }
            None => {
                println!("FOUND but failed to get version");
                all_ok = false;
            }
        },
        Err(_) if config.output.format.needs_ffmpeg() => {
            println!("NOT FOUND");
            println!(
                "               Required for {} output. Install ffmpeg or use --format best",
                config.output.format
            );
            all_ok = false;
        }
        Err(_) => println!("not found (not needed for --format best)"),
    }

    // Check credentials
    print!("credentials:   ");
    match config.credentials() {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("MISSING");
            println!("               {}", e);
            if let Some(path) = default_config_path() {
                println!("               or add them to {}", path.display());
            }
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All dependencies OK!");
    } else {
        println!("Some dependencies are missing. See above for instructions.");
    }

    Ok(())
}

/// First line of `<tool> <flag>` output
fn tool_version(path: &Path, flag: &str) -> Option<String> {
    let out = Command::new(path).arg(flag).output().ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .next()
        .map(|l| l.trim().to_string())
}
