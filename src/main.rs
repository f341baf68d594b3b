use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use halovid::cli::{self, Cli};
use halovid::compose::{generate_video, RenderJob};
use halovid::config;
use halovid::prompt::{self, FsCompleter};
use halovid::report::Reporter;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect halovid.toml /
    // the global config. Config values apply only where the CLI is at its
    // default.
    let config_path = cli.config.clone().or_else(config::discover_config);
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                config::Config::default()
            }
        },
        None => config::Config::default(),
    };

    if cli.font == cli::DEFAULT_FONT {
        if let Some(ref font) = cfg.heading.font {
            cli.font = font.to_string_lossy().into_owned();
        }
    }
    if cli.heading_color == cli::DEFAULT_HEADING_COLOR {
        if let Some(ref c) = cfg.colors.heading {
            cli.heading_color = c.clone();
        }
    }
    if cli.outline_color == cli::DEFAULT_OUTLINE_COLOR {
        if let Some(ref c) = cfg.colors.outline {
            cli.outline_color = c.clone();
        }
    }
    if cli.wave_color == cli::DEFAULT_WAVE_COLOR {
        if let Some(ref c) = cfg.colors.wave {
            cli.wave_color = c.clone();
        }
    }

    prompt::fill_missing(&mut cli, &FsCompleter).context("failed to read input")?;

    let job = RenderJob {
        audio_path: cli.audio_path.expect("prompted"),
        image_path: cli.image_path.expect("prompted"),
        heading_text: cli.heading_text.expect("prompted"),
        font: cli.font,
        heading_color: cli.heading_color,
        outline_color: cli.outline_color,
        wave_color: cli.wave_color,
        output_path: cli.output_path,
    };
    let settings = cfg.encode_settings();

    log::info!("halovid - audio visualizer video generator");
    log::info!("Input: {}", job.audio_path.display());
    log::info!("Output: {}", job.output_path.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let progress_pb = pb.clone();
    let log_pb = pb.clone();
    let mut reporter = Reporter::new(
        Some(Box::new(move |pct| progress_pb.set_position(pct as u64))),
        Some(Box::new(move |line: &str| log_pb.println(line))),
    );

    // The pipeline blocks its thread for the whole run; keep it off the
    // presentation thread so the progress bar stays live.
    let worker = std::thread::spawn(move || generate_video(&job, &settings, &mut reporter));
    let result = worker
        .join()
        .map_err(|_| anyhow::anyhow!("render thread panicked"))?;

    match result {
        Ok(path) => {
            pb.finish_with_message(format!("done: {}", path.display()));
            Ok(())
        }
        Err(err) => {
            pb.abandon();
            Err(err).context("video generation failed")
        }
    }
}
