use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_FONT: &str = "Arial";
pub const DEFAULT_HEADING_COLOR: &str = "#FFFFFF";
pub const DEFAULT_OUTLINE_COLOR: &str = "#000000";
pub const DEFAULT_WAVE_COLOR: &str = "#FF0000";
pub const DEFAULT_OUTPUT: &str = "output.mp4";

/// Omitted required values are collected through interactive prompts
/// before the run starts.
#[derive(Parser, Debug)]
#[command(
    name = "halovid",
    about = "Generate a video with audio visualization and text overlay"
)]
pub struct Cli {
    /// Path to the audio file
    #[arg(long = "audio_path")]
    pub audio_path: Option<PathBuf>,

    /// Path to the background image
    #[arg(long = "image_path")]
    pub image_path: Option<PathBuf>,

    /// Text to display as heading
    #[arg(long = "heading_text")]
    pub heading_text: Option<String>,

    /// Font for the heading text
    #[arg(long, default_value = DEFAULT_FONT)]
    pub font: String,

    /// Color of the heading text
    #[arg(long = "heading_color", default_value = DEFAULT_HEADING_COLOR)]
    pub heading_color: String,

    /// Color of the heading text outline
    #[arg(long = "outline_color", default_value = DEFAULT_OUTLINE_COLOR)]
    pub outline_color: String,

    /// Color of the audio wave
    #[arg(long = "wave_color", default_value = DEFAULT_WAVE_COLOR)]
    pub wave_color: String,

    /// Output video file path
    #[arg(long = "output_path", default_value = DEFAULT_OUTPUT)]
    pub output_path: PathBuf,

    /// Config file (default: auto-detect halovid.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
