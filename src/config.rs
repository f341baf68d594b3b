use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::encode::EncodeSettings;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub heading: HeadingConfig,
    #[serde(default)]
    pub colors: ColorConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
    #[serde(default = "default_preset")]
    pub preset: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct HeadingConfig {
    /// Font file used when the CLI font field does not name one.
    pub font: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ColorConfig {
    pub heading: Option<String>,
    pub outline: Option<String>,
    pub wave: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            bitrate: default_bitrate(),
            preset: default_preset(),
            crf: default_crf(),
        }
    }
}

fn default_fps() -> u32 {
    24
}
fn default_bitrate() -> String {
    "5000k".into()
}
fn default_preset() -> String {
    "faster".into()
}
fn default_crf() -> u32 {
    23
}

impl Config {
    pub fn encode_settings(&self) -> EncodeSettings {
        EncodeSettings {
            fps: self.output.fps,
            bitrate: self.output.bitrate.clone(),
            preset: self.output.preset.clone(),
            crf: self.output.crf,
        }
    }
}

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    toml::from_str(&content).ok()
}

/// Auto-detect a config file: local `halovid.toml`, then the XDG location,
/// then the platform config dir.
pub fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("halovid.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("halovid").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("halovid").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_fixed_defaults() {
        let cfg: Config = toml::from_str("").unwrap();
        let settings = cfg.encode_settings();
        assert_eq!(settings.fps, 24);
        assert_eq!(settings.bitrate, "5000k");
        assert_eq!(settings.preset, "faster");
        assert_eq!(settings.crf, 23);
        assert!(cfg.heading.font.is_none());
        assert!(cfg.colors.wave.is_none());
    }

    #[test]
    fn output_section_overrides_encode_settings() {
        let cfg: Config = toml::from_str(
            r##"
            [output]
            fps = 30
            bitrate = "8000k"

            [colors]
            wave = "#00FF00"
            "##,
        )
        .unwrap();
        let settings = cfg.encode_settings();
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.bitrate, "8000k");
        assert_eq!(settings.preset, "faster");
        assert_eq!(cfg.colors.wave.as_deref(), Some("#00FF00"));
    }
}
