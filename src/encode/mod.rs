pub mod ffmpeg;

pub use ffmpeg::FfmpegEncoder;

/// Encoder parameters. Fixed defaults; a config file may override them.
#[derive(Clone, Debug)]
pub struct EncodeSettings {
    pub fps: u32,
    pub bitrate: String,
    pub preset: String,
    pub crf: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            fps: 24,
            bitrate: "5000k".into(),
            preset: "faster".into(),
            crf: 23,
        }
    }
}

/// Worker threads for the encode stage: all available cores except one.
pub fn encoder_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(1)
        .max(1)
}
