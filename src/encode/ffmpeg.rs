use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use super::EncodeSettings;
use crate::error::{VidError, VidResult};

/// Child-process ffmpeg encoder: raw RGBA frames go in over stdin, the
/// original audio file is muxed in as the audio track, and the container is
/// chosen from the output path's extension.
///
/// Frames are written to a staging path next to the output and renamed onto
/// it only after ffmpeg exits cleanly, so a failed run never leaves a
/// truncated file at the requested path.
pub struct FfmpegEncoder {
    child: Child,
    staging: PathBuf,
    output: PathBuf,
}

impl FfmpegEncoder {
    pub fn new(
        output_path: &Path,
        input_audio: &Path,
        width: u32,
        height: u32,
        settings: &EncodeSettings,
        threads: usize,
    ) -> VidResult<Self> {
        let staging = staging_path(output_path);
        let args = build_args(&staging, input_audio, width, height, settings, threads);

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                VidError::composition(format!(
                    "failed to spawn ffmpeg (is ffmpeg installed?): {}",
                    e
                ))
            })?;

        log::info!(
            "FFmpeg encoder started: {}x{} @ {}fps, bitrate {}, preset {}, {} threads",
            width,
            height,
            settings.fps,
            settings.bitrate,
            settings.preset,
            threads
        );

        Ok(Self {
            child,
            staging,
            output: output_path.to_path_buf(),
        })
    }

    pub fn write_frame(&mut self, rgba_pixels: &[u8]) -> VidResult<()> {
        let stdin = self
            .child
            .stdin
            .as_mut()
            .ok_or_else(|| VidError::composition("ffmpeg stdin not available"))?;
        stdin
            .write_all(rgba_pixels)
            .map_err(|e| VidError::composition(format!("failed to write frame to ffmpeg: {}", e)))
    }

    /// Close the frame stream, wait for ffmpeg, and move the finished file
    /// onto the output path.
    pub fn finish(mut self) -> VidResult<PathBuf> {
        drop(self.child.stdin.take());

        let output = self
            .child
            .wait_with_output()
            .map_err(|e| VidError::composition(format!("failed to wait for ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let _ = std::fs::remove_file(&self.staging);
            return Err(VidError::composition(format!(
                "ffmpeg exited with error:\n{}",
                stderr.trim_end()
            )));
        }

        std::fs::rename(&self.staging, &self.output).map_err(|e| {
            VidError::composition(format!(
                "failed to move {} to {}: {}",
                self.staging.display(),
                self.output.display(),
                e
            ))
        })?;

        log::info!("FFmpeg encoding complete");
        Ok(self.output)
    }

    /// Kill the encoder and drop the staging file. Used when an earlier
    /// stage fails mid-stream.
    pub fn abort(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_file(&self.staging);
    }
}

/// `dir/name.ext` -> `dir/name.part.ext`, keeping the container extension
/// last so ffmpeg still infers the right muxer.
pub fn staging_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let name = match output.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.part.{}", stem, ext),
        None => format!("{}.part", stem),
    };
    output.with_file_name(name)
}

fn build_args(
    staging: &Path,
    input_audio: &Path,
    width: u32,
    height: u32,
    settings: &EncodeSettings,
    threads: usize,
) -> Vec<String> {
    vec![
        "-y".to_string(),
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "rgba".into(),
        "-video_size".into(),
        format!("{}x{}", width, height),
        "-framerate".into(),
        settings.fps.to_string(),
        "-i".into(),
        "pipe:0".into(),
        "-i".into(),
        input_audio.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-b:v".into(),
        settings.bitrate.clone(),
        "-preset".into(),
        settings.preset.clone(),
        "-crf".into(),
        settings.crf.to_string(),
        "-threads".into(),
        threads.to_string(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        "-shortest".into(),
        staging.to_string_lossy().into_owned(),
    ]
}
