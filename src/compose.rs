use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::audio::{analysis, decode};
use crate::encode::{encoder_threads, FfmpegEncoder};
use crate::error::{VidError, VidResult};
use crate::render::frame::FrameRenderer;
use crate::render::text::{
    self, HeadingStyle, FALLBACK_FONT_PATH, HEADING_FONT_SIZE, HEADING_STROKE_WIDTH,
};
use crate::render::{color, overlay};
use crate::report::{milestone, Reporter};

pub use crate::encode::EncodeSettings;

/// Vertical offset of the heading overlay from the top edge, in pixels.
const HEADING_TOP_OFFSET: i64 = 50;

/// Full parameter set for one end-to-end run. Created once per invocation,
/// from either the form or the command line; never mutated after dispatch.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub audio_path: PathBuf,
    pub image_path: PathBuf,
    pub heading_text: String,
    pub font: String,
    pub heading_color: String,
    pub outline_color: String,
    pub wave_color: String,
    pub output_path: PathBuf,
}

/// Run the whole pipeline: decode + analyze audio, load the background,
/// build the visualization and heading layers, composite, and encode.
///
/// Progress milestones and status lines go to the reporter; errors are also
/// formatted to a single `"Error: ..."` line there before propagating, so
/// shells can mirror the log stream while programmatic callers still see
/// the typed failure.
pub fn generate_video(
    job: &RenderJob,
    settings: &EncodeSettings,
    reporter: &mut Reporter,
) -> VidResult<PathBuf> {
    match run_pipeline(job, settings, reporter) {
        Ok(path) => {
            reporter.log(&format!("Video generated successfully: {}", path.display()));
            Ok(path)
        }
        Err(err) => {
            reporter.log(&format!("Error: {}", err));
            Err(err)
        }
    }
}

fn run_pipeline(
    job: &RenderJob,
    settings: &EncodeSettings,
    reporter: &mut Reporter,
) -> VidResult<PathBuf> {
    let audio_path = expand_tilde(&job.audio_path);
    let image_path = expand_tilde(&job.image_path);
    let output_path = expand_tilde(&job.output_path);

    reporter.log(&format!("Audio path: {}", audio_path.display()));
    reporter.log(&format!("Image path: {}", image_path.display()));

    // Validate everything cheap before any expensive work begins.
    if !audio_path.exists() {
        return Err(VidError::validation(format!(
            "audio file not found: {}",
            audio_path.display()
        )));
    }
    if !image_path.exists() {
        return Err(VidError::validation(format!(
            "background image not found: {}",
            image_path.display()
        )));
    }
    if job.heading_text.is_empty() {
        return Err(VidError::validation("heading text is required"));
    }
    let heading_rgb = color::parse_hex(&job.heading_color)?;
    let outline_rgb = color::parse_hex(&job.outline_color)?;
    let wave_rgb = color::parse_hex(&job.wave_color)?;
    reporter.progress(milestone::START);

    reporter.log("Loading audio file...");
    let track = decode::decode_audio(&audio_path)?;
    let duration = track.duration();
    reporter.progress(milestone::AUDIO_DECODED);
    reporter.log(&format!("Audio duration: {:.2}s", duration));

    let field = analysis::analyze(&track)?;
    reporter.progress(milestone::AUDIO_ANALYZED);

    reporter.log("Creating background...");
    let background = image::open(&image_path)
        .map_err(|e| {
            VidError::composition(format!(
                "failed to load background image {}: {}",
                image_path.display(),
                e
            ))
        })?
        .to_rgba8();
    reporter.progress(milestone::BACKGROUND);

    reporter.log("Creating audio visualization...");
    let renderer = FrameRenderer::new(field, wave_rgb)?;
    reporter.progress(milestone::VISUALIZATION);

    reporter.log("Creating heading text...");
    let font_path = text::resolve_font_path(&job.font, Path::new(FALLBACK_FONT_PATH));
    if font_path != Path::new(job.font.as_str()) {
        reporter.log(&format!(
            "Font {:?} is not a font file, using {}",
            job.font,
            font_path.display()
        ));
    }
    let font = text::load_font(&font_path)?;
    let style = HeadingStyle {
        font_size: HEADING_FONT_SIZE,
        fill: heading_rgb,
        stroke: outline_rgb,
        stroke_width: HEADING_STROKE_WIDTH,
    };
    let heading = text::render_heading(
        &job.heading_text,
        &font,
        &style,
        background.width(),
        background.height(),
    )?;
    reporter.progress(milestone::HEADING);

    reporter.log("Composing video...");
    let mut compositor = Compositor {
        background,
        heading,
        renderer,
    };
    reporter.progress(milestone::COMPOSED);

    reporter.log(&format!(
        "Writing video file to {}...",
        output_path.display()
    ));
    let total_frames = frame_count(duration, settings.fps);
    let mut encoder = FfmpegEncoder::new(
        &output_path,
        &audio_path,
        compositor.width(),
        compositor.height(),
        settings,
        encoder_threads(),
    )?;

    let streamed: VidResult<()> = (|| {
        for idx in 0..total_frames {
            let t = idx as f32 / settings.fps as f32;
            let canvas = compositor.frame_at(t)?;
            encoder.write_frame(canvas.as_raw())?;
        }
        Ok(())
    })();

    let written = match streamed {
        Ok(()) => encoder.finish()?,
        Err(err) => {
            encoder.abort();
            return Err(err);
        }
    };
    reporter.progress(milestone::DONE);

    Ok(written)
}

/// One output frame per timestamp: background, visualization at the
/// top-left, heading horizontally centered at the fixed top offset.
struct Compositor {
    background: RgbaImage,
    heading: RgbaImage,
    renderer: FrameRenderer,
}

impl Compositor {
    fn width(&self) -> u32 {
        self.background.width()
    }

    fn height(&self) -> u32 {
        self.background.height()
    }

    fn frame_at(&mut self, t: f32) -> VidResult<RgbaImage> {
        let mut canvas = self.background.clone();
        let vis = self.renderer.frame_at(t)?;
        overlay(&mut canvas, &vis, 0, 0);
        let hx = (canvas.width() as i64 - self.heading.width() as i64) / 2;
        overlay(&mut canvas, &self.heading, hx, HEADING_TOP_OFFSET);
        Ok(canvas)
    }
}

/// Number of output frames the encoder receives for a clip.
fn frame_count(duration: f32, fps: u32) -> usize {
    (duration * fps as f32).ceil() as usize
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::analysis::{HOP_LENGTH, N_BANDS};
    use crate::audio::SpectralField;
    use image::Rgba;
    use std::sync::{Arc, Mutex};

    fn job(audio: &str, image: &str, heading: &str) -> RenderJob {
        RenderJob {
            audio_path: PathBuf::from(audio),
            image_path: PathBuf::from(image),
            heading_text: heading.to_string(),
            font: "Arial".into(),
            heading_color: "#FFFFFF".into(),
            outline_color: "#000000".into(),
            wave_color: "#FF0000".into(),
            output_path: PathBuf::from("out.mp4"),
        }
    }

    fn recording_reporter() -> (Reporter, Arc<Mutex<Vec<u32>>>, Arc<Mutex<Vec<String>>>) {
        let milestones = Arc::new(Mutex::new(Vec::new()));
        let lines = Arc::new(Mutex::new(Vec::new()));
        let m = milestones.clone();
        let l = lines.clone();
        let reporter = Reporter::new(
            Some(Box::new(move |pct| m.lock().unwrap().push(pct))),
            Some(Box::new(move |line: &str| {
                l.lock().unwrap().push(line.to_string())
            })),
        );
        (reporter, milestones, lines)
    }

    fn touch(path: &Path) {
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn missing_audio_aborts_before_any_milestone() {
        let (mut reporter, milestones, lines) = recording_reporter();
        let job = job("/nonexistent/track.mp3", "/nonexistent/bg.png", "Hi");
        let err = generate_video(&job, &EncodeSettings::default(), &mut reporter).unwrap_err();
        assert!(matches!(err, VidError::Validation(_)));
        assert!(err.to_string().contains("not found"));
        assert!(milestones.lock().unwrap().is_empty());
        assert!(lines
            .lock()
            .unwrap()
            .iter()
            .any(|l| l.starts_with("Error: ") && l.contains("not found")));
    }

    #[test]
    fn empty_heading_aborts_with_no_milestones() {
        let dir = std::env::temp_dir().join("halovid-test-empty-heading");
        std::fs::create_dir_all(&dir).unwrap();
        let audio = dir.join("a.wav");
        let image = dir.join("b.png");
        touch(&audio);
        touch(&image);

        let (mut reporter, milestones, _) = recording_reporter();
        let job = job(audio.to_str().unwrap(), image.to_str().unwrap(), "");
        let err = generate_video(&job, &EncodeSettings::default(), &mut reporter).unwrap_err();
        assert!(matches!(err, VidError::Validation(_)));
        assert!(milestones.lock().unwrap().is_empty());
    }

    #[test]
    fn bad_color_is_rejected_during_validation() {
        let dir = std::env::temp_dir().join("halovid-test-bad-color");
        std::fs::create_dir_all(&dir).unwrap();
        let audio = dir.join("a.wav");
        let image = dir.join("b.png");
        touch(&audio);
        touch(&image);

        let (mut reporter, milestones, _) = recording_reporter();
        let mut job = job(audio.to_str().unwrap(), image.to_str().unwrap(), "Hi");
        job.wave_color = "red".into();
        let err = generate_video(&job, &EncodeSettings::default(), &mut reporter).unwrap_err();
        assert!(matches!(err, VidError::Validation(_)));
        assert!(milestones.lock().unwrap().is_empty());
    }

    #[test]
    fn frame_count_matches_duration_times_fps() {
        assert_eq!(frame_count(5.0, 24), 120);
        assert_eq!(frame_count(5.04, 24), 121);
        assert_eq!(frame_count(0.0, 24), 0);
    }

    #[test]
    fn expand_tilde_leaves_plain_paths_alone() {
        assert_eq!(
            expand_tilde(Path::new("/tmp/x.mp3")),
            PathBuf::from("/tmp/x.mp3")
        );
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/x.mp3")), home.join("x.mp3"));
        }
    }

    #[test]
    fn compositor_keeps_background_dimensions_and_pixels() {
        let mut background = RgbaImage::new(120, 90);
        for px in background.pixels_mut() {
            *px = Rgba([10, 20, 30, 255]);
        }
        let heading = RgbaImage::new(120, 90);
        let field = SpectralField::new(vec![0.0; N_BANDS * 10], N_BANDS, HOP_LENGTH, 22_050);
        let renderer = FrameRenderer::new(field, [255, 0, 0]).unwrap();

        let mut compositor = Compositor {
            background,
            heading,
            renderer,
        };
        let canvas = compositor.frame_at(0.0).unwrap();
        assert_eq!(canvas.dimensions(), (120, 90));
        // Top-left corner of the visualization circle is transparent, so
        // the background shows through unchanged.
        assert_eq!(*canvas.get_pixel(0, 0), Rgba([10, 20, 30, 255]));
    }
}
