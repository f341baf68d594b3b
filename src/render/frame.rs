use std::collections::{HashMap, VecDeque};
use std::f32::consts::TAU;
use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::audio::SpectralField;
use crate::error::{VidError, VidResult};

/// Side length of the square visualization canvas, in pixels.
pub const FRAME_SIZE: u32 = 1000;
/// Most-recently-rendered frames kept alive; frames are pure functions of
/// their timestamp, so evicted entries are simply re-derived.
pub const CACHE_CAPACITY: usize = 100;

/// dB values are shifted up by this much before drawing so the interesting
/// range lands above zero.
const DISPLAY_OFFSET: f32 = 40.0;
/// A bar at this value reaches the full circle radius.
const DISPLAY_CEILING: f32 = 80.0;
/// Bars are drawn at 0.8 opacity.
const BAR_ALPHA: u8 = 204;

/// Lazy, time-indexed source of circular bar-chart frames.
///
/// `frame_at` maps the timestamp to the nearest spectral column and draws
/// one bar per band at equally spaced angles around the circle. Results are
/// cached by centisecond so the ~fps-spaced queries of the encode loop reuse
/// one rendered image.
pub struct FrameRenderer {
    field: SpectralField,
    wave_color: [u8; 3],
    cache: HashMap<u64, Arc<RgbaImage>>,
    lru: VecDeque<u64>,
}

impl FrameRenderer {
    pub fn new(field: SpectralField, wave_color: [u8; 3]) -> VidResult<Self> {
        if field.is_empty() {
            return Err(VidError::render("spectral field has no frames"));
        }
        Ok(Self {
            field,
            wave_color,
            cache: HashMap::new(),
            lru: VecDeque::new(),
        })
    }

    /// RGBA frame for a playback timestamp. Always [`FRAME_SIZE`] square.
    pub fn frame_at(&mut self, t: f32) -> VidResult<Arc<RgbaImage>> {
        let key = cache_key(t);
        if let Some(img) = self.cache.get(&key).cloned() {
            self.touch(key);
            return Ok(img);
        }
        let img = Arc::new(self.rasterize(key as f32 / 100.0)?);
        self.insert(key, img.clone());
        Ok(img)
    }

    /// Pure rasterization: (field, timestamp, color) fully determine the
    /// output, which makes caching and re-derivation safe.
    fn rasterize(&self, t: f32) -> VidResult<RgbaImage> {
        let column = self.field.column(self.field.column_index(t));
        let values: Vec<f32> = column
            .iter()
            .map(|&db| (db + DISPLAY_OFFSET).clamp(0.0, DISPLAY_CEILING))
            .collect();

        let n = values.len();
        let step = TAU / n as f32;
        let center = FRAME_SIZE as f32 / 2.0;
        let radius = center;

        let mut img = RgbaImage::new(FRAME_SIZE, FRAME_SIZE);
        for y in 0..FRAME_SIZE {
            for x in 0..FRAME_SIZE {
                let dx = x as f32 + 0.5 - center;
                let dy = center - (y as f32 + 0.5);
                let r = (dx * dx + dy * dy).sqrt();
                if r > radius {
                    continue;
                }

                // Bar k is centered at angle k*step, spanning step/2 to
                // either side, so the nearest center picks the band.
                let mut theta = dy.atan2(dx);
                if theta < 0.0 {
                    theta += TAU;
                }
                let band = ((theta / step).round() as usize) % n;

                let bar_len = values[band] / DISPLAY_CEILING * radius;
                if r <= bar_len {
                    img.put_pixel(
                        x,
                        y,
                        Rgba([
                            self.wave_color[0],
                            self.wave_color[1],
                            self.wave_color[2],
                            BAR_ALPHA,
                        ]),
                    );
                }
            }
        }
        Ok(img)
    }

    fn insert(&mut self, key: u64, img: Arc<RgbaImage>) {
        self.cache.insert(key, img);
        self.touch(key);
        while self.lru.len() > CACHE_CAPACITY {
            if let Some(old) = self.lru.pop_front() {
                self.cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

/// Timestamps are rounded to two decimal places of a second for caching.
fn cache_key(t: f32) -> u64 {
    (t.max(0.0) * 100.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::analysis::{HOP_LENGTH, N_BANDS};

    /// Field where every band sits at the clip maximum (0 dB), 100 frames.
    fn flat_field() -> SpectralField {
        SpectralField::new(vec![0.0; N_BANDS * 100], N_BANDS, HOP_LENGTH, 22_050)
    }

    fn renderer(color: [u8; 3]) -> FrameRenderer {
        FrameRenderer::new(flat_field(), color).unwrap()
    }

    #[test]
    fn frames_have_fixed_dimensions() {
        let mut r = renderer([255, 0, 0]);
        for t in [0.0, 0.5, 1.0, 2.0] {
            let frame = r.frame_at(t).unwrap();
            assert_eq!(frame.dimensions(), (FRAME_SIZE, FRAME_SIZE));
        }
    }

    #[test]
    fn timestamps_rounding_to_same_centisecond_share_a_frame() {
        let mut r = renderer([255, 0, 0]);
        let a = r.frame_at(0.501).unwrap();
        let b = r.frame_at(0.499).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut r1 = renderer([0, 128, 255]);
        let mut r2 = renderer([0, 128, 255]);
        let a = r1.frame_at(1.23).unwrap();
        let b = r2.frame_at(1.23).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn bars_carry_the_exact_wave_color() {
        let mut r = renderer([18, 200, 77]);
        let frame = r.frame_at(0.0).unwrap();
        // All bands at 0 dB -> bar length (0+40)/80 of the radius, so the
        // center of the canvas is inside every bar.
        let px = frame.get_pixel(FRAME_SIZE / 2, FRAME_SIZE / 2);
        assert_eq!(*px, Rgba([18, 200, 77, BAR_ALPHA]));
    }

    #[test]
    fn background_stays_transparent() {
        let mut r = renderer([255, 0, 0]);
        let frame = r.frame_at(0.0).unwrap();
        assert_eq!(frame.get_pixel(0, 0)[3], 0);
        assert_eq!(frame.get_pixel(FRAME_SIZE - 1, FRAME_SIZE - 1)[3], 0);
    }

    #[test]
    fn cache_stays_bounded_and_keeps_recent_keys() {
        let mut r = renderer([255, 0, 0]);
        for i in 0..150 {
            r.frame_at(i as f32 / 100.0).unwrap();
        }
        assert!(r.cache.len() <= CACHE_CAPACITY);
        assert!(r.lru.len() <= CACHE_CAPACITY);
        assert!(r.cache.contains_key(&149));
        assert!(!r.cache.contains_key(&0));
    }

    #[test]
    fn empty_field_is_rejected() {
        let field = SpectralField::new(Vec::new(), N_BANDS, HOP_LENGTH, 22_050);
        assert!(FrameRenderer::new(field, [255, 0, 0]).is_err());
    }
}
