use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::decode::AudioTrack;
use super::spectrum::SpectralField;
use crate::error::{VidError, VidResult};

pub const FFT_SIZE: usize = 1024;
pub const HOP_LENGTH: usize = 512;
/// Number of perceptual frequency bands the spectrum is collapsed to; also
/// the number of bars drawn around the visualization circle.
pub const N_BANDS: usize = 64;

/// Band values below `max - DB_RANGE` are clamped to the floor.
const DB_RANGE: f32 = 80.0;
const AMIN: f32 = 1e-10;

/// Compute the short-time mel-band dB representation of a decoded track.
///
/// Windowed magnitude FFT per hop, collapsed through a triangular mel
/// filterbank, converted to dB relative to the loudest band in the clip.
pub fn analyze(track: &AudioTrack) -> VidResult<SpectralField> {
    let samples = &track.samples;
    let sr = track.sample_rate;

    if samples.is_empty() {
        return Err(VidError::audio_decode("audio track has no samples"));
    }

    let n_frames = samples.len() / HOP_LENGTH + 1;
    let n_bins = FFT_SIZE / 2 + 1;
    let hann = hann_window(FFT_SIZE);
    let filterbank = mel_filterbank(N_BANDS, n_bins, sr as f32);

    log::info!(
        "Analyzing audio: {} frames, {} bands, hop {}",
        n_frames,
        N_BANDS,
        HOP_LENGTH
    );

    let columns: Vec<Vec<f32>> = (0..n_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let start = frame_idx * HOP_LENGTH;
            let avail = samples.len().saturating_sub(start).min(FFT_SIZE);

            let mut buffer: Vec<Complex<f32>> = vec![Complex::new(0.0, 0.0); FFT_SIZE];
            for i in 0..avail {
                buffer[i] = Complex::new(samples[start + i] * hann[i], 0.0);
            }

            // Per-thread FFT planner (rayon-safe)
            let mut planner = FftPlanner::<f32>::new();
            let fft = planner.plan_fft_forward(FFT_SIZE);
            fft.process(&mut buffer);

            let magnitudes: Vec<f32> = buffer[..n_bins].iter().map(|c| c.norm()).collect();

            filterbank
                .iter()
                .map(|filter| {
                    filter
                        .iter()
                        .zip(magnitudes.iter())
                        .map(|(w, m)| w * m)
                        .sum::<f32>()
                })
                .collect()
        })
        .collect();

    // dB relative to the loudest band anywhere in the clip, floored 80 dB down.
    let peak = columns
        .iter()
        .flat_map(|c| c.iter().copied())
        .fold(0.0f32, f32::max)
        .max(AMIN);
    let ref_db = 10.0 * peak.log10();

    let mut data = Vec::with_capacity(n_frames * N_BANDS);
    for column in &columns {
        for &energy in column {
            let db = 10.0 * energy.max(AMIN).log10() - ref_db;
            data.push(db.max(-DB_RANGE));
        }
    }

    Ok(SpectralField::new(data, N_BANDS, HOP_LENGTH, sr))
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank: `n_bands` filters over `n_bins` linear FFT
/// bins, with band edges equally spaced on the mel scale from 0 Hz to
/// Nyquist.
fn mel_filterbank(n_bands: usize, n_bins: usize, sample_rate: f32) -> Vec<Vec<f32>> {
    let fmax = sample_rate / 2.0;
    let mel_max = hz_to_mel(fmax);
    let edges: Vec<f32> = (0..n_bands + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_bands + 1) as f32))
        .collect();
    let bin_hz = fmax / (n_bins - 1) as f32;

    (0..n_bands)
        .map(|b| {
            let (lower, center, upper) = (edges[b], edges[b + 1], edges[b + 2]);
            (0..n_bins)
                .map(|k| {
                    let f = k as f32 * bin_hz;
                    let rising = (f - lower) / (center - lower);
                    let falling = (upper - f) / (upper - center);
                    rising.min(falling).max(0.0)
                })
                .collect()
        })
        .collect()
}
