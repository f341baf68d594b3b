use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{VidError, VidResult};

/// All audio analysis runs at this reduced rate, regardless of the source
/// file's native rate. Keeps spectral processing cost bounded.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22_050;

/// Decoded mono sample buffer at [`ANALYSIS_SAMPLE_RATE`]. Produced once per
/// run and immutable thereafter.
#[derive(Debug)]
pub struct AudioTrack {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioTrack {
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Decode an audio file to mono f32 samples at the fixed analysis rate.
pub fn decode_audio(path: &Path) -> VidResult<AudioTrack> {
    let file = std::fs::File::open(path).map_err(|e| {
        VidError::audio_decode(format!("failed to open {}: {}", path.display(), e))
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VidError::audio_decode(format!("failed to probe audio format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| VidError::audio_decode("no audio tracks found"))?;

    let track_id = track.id;
    let channels = track.codec_params.channels.map_or(1, |c| c.count());
    let native_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| VidError::audio_decode("unknown sample rate"))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| VidError::audio_decode(format!("failed to create decoder: {}", e)))?;

    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => return Err(VidError::audio_decode(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            // A corrupt packet is recoverable; skip it and keep decoding.
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(VidError::audio_decode(e.to_string())),
        };

        let spec = *decoded.spec();
        let num_frames = decoded.frames();

        let mut sample_buf = SampleBuffer::<f32>::new(num_frames as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);

        downmix_into(&mut mono, sample_buf.samples(), channels);
    }

    if mono.is_empty() {
        return Err(VidError::audio_decode(format!(
            "no decodable audio in {}",
            path.display()
        )));
    }

    let samples = if native_rate == ANALYSIS_SAMPLE_RATE {
        mono
    } else {
        resample(&mono, native_rate, ANALYSIS_SAMPLE_RATE)?
    };

    log::info!(
        "Decoded audio: {} samples @ {}Hz ({:.1}s, source {}Hz)",
        samples.len(),
        ANALYSIS_SAMPLE_RATE,
        samples.len() as f32 / ANALYSIS_SAMPLE_RATE as f32,
        native_rate
    );

    Ok(AudioTrack {
        samples,
        sample_rate: ANALYSIS_SAMPLE_RATE,
    })
}

fn downmix_into(mono: &mut Vec<f32>, interleaved: &[f32], channels: usize) {
    if channels <= 1 {
        mono.extend_from_slice(interleaved);
        return;
    }
    for frame in interleaved.chunks(channels) {
        let sum: f32 = frame.iter().sum();
        mono.push(sum / channels as f32);
    }
}

/// Resample mono f32 audio between arbitrary rates using rubato.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> VidResult<Vec<f32>> {
    use rubato::{
        Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
    };

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, samples.len(), 1)
        .map_err(|e| VidError::audio_decode(format!("failed to create resampler: {}", e)))?;

    let input = vec![samples.to_vec()];
    let output = resampler
        .process(&input, None)
        .map_err(|e| VidError::audio_decode(format!("resampling failed: {}", e)))?;

    Ok(output.into_iter().next().unwrap_or_default())
}
