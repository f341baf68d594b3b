/// Time-indexed mel-band magnitudes in dB, derived once from the decoded
/// track and read-only thereafter. Values are relative to the loudest band
/// in the clip: the maximum is 0 dB and the floor sits 80 dB below it.
pub struct SpectralField {
    /// Frame-major storage: `data[frame * n_bands + band]`.
    data: Vec<f32>,
    n_bands: usize,
    n_frames: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl SpectralField {
    pub fn new(
        data: Vec<f32>,
        n_bands: usize,
        hop_length: usize,
        sample_rate: u32,
    ) -> Self {
        assert!(n_bands > 0);
        assert_eq!(data.len() % n_bands, 0);
        let n_frames = data.len() / n_bands;
        Self {
            data,
            n_bands,
            n_frames,
            hop_length,
            sample_rate,
        }
    }

    pub fn n_bands(&self) -> usize {
        self.n_bands
    }

    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    pub fn is_empty(&self) -> bool {
        self.n_frames == 0
    }

    /// Map a playback timestamp to its nearest spectral frame index,
    /// clamped to the valid range.
    pub fn column_index(&self, t: f32) -> usize {
        let raw = (t.max(0.0) * self.sample_rate as f32 / self.hop_length as f32) as usize;
        raw.min(self.n_frames.saturating_sub(1))
    }

    /// The per-band dB column at a frame index.
    pub fn column(&self, index: usize) -> &[f32] {
        let start = index * self.n_bands;
        &self.data[start..start + self.n_bands]
    }
}
