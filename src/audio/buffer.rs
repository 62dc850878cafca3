use serde::{Deserialize, Serialize};

/// Mono or interleaved 16-bit PCM captured by the host shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
    /// Cached duration in seconds
    #[serde(skip)]
    pub duration_secs: f32,
}

impl AudioBuffer {
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            channels,
            duration_secs: 0.0,
        }
    }

    pub fn from_samples(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        let mut buffer = Self::new(sample_rate, channels);
        buffer.samples = samples;
        buffer.update_duration();
        buffer
    }

    fn sample_duration(&self) -> f32 {
        match self.sample_rate {
            0 => 0.0,
            rate => self.samples.len() as f32 / (rate as f32 * self.channels.max(1) as f32),
        }
    }

    pub fn update_duration(&mut self) {
        self.duration_secs = self.sample_duration();
    }

    /// Duration, recomputed from samples when the cached value was skipped by serde
    pub fn effective_duration_secs(&self) -> f32 {
        if self.duration_secs > 0.0 {
            self.duration_secs
        } else {
            self.sample_duration()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.duration_secs = 0.0;
    }

    pub fn append(&mut self, data: &[i16]) {
        self.samples.extend_from_slice(data);
        self.update_duration();
    }

    /// Encode as a 16-bit PCM RIFF/WAVE file
    pub fn to_wav_bytes(&self) -> Vec<u8> {
        let channels = self.channels.max(1);
        let mut wav = Vec::with_capacity(44 + self.samples.len() * 2);

        // RIFF header
        wav.extend_from_slice(b"RIFF");
        let file_size = (36 + self.samples.len() * 2) as u32;
        wav.extend_from_slice(&file_size.to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        // fmt chunk
        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&channels.to_le_bytes());
        wav.extend_from_slice(&self.sample_rate.to_le_bytes());
        let byte_rate = self.sample_rate * channels as u32 * 2;
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&(channels * 2).to_le_bytes());
        wav.extend_from_slice(&16u16.to_le_bytes());

        // data chunk
        wav.extend_from_slice(b"data");
        let data_size = (self.samples.len() * 2) as u32;
        wav.extend_from_slice(&data_size.to_le_bytes());
        for &sample in &self.samples {
            wav.extend_from_slice(&sample.to_le_bytes());
        }

        wav
    }
}
