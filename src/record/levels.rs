use std::collections::VecDeque;

/// `log10(|s| + 1)` of the loudest possible 16-bit sample.
const MAX_LEVEL: f32 = 4.515_46;

/// Log-scaled magnitude of each sample: `log10(|s| + 1)`.
pub fn amplitudes(buffer: &[i16]) -> Vec<f32> {
    buffer
        .iter()
        .map(|&s| (f64::from(s).abs() + 1.0).log10() as f32)
        .collect()
}

/// Rolling window of per-chunk peak levels, newest last.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    peaks: VecDeque<f32>,
    capacity: usize,
}

impl LevelMeter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            peaks: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push_chunk(&mut self, chunk: &[i16]) {
        if chunk.is_empty() {
            return;
        }
        let peak = amplitudes(chunk).into_iter().fold(0.0f32, f32::max);
        if self.peaks.len() == self.capacity {
            self.peaks.pop_front();
        }
        self.peaks.push_back(peak);
    }

    pub fn clear(&mut self) {
        self.peaks.clear();
    }

    pub fn latest(&self) -> Option<f32> {
        self.peaks.back().copied()
    }

    /// The newest `width` peaks scaled to `0..=100`, left-padded with zeros.
    pub fn bars(&self, width: usize) -> Vec<u64> {
        let skip = self.peaks.len().saturating_sub(width);
        let mut out = vec![0u64; width.saturating_sub(self.peaks.len())];
        out.extend(
            self.peaks
                .iter()
                .skip(skip)
                .map(|p| ((p / MAX_LEVEL).clamp(0.0, 1.0) * 100.0).round() as u64),
        );
        out
    }
}
