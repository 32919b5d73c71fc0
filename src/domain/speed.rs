/// Distribution of every speed observed during this run
///
/// Samples are kept in ascending order after each insertion; NaN samples sort first.
#[derive(Debug, Clone, Default)]
pub struct SpeedSampler {
    samples: Vec<f64>,
}

impl SpeedSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a speed in km/h
    pub fn add(&mut self, kmh: f64) {
        let idx = if kmh.is_nan() {
            self.samples.partition_point(|s| s.is_nan())
        } else {
            self.samples.partition_point(|s| s.is_nan() || *s <= kmh)
        };
        self.samples.insert(idx, kmh);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Highest sample, NaN when empty
    pub fn max(&self) -> f64 {
        self.samples.last().copied().unwrap_or(f64::NAN)
    }

    /// Nearest-rank percentile, `p` in [0, 100]. NaN when empty.
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return f64::NAN;
        }

        let rank = (self.samples.len() as f64 * p / 100.0 - 0.5).floor();
        let idx = rank.clamp(0.0, (self.samples.len() - 1) as f64) as usize;
        self.samples[idx]
    }

    pub fn median(&self) -> f64 {
        self.percentile(50.0)
    }

    /// Mean over all non-NaN samples, NaN if there are none
    pub fn average(&self) -> f64 {
        let (sum, num) = self
            .samples
            .iter()
            .filter(|s| !s.is_nan())
            .fold((0.0_f64, 0usize), |(sum, num), s| (sum + s, num + 1));

        if num == 0 {
            return f64::NAN;
        }
        sum / num as f64
    }
}
