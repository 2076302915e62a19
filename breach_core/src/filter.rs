//! Fixed-window moving average over a circular buffer.

/// Window used by `MovingAverage::default()`.
pub const DEFAULT_WINDOW: usize = 4;

/// Moving average whose window always holds exactly `len()` values.
///
/// Slots start at a seed value rather than empty, so the average is always
/// taken over the full window: the first `len() - 1` readings blend the seed
/// with real data.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverage {
    buf: Vec<f64>,
    // next slot to overwrite
    cursor: usize,
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, 0.0)
    }
}

impl MovingAverage {
    /// Window of `size` slots, all set to `seed`. A size of 0 is clamped to 1.
    pub fn new(size: usize, seed: f64) -> Self {
        Self {
            buf: vec![seed; size.max(1)],
            cursor: 0,
        }
    }

    /// Default-sized window seeded with `seed`.
    pub fn with_seed(seed: f64) -> Self {
        Self::new(DEFAULT_WINDOW, seed)
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Overwrite the oldest slot. Callers must not pass NaN or infinities.
    pub fn add(&mut self, sample: f64) {
        debug_assert!(sample.is_finite(), "non-finite sample: {sample}");
        self.buf[self.cursor] = sample;
        self.cursor += 1;
        if self.cursor == self.buf.len() {
            self.cursor = 0;
        }
    }

    /// Mean of all slots.
    pub fn average(&self) -> f64 {
        let sum: f64 = self.buf.iter().sum();
        sum / self.buf.len() as f64
    }

    pub fn add_and_average(&mut self, sample: f64) -> f64 {
        self.add(sample);
        self.average()
    }

    /// Refill every slot with `seed` and rewind the cursor.
    pub fn reseed(&mut self, seed: f64) {
        self.buf.fill(seed);
        self.cursor = 0;
    }
}
