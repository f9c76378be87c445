//! ADC Sample Filtering
//!
//! Two-stage noise suppression for thermistor readings: a batch median to
//! reject single-sample spikes, followed by a moving average to smooth the
//! remaining ADC noise before conversion.

use num_traits::{Float, FromPrimitive};

/// A batch median filter over a fixed window.
///
/// Samples accumulate until the window is full; the filter then emits the
/// middle element of the sorted window and starts a fresh batch. Every output
/// therefore consumes `N` fresh samples, which bounds the rate at which the
/// downstream consumer sees updates.
#[derive(Debug, Clone)]
pub struct MedianFilter<T, const N: usize>
where
    T: Copy + Default + PartialOrd,
{
    window: [T; N],
    count: usize,
}

impl<T, const N: usize> MedianFilter<T, N>
where
    T: Copy + Default + PartialOrd,
{
    /// Creates an empty `MedianFilter`.
    pub fn new() -> Self {
        assert!(N > 0, "Window size must be greater than zero.");
        Self {
            window: [T::default(); N],
            count: 0,
        }
    }

    /// Adds a sample. Returns the batch median when the window fills.
    pub fn push(&mut self, sample: T) -> Option<T> {
        self.window[self.count] = sample;
        self.count += 1;
        if self.count < N {
            return None;
        }
        self.count = 0;

        let mut sorted = self.window;
        // Insertion sort: N is small and PartialOrd is all we ask of T.
        for i in 1..N {
            let mut j = i;
            while j > 0 && sorted[j - 1] > sorted[j] {
                sorted.swap(j - 1, j);
                j -= 1;
            }
        }
        Some(sorted[N / 2])
    }

    /// Discards any partially accumulated batch.
    pub fn reset(&mut self) {
        self.count = 0;
    }
}

impl<T, const N: usize> Default for MedianFilter<T, N>
where
    T: Copy + Default + PartialOrd,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A moving average filter.
///
/// The filter stays silent until its ring has filled once, then emits the
/// arithmetic mean of the last `N` samples on every push. Effective at
/// smoothing random noise but slow to respond to actual changes.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter<F: Float + FromPrimitive, const N: usize> {
    samples: [F; N],
    index: usize,
    count: usize,
}

impl<F: Float + FromPrimitive, const N: usize> MovingAverageFilter<F, N> {
    /// Creates an empty `MovingAverageFilter`.
    pub fn new() -> Self {
        assert!(N > 0, "Window size must be greater than zero.");
        Self {
            samples: [F::zero(); N],
            index: 0,
            count: 0,
        }
    }

    /// Adds a sample. Returns the mean once the ring holds `N` samples.
    pub fn push(&mut self, sample: F) -> Option<F> {
        self.samples[self.index] = sample;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
        if self.count < N {
            return None;
        }

        let mut sum = F::zero();
        for &s in self.samples.iter() {
            sum = sum + s;
        }
        Some(sum / F::from_usize(N).unwrap())
    }

    /// Empties the ring; the filter goes silent until it fills again.
    pub fn reset(&mut self) {
        self.index = 0;
        self.count = 0;
    }
}

impl<F: Float + FromPrimitive, const N: usize> Default for MovingAverageFilter<F, N> {
    fn default() -> Self {
        Self::new()
    }
}
