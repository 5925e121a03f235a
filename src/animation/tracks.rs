use crate::animation::values::Interpolatable;
use crate::errors::{MarionetteError, Result};

/// An ordered sequence of `(time, value)` keys for one transform property
/// of one bone.
///
/// Times are in clip ticks and non-decreasing (validated on construction).
/// Sampling policy:
/// - 0 keys: no contribution (`None`; the channel substitutes the property
///   identity)
/// - 1 key: that value, constant for all time
/// - otherwise: interpolate between the two bracketing keys, clamping to
///   the first/last value outside the keyed range. Callers wrap time before
///   sampling, so the clamp only covers float fuzz at the clip edges.
#[derive(Debug, Clone, Default)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
}

const MIN_KEY_INTERVAL: f32 = 1e-6;

impl<T: Interpolatable> KeyframeTrack<T> {
    pub fn new(times: Vec<f32>, values: Vec<T>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(MarionetteError::MismatchedTrackLengths {
                times: times.len(),
                values: values.len(),
            });
        }
        if let Some(i) = times.windows(2).position(|w| w[1] < w[0]) {
            return Err(MarionetteError::UnorderedKeyframes(i + 1));
        }
        Ok(Self { times, values })
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            times: Vec::new(),
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Last key time, or zero for empty tracks.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        self.times.last().copied().unwrap_or(0.0)
    }

    #[must_use]
    pub fn sample(&self, time: f32) -> Option<T> {
        let len = self.times.len();
        match len {
            0 => None,
            1 => Some(self.values[0]),
            _ => {
                // First index whose key time is strictly after `time`; the
                // segment to interpolate starts one before it.
                let next = self.times.partition_point(|&t| t <= time);
                if next == 0 {
                    return Some(self.values[0]);
                }
                let index = next - 1;
                if index >= len - 1 {
                    return Some(self.values[len - 1]);
                }

                let t0 = self.times[index];
                let t1 = self.times[index + 1];
                let dt = t1 - t0;
                // Zero-length intervals would divide by zero; hold the left key.
                let factor = if dt > MIN_KEY_INTERVAL {
                    ((time - t0) / dt).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Some(T::interpolate_linear(
                    self.values[index],
                    self.values[index + 1],
                    factor,
                ))
            }
        }
    }
}
