//! Cubic space curves
//!
//! Drives moving IK targets, e.g. sweeping a weapon's effector along a
//! swing arc. Evaluation by raw parameter is uneven in speed; the
//! [`ArcLengthCurve`] wrapper resamples the curve into a distance lookup
//! table so traversal by distance moves at constant speed.

use glam::Vec3;

/// Supported cubic bases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    /// Control points 1 and 2 shape the curve; ends interpolate points 0
    /// and 3.
    Bezier,
    /// Interpolates points 1 and 2; points 0 and 3 steer the tangents.
    CatmullRom,
}

/// A 3D cubic curve over four control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicCurve {
    pub kind: CurveKind,
    pub points: [Vec3; 4],
}

impl CubicCurve {
    #[must_use]
    pub const fn new(kind: CurveKind, points: [Vec3; 4]) -> Self {
        Self { kind, points }
    }

    /// Position at parameter `t`, wrapped into `[0, 1)`.
    #[must_use]
    pub fn position_at(&self, t: f32) -> Vec3 {
        let t = t.rem_euclid(1.0);
        let [p0, p1, p2, p3] = self.points;
        match self.kind {
            CurveKind::Bezier => {
                let u = 1.0 - t;
                p0 * (u * u * u)
                    + p1 * (3.0 * t * u * u)
                    + p2 * (3.0 * t * t * u)
                    + p3 * (t * t * t)
            }
            CurveKind::CatmullRom => {
                let t2 = t * t;
                let t3 = t2 * t;
                (p1 * 2.0
                    + (p2 - p0) * t
                    + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
                    + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
                    * 0.5
            }
        }
    }

    /// Position at the un-wrapped end of the parameter range.
    fn position_at_end(&self) -> Vec3 {
        match self.kind {
            CurveKind::Bezier => self.points[3],
            CurveKind::CatmullRom => {
                // Catmull-Rom at t = 1 lands on control point 2.
                self.points[2]
            }
        }
    }
}

/// A cubic curve resampled for constant-speed traversal.
#[derive(Debug, Clone)]
pub struct ArcLengthCurve {
    curve: CubicCurve,
    /// Sampled positions at `i / samples` for `i` in `0..=samples`.
    positions: Vec<Vec3>,
    /// Cumulative distance along the polyline, one entry per position.
    distances: Vec<f32>,
    length: f32,
}

impl ArcLengthCurve {
    /// Builds the lookup table from `samples` segments. Accuracy of
    /// distance queries grows with the sample count.
    #[must_use]
    pub fn new(curve: CubicCurve, samples: usize) -> Self {
        let samples = samples.max(1);
        let mut positions = Vec::with_capacity(samples + 1);
        let mut distances = Vec::with_capacity(samples + 1);

        let mut length = 0.0;
        let mut prev = curve.position_at(0.0);
        positions.push(prev);
        distances.push(0.0);
        for i in 1..=samples {
            // position_at wraps t = 1.0 to 0.0; feed the end point directly.
            let t = i as f32 / samples as f32;
            let point = if i == samples {
                curve.position_at_end()
            } else {
                curve.position_at(t)
            };
            length += point.distance(prev);
            positions.push(point);
            distances.push(length);
            prev = point;
        }

        Self {
            curve,
            positions,
            distances,
            length,
        }
    }

    #[must_use]
    pub const fn curve(&self) -> &CubicCurve {
        &self.curve
    }

    /// Approximate total curve length.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Position at normalized distance `s` along the curve, wrapped into
    /// `[0, 1)`; equal steps in `s` travel equal distances.
    #[must_use]
    pub fn position_at_distance(&self, s: f32) -> Vec3 {
        if self.length <= f32::EPSILON {
            return self.positions[0];
        }
        let offset = s.rem_euclid(1.0) * self.length;

        let next = self
            .distances
            .partition_point(|&d| d <= offset)
            .min(self.distances.len() - 1)
            .max(1);
        let left = next - 1;

        let segment = self.distances[next] - self.distances[left];
        let alpha = if segment > f32::EPSILON {
            (offset - self.distances[left]) / segment
        } else {
            0.0
        };
        self.positions[left].lerp(self.positions[next], alpha)
    }
}
