//! Polyline path with a cumulative arc-length table
//!
//! The chain lives in arc-length space: every segment is a single scalar `s`
//! measured from the first waypoint. This module maps between that space and
//! world coordinates:
//! - `sample(s)`: arc length -> world point (extrapolates past both ends)
//! - `project(p)`: world point -> arc length of the closest point on the path

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::PATH_EPSILON;

/// Precomputed polyline. Immutable once built for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathCache {
    pub points: Vec<Vec2>,
    /// Length of segment `i` (between points `i` and `i + 1`)
    pub segment_lengths: Vec<f32>,
    /// Arc length at point `i`; `cumulative[0] == 0`
    pub cumulative: Vec<f32>,
    pub total_length: f32,
}

impl PathCache {
    pub fn new(points: Vec<Vec2>) -> Self {
        let mut segment_lengths = Vec::with_capacity(points.len().saturating_sub(1));
        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);

        let mut total = 0.0;
        for pair in points.windows(2) {
            let len = pair[0].distance(pair[1]);
            segment_lengths.push(len);
            total += len;
            cumulative.push(total);
        }

        Self {
            points,
            segment_lengths,
            cumulative,
            total_length: total,
        }
    }

    /// Number of drawable segments
    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segment_lengths.len()
    }

    /// World position at arc length `s`
    ///
    /// Outside `[0, total_length]` the first/last segment direction is
    /// extended, so tail segments that have not entered yet still get a
    /// sensible position.
    pub fn sample(&self, s: f32) -> Vec2 {
        if self.points.len() < 2 {
            return self.points.first().copied().unwrap_or(Vec2::ZERO);
        }

        if s <= 0.0 {
            let a = self.points[0];
            let dir = self.points[1] - a;
            let len = dir.length().max(PATH_EPSILON);
            return a + dir / len * s;
        }

        if s >= self.total_length {
            let n = self.points.len();
            let a = self.points[n - 2];
            let b = self.points[n - 1];
            let dir = b - a;
            let len = dir.length().max(PATH_EPSILON);
            return b + dir / len * (s - self.total_length);
        }

        // First cumulative entry strictly greater than s closes the bracket
        let upper = self.cumulative.partition_point(|&c| c <= s);
        let i = upper.saturating_sub(1).min(self.segment_count() - 1);
        let start = self.cumulative[i];
        let end = self.cumulative[i + 1];
        let t = (s - start) / (end - start).max(PATH_EPSILON);
        self.points[i].lerp(self.points[i + 1], t)
    }

    /// Arc length of the point on the path closest to `p`
    pub fn project(&self, p: Vec2) -> f32 {
        let mut best_s = 0.0;
        let mut best_d2 = f32::INFINITY;

        for i in 0..self.segment_count() {
            let a = self.points[i];
            let ab = self.points[i + 1] - a;
            let ab_len2 = ab.length_squared().max(PATH_EPSILON);
            let t = ((p - a).dot(ab) / ab_len2).clamp(0.0, 1.0);
            let q = a + ab * t;
            let d2 = p.distance_squared(q);
            if d2 < best_d2 {
                best_d2 = d2;
                best_s = self.cumulative[i] + self.segment_lengths[i] * t;
            }
        }

        best_s
    }
}
