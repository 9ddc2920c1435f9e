use std::f32::consts::TAU;

use glam::Vec3;

/// Position stored as a running sum plus the low-order bits lost by the
/// previous additions (Kahan summation).
///
/// Per-frame movement deltas are usually several orders of magnitude smaller
/// than the absolute position, so naive `+=` on `f32` drops them entirely
/// once the position is large enough.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct KahanVec3 {
    sum: Vec3,
    compensation: Vec3,
}

impl KahanVec3 {
    pub fn new(value: Vec3) -> Self {
        Self { sum: value, compensation: Vec3::ZERO }
    }

    pub fn value(&self) -> Vec3 {
        self.sum
    }

    /// Overwrite the position. The compensation term belongs to the old sum,
    /// so it is discarded.
    pub fn set(&mut self, value: Vec3) {
        self.sum = value;
        self.compensation = Vec3::ZERO;
    }

    pub fn add(&mut self, delta: Vec3) {
        let adjusted = delta - self.compensation;
        let new_sum = self.sum + adjusted;
        self.compensation = (new_sum - self.sum) - adjusted;
        self.sum = new_sum;
    }
}

/// Wrap an angle in radians into `[0, 2π)`.
#[inline(always)]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

pub fn normalize_angles(angles: Vec3) -> Vec3 {
    Vec3::new(normalize_angle(angles.x), normalize_angle(angles.y), normalize_angle(angles.z))
}
