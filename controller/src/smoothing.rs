//! Frame-rate independent blending helpers

use bevy::prelude::*;

/// Fraction of the remaining distance covered in `dt` at `rate` (1/s)
pub fn blend_factor(rate: f32, dt: f32) -> f32 {
    1.0 - (-rate * dt).exp()
}

/// Lerp that keeps `from` when any operand is not finite
pub fn guarded_lerp(from: f32, to: f32, t: f32) -> f32 {
    if !(from.is_finite() && to.is_finite() && t.is_finite()) {
        warn!("lerp received non-finite input: from={from} to={to} t={t}");
        return if from.is_finite() { from } else { 0.0 };
    }
    from + (to - from) * t
}

pub fn guarded_lerp_vec3(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    Vec3::new(
        guarded_lerp(from.x, to.x, t),
        guarded_lerp(from.y, to.y, t),
        guarded_lerp(from.z, to.z, t),
    )
}
