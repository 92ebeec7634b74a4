// src/core/gesture/geometry.rs
//! Vector helpers shared by scoring, matching and spoofing analysis.

use super::types::Point3;
use crate::utils::error::{AuthError, Result};

pub fn sub(a: &Point3, b: &Point3) -> Point3 {
    Point3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

pub fn dot(a: &Point3, b: &Point3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

pub fn magnitude(v: &Point3) -> f64 {
    dot(v, v).sqrt()
}

pub fn distance3d(a: &Point3, b: &Point3) -> f64 {
    magnitude(&sub(a, b))
}

/// Turn angle at `p2` between the segments `p1→p2` and `p2→p3`, in degrees.
///
/// Continuing straight through `p2` is 0°, a full reversal is 180°.
pub fn angle_degrees(p1: &Point3, p2: &Point3, p3: &Point3) -> Result<f64> {
    let v1 = sub(p2, p1);
    let v2 = sub(p3, p2);
    let m1 = magnitude(&v1);
    let m2 = magnitude(&v2);

    if m1 == 0.0 || m2 == 0.0 {
        return Err(AuthError::DegenerateVector(format!(
            "zero-length segment at ({}, {}, {})", p2.x, p2.y, p2.z
        )));
    }

    // Rounding can push the cosine just outside acos' domain.
    let cos = (dot(&v1, &v2) / (m1 * m2)).clamp(-1.0, 1.0);
    Ok(cos.acos().to_degrees())
}

/// Distance per unit of `dt`; `None` when no time elapsed.
pub fn velocity(a: &Point3, b: &Point3, dt: f64) -> Option<f64> {
    if dt > 0.0 {
        Some(distance3d(a, b) / dt)
    } else {
        None
    }
}

/// Population mean and variance.
pub fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}
