//! Vector similarity and distance functions over feature rows.
//!
//! Both slices must have the same length; extra trailing values of the
//! longer slice are ignored by the pairwise iteration.

pub fn dot(u: &[f64], v: &[f64]) -> f64 {
    u.iter().zip(v).map(|(a, b)| a * b).sum()
}

/// Euclidean norm
pub fn l2_norm(u: &[f64]) -> f64 {
    dot(u, u).sqrt()
}

/// `1 - u·v / (|u| |v|)`, in `[0, 2]`.
///
/// A zero vector has no direction, so its distance to anything is 1.0
/// (orthogonal) rather than NaN.
pub fn cosine_distance(u: &[f64], v: &[f64]) -> f64 {
    let norms = l2_norm(u) * l2_norm(v);
    if norms == 0.0 {
        return 1.0;
    }
    1.0 - dot(u, v) / norms
}

/// `Σ|u - v| / Σ|u + v|`.
///
/// Two vectors whose sum is zero everywhere are treated as identical (0.0).
pub fn bray_curtis_distance(u: &[f64], v: &[f64]) -> f64 {
    let (diff, total) = u
        .iter()
        .zip(v)
        .fold((0.0, 0.0), |(diff, total), (a, b)| {
            (diff + (a - b).abs(), total + (a + b).abs())
        });
    if total == 0.0 {
        return 0.0;
    }
    diff / total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norm() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(l2_norm(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn test_cosine_distance() {
        assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-12);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-12);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-12);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    #[test]
    fn test_bray_curtis_distance() {
        assert_eq!(bray_curtis_distance(&[1.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(bray_curtis_distance(&[1.0, 0.0], &[0.0, 1.0]), 1.0);
        assert_eq!(bray_curtis_distance(&[1.0, 2.0, 0.0], &[1.0, 0.0, 0.0]), 0.5);
        assert_eq!(bray_curtis_distance(&[0.0], &[0.0]), 0.0);
    }
}
