use nalgebra::Point3;

/// Euclidean distance between two points, in Angstroms.
pub fn distance(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p2).norm()
}

/// Squared Euclidean distance; cheaper when only comparing against a cutoff.
pub fn distance_squared(p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    (p1 - p2).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn distance_of_identical_points_is_zero() {
        let p = Point3::new(1.5, -2.0, 3.25);
        assert!(distance(&p, &p).abs() < EPSILON);
    }

    #[test]
    fn distance_matches_pythagorean_triple() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 12.0);
        assert!((distance(&a, &b) - 13.0).abs() < EPSILON);
        assert!((distance_squared(&a, &b) - 169.0).abs() < EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Point3::new(-1.0, 2.0, 0.5);
        let b = Point3::new(4.0, -3.0, 7.0);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < EPSILON);
    }
}
