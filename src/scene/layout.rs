//! Rejection sampling of scene layouts.

use rand::Rng;

use super::path::dist_squared;

/// Draw `n` uniform points in the unit square such that every accepted point
/// sits at squared distance greater than `min_sep_sq` from all earlier ones.
///
/// Rejected candidates are redrawn indefinitely. An infeasible combination of
/// `n` and `min_sep_sq` (more points than the square can hold at that
/// separation) never returns; callers pick parameters the square can satisfy.
pub fn sample_positions<R: Rng + ?Sized>(rng: &mut R, n: usize, min_sep_sq: f64) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = Vec::with_capacity(n);
    while points.len() < n {
        let candidate = [rng.gen::<f64>(), rng.gen::<f64>()];
        if points.iter().all(|p| dist_squared(candidate, *p) > min_sep_sq) {
            points.push(candidate);
        }
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_points_are_in_unit_square() {
        let mut rng = StdRng::seed_from_u64(7);
        for p in sample_positions(&mut rng, 8, 0.1) {
            assert!((0.0..1.0).contains(&p[0]));
            assert!((0.0..1.0).contains(&p[1]));
        }
    }

    #[test]
    fn test_pairwise_separation_holds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let points = sample_positions(&mut rng, 8, 0.1);
            assert_eq!(points.len(), 8);
            for i in 0..points.len() {
                for j in (i + 1)..points.len() {
                    assert!(
                        dist_squared(points[i], points[j]) > 0.1,
                        "points {} and {} are too close",
                        i,
                        j
                    );
                }
            }
        }
    }

    #[test]
    fn test_small_layouts() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(sample_positions(&mut rng, 0, 0.1).is_empty());
        assert_eq!(sample_positions(&mut rng, 1, 0.1).len(), 1);
    }
}
