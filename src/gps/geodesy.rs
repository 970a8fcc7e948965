// src/gps/geodesy.rs
//! Geodesic distance on the WGS-84 ellipsoid (Vincenty inverse formula)

// WGS-84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const SEMI_MINOR_AXIS: f64 = 6_356_752.314_245;
const FLATTENING: f64 = 1.0 / 298.257_223_563;

const ITERATION_LIMIT: u32 = 100;
const TOLERANCE: f64 = 1e-12;

/// Distance in metres between two `(latitude, longitude)` points given in
/// signed decimal degrees
///
/// Returns `None` when the iteration does not converge, which only happens
/// for nearly antipodal points.
pub fn vincenty_distance(from: (f64, f64), to: (f64, f64)) -> Option<f64> {
    let (a, b, f) = (SEMI_MAJOR_AXIS, SEMI_MINOR_AXIS, FLATTENING);

    let l = (to.1 - from.1).to_radians();
    let u1 = ((1.0 - f) * from.0.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * to.0.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;
    let (mut sin_sigma, mut cos_sigma, mut sigma) = (0.0, 0.0, 0.0);
    let (mut cos_sq_alpha, mut cos_2sigma_m) = (0.0, 0.0);

    for _ in 0..ITERATION_LIMIT {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        sin_sigma = ((cos_u2 * sin_lambda).powi(2)
            + (cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda).powi(2))
        .sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Some(0.0);
        }
        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos_2sigma_m = if cos_sq_alpha == 0.0 {
            // equatorial line
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };
        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        if (lambda - previous).abs() <= TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        log::debug!("vincenty distance did not converge for {:?} -> {:?}", from, to);
        return None;
    }

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    Some(b * big_a * (sigma - delta_sigma))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coincident_points() {
        assert_eq!(vincenty_distance((48.1173, 11.5167), (48.1173, 11.5167)), Some(0.0));
    }

    #[test]
    fn test_one_degree_along_equator() {
        // a * pi / 180
        let d = vincenty_distance((0.0, 0.0), (0.0, 1.0)).unwrap();
        assert!((d - 111_319.491).abs() < 0.01, "{}", d);
    }

    #[test]
    fn test_flinders_peak_to_buninyong() {
        // Reference pair from Vincenty's paper.
        let flinders = (-37.951_033_416_7, 144.424_867_888_9);
        let buninyong = (-37.652_821_138_9, 143.926_495_527_8);
        let d = vincenty_distance(flinders, buninyong).unwrap();
        assert!((d - 54_972.271).abs() < 0.01, "{}", d);
    }

    #[test]
    fn test_meridian_distance_is_symmetric() {
        let there = vincenty_distance((10.0, 20.0), (11.0, 20.0)).unwrap();
        let back = vincenty_distance((11.0, 20.0), (10.0, 20.0)).unwrap();
        assert!((there - back).abs() < 1e-6);
        assert!(there > 110_000.0 && there < 111_000.0);
    }
}
