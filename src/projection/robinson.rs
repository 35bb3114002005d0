//! Robinson's tabulated coefficients, one (A, B) pair every 5° of latitude.

/// Latitudes are clipped just short of the pole before interpolating.
const MAX_LATITUDE: f64 = 1.57079632679;
const STEPS_PER_RADIAN: f64 = 36.0 / std::f64::consts::PI;

const A: [f64; 19] = [
    0.8487, 0.84751182, 0.84479598, 0.840213, 0.83359314, 0.8257851, 0.814752, 0.80006949,
    0.78216192, 0.76060494, 0.73658673, 0.7086645, 0.67777182, 0.64475739, 0.60987582, 0.57134484,
    0.52729731, 0.48562614, 0.45167814,
];

const B: [f64; 19] = [
    0.0, 0.0838426, 0.1676852, 0.2515278, 0.3353704, 0.419213, 0.5030556, 0.5868982, 0.67182264,
    0.75336633, 0.83518048, 0.91537187, 0.99339958, 1.06872269, 1.14066505, 1.20841528,
    1.27035062, 1.31998003, 1.3523,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Linear,
    Quadratic,
}

/// Interpolated (A, B) at the absolute latitude `y`, in radians.
///
/// The quadratic mode fits a local parabola through the three nearest nodes, not a global
/// quadratic spline, so between nodes it can differ slightly from a spline fit.
pub fn coefficients(y: f64, interpolation: Interpolation) -> (f64, f64) {
    let y = y.abs().min(MAX_LATITUDE);
    let t = y * STEPS_PER_RADIAN;
    let i = (t as usize).min(A.len() - 1);
    match interpolation {
        Interpolation::Linear => {
            if i == A.len() - 1 {
                return (A[i], B[i]);
            }
            let dt = t - i as f64;
            (A[i] + (A[i + 1] - A[i]) * dt, B[i] + (B[i + 1] - B[i]) * dt)
        }
        Interpolation::Quadratic => {
            // Lagrange parabola through three consecutive nodes, kept inside the table.
            let k = i.saturating_sub(1).min(A.len() - 3);
            let u = t - k as f64;
            let w0 = (u - 1.0) * (u - 2.0) / 2.0;
            let w1 = -u * (u - 2.0);
            let w2 = u * (u - 1.0) / 2.0;
            (
                w0 * A[k] + w1 * A[k + 1] + w2 * A[k + 2],
                w0 * B[k] + w1 * B[k + 1] + w2 * B[k + 2],
            )
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_nodes_are_exact() {
        for i in 0..18 {
            let y = (i as f64 * 5.0).to_radians();
            for interpolation in [Interpolation::Linear, Interpolation::Quadratic] {
                let (a, b) = coefficients(y, interpolation);
                assert_abs_diff_eq!(a, A[i], epsilon = 1e-9);
                assert_abs_diff_eq!(b, B[i], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_pole_does_not_overrun() {
        for interpolation in [Interpolation::Linear, Interpolation::Quadratic] {
            let (a, b) = coefficients(std::f64::consts::FRAC_PI_2 + 0.1, interpolation);
            assert_abs_diff_eq!(a, A[18], epsilon = 1e-6);
            assert_abs_diff_eq!(b, B[18], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_between_nodes() {
        let (a, _) = coefficients(2.5_f64.to_radians(), Interpolation::Linear);
        assert_abs_diff_eq!(a, (A[0] + A[1]) / 2.0, epsilon = 1e-12);
        let (a, _) = coefficients(2.5_f64.to_radians(), Interpolation::Quadratic);
        assert!(a < A[0] && a > A[1]);
    }
}
