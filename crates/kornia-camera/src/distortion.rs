use serde::{Deserialize, Serialize};

use crate::error::CameraError;

/// Represents the polynomial (Brown-Conrady) distortion parameters of a camera.
///
/// The coefficient order follows the usual `(k1, k2, p1, p2[, k3[, k4, k5, k6]])`
/// convention. All coefficients default to zero, i.e. no distortion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

impl PolynomialDistortion {
    /// Create the four coefficient model with two radial and two tangential terms.
    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64) -> Self {
        Self {
            k1,
            k2,
            p1,
            p2,
            ..Default::default()
        }
    }

    /// Create the distortion from a coefficient vector of length 4, 5 or 8.
    ///
    /// Example:
    ///
    /// ```
    /// use kornia_camera::distortion::PolynomialDistortion;
    ///
    /// let d = PolynomialDistortion::from_coefficients(&[0.1, 0.01, 0.0, 0.0]).unwrap();
    /// assert_eq!(d.k1, 0.1);
    /// assert_eq!(d.coefficients(), [0.1, 0.01, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    /// ```
    pub fn from_coefficients(coeffs: &[f64]) -> Result<Self, CameraError> {
        let mut all = [0.0; 8];
        match coeffs.len() {
            4 | 5 | 8 => all[..coeffs.len()].copy_from_slice(coeffs),
            n => {
                return Err(CameraError::InvalidIntrinsics(format!(
                    "distortion needs 4, 5 or 8 coefficients, got {n}"
                )))
            }
        }
        let [k1, k2, p1, p2, k3, k4, k5, k6] = all;
        Ok(Self {
            k1,
            k2,
            k3,
            k4,
            k5,
            k6,
            p1,
            p2,
        })
    }

    /// Return the coefficients in `(k1, k2, p1, p2, k3, k4, k5, k6)` order.
    pub fn coefficients(&self) -> [f64; 8] {
        [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ]
    }

    /// Check if there is any distortion.
    pub fn has_distortion(&self) -> bool {
        self.coefficients().iter().any(|c| *c != 0.0)
    }

    /// Distort a point given in normalized image coordinates (`x / z`, `y / z`).
    pub fn distort_normalized(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        // radial distortion
        let kr = (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6);

        // tangential distortion
        let xd = x * kr + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * kr + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        (xd, yd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_no_distortion_is_identity() {
        let d = PolynomialDistortion::default();
        assert!(!d.has_distortion());
        assert_eq!(d.distort_normalized(0.3, -0.2), (0.3, -0.2));
    }

    #[test]
    fn test_radial_distortion() {
        let d = PolynomialDistortion::new(0.1, 0.0, 0.0, 0.0);
        assert!(d.has_distortion());
        let (xd, yd) = d.distort_normalized(0.5, 0.0);
        // r2 = 0.25 -> scale 1.025
        assert_relative_eq!(xd, 0.5125, epsilon = 1e-12);
        assert_relative_eq!(yd, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tangential_distortion() {
        let d = PolynomialDistortion::new(0.0, 0.0, 0.01, 0.02);
        let (xd, yd) = d.distort_normalized(0.1, 0.2);
        let r2 = 0.05;
        assert_relative_eq!(xd, 0.1 + 2.0 * 0.01 * 0.02 + 0.02 * (r2 + 0.02), epsilon = 1e-12);
        assert_relative_eq!(yd, 0.2 + 0.01 * (r2 + 0.08) + 2.0 * 0.02 * 0.02, epsilon = 1e-12);
    }

    #[test]
    fn test_from_coefficients() -> Result<(), CameraError> {
        let d = PolynomialDistortion::from_coefficients(&[1.0, 2.0, 3.0, 4.0, 5.0])?;
        assert_eq!(d.k3, 5.0);
        assert_eq!(d.p2, 4.0);
        assert!(PolynomialDistortion::from_coefficients(&[1.0, 2.0]).is_err());
        Ok(())
    }
}
