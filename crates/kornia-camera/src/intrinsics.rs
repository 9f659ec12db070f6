use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::distortion::PolynomialDistortion;
use crate::error::CameraError;

/// The size of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    /// The number of rows
    pub height: usize,
    /// The number of columns
    pub width: usize,
    /// The number of channels
    pub channels: usize,
}

impl ImageShape {
    /// Create a new image shape.
    pub fn new(height: usize, width: usize, channels: usize) -> Self {
        Self {
            height,
            width,
            channels,
        }
    }
}

/// Create the calibration matrix of a pinhole camera.
///
/// The skew term is zero.
///
/// Example:
///
/// ```
/// use kornia_camera::intrinsics::construct_k;
///
/// let k = construct_k(500.0, 500.0, 319.5, 239.5);
/// assert_eq!(k.col(2).x, 319.5);
/// assert_eq!(k.col(2).z, 1.0);
/// ```
pub fn construct_k(fx: f64, fy: f64, cx: f64, cy: f64) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(fx, 0.0, 0.0),
        DVec3::new(0.0, fy, 0.0),
        DVec3::new(cx, cy, 1.0),
    )
}

/// Represents the intrinsic parameters of a pinhole camera.
///
/// A principal point that is not finite (e.g. `NaN`) is treated as not set.
/// Deserialization goes through [`Intrinsics::from_matrix`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IntrinsicsData")]
pub struct Intrinsics {
    k: DMat3,
    distortion: PolynomialDistortion,
    shape: Option<ImageShape>,
}

#[derive(Deserialize)]
struct IntrinsicsData {
    k: DMat3,
    #[serde(default)]
    distortion: PolynomialDistortion,
    #[serde(default)]
    shape: Option<ImageShape>,
}

impl TryFrom<IntrinsicsData> for Intrinsics {
    type Error = CameraError;

    fn try_from(data: IntrinsicsData) -> Result<Self, Self::Error> {
        let mut intrinsics = Self::from_matrix(data.k)?.with_distortion(data.distortion);
        intrinsics.set_shape(data.shape);
        Ok(intrinsics)
    }
}

impl Intrinsics {
    /// Create camera intrinsics from focal lengths and principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Result<Self, CameraError> {
        Self::from_matrix(construct_k(fx, fy, cx, cy))
    }

    /// Create camera intrinsics from a 3x3 calibration matrix.
    ///
    /// The matrix must be upper triangular with `K[2,2] = 1` and positive
    /// focal lengths. A non zero skew `K[0,1]` is accepted.
    pub fn from_matrix(k: DMat3) -> Result<Self, CameraError> {
        let (fx, fy) = (k.x_axis.x, k.y_axis.y);
        if !(fx.is_finite() && fy.is_finite() && fx > 0.0 && fy > 0.0) {
            return Err(CameraError::InvalidIntrinsics(format!(
                "focal lengths must be positive, got fx={fx}, fy={fy}"
            )));
        }
        if k.x_axis.y != 0.0 || k.x_axis.z != 0.0 || k.y_axis.z != 0.0 || k.z_axis.z != 1.0 {
            return Err(CameraError::InvalidIntrinsics(
                "matrix must have form [[fx, s, cx], [0, fy, cy], [0, 0, 1]]".to_string(),
            ));
        }

        Ok(Self {
            k,
            distortion: PolynomialDistortion::default(),
            shape: None,
        })
    }

    /// Simulate a 640x480 camera with 500 focal length.
    pub fn simulate() -> Self {
        Self {
            k: construct_k(500.0, 500.0, 320.0, 240.0),
            distortion: PolynomialDistortion::default(),
            shape: Some(ImageShape::new(480, 640, 3)),
        }
    }

    /// Set the distortion parameters.
    pub fn with_distortion(mut self, distortion: PolynomialDistortion) -> Self {
        self.distortion = distortion;
        self
    }

    /// Set the image shape.
    pub fn with_shape(mut self, shape: ImageShape) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Replace the image shape.
    pub fn set_shape(&mut self, shape: Option<ImageShape>) {
        self.shape = shape;
    }

    /// The calibration matrix.
    pub fn k(&self) -> DMat3 {
        self.k
    }

    /// The focal length in x.
    pub fn fx(&self) -> f64 {
        self.k.x_axis.x
    }

    /// The focal length in y.
    pub fn fy(&self) -> f64 {
        self.k.y_axis.y
    }

    /// The x coordinate of the principal point.
    pub fn cx(&self) -> f64 {
        self.k.z_axis.x
    }

    /// The y coordinate of the principal point.
    pub fn cy(&self) -> f64 {
        self.k.z_axis.y
    }

    /// The skew term `K[0,1]`.
    pub fn skew(&self) -> f64 {
        self.k.y_axis.x
    }

    /// The distortion parameters.
    pub fn distortion(&self) -> &PolynomialDistortion {
        &self.distortion
    }

    /// The image shape, if known.
    pub fn shape(&self) -> Option<ImageShape> {
        self.shape
    }

    /// Returns the field of view in radians for each axis as `[fov_x, fov_y]`.
    ///
    /// Computed from the principal point as `2 * atan(cx / fx)` and
    /// `2 * atan(cy / fy)`.
    pub fn field_of_view(&self) -> [f64; 2] {
        [
            2.0 * (self.cx() / self.fx()).atan(),
            2.0 * (self.cy() / self.fy()).atan(),
        ]
    }
}
