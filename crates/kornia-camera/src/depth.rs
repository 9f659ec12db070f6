use glam::DMat3;
use ndarray::{Array2, Array3, ArrayView2, Axis, Zip};

use crate::distortion::PolynomialDistortion;
use crate::error::CameraError;
use crate::intrinsics::{ImageShape, Intrinsics};
use crate::kinect_v1;

/// A pinhole depth camera with a precomputed ray mesh for fast reconstruction.
///
/// The mesh holds the normalized ray of every `skip`-th pixel so that a depth
/// image is back-projected with a single multiplication per coordinate.
#[derive(Debug, Clone)]
pub struct DepthCamera {
    intrinsics: Intrinsics,
    shape: (usize, usize),
    skip: usize,
    xs: Array2<f64>,
    ys: Array2<f64>,
}

impl DepthCamera {
    /// Create a depth camera.
    ///
    /// # Arguments
    ///
    /// * `k` - The calibration matrix.
    /// * `shape` - The image size as `(height, width)`.
    /// * `skip` - The pixel stride of the mesh, at least 1.
    /// * `distortion` - The lens distortion, kept with the intrinsics but not
    ///   used by the reconstruction.
    pub fn new(
        k: DMat3,
        shape: (usize, usize),
        skip: usize,
        distortion: PolynomialDistortion,
    ) -> Result<Self, CameraError> {
        let (height, width) = shape;
        if height == 0 || width == 0 {
            return Err(CameraError::InvalidShape(height, width));
        }
        if skip == 0 {
            return Err(CameraError::InvalidStride(skip));
        }

        let intrinsics = Intrinsics::from_matrix(k)?
            .with_distortion(distortion)
            .with_shape(ImageShape::new(height, width, 1));
        let (xs, ys) = build_mesh(&intrinsics, shape, skip);

        Ok(Self {
            intrinsics,
            shape,
            skip,
            xs,
            ys,
        })
    }

    /// The Kinect v1 depth camera at full resolution.
    pub fn kinect() -> Result<Self, CameraError> {
        Self::new(
            kinect_v1::k_depth(),
            (kinect_v1::HEIGHT, kinect_v1::WIDTH),
            1,
            PolynomialDistortion::default(),
        )
    }

    /// The intrinsic parameters.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The image size as `(height, width)`.
    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// The pixel stride of the mesh.
    pub fn skip(&self) -> usize {
        self.skip
    }

    /// The size of the ray mesh, `(ceil(height / skip), ceil(width / skip))`.
    pub fn mesh_shape(&self) -> (usize, usize) {
        self.xs.dim()
    }

    /// The normalized ray components `(x / z, y / z)` of the mesh.
    pub fn rays(&self) -> (&Array2<f64>, &Array2<f64>) {
        (&self.xs, &self.ys)
    }

    /// Back-project a depth image into a `H x W x 3` array of camera frame points.
    ///
    /// PRECONDITION: `depth` has the shape of the mesh, see [`DepthCamera::mesh_shape`].
    ///
    /// Example:
    ///
    /// ```
    /// use kornia_camera::depth::DepthCamera;
    /// use kornia_camera::intrinsics::construct_k;
    /// use ndarray::Array2;
    ///
    /// let k = construct_k(500.0, 500.0, 2.0, 1.0);
    /// let camera = DepthCamera::new(k, (3, 5), 1, Default::default()).unwrap();
    /// let points = camera.reconstruct(Array2::from_elem((3, 5), 2.0).view()).unwrap();
    /// assert_eq!(points.dim(), (3, 5, 3));
    /// assert_eq!(points[[1, 2, 2]], 2.0);
    /// ```
    pub fn reconstruct(&self, depth: ArrayView2<'_, f64>) -> Result<Array3<f64>, CameraError> {
        if depth.dim() != self.xs.dim() {
            return Err(CameraError::ShapeMismatch {
                expected: self.xs.dim(),
                actual: depth.dim(),
            });
        }

        let (rows, cols) = depth.dim();
        let mut points = Array3::<f64>::zeros((rows, cols, 3));
        Zip::from(points.lanes_mut(Axis(2)))
            .and(&depth)
            .and(&self.xs)
            .and(&self.ys)
            .for_each(|mut p, &d, &x, &y| {
                p[0] = x * d;
                p[1] = y * d;
                p[2] = d;
            });

        Ok(points)
    }
}

fn build_mesh(
    intrinsics: &Intrinsics,
    shape: (usize, usize),
    skip: usize,
) -> (Array2<f64>, Array2<f64>) {
    let (height, width) = shape;
    let (fx, fy, cx, cy) = (
        intrinsics.fx(),
        intrinsics.fy(),
        intrinsics.cx(),
        intrinsics.cy(),
    );

    let ray_x: Vec<f64> = (0..width)
        .step_by(skip)
        .map(|col| (col as f64 - cx) / fx)
        .collect();
    let ray_y: Vec<f64> = (0..height)
        .step_by(skip)
        .map(|row| (row as f64 - cy) / fy)
        .collect();

    let dim = (ray_y.len(), ray_x.len());
    let xs = Array2::from_shape_fn(dim, |(_, j)| ray_x[j]);
    let ys = Array2::from_shape_fn(dim, |(i, _)| ray_y[i]);
    (xs, ys)
}
