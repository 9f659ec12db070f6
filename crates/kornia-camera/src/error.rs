/// An error type for the camera geometry module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    /// The calibration matrix is not a valid pinhole intrinsics matrix.
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// The rotation matrix is not orthonormal with a positive determinant.
    #[error("Invalid rotation matrix: {0}")]
    InvalidRotation(String),

    /// The principal point of the camera is not set.
    #[error("Principal point (cx, cy) is not set")]
    MissingPrincipalPoint,

    /// The operation needs the image shape but the camera has none.
    #[error("Image shape is not set")]
    MissingImageShape,

    /// The image shape has a zero dimension.
    #[error("Invalid image shape ({0}, {1})")]
    InvalidShape(usize, usize),

    /// The stride must be at least one.
    #[error("Invalid stride ({0}), must be at least 1")]
    InvalidStride(usize),

    /// Array shapes differ.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Shape required by the operation.
        expected: (usize, usize),
        /// Shape of the provided array.
        actual: (usize, usize),
    },

    /// The two point sets do not have the same length.
    #[error("Mismatched point sets: {0} != {1}")]
    LengthMismatch(usize, usize),

    /// Not enough correspondences for the estimator.
    #[error("Need at least {required} correspondences, got {actual}")]
    NotEnoughPoints {
        /// Minimum number of correspondences for the estimator.
        required: usize,
        /// Number of correspondences provided.
        actual: usize,
    },

    /// The input configuration is numerically degenerate.
    #[error("Degenerate configuration: {0}")]
    Degenerate(String),

    /// A robust estimator could not find a valid model.
    #[error("Estimation failed: {0}")]
    EstimationFailed(String),

    /// The epipole lies at infinity and cannot be normalized.
    #[error("Epipole is at infinity")]
    EpipoleAtInfinity,

    /// The intrinsics block of a projection matrix is not invertible.
    #[error("Intrinsics matrix is singular")]
    SingularIntrinsics,
}
