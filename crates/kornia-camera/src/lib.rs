#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera combining intrinsics and pose.
pub mod camera;

/// Depth camera back-projection.
pub mod depth;

/// Lens distortion models.
pub mod distortion;

/// Error types for the camera module.
pub mod error;

/// Camera pose.
pub mod extrinsics;

/// Camera calibration parameters.
pub mod intrinsics;

/// Kinect v1 sensor presets.
pub mod kinect_v1;

/// Linear algebra utilities.
pub mod linalg;

/// Projection and projection matrix operations.
pub mod ops;

/// Two-view geometry.
pub mod pose;

/// Rotation representations.
pub mod transforms;

/// Visibility checks and object bounding boxes.
pub mod visibility;

pub use camera::Camera;
pub use depth::DepthCamera;
pub use distortion::PolynomialDistortion;
pub use error::CameraError;
pub use extrinsics::Extrinsics;
pub use intrinsics::{ImageShape, Intrinsics};
