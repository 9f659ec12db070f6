//! Factory calibration of the Kinect v1 sensor.

use glam::DMat3;

use crate::intrinsics::construct_k;

/// Focal length of the depth camera in pixels.
pub const DEPTH_FOCAL_LENGTH: f64 = 576.097_578_60;

/// Focal length of the RGB camera in pixels.
pub const RGB_FOCAL_LENGTH: f64 = 528.494_047_21;

/// Principal point shared by both cameras.
pub const PRINCIPAL_POINT: (f64, f64) = (319.5, 239.5);

/// Image height in pixels.
pub const HEIGHT: usize = 480;

/// Image width in pixels.
pub const WIDTH: usize = 640;

/// Disparity shift offset.
pub const SHIFT_OFFSET: f64 = 1079.4753;

/// Baseline between the IR projector and the depth camera in meters.
pub const PROJECTOR_DEPTH_BASELINE: f64 = 0.07214;

/// Calibration matrix of the depth camera.
pub fn k_depth() -> DMat3 {
    construct_k(
        DEPTH_FOCAL_LENGTH,
        DEPTH_FOCAL_LENGTH,
        PRINCIPAL_POINT.0,
        PRINCIPAL_POINT.1,
    )
}

/// Calibration matrix of the RGB camera.
pub fn k_rgb() -> DMat3 {
    construct_k(
        RGB_FOCAL_LENGTH,
        RGB_FOCAL_LENGTH,
        PRINCIPAL_POINT.0,
        PRINCIPAL_POINT.1,
    )
}
