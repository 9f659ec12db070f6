use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::error::CameraError;
use crate::ops::median_in_place;

/// Check which points fall inside the field of view of the camera.
///
/// The view is approximated by a cone around the viewing direction (the third
/// column of the rotation) with the larger per-axis half field of view as
/// aperture. The vector to each point is taken from the camera translation.
/// Points at the camera center are never visible.
///
/// Example:
///
/// ```
/// use kornia_camera::camera::Camera;
/// use kornia_camera::visibility::check_visibility;
///
/// let camera = Camera::simulate();
/// let visible = check_visibility(&camera, &[[0.0, 0.0, 5.0], [0.0, 0.0, -5.0]]);
/// assert_eq!(visible, vec![true, false]);
/// ```
pub fn check_visibility(camera: &Camera, points: &[[f64; 3]]) -> Vec<bool> {
    let [fov_x, fov_y] = camera.field_of_view();
    let half_fov = 0.5 * fov_x.max(fov_y);
    let lookat = camera.rotation().z_axis;
    let origin = camera.translation();

    points
        .iter()
        .map(|p| {
            let v = DVec3::from_array(*p) - origin;
            let norm = v.length();
            if norm <= 0.0 {
                return false;
            }
            let cos_theta = (lookat.dot(v) / norm).clamp(-1.0, 1.0);
            cos_theta.acos() < half_fov
        })
        .collect()
}

/// Tunables of [`object_bounding_box`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxParams {
    /// Keep every `subsample`-th point of the cloud.
    pub subsample: usize,
    /// Scale factor of the box around its center.
    pub scale: f64,
    /// Minimum box height in pixels.
    pub min_height: i32,
    /// Minimum box width in pixels.
    pub min_width: i32,
}

impl Default for BoundingBoxParams {
    fn default() -> Self {
        Self {
            subsample: 10,
            scale: 1.0,
            min_height: 10,
            min_width: 10,
        }
    }
}

/// An axis aligned box in pixel coordinates, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left column.
    pub left: i32,
    /// Right column.
    pub right: i32,
    /// Top row.
    pub top: i32,
    /// Bottom row.
    pub bottom: i32,
}

impl BoundingBox {
    /// Horizontal extent, `right - left`.
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Vertical extent, `bottom - top`.
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Area in square pixels.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }
}

/// An object found in the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDetection {
    /// Projected points inside the image, truncated to pixels.
    pub points: Vec<[i32; 2]>,
    /// Box around the projected points.
    pub bbox: BoundingBox,
    /// Median camera frame depth of the subsampled points.
    pub depth: f64,
}

/// Why an object was not detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// No projection, or its median, lies inside the image.
    OutOfImage,
    /// The box is smaller than the minimum size.
    TooSmall,
    /// The object is behind the camera.
    BehindCamera,
}

/// The outcome of [`object_bounding_box`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectBoundingBox {
    /// The object is visible.
    Visible(ObjectDetection),
    /// The object was rejected.
    Rejected(Rejection),
}

impl ObjectBoundingBox {
    /// The detection if the object is visible.
    pub fn detection(&self) -> Option<&ObjectDetection> {
        match self {
            Self::Visible(detection) => Some(detection),
            Self::Rejected(_) => None,
        }
    }

    /// Whether the object is visible.
    pub fn is_visible(&self) -> bool {
        matches!(self, Self::Visible(_))
    }
}

/// Compute the image bounding box and median depth of a 3D point cloud.
///
/// The cloud is subsampled, projected and bounded by its projections clipped
/// to the image. The object is accepted when the median projection lies in
/// the image, the box has the minimum size and the median depth is not
/// negative. With `scale != 1` the box grows (or shrinks) around its center,
/// clipped to the image.
///
/// # Errors
///
/// [`CameraError::MissingImageShape`] when the camera intrinsics have no image
/// shape and [`CameraError::InvalidStride`] for `subsample == 0`.
pub fn object_bounding_box(
    camera: &Camera,
    points: &[[f64; 3]],
    params: &BoundingBoxParams,
) -> Result<ObjectBoundingBox, CameraError> {
    let shape = camera
        .intrinsics()
        .shape()
        .ok_or(CameraError::MissingImageShape)?;
    if params.subsample == 0 {
        return Err(CameraError::InvalidStride(params.subsample));
    }

    let (width, height) = (shape.width as f64, shape.height as f64);

    let subsampled: Vec<[f64; 3]> = points.iter().step_by(params.subsample).copied().collect();
    let projected: Vec<[f64; 2]> = camera
        .project(&subsampled)
        .into_iter()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();

    if projected.is_empty() {
        log::debug!("object rejected: no point in front of the camera");
        return Ok(ObjectBoundingBox::Rejected(Rejection::BehindCamera));
    }

    // min-max bounds clipped to the image
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in projected.iter() {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }
    let mut bbox = BoundingBox {
        left: min_x.max(0.0) as i32,
        right: max_x.min(width - 1.0) as i32,
        top: min_y.max(0.0) as i32,
        bottom: max_y.min(height - 1.0) as i32,
    };

    let inside: Vec<[f64; 2]> = projected
        .into_iter()
        .filter(|p| p[0] >= 0.0 && p[0] < width && p[1] >= 0.0 && p[1] < height)
        .collect();

    let mut xs: Vec<f64> = inside.iter().map(|p| p[0]).collect();
    let mut ys: Vec<f64> = inside.iter().map(|p| p[1]).collect();
    let (x_med, y_med) = (median_in_place(&mut xs), median_in_place(&mut ys));
    let centered = x_med >= 0.0 && y_med >= 0.0 && x_med <= width && y_med < height;
    if !centered {
        log::debug!("object rejected: median projection outside the image");
        return Ok(ObjectBoundingBox::Rejected(Rejection::OutOfImage));
    }

    if bbox.height() < params.min_height || bbox.width() < params.min_width {
        log::debug!(
            "object rejected: box {}x{} below {}x{}",
            bbox.width(),
            bbox.height(),
            params.min_width,
            params.min_height
        );
        return Ok(ObjectBoundingBox::Rejected(Rejection::TooSmall));
    }

    let mut depths = camera.camera_frame_depths(&subsampled);
    let depth = median_in_place(&mut depths);
    if depth < 0.0 {
        log::debug!("object rejected: median depth {depth:.3} behind the camera");
        return Ok(ObjectBoundingBox::Rejected(Rejection::BehindCamera));
    }

    if params.scale != 1.0 {
        let w2 = (params.scale - 1.0) * bbox.width() as f64 / 2.0;
        let h2 = (params.scale - 1.0) * bbox.height() as f64 / 2.0;
        bbox = BoundingBox {
            left: (bbox.left as f64 - w2).max(0.0) as i32,
            right: (bbox.right as f64 + w2).min(width - 1.0) as i32,
            top: (bbox.top as f64 - h2).max(0.0) as i32,
            bottom: (bbox.bottom as f64 + h2).min(height - 1.0) as i32,
        };
    }

    Ok(ObjectBoundingBox::Visible(ObjectDetection {
        points: inside.iter().map(|p| [p[0] as i32, p[1] as i32]).collect(),
        bbox,
        depth,
    }))
}
