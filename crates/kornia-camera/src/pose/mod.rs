//! # Two-view geometry
//!
//! Epipolar geometry between two views of the same scene from 2D correspondences.
//!
//! - [`fundamental`]: fundamental matrix solvers (7-point, normalized 8-point) and the Sampson distance
//! - [`ransac`]: robust estimation (RANSAC, LMedS) and the [`compute_fundamental`] entry point
//! - [`essential`]: essential matrix, epipoles and relative pose candidates

/// Fundamental matrix solvers.
pub mod fundamental;
pub use fundamental::{fundamental_7point, fundamental_8point, normalize_points_2d, sampson_distance};

/// Robust fundamental matrix estimation.
pub mod ransac;
pub use ransac::*;

/// Essential matrix and epipoles.
pub mod essential;
pub use essential::*;
