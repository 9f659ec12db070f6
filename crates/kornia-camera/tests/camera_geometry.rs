use approx::assert_relative_eq;
use glam::{DMat3, DVec3};
use kornia_camera::intrinsics::construct_k;
use kornia_camera::pose::{
    compute_epipole, compute_essential, compute_fundamental, decompose_essential,
    FundamentalMethod, RansacParams,
};
use kornia_camera::visibility::{
    check_visibility, object_bounding_box, BoundingBoxParams, ObjectBoundingBox, Rejection,
};
use kornia_camera::{Camera, CameraError, DepthCamera, Extrinsics, Intrinsics};
use ndarray::Array2;

fn cube_cloud(center: [f64; 3], half_size: f64, steps: usize) -> Vec<[f64; 3]> {
    let mut points = Vec::new();
    let delta = 2.0 * half_size / steps as f64;
    for i in 0..=steps {
        for j in 0..=steps {
            for k in 0..=steps {
                points.push([
                    center[0] - half_size + delta * i as f64,
                    center[1] - half_size + delta * j as f64,
                    center[2] - half_size + delta * k as f64,
                ]);
            }
        }
    }
    points
}

#[test]
fn field_of_view_from_centered_principal_point() {
    let (w, h, f) = (800.0, 600.0, 700.0);
    let intrinsics = Intrinsics::new(f, f, w / 2.0, h / 2.0).expect("valid intrinsics");
    let [fov_x, fov_y] = intrinsics.field_of_view();
    assert_relative_eq!(fov_x, 2.0 * (400.0f64 / 700.0).atan());
    assert_relative_eq!(fov_y, 2.0 * (300.0f64 / 700.0).atan());
}

#[test]
fn simulated_camera_projects_optical_axis_to_principal_point() {
    let camera = Camera::simulate();
    let p = camera.projection_matrix();
    // homogeneous world origin maps to the direction of (cx, cy, 1) times t = 0
    assert_eq!([p[0][3], p[1][3], p[2][3]], [0.0, 0.0, 0.0]);

    let uv = camera.project(&[[0.0, 0.0, 3.0], [0.0, 0.0, 30.0]]);
    for px in uv {
        assert_relative_eq!(px[0], 320.0);
        assert_relative_eq!(px[1], 240.0);
    }

    let behind = camera.project(&[[0.0, 0.0, -1.0]]);
    assert!(behind[0][0].is_nan() && behind[0][1].is_nan());
}

#[test]
fn factor_recovers_calibration_and_pose() {
    let k = construct_k(640.0, 620.0, 330.0, 245.0);
    let pose = Extrinsics::from_axis_angle(DVec3::new(-0.2, 0.35, 0.05), DVec3::new(0.4, -0.3, 2.5));
    let camera = Camera::new(Intrinsics::from_matrix(k).expect("valid K"), pose);

    let factors = camera.factor().expect("well conditioned camera");
    assert!(factors.k.abs_diff_eq(k, 1e-8));
    assert!(factors.r.abs_diff_eq(pose.rotation(), 1e-9));
    assert!(factors.t.abs_diff_eq(pose.translation(), 1e-9));
}

#[test]
fn depth_camera_reconstructs_constant_depth() {
    let camera = DepthCamera::kinect().expect("kinect preset");
    let (height, width) = camera.mesh_shape();
    let d = 1.5;
    let points = camera
        .reconstruct(Array2::from_elem((height, width), d).view())
        .expect("matching shape");

    let (fx, fy) = (camera.intrinsics().fx(), camera.intrinsics().fy());
    let (cx, cy) = (camera.intrinsics().cx(), camera.intrinsics().cy());
    assert_relative_eq!(points[[0, 0, 0]], -cx / fx * d);
    assert_relative_eq!(points[[0, 0, 1]], -cy / fy * d);
    assert_relative_eq!(points[[height - 1, width - 1, 0]], (639.0 - cx) / fx * d);
    assert_relative_eq!(points[[height - 1, width - 1, 1]], (479.0 - cy) / fy * d);
    assert!(points.iter().skip(2).step_by(3).all(|&z| z == d));

    // the center pixel is half a pixel off the principal point
    assert!(points[[240, 320, 0]].abs() < 1.0 / fx * d);
    assert!(points[[240, 320, 1]].abs() < 1.0 / fy * d);
}

#[test]
fn depth_camera_rejects_wrong_shape() {
    let camera = DepthCamera::new(
        construct_k(500.0, 500.0, 320.0, 240.0),
        (480, 640),
        4,
        Default::default(),
    )
    .expect("valid depth camera");
    assert_eq!(camera.mesh_shape(), (120, 160));

    for shape in [(480, 640), (120, 161), (0, 0)] {
        let result = camera.reconstruct(Array2::<f64>::zeros(shape).view());
        assert!(matches!(result, Err(CameraError::ShapeMismatch { .. })));
    }
}

#[test]
fn two_view_pipeline_recovers_epipolar_geometry() {
    let k = construct_k(500.0, 500.0, 320.0, 240.0);
    let first = Camera::from_parts(k, DMat3::IDENTITY, DVec3::ZERO).expect("valid camera");
    let pose = Extrinsics::from_axis_angle(DVec3::new(0.02, 0.2, -0.05), DVec3::new(0.8, -0.1, 0.3));
    let second = Camera::new(first.intrinsics().clone(), pose);

    let cloud = cube_cloud([0.2, -0.1, 6.0], 1.5, 4);
    let x1 = first.project(&cloud);
    let mut x2 = second.project(&cloud);
    // corrupt every sixth correspondence
    for (i, p) in x2.iter_mut().enumerate().step_by(6) {
        *p = [p[0] + 35.0 + (i % 7) as f64 * 5.0, p[1] - 20.0];
    }

    let estimate = compute_fundamental(&x1, &x2, &FundamentalMethod::Ransac(RansacParams::default()))
        .expect("RANSAC succeeds");
    for (i, inlier) in estimate.inliers.iter().enumerate() {
        if i % 6 != 0 {
            assert!(inlier, "correspondence {i} should be an inlier");
        }
    }

    // the right epipole is the second camera center seen from the first camera
    let center = pose.inverse().translation();
    let expected = k * center;
    let epipole = compute_epipole(&estimate.fundamental).expect("finite epipole");
    assert_relative_eq!(epipole[0], expected.x / expected.z, epsilon = 1e-2);
    assert_relative_eq!(epipole[1], expected.y / expected.z, epsilon = 1e-2);
    assert_eq!(epipole[2], 1.0);

    // one of the essential decompositions is the true relative pose
    let e = compute_essential(&estimate.fundamental, &k);
    let t = pose.translation().normalize();
    let found = decompose_essential(&e)
        .iter()
        .any(|(r, tc)| r.abs_diff_eq(pose.rotation(), 1e-4) && tc.abs_diff_eq(t, 1e-4));
    assert!(found);
}

#[test]
fn visibility_of_axis_and_behind_points() {
    let camera = Camera::simulate();
    let points = [[0.0, 0.0, 1.0], [0.0, 0.0, 100.0], [0.0, 0.0, -1.0], [0.3, -0.2, -2.0]];
    assert_eq!(
        check_visibility(&camera, &points),
        vec![true, true, false, false]
    );
}

#[test]
fn bounding_box_of_object_cloud() {
    let camera = Camera::simulate();
    let cloud = cube_cloud([0.0, 0.0, 5.0], 0.5, 10);

    let params = BoundingBoxParams {
        subsample: 3,
        ..Default::default()
    };
    let unit = object_bounding_box(&camera, &cloud, &params).expect("camera has a shape");
    let larger = object_bounding_box(
        &camera,
        &cloud,
        &BoundingBoxParams {
            scale: 1.5,
            ..params
        },
    )
    .expect("camera has a shape");

    let (Some(unit), Some(larger)) = (unit.detection(), larger.detection()) else {
        panic!("centered cloud should be visible");
    };
    assert!(larger.bbox.area() > unit.bbox.area());
    assert!(unit.bbox.left < 320 && unit.bbox.right > 320);
    assert!(unit.bbox.top < 240 && unit.bbox.bottom > 240);
    assert_relative_eq!(unit.depth, 5.0, epsilon = 0.1);

    let shifted = cube_cloud([50.0, 0.0, 5.0], 0.5, 10);
    assert_eq!(
        object_bounding_box(&camera, &shifted, &params).expect("camera has a shape"),
        ObjectBoundingBox::Rejected(Rejection::OutOfImage)
    );
}

#[test]
fn camera_json_roundtrip() {
    let camera = Camera::kinect(DMat3::IDENTITY, DVec3::new(0.0, 0.0, 1.0)).expect("kinect preset");
    let json = serde_json::to_string(&camera).expect("serialize");
    let back: Camera = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, camera);
}

#[test]
fn camera_json_with_invalid_parameters_is_rejected() -> Result<(), serde_json::Error> {
    let mut value = serde_json::to_value(Camera::simulate())?;

    value["extrinsics"]["rotation"] = serde_json::json!([0.0, 0.0, 1.0, 1.0]);
    assert!(serde_json::from_value::<Camera>(value.clone()).is_err());

    value["extrinsics"]["rotation"] = serde_json::json!([0.0, 0.0, 0.0, 1.0]);
    assert_eq!(serde_json::from_value::<Camera>(value.clone())?, Camera::simulate());

    value["intrinsics"]["k"][0] = serde_json::json!(0.0);
    assert!(serde_json::from_value::<Camera>(value).is_err());
    Ok(())
}
