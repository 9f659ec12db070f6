use argh::FromArgs;
use glam::DVec3;
use rand::{Rng, SeedableRng};

use kornia_camera::extrinsics::Extrinsics;
use kornia_camera::pose::{
    compute_epipole, compute_essential, compute_fundamental, FundamentalMethod, LmedsParams,
    RansacParams,
};
use kornia_camera::visibility::{check_visibility, object_bounding_box, BoundingBoxParams};
use kornia_camera::Camera;

#[derive(FromArgs)]
/// Simulate a camera looking at a box shaped object and estimate two-view geometry
struct Args {
    /// distance of the object to the camera in meters
    #[argh(option, short = 'd', default = "4.0")]
    distance: f64,

    /// number of points sampled on the object
    #[argh(option, short = 'n', default = "2000")]
    num_points: usize,

    /// scale factor of the bounding box
    #[argh(option, short = 's', default = "1.0")]
    scale: f64,

    /// fraction of corrupted correspondences in the second view
    #[argh(option, default = "0.2")]
    outlier_ratio: f64,

    /// use LMedS instead of RANSAC
    #[argh(switch)]
    lmeds: bool,

    /// use the Kinect v1 depth calibration instead of the simulated camera
    #[argh(switch)]
    kinect: bool,

    /// print the camera as JSON
    #[argh(switch)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut camera = if args.kinect {
        let mut camera = Camera::kinect(glam::DMat3::IDENTITY, DVec3::ZERO)?;
        camera
            .intrinsics_mut()
            .set_shape(Some(kornia_camera::ImageShape::new(
                kornia_camera::kinect_v1::HEIGHT,
                kornia_camera::kinect_v1::WIDTH,
                1,
            )));
        camera
    } else {
        Camera::simulate()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&camera)?);
    }

    let [fov_x, fov_y] = camera.field_of_view();
    println!(
        "Field of view: {:.1} x {:.1} degrees",
        fov_x.to_degrees(),
        fov_y.to_degrees()
    );

    // sample points on a 1m box in front of the camera
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let points: Vec<[f64; 3]> = (0..args.num_points)
        .map(|_| {
            [
                rng.random_range(-0.5..0.5),
                rng.random_range(-0.5..0.5),
                args.distance + rng.random_range(-0.5..0.5),
            ]
        })
        .collect();

    let visible = check_visibility(&camera, &points).iter().filter(|&&v| v).count();
    println!("Visible points: {visible}/{}", points.len());

    let params = BoundingBoxParams {
        scale: args.scale,
        ..Default::default()
    };
    match object_bounding_box(&camera, &points, &params)?.detection() {
        Some(detection) => println!(
            "Object box: left={} right={} top={} bottom={}, depth {:.3} m",
            detection.bbox.left,
            detection.bbox.right,
            detection.bbox.top,
            detection.bbox.bottom,
            detection.depth
        ),
        None => println!("Object is not visible"),
    }

    // second view: move the camera sideways and corrupt some correspondences
    let x1 = camera.project(&points);
    camera.set_pose(Extrinsics::from_axis_angle(
        DVec3::new(0.0, -0.1, 0.0),
        DVec3::new(-0.5, 0.0, 0.1),
    ));
    let mut x2 = camera.project(&points);
    let mut outliers = 0;
    for p in x2.iter_mut() {
        if rng.random_bool(args.outlier_ratio.clamp(0.0, 1.0)) {
            *p = [rng.random_range(0.0..640.0), rng.random_range(0.0..480.0)];
            outliers += 1;
        }
    }
    log::info!("corrupted {outliers} correspondences");

    let method = if args.lmeds {
        FundamentalMethod::Lmeds(LmedsParams::default())
    } else {
        FundamentalMethod::Ransac(RansacParams::default())
    };
    let estimate = compute_fundamental(&x1, &x2, &method)?;
    println!(
        "Fundamental matrix ({} inliers of {}):",
        estimate.inlier_count(),
        x1.len()
    );
    for row in kornia_camera::linalg::mat3_to_rows(&estimate.fundamental) {
        println!("  [{:>12.4e} {:>12.4e} {:>12.4e}]", row[0], row[1], row[2]);
    }

    match compute_epipole(&estimate.fundamental) {
        Ok(e) => println!("Epipole: ({:.2}, {:.2})", e[0], e[1]),
        Err(e) => println!("Epipole: {e}"),
    }

    let essential = compute_essential(&estimate.fundamental, &camera.intrinsics().k());
    log::info!("essential matrix: {essential:?}");

    Ok(())
}
