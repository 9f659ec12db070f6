use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::DVec3;
use kornia_camera::camera::Camera;
use kornia_camera::depth::DepthCamera;
use kornia_camera::extrinsics::Extrinsics;
use kornia_camera::pose::{
    compute_epipole, fundamental_7point, fundamental_8point, ransac_fundamental,
    sampson_distance, RansacParams,
};
use kornia_camera::visibility::{object_bounding_box, BoundingBoxParams};
use ndarray::Array2;

/// Generate a deterministic point cloud in front of the camera.
fn generate_points(n: usize) -> Vec<[f64; 3]> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            [
                (t * 0.37).sin() * 1.5,
                (t * 0.73).cos() * 1.0,
                4.0 + (t * 0.11).sin().abs() * 4.0,
            ]
        })
        .collect()
}

/// Generate correspondences between two simulated views of the same cloud.
fn generate_correspondences(n: usize) -> (Vec<[f64; 2]>, Vec<[f64; 2]>) {
    let points = generate_points(n);
    let mut camera = Camera::simulate();
    let x1 = camera.project(&points);
    camera.set_pose(Extrinsics::from_axis_angle(
        DVec3::new(0.05, -0.25, 0.1),
        DVec3::new(-0.6, 0.1, 0.2),
    ));
    let x2 = camera.project(&points);
    (x1, x2)
}

fn bench_project(c: &mut Criterion) {
    let mut group = c.benchmark_group("project");
    let camera = Camera::simulate();
    for &n in &[100, 1000, 10000] {
        let points = generate_points(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                std::hint::black_box(camera.project(&points));
            });
        });
    }
    group.finish();
}

fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    for &skip in &[1, 2, 4] {
        let Ok(camera) = DepthCamera::new(
            kornia_camera::kinect_v1::k_depth(),
            (480, 640),
            skip,
            Default::default(),
        ) else {
            continue;
        };
        let depth = Array2::from_elem(camera.mesh_shape(), 2.0);
        group.bench_with_input(BenchmarkId::from_parameter(skip), &skip, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(camera.reconstruct(depth.view()));
            });
        });
    }
    group.finish();
}

fn bench_fundamental(c: &mut Criterion) {
    let mut group = c.benchmark_group("fundamental_8point");
    for &n in &[8, 50, 200] {
        let (x1, x2) = generate_correspondences(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(fundamental_8point(&x1, &x2));
            });
        });
    }
    group.finish();

    let (x1, x2) = generate_correspondences(7);
    c.bench_function("fundamental_7point", |b| {
        b.iter(|| {
            let _ = std::hint::black_box(fundamental_7point(&x1, &x2));
        });
    });
}

fn bench_sampson_distance(c: &mut Criterion) {
    let (x1, x2) = generate_correspondences(16);
    let Ok(f) = fundamental_8point(&x1, &x2) else {
        return;
    };
    c.bench_function("sampson_distance", |b| {
        b.iter(|| {
            std::hint::black_box(sampson_distance(&f, &x1[0], &x2[0]));
        });
    });
    c.bench_function("compute_epipole", |b| {
        b.iter(|| {
            let _ = std::hint::black_box(compute_epipole(&f));
        });
    });
}

fn bench_ransac_fundamental(c: &mut Criterion) {
    let mut group = c.benchmark_group("ransac_fundamental");
    let params = RansacParams {
        max_iterations: 200,
        ..Default::default()
    };
    for &n in &[50, 200] {
        let (x1, mut x2) = generate_correspondences(n);
        // corrupt every fifth correspondence
        for (i, p) in x2.iter_mut().enumerate().step_by(5) {
            *p = [p[0] + 40.0 + i as f64, p[1] - 25.0];
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let _ = std::hint::black_box(ransac_fundamental(&x1, &x2, &params));
            });
        });
    }
    group.finish();
}

fn bench_object_bounding_box(c: &mut Criterion) {
    let camera = Camera::simulate();
    let points = generate_points(10000);
    let params = BoundingBoxParams::default();
    c.bench_function("object_bounding_box", |b| {
        b.iter(|| {
            let _ = std::hint::black_box(object_bounding_box(&camera, &points, &params));
        });
    });
}

criterion_group!(
    benches,
    bench_project,
    bench_reconstruct,
    bench_fundamental,
    bench_sampson_distance,
    bench_ransac_fundamental,
    bench_object_bounding_box,
);
criterion_main!(benches);
