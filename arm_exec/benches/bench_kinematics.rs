//! # Kinematics Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use arm_lib::arm_ctrl::{CartesianCoords, KinematicsConverter, Params};
use comms_if::eqpt::mech::JointId;

fn kinematics_benchmark(c: &mut Criterion) {
    let kin = KinematicsConverter::new(Params {
        base_height_in: 12.0,
        shoulder_length_in: 30.0,
        forearm_length_in: 30.0,
        min_angle_rad: [-3.0, -0.5, -2.8],
        max_angle_rad: [3.0, 2.5, 2.8],
        nudge_joint: JointId::Turret,
        max_nudge_rate_rads: 1.0,
        starting_coords_in: [0.0, 24.0, 20.0],
    });

    let angles = [0.3, 1.2, -1.4];
    let current = [0.0, 1.0, -1.0];
    let target = CartesianCoords::new(-35.0, 4.0, 0.0);

    c.bench_function("KinematicsConverter::forward", |b| {
        b.iter(|| kin.forward(black_box(&angles)))
    });

    c.bench_function("KinematicsConverter::inverse", |b| {
        b.iter(|| kin.inverse(black_box(&target), black_box(&current)))
    });
}

criterion_group!(benches, kinematics_benchmark);
criterion_main!(benches);
