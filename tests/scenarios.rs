//! End-to-end behavior of the 1D, 2D and 3D splines.

use equidistant_bsplines::prelude::*;
use equidistant_bsplines::MAX_ORDER;

fn full() -> (BoundaryCondition, BoundaryCondition) {
    (BoundaryCondition::Full, BoundaryCondition::Full)
}

#[test]
fn piecewise_constant() {
    let spline = BSpline1::with_weights(0.0, 2.0, 2, 1, &[1.0, 2.0]).unwrap();
    assert_eq!(spline.evaluate(0.5), 1.0);
    assert_eq!(spline.evaluate(1.5), 2.0);
}

#[test]
fn piecewise_linear() {
    let spline = BSpline1::with_weights(0.0, 2.0, 2, 2, &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(spline.carrier().knots(), &[0.0, 1.0, 2.0]);
    assert_eq!(spline.evaluate(0.5), 1.5);
    assert_eq!(spline.evaluate(1.5), 2.5);
}

#[test]
fn seam_is_continuous_for_every_order() {
    let (lower, upper) = full();
    for k in 1..=MAX_ORDER {
        let carrier = Carrier::with_domain(-1.0, 2.0, 5, k).unwrap();
        let weights: Vec<f64> = (0..carrier.weight_count())
            .map(|i| ((i * 7 + 3) % 5) as f64 - 1.5)
            .collect();
        let spline = BSpline1::from_carrier(&carrier, &weights, lower, upper).unwrap();

        let a = spline.lower_bound();
        let b = spline.upper_bound();
        let lower_gap = spline.evaluate(a) - spline.lower_taylor().evaluate(0.0);
        let upper_gap = spline.evaluate(b) - spline.upper_taylor().evaluate(0.0);
        assert!(lower_gap.abs() < 1e-12, "order {k}");
        assert!(upper_gap.abs() < 1e-12, "order {k}");

        // Just outside the domain the polynomial continues the spline.
        let eps = 1e-7;
        assert!((spline.evaluate(a - eps) - spline.evaluate(a)).abs() < 1e-5);
        assert!((spline.evaluate(b + eps) - spline.evaluate(b)).abs() < 1e-5);
    }
}

#[test]
fn differentiate_then_integrate_restores_function() {
    for k in 2..MAX_ORDER {
        let weights: Vec<f64> = (0..4 + k - 1).map(|i| (i as f64).sin() * 3.0).collect();
        let original = BSpline1::with_weights(0.0, 4.0, 4, k, &weights).unwrap();

        let mut spline = original.clone();
        spline.differentiate();
        assert_eq!(spline.order(), k - 1);

        let x0 = 1.3;
        spline.integrate(x0, original.evaluate(x0));
        assert_eq!(spline.order(), k);

        for i in 0..=40 {
            let x = 4.0 * i as f64 / 40.0;
            assert!(
                (spline.evaluate(x) - original.evaluate(x)).abs() < 1e-10,
                "order {k}, x = {x}"
            );
        }
    }
}

#[test]
fn inverse_of_monotone_spline() {
    let weights = [0.0, 0.5, 1.5, 1.75, 3.0, 4.0, 6.0];
    let spline = BSpline1::with_weights(0.0, 1.0, 4, 4, &weights).unwrap();

    for i in 0..=20 {
        let x = i as f64 / 20.0;
        let y = spline.evaluate(x);
        assert!((spline.inverse(y) - x).abs() < 1e-6, "x = {x}");
    }

    // Targets beyond the endpoint values clip.
    assert_eq!(spline.inverse(-10.0), 0.0);
    assert_eq!(spline.inverse(100.0), 1.0);
}

#[test]
fn constant_extension_along_z() {
    // A 3D spline whose weights do not depend on iz equals the 2D spline.
    let (lower, upper) = full();
    let mut surface = BSpline2::new(6, 4).unwrap();
    surface.set_carrier(Axis::X, 0.0, 3.0, 3, 3, lower, upper).unwrap();
    surface.set_carrier(Axis::Y, -1.0, 1.0, 4, 2, lower, upper).unwrap();
    let weights2: Vec<f64> = (0..surface.number_of_weights())
        .map(|i| (i as f64 * 0.7).cos())
        .collect();
    surface.set_weights(&weights2).unwrap();

    let mut volume = BSpline3::new(6, 4).unwrap();
    volume.set_carrier(Axis::X, 0.0, 3.0, 3, 3, lower, upper).unwrap();
    volume.set_carrier(Axis::Y, -1.0, 1.0, 4, 2, lower, upper).unwrap();
    volume.set_carrier(Axis::Z, 10.0, 12.0, 2, 4, lower, upper).unwrap();

    let wx = volume.x().weight_count();
    let wy = volume.y().weight_count();
    let wz = volume.z().weight_count();
    let mut weights3 = vec![0.0; volume.number_of_weights()];
    for ix in 0..wx {
        for iy in 0..wy {
            for iz in 0..wz {
                weights3[volume.index(ix, iy, iz)] = weights2[surface.index(ix, iy)];
            }
        }
    }
    volume.set_weights(&weights3).unwrap();

    for &(x, y) in &[(0.2, -0.8), (1.5, 0.0), (2.9, 0.95), (-0.5, 1.5)] {
        for &z in &[10.0, 11.3, 12.0, 13.0] {
            let expected = surface.evaluate(x, y);
            assert!((volume.evaluate_at(x, y, z) - expected).abs() < 1e-12);
            assert!((volume.derivative_x_at(x, y, z) - surface.dx(x, y)).abs() < 1e-10);
        }
    }
}

#[test]
fn profile_cache_survives_repeated_x_evaluation() {
    let (lower, upper) = full();
    let mut volume = BSpline3::new(8, 4).unwrap();
    volume.set_carrier(Axis::X, 0.0, 1.0, 8, 4, lower, upper).unwrap();
    volume.set_carrier(Axis::Y, 0.0, 1.0, 3, 3, lower, upper).unwrap();
    volume.set_carrier(Axis::Z, 0.0, 1.0, 2, 2, lower, upper).unwrap();
    let weights: Vec<f64> = (0..volume.number_of_weights())
        .map(|i| ((i * 13) % 11) as f64)
        .collect();
    volume.set_weights(&weights).unwrap();

    volume.preset(0.4, 0.6);
    let first = volume.evaluate(0.30);
    let snapshot = volume.profile_cache().values().to_vec();
    let builds = volume.profile_cache().builds();

    let second = volume.evaluate(0.32);
    assert_eq!(volume.profile_cache().values(), snapshot.as_slice());
    assert_eq!(volume.profile_cache().builds(), builds);
    assert_ne!(first, second);

    assert!((first - volume.value_at(0.30, 0.4, 0.6)).abs() < 1e-12);
    assert!((second - volume.value_at(0.32, 0.4, 0.6)).abs() < 1e-12);

    // A sweep along X builds every entry exactly once.
    let xs: Vec<f64> = (0..=50).map(|i| i as f64 / 50.0).collect();
    volume.evaluate_many(&xs, 0.4, 0.6);
    let total = volume.profile_cache().builds();
    assert_eq!(total, volume.x().weight_count());
    volume.evaluate_many(&xs, 0.4, 0.6);
    assert_eq!(volume.profile_cache().builds(), total);
}

#[test]
fn invert_3d_along_x() {
    let (lower, upper) = full();
    let mut volume = BSpline3::new(8, 4).unwrap();
    volume.set_carrier(Axis::X, 0.0, 2.0, 4, 3, lower, upper).unwrap();
    volume.set_carrier(Axis::Y, 0.0, 1.0, 2, 2, lower, upper).unwrap();
    volume.set_carrier(Axis::Z, 0.0, 1.0, 2, 2, lower, upper).unwrap();
    // Increasing in x, scaled by 1 + y + z.
    let weights: Vec<f64> = (0..volume.number_of_weights())
        .map(|i| {
            let (x, y, z) = volume.weight_position(i);
            (x * x + x) * (1.0 + y + z)
        })
        .collect();
    volume.set_weights(&weights).unwrap();

    let (y, z) = (0.3, 0.8);
    for &x in &[0.1, 0.75, 1.6] {
        let target = volume.value_at(x, y, z);
        let found = volume.inv_x(target, y, z);
        assert!((volume.value_at(found, y, z) - target).abs() < 1e-7, "x = {x}");
        assert!((found - x).abs() < 1e-6, "x = {x}, found {found}");
    }
}
