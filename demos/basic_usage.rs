//! Basic usage example for equidistant-bsplines

use equidistant_bsplines::interp::{CubicSpline, EquidistantLinearSpline, LinearSpline};
use equidistant_bsplines::prelude::*;

fn main() -> Result<(), SplineError> {
    println!("=== Basic B-Spline Example ===\n");

    // Example 1: A cubic curve on [0, 1] with 4 intervals
    println!("1D cubic B-spline:");
    let weights = [0.0, 0.0, 1.0, 4.0, 3.0, 3.0, 2.0];
    let mut curve = BSpline1::with_weights(0.0, 1.0, 4, 4, &weights)?;

    for x in [0.0, 0.25, 0.5, 0.75, 1.0] {
        println!(
            "  f({:.2}) = {:.4}   f'({:.2}) = {:.4}",
            x,
            curve.evaluate(x),
            x,
            curve.derivative(x)
        );
    }

    // Example 2: Boundary polynomials continue the curve
    println!("\nExtrapolation with natural boundaries (order K - 1):");
    for x in [-0.5, -0.1, 1.1, 1.5] {
        println!("  f({:.2}) = {:.4}", x, curve.evaluate(x));
    }
    curve.set_taylor_orders(TaylorOrders::new(4, 4));
    println!("Extrapolation with full boundaries (order K):");
    for x in [-0.5, -0.1, 1.1, 1.5] {
        println!("  f({:.2}) = {:.4}", x, curve.evaluate(x));
    }

    // Example 3: Inversion of a monotone curve
    println!("\nInversion:");
    let monotone = BSpline1::with_weights(
        0.0,
        1.0,
        4,
        4,
        &[0.0, 0.0, 1.0, 2.0, 4.0, 8.0, 16.0],
    )?;
    let y_target = 3.0;
    let x = monotone.inverse(y_target);
    println!("  For y = {}, x = {:.6}", y_target, x);
    println!("  Verification: f({:.6}) = {:.6}", x, monotone.evaluate(x));

    // Example 4: Calculus changes the order
    println!("\nCalculus:");
    let mut integral = curve.clone();
    integral.integrate(0.0, 0.0);
    println!("  order {} -> {} after integrating", curve.order(), integral.order());
    println!("  integral over [0, 1] = {:.6}", integral.evaluate(1.0));
    integral.differentiate();
    println!(
        "  differentiated back: f(0.5) = {:.6} (was {:.6})",
        integral.evaluate(0.5),
        curve.evaluate(0.5)
    );

    // Example 5: A surface
    println!("\n2D surface (bilinear):");
    let mut surface = BSpline2::new(4, 4)?;
    surface.set_carrier(Axis::X, 0.0, 1.0, 1, 2, BoundaryCondition::Full, BoundaryCondition::Full)?;
    surface.set_carrier(Axis::Y, 0.0, 1.0, 1, 2, BoundaryCondition::Full, BoundaryCondition::Full)?;
    // X runs fastest: (0,0), (1,0), (0,1), (1,1)
    surface.set_weights(&[0.0, 1.0, 2.0, 3.0])?;
    for (x, y) in [(0.0, 0.0), (0.5, 0.5), (1.0, 1.0), (2.0, 0.0)] {
        println!("  f({:.1}, {:.1}) = {:.4}", x, y, surface.evaluate(x, y));
    }

    // Example 6: Interpolants over sample points
    println!("\nSample point interpolants at x = 0.5:");
    let xs = [0.0, 1.0, 2.0];
    let ys = [0.0, 1.0, 0.0];
    println!("  Cubic (natural): {:.4}", CubicSpline::natural(&xs, &ys)?.evaluate(0.5));
    println!("  Linear:          {:.4}", LinearSpline::new(&xs, &ys)?.evaluate(0.5));
    let even = EquidistantLinearSpline::new(&xs, &ys)?;
    println!("  Equidistant:     {:.4}", even.evaluate(0.5)?);
    println!("  Integral 0..2:   {:.4}", even.integral(0.0, 2.0)?);

    // Example 7: Error handling
    println!("\nError handling:");
    match BSpline1::with_weights(0.0, 1.0, 4, 4, &[1.0, 2.0]) {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  Error: {}", e),
    }
    match BSpline1::with_weights(1.0, 0.0, 4, 4, &weights) {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  Error: {}", e),
    }

    Ok(())
}
