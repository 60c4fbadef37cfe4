//! Evaluating a 3D spline along X through the profile cache, and saving it
//! in the text format.

use equidistant_bsplines::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SplineError> {
    // `RUST_LOG=equidistant_bsplines=trace` shows every profile entry built.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (lower, upper) = (BoundaryCondition::Full, BoundaryCondition::Full);
    let mut volume = BSpline3::new(8, 4)?;
    volume.set_carrier(Axis::X, 0.0, 10.0, 8, 4, lower, upper)?;
    volume.set_carrier(Axis::Y, 0.0, 1.0, 3, 3, lower, upper)?;
    volume.set_carrier(Axis::Z, -1.0, 1.0, 2, 2, lower, upper)?;

    // f(x, y, z) = x * (1 + y) + z, sampled at the weight positions.
    let weights: Vec<f64> = (0..volume.number_of_weights())
        .map(|i| {
            let (x, y, z) = volume.weight_position(i);
            x * (1.0 + y) + z
        })
        .collect();
    volume.set_weights(&weights)?;

    println!("=== Profile cache ===\n");
    volume.preset(0.5, 0.25);
    for x in [0.5, 0.7, 0.9, 5.0, 9.9] {
        let value = volume.evaluate(x);
        println!(
            "  f({:.1}, 0.5, 0.25) = {:8.4}   entries built so far: {}",
            x,
            value,
            volume.profile_cache().builds()
        );
    }

    println!("\nInverse along X:");
    let x = volume.inv_x(6.0, 0.5, 0.25);
    println!("  f(x, 0.5, 0.25) = 6 at x = {:.6}", x);

    println!("\nPartial derivative along Y at (4, 0.5, 0.25):");
    println!("  {:.6}", volume.partial(4.0, 0.5, 0.25, [0, 1, 0]));

    println!("\nText format:");
    let mut text = Vec::new();
    if volume.save(&mut text, "demo.volume") {
        for line in String::from_utf8_lossy(&text).lines().take(8) {
            println!("  {line}");
        }
        println!("  ...");
    }

    Ok(())
}
