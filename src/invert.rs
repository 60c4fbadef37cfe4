//! Bracketing root finders used to invert splines.

use crate::DELTA;
use core::num::NonZeroU16;
use tracing::warn;

/// Iteration count of the 1D Illinois solver.
pub const ILLINOIS_ITERATIONS: u16 = 30;

/// Iteration count of the secant solver used along X of a 3D spline.
pub const SECANT_ITERATIONS: u16 = 100;

/// Options for spline inversion.
///
/// Both fields fall back to the solver's own defaults when `None`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InverseOptions {
    /// Upper bound on solver iterations.
    pub max_iterations: Option<NonZeroU16>,
    /// Residual tolerance. The 1D solver scales it by the target value,
    /// the 3D secant solver uses it as an absolute bound. Defaults to
    /// [`DELTA`].
    pub tolerance: Option<f64>,
}

impl InverseOptions {
    #[inline]
    fn iterations(&self, default: u16) -> usize {
        self.max_iterations.map_or(default, NonZeroU16::get) as usize
    }

    #[inline]
    fn tolerance(&self) -> f64 {
        self.tolerance.unwrap_or(DELTA)
    }
}

/// Solve `function(x) == y` on `[lower, upper]`.
///
/// Targets outside the endpoint values are clipped to the nearer endpoint.
/// Otherwise one bisection step is followed by regula falsi with the
/// Illinois modification: whenever the sign of the residual does not flip
/// the retained end's residual is halved. A final Newton step using
/// `derivative` polishes the result.
pub fn illinois<F, D>(
    function: F,
    derivative: D,
    y: f64,
    lower: f64,
    upper: f64,
    options: &InverseOptions,
) -> f64
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let mut x1 = lower;
    let mut x2 = upper;
    let mut f1 = function(x1);
    let mut f2 = function(x2);

    if f2 > f1 {
        if y >= f2 {
            return upper;
        }
        if y <= f1 {
            return lower;
        }
    } else {
        if y >= f1 {
            return lower;
        }
        if y <= f2 {
            return upper;
        }
    }

    f1 -= y;
    f2 -= y;

    // The residual bound scales with the target and so degenerates at
    // y <= 0, where only the abscissa bound ends the loop.
    let epsilon_x = f64::EPSILON * (upper - lower).abs();
    let epsilon_f = options.tolerance() * y + epsilon_x;

    if f1.abs() < epsilon_f {
        return x1;
    }
    if f2.abs() < epsilon_f {
        return x2;
    }

    let z = 0.5 * (x1 + x2);
    let fz = function(z) - y;
    if f2 * fz < 0.0 {
        x1 = x2;
        f1 = f2;
    } else {
        f1 *= 0.5;
    }
    x2 = z;
    f2 = fz;

    for _ in 0..options.iterations(ILLINOIS_ITERATIONS) {
        if (x2 - x1).abs() < epsilon_x || f2.abs() < epsilon_f {
            break;
        }

        let z = if f2 != f1 {
            x1 - f1 * (x2 - x1) / (f2 - f1)
        } else {
            0.5 * (x1 + x2)
        };
        let fz = function(z) - y;

        if fz * f2 < 0.0 {
            x1 = x2;
            f1 = f2;
        } else {
            f1 *= 0.5;
        }
        x2 = z;
        f2 = fz;
    }

    let slope = derivative(x2);
    if slope != 0.0 && slope.is_finite() {
        x2 -= f2 / slope;
    } else {
        warn!(x = x2, residual = f2, "vanishing slope, skipping Newton step");
    }
    x2
}

/// Solve `function(x) == target` on `[lower, upper]` with a secant
/// iteration that retains the last bracketing point.
///
/// Runs only if the endpoint residuals differ in sign; otherwise `upper`
/// is returned unchanged.
pub fn secant_retained<F>(
    mut function: F,
    target: f64,
    lower: f64,
    upper: f64,
    options: &InverseOptions,
) -> f64
where
    F: FnMut(f64) -> f64,
{
    let tolerance = options.tolerance();
    let mut x0 = lower;
    let mut x1 = upper;
    let mut f0 = function(x0) - target;
    let mut f1 = function(x1) - target;

    if f0 * f1 < 0.0 {
        let mut rx = x0;
        let mut rf = f0;

        for _ in 0..options.iterations(SECANT_ITERATIONS) {
            if f1.abs() < tolerance {
                break;
            }

            let df = f1 - f0;
            if df.abs() > 0.0 {
                let x = x1 - f1 * (x1 - x0) / df;
                x0 = x1;
                f0 = f1;
                x1 = x;
                f1 = function(x1) - target;

                if rf * f1 < 0.0 {
                    rx = x0;
                    rf = f0;
                }
            } else {
                let xn = x1 - f1 * (x1 - rx) / (f1 - rf);
                let fn_ = function(xn) - target;

                if rf * fn_ < 0.0 {
                    x1 = xn;
                    f1 = fn_;
                } else {
                    rx = xn;
                    rf = fn_;
                    x0 = xn;
                    f0 = fn_;
                }
            }
        }
    }

    x1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illinois_square_root() {
        let options = InverseOptions::default();
        let x =
            illinois(|x| x * x, |x| 2.0 * x, 2.0, 0.0, 2.0, &options);
        assert!((x - 2f64.sqrt()).abs() < 1e-9, "{x}");

        // Clipped to the nearer endpoint.
        assert_eq!(illinois(|x| x * x, |x| 2.0 * x, 5.0, 0.0, 2.0, &options), 2.0);
        assert_eq!(illinois(|x| x * x, |x| 2.0 * x, -1.0, 0.0, 2.0, &options), 0.0);
    }

    #[test]
    fn illinois_decreasing() {
        let options = InverseOptions::default();
        let x = illinois(|x| 3.0 - x, |_| -1.0, 1.25, 0.0, 2.0, &options);
        assert!((x - 1.75).abs() < 1e-12);

        assert_eq!(illinois(|x| 3.0 - x, |_| -1.0, 9.0, 0.0, 2.0, &options), 0.0);
        assert_eq!(illinois(|x| 3.0 - x, |_| -1.0, 0.0, 0.0, 2.0, &options), 2.0);
    }

    #[test]
    fn secant_monotone() {
        let options = InverseOptions::default();
        let x = secant_retained(|x| x * x * x + x, 2.0, 0.0, 2.0, &options);
        assert!((x - 1.0).abs() < 1e-6, "{x}");

        // No sign change: the upper bound comes back untouched.
        let x = secant_retained(|x| x * x * x + x, 20.0, 0.0, 2.0, &options);
        assert_eq!(x, 2.0);
    }

    #[test]
    fn iteration_cap() {
        let options = InverseOptions {
            max_iterations: NonZeroU16::new(1),
            tolerance: None,
        };
        let mut calls = 0;
        secant_retained(
            |x| {
                calls += 1;
                x * x * x
            },
            1.0,
            -1.0,
            2.0,
            &options,
        );
        assert_eq!(calls, 3);
    }
}
