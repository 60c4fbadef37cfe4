use super::{SortedPoints, EPSILON_SCALE};
use crate::{SplineError, SplineResult};

/// Largest difference between two steps that still counts as equal.
pub const EQUIDISTANCE_TOLERANCE: f64 = 1e-10;

/// Piecewise-linear interpolation of values on evenly spaced nodes of
/// `[x_min, x_max]`.
///
/// Unlike [`LinearSpline`](super::LinearSpline) this does not extrapolate:
/// evaluating outside the interval is an error.
///
/// # Examples
/// ```
/// use equidistant_bsplines::interp::EquidistantLinearSpline;
///
/// let spline = EquidistantLinearSpline::new(&[2.0, 0.0, 1.0], &[4.0, 0.0, 2.0])?;
/// assert_eq!(spline.evaluate(1.5)?, 3.0);
/// assert_eq!(spline.integral(0.0, 2.0)?, 4.0);
/// assert!(spline.evaluate(2.5).is_err());
/// # Ok::<(), equidistant_bsplines::SplineError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EquidistantLinearSpline {
    data: Vec<f64>,
    x_min: f64,
    x_max: f64,
    epsilon: f64,
}

impl EquidistantLinearSpline {
    /// Sorts `(xs[i], ys[i])` by abscissa. The sorted abscissae must be
    /// evenly spaced.
    pub fn new(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        Self::from_points(SortedPoints::new(xs, ys)?)
    }

    /// Takes `xs` as already sorted.
    pub fn from_sorted(xs: &[f64], ys: &[f64]) -> SplineResult<Self> {
        Self::from_points(SortedPoints::from_sorted(xs, ys)?)
    }

    fn from_points(points: SortedPoints) -> SplineResult<Self> {
        points.require(2)?;
        check_equidistance(points.xs())?;
        let xs = points.xs();
        let (x_min, x_max) = (xs[0], xs[xs.len() - 1]);
        check_interval(x_min, x_max)?;
        Ok(Self {
            data: points.ys().to_vec(),
            x_min,
            x_max,
            epsilon: epsilon_for(x_min, x_max),
        })
    }

    /// `len` nodes on `[x_min, x_max]`, all holding `value`.
    pub fn constant(len: usize, value: f64, x_min: f64, x_max: f64) -> SplineResult<Self> {
        check_interval(x_min, x_max)?;
        check_len(len)?;
        Ok(Self {
            data: vec![value; len],
            x_min,
            x_max,
            epsilon: epsilon_for(x_min, x_max),
        })
    }

    /// Whether consecutive `values` differ by the same step.
    ///
    /// Fewer than two values are never equidistant.
    pub fn is_equidistant(values: &[f64]) -> bool {
        values.len() >= 2 && check_equidistance(values).is_ok()
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Replaces the node values, keeping the node count.
    pub fn set_values(&mut self, ys: &[f64]) -> SplineResult<()> {
        if ys.len() != self.data.len() {
            return Err(SplineError::SizeMismatch {
                expected: self.data.len(),
                actual: ys.len(),
            });
        }
        self.data.copy_from_slice(ys);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always `false`; a spline holds at least two nodes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn interval(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    #[inline]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    #[inline]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Distance between neighbouring nodes.
    #[inline]
    pub fn step(&self) -> f64 {
        (self.x_max - self.x_min) / (self.data.len() - 1) as f64
    }

    /// Moves the nodes to a new interval, keeping the values.
    pub fn set_interval(&mut self, x_min: f64, x_max: f64) -> SplineResult<()> {
        check_interval(x_min, x_max)?;
        self.x_min = x_min;
        self.x_max = x_max;
        self.epsilon = epsilon_for(x_min, x_max);
        Ok(())
    }

    /// Changes the node count over the same interval. New nodes hold
    /// zero; existing values stay at their index.
    pub fn resize(&mut self, len: usize) -> SplineResult<()> {
        check_len(len)?;
        self.data.resize(len, 0.0);
        Ok(())
    }

    /// Value at `x`.
    ///
    /// `x` may exceed the interval by a relative tolerance of
    /// [`EPSILON_SCALE`]; further out is an error.
    pub fn evaluate(&self, x: f64) -> SplineResult<f64> {
        if x < self.x_min - self.epsilon || x > self.x_max + self.epsilon {
            return Err(self.out_of_range(x));
        }
        if x <= self.x_min {
            return Ok(self.data[0]);
        }
        if x >= self.x_max {
            return Ok(self.data[self.data.len() - 1]);
        }
        Ok(self.on_segment(self.segment(x), x))
    }

    /// Exact integral of the piecewise-linear function from `a` to `b`.
    ///
    /// Both limits must lie in the interval; `b < a` flips the sign.
    pub fn integral(&self, a: f64, b: f64) -> SplineResult<f64> {
        for value in [a, b] {
            if !(self.x_min..=self.x_max).contains(&value) {
                return Err(self.out_of_range(value));
            }
        }
        Ok(self.primitive(b) - self.primitive(a))
    }

    /// Integral from `x_min` to `x`.
    fn primitive(&self, x: f64) -> f64 {
        let i = self.segment(x);
        let h = self.step();
        let full: f64 = self.data[..=i]
            .windows(2)
            .map(|w| 0.5 * (w[0] + w[1]) * h)
            .sum();
        let left = self.x_of_index(i);
        full + 0.5 * (self.data[i] + self.on_segment(i, x)) * (x - left)
    }

    /// First node of the segment containing `x`.
    #[inline]
    fn segment(&self, x: f64) -> usize {
        let f = ((x - self.x_min) / self.step()).floor().max(0.0);
        (f as usize).min(self.data.len() - 2)
    }

    #[inline]
    fn x_of_index(&self, index: usize) -> f64 {
        self.x_min + index as f64 * self.step()
    }

    #[inline]
    fn on_segment(&self, i: usize, x: f64) -> f64 {
        let slope = (self.data[i + 1] - self.data[i]) / self.step();
        self.data[i] + slope * (x - self.x_of_index(i))
    }

    fn out_of_range(&self, value: f64) -> SplineError {
        SplineError::ArgumentOutOfRange {
            value,
            lower: self.x_min,
            upper: self.x_max,
        }
    }
}

fn check_equidistance(values: &[f64]) -> SplineResult<()> {
    let Some(expected) = values.get(1).map(|second| second - values[0]) else {
        return Ok(());
    };
    match values
        .windows(2)
        .map(|w| w[1] - w[0])
        .find(|step| (step - expected).abs() > EQUIDISTANCE_TOLERANCE)
    {
        Some(step) => Err(SplineError::NotEquidistant { step, expected }),
        None => Ok(()),
    }
}

fn epsilon_for(x_min: f64, x_max: f64) -> f64 {
    EPSILON_SCALE * x_min.abs().max(x_max.abs())
}

fn check_interval(x_min: f64, x_max: f64) -> SplineResult<()> {
    if x_min < x_max {
        Ok(())
    } else {
        Err(SplineError::InvalidDomain {
            lower: x_min,
            upper: x_max,
        })
    }
}

fn check_len(len: usize) -> SplineResult<()> {
    if len < 2 {
        Err(SplineError::InsufficientPoints {
            required: 2,
            actual: len,
        })
    } else {
        Ok(())
    }
}
