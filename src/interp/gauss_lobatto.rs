use super::SortedPoints;
use crate::{SplineError, SplineResult};
use core::f64::consts::PI;

/// Placement of the nodes of a [`GaussLobattoSpline`] on its interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Spacing {
    /// `(1 - cos(pi t)) / 2`: dense at both ends.
    #[default]
    Both,
    /// `1 - cos(pi t / 2)`: dense at the lower end.
    Lower,
    /// `sin(pi t / 2)`: dense at the upper end.
    Upper,
}

impl Spacing {
    /// Relative position in `[0, 1]` of the node at `t = i / (n - 1)`.
    #[inline]
    fn warp(self, t: f64) -> f64 {
        match self {
            Spacing::Both => 0.5 * (1.0 - (PI * t).cos()),
            Spacing::Lower => 1.0 - (0.5 * PI * t).cos(),
            Spacing::Upper => (0.5 * PI * t).sin(),
        }
    }

    /// Inverse of [`warp`](Self::warp) on `[0, 1]`.
    #[inline]
    fn unwarp(self, f: f64) -> f64 {
        match self {
            Spacing::Both => (1.0 - 2.0 * f).acos() / PI,
            Spacing::Lower => 2.0 * (1.0 - f).acos() / PI,
            Spacing::Upper => 2.0 * f.asin() / PI,
        }
    }
}

/// Values on cosine-warped nodes of `[x_min, x_max]`, interpolated
/// linearly between nodes.
///
/// # Examples
/// ```
/// use equidistant_bsplines::interp::{GaussLobattoSpline, Spacing};
///
/// let spline = GaussLobattoSpline::constant(5, 2.0, 0.0, 3.0, Spacing::Both)?;
/// assert_eq!(spline.evaluate(1.2), 2.0);
/// assert!((spline.integral(0.0, 3.0)? - 6.0).abs() < 1e-12);
/// # Ok::<(), equidistant_bsplines::SplineError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GaussLobattoSpline {
    data: Vec<f64>,
    x_min: f64,
    x_max: f64,
    spacing: Spacing,
}

impl GaussLobattoSpline {
    /// `len` nodes on `[x_min, x_max]`, all holding `value`.
    pub fn constant(
        len: usize,
        value: f64,
        x_min: f64,
        x_max: f64,
        spacing: Spacing,
    ) -> SplineResult<Self> {
        check_interval(x_min, x_max)?;
        check_len(len)?;
        Ok(Self {
            data: vec![value; len],
            x_min,
            x_max,
            spacing,
        })
    }

    /// Resamples the polyline through `(xs, ys)` onto as many nodes as
    /// there are points, spanning the range of `xs`. Abscissae must be
    /// distinct.
    pub fn resample(xs: &[f64], ys: &[f64], spacing: Spacing) -> SplineResult<Self> {
        let points = SortedPoints::new(xs, ys)?;
        points.require(2)?;
        points.require_distinct()?;
        let (xs, ys) = (points.xs(), points.ys());
        let (x_min, x_max) = (xs[0], xs[xs.len() - 1]);
        check_interval(x_min, x_max)?;

        let mut spline = Self {
            data: vec![0.0; xs.len()],
            x_min,
            x_max,
            spacing,
        };

        let mut segment = 0;
        for i in 0..spline.data.len() {
            let x = spline.x_of_index(i);
            while x > xs[segment + 1] && segment < xs.len() - 2 {
                segment += 1;
            }
            let slope = (ys[segment + 1] - ys[segment]) / (xs[segment + 1] - xs[segment]);
            spline.data[i] = ys[segment] + slope * (x - xs[segment]);
        }
        Ok(spline)
    }

    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.data
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
    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// Moves the nodes to a new interval, keeping the values.
    pub fn set_interval(&mut self, x_min: f64, x_max: f64) -> SplineResult<()> {
        check_interval(x_min, x_max)?;
        self.x_min = x_min;
        self.x_max = x_max;
        Ok(())
    }

    /// Changes the node count. New nodes hold zero.
    pub fn resize(&mut self, len: usize) -> SplineResult<()> {
        check_len(len)?;
        self.data.resize(len, 0.0);
        Ok(())
    }

    /// Abscissa of node `index`.
    pub fn x_of_index(&self, index: usize) -> f64 {
        let t = index as f64 / (self.data.len() - 1) as f64;
        self.x_min + (self.x_max - self.x_min) * self.spacing.warp(t)
    }

    /// Fractional node index of `x`, clamped to `[0, len - 1]`.
    pub fn index_of_x(&self, x: f64) -> f64 {
        let f = ((x - self.x_min) / (self.x_max - self.x_min)).clamp(0.0, 1.0);
        self.spacing.unwarp(f) * (self.data.len() - 1) as f64
    }

    /// First node of the segment containing `x`.
    #[inline]
    fn segment(&self, x: f64) -> usize {
        (self.index_of_x(x) as usize).min(self.data.len() - 2)
    }

    /// Value at `x`. Outside the interval the end segments are extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        let i = self.segment(x);
        self.on_segment(i, x)
    }

    #[inline]
    fn on_segment(&self, i: usize, x: f64) -> f64 {
        let left = self.x_of_index(i);
        let right = self.x_of_index(i + 1);
        let slope = (self.data[i + 1] - self.data[i]) / (right - left);
        self.data[i] + slope * (x - left)
    }

    /// Exact integral of the piecewise-linear function from `a` to `b`.
    ///
    /// Both limits must lie in the interval; `b < a` flips the sign.
    pub fn integral(&self, a: f64, b: f64) -> SplineResult<f64> {
        for value in [a, b] {
            if !(self.x_min..=self.x_max).contains(&value) {
                return Err(SplineError::ArgumentOutOfRange {
                    value,
                    lower: self.x_min,
                    upper: self.x_max,
                });
            }
        }
        let (a, b, sign) = if b < a { (b, a, -1.0) } else { (a, b, 1.0) };

        let ia = self.segment(a);
        let ib = self.segment(b);
        let trapezoid = |x0: f64, y0: f64, x1: f64, y1: f64| 0.5 * (y0 + y1) * (x1 - x0);

        let result = if ia == ib {
            trapezoid(a, self.on_segment(ia, a), b, self.on_segment(ia, b))
        } else {
            let head = trapezoid(
                a,
                self.on_segment(ia, a),
                self.x_of_index(ia + 1),
                self.data[ia + 1],
            );
            let tail = trapezoid(
                self.x_of_index(ib),
                self.data[ib],
                b,
                self.on_segment(ib, b),
            );
            let inner: f64 = (ia + 1..ib)
                .map(|i| {
                    trapezoid(
                        self.x_of_index(i),
                        self.data[i],
                        self.x_of_index(i + 1),
                        self.data[i + 1],
                    )
                })
                .sum();
            head + inner + tail
        };
        Ok(sign * result)
    }
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
