//! Two-dimensional tensor-product B-spline functions.

use crate::{
    carrier::{approximated_equal, Carrier, Edge},
    format::{self, FieldReader, FormatError},
    lanes,
    snapshot::Snapshot2,
    spline_trait::{Axis, EquidistantSpline},
    taylor::{BoundaryCondition, TaylorOrders},
    SplineError, SplineResult, MAX_ORDER,
};
use std::io::{BufRead, Write};

/// A B-spline function of two variables.
///
/// Weights are stored row by row with X running fastest: weight `(ix, iy)`
/// lives at `iy * wx + ix`. Evaluation reduces the `K_y` rows of the active
/// window along X first, then the resulting column along Y. Outside the
/// domain of an axis its boundary Taylor polynomial is formed on the fly.
#[derive(Clone, Debug)]
pub struct BSpline2 {
    x: Carrier,
    y: Carrier,
    weights: Vec<f64>,
    taylor_x: TaylorOrders,
    taylor_y: TaylorOrders,
}

impl BSpline2 {
    /// Creates the zero function with the same capacities on both axes.
    pub fn new(max_intervals: usize, max_order: usize) -> SplineResult<Self> {
        Self::with_capacities(
            (max_intervals, max_order),
            (max_intervals, max_order),
        )
    }

    /// Creates the zero function with `(max_intervals, max_order)` per
    /// axis.
    pub fn with_capacities(
        x: (usize, usize),
        y: (usize, usize),
    ) -> SplineResult<Self> {
        let x = Carrier::new(x.0, x.1)?;
        let y = Carrier::new(y.0, y.1)?;
        Ok(Self {
            weights: vec![0.0; x.weight_count() * y.weight_count()],
            x,
            y,
            taylor_x: TaylorOrders::default(),
            taylor_y: TaylorOrders::default(),
        })
    }

    /// Replaces the carrier of `axis`. All weights are reset to zero.
    #[allow(clippy::too_many_arguments)]
    pub fn set_carrier(
        &mut self,
        axis: Axis,
        a: f64,
        b: f64,
        n: usize,
        k: usize,
        lower: BoundaryCondition,
        upper: BoundaryCondition,
    ) -> SplineResult<()> {
        let orders = TaylorOrders::from_conditions(lower, upper, k);
        match axis {
            Axis::X => {
                self.x.set(a, b, n, k)?;
                self.taylor_x = orders;
            }
            Axis::Y => {
                self.y.set(a, b, n, k)?;
                self.taylor_y = orders;
            }
            Axis::Z => return Err(SplineError::InvalidAxis { axis: 'z', dims: 2 }),
        }
        self.weights.clear();
        self.weights
            .resize(self.x.weight_count() * self.y.weight_count(), 0.0);
        Ok(())
    }

    #[inline]
    pub fn x(&self) -> &Carrier {
        &self.x
    }

    #[inline]
    pub fn y(&self) -> &Carrier {
        &self.y
    }

    #[inline]
    pub fn taylor_orders(&self, axis: Axis) -> SplineResult<TaylorOrders> {
        match axis {
            Axis::X => Ok(self.taylor_x),
            Axis::Y => Ok(self.taylor_y),
            Axis::Z => Err(SplineError::InvalidAxis { axis: 'z', dims: 2 }),
        }
    }

    pub fn set_taylor_orders(
        &mut self,
        axis: Axis,
        orders: TaylorOrders,
    ) -> SplineResult<()> {
        match axis {
            Axis::X => self.taylor_x = orders.clamped(self.x.order()),
            Axis::Y => self.taylor_y = orders.clamped(self.y.order()),
            Axis::Z => {
                return Err(SplineError::InvalidAxis { axis: 'z', dims: 2 })
            }
        }
        Ok(())
    }

    /// Flat index of weight `(ix, iy)`.
    #[inline]
    pub fn index(&self, ix: usize, iy: usize) -> usize {
        iy * self.x.weight_count() + ix
    }

    /// Value at `(x, y)`.
    #[inline]
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.partial(x, y, 0, 0)
    }

    /// Partial derivative along X at `(x, y)`.
    #[inline]
    pub fn dx(&self, x: f64, y: f64) -> f64 {
        self.partial(x, y, 1, 0)
    }

    /// Partial derivative along Y at `(x, y)`.
    #[inline]
    pub fn dy(&self, x: f64, y: f64) -> f64 {
        self.partial(x, y, 0, 1)
    }

    /// Mixed partial derivative `d^(mx + my) f / dx^mx dy^my` at `(x, y)`.
    pub fn partial(&self, x: f64, y: f64, mx: usize, my: usize) -> f64 {
        let wx = self.x.weight_count();
        let rx = self.x.window_for(x);
        let ry = self.y.window_for(y);

        let mut column = [0.0; MAX_ORDER];
        for (j, c) in column[..self.y.order()].iter_mut().enumerate() {
            let row = &self.weights[(ry + j) * wx + rx..];
            *c = self.x.evaluate_window(x, mx, row, self.taylor_x);
        }
        self.y.evaluate_window(y, my, &column, self.taylor_y)
    }

    /// Values at all `(x, y)` pairs.
    pub fn evaluate_many(&self, points: &[(f64, f64)]) -> Vec<f64> {
        points.iter().map(|&(x, y)| self.evaluate(x, y)).collect()
    }

    /// Representative `(x, y)` of weight `index`.
    pub fn weight_position(&self, index: usize) -> (f64, f64) {
        let wx = self.x.weight_count();
        (
            self.x.weight_position(index % wx),
            self.y.weight_position(index / wx),
        )
    }

    /// Mean of `w_i^p` over all weights, each term scaled by
    /// `importance[i]` and the sum divided by the sum of `importance`.
    ///
    /// `importance` is indexed like the weights.
    pub fn weighted_norm_p(&self, p: u32, importance: &[f64]) -> SplineResult<f64> {
        if importance.len() != self.weights.len() {
            return Err(SplineError::SizeMismatch {
                expected: self.weights.len(),
                actual: importance.len(),
            });
        }
        let p = p.max(1) as i32;
        let (norm, total) = self
            .weights
            .iter()
            .zip(importance)
            .fold((0.0, 0.0), |(norm, total), (w, g)| {
                (norm + w.powi(p) * g, total + g)
            });
        Ok(norm / total)
    }

    /// Edge of the support of weight `index` along `axis`.
    pub fn carrier_edge(&self, axis: Axis, edge: Edge, index: usize) -> SplineResult<f64> {
        Ok(self.carrier(axis)?.carrier_edge(edge, index))
    }

    /// `[wy, wx]`, the extents of the weight matrix.
    #[inline]
    fn dims(&self) -> [usize; 2] {
        [self.y.weight_count(), self.x.weight_count()]
    }

    fn axis_parts(
        &mut self,
        axis: Axis,
    ) -> SplineResult<(usize, &mut Carrier, &mut TaylorOrders)> {
        match axis {
            Axis::X => Ok((1, &mut self.x, &mut self.taylor_x)),
            Axis::Y => Ok((0, &mut self.y, &mut self.taylor_y)),
            Axis::Z => Err(SplineError::InvalidAxis { axis: 'z', dims: 2 }),
        }
    }

    fn loaded_from(&self, fields: &FieldReader) -> Result<Self, FormatError> {
        let x = format::read_carrier(fields, Some("x"))?;
        let y = format::read_carrier(fields, Some("y"))?;
        let taylor_x = TaylorOrders::new(
            fields.require_usize(None, "lTp_x")?,
            fields.require_usize(None, "uTp_x")?,
        );
        let taylor_y = TaylorOrders::new(
            fields.require_usize(None, "lTp_y")?,
            fields.require_usize(None, "uTp_y")?,
        );
        let weights =
            format::read_weights(fields, x.weight_count() * y.weight_count())?;

        let mut loaded = self.clone();
        loaded.restore(&Snapshot2 {
            x,
            y,
            taylor_x,
            taylor_y,
            weights,
        })?;
        Ok(loaded)
    }
}

impl EquidistantSpline for BSpline2 {
    const DIMENSIONS: usize = 2;
    type Snapshot = Snapshot2;

    fn carrier(&self, axis: Axis) -> SplineResult<&Carrier> {
        match axis {
            Axis::X => Ok(&self.x),
            Axis::Y => Ok(&self.y),
            Axis::Z => Err(SplineError::InvalidAxis { axis: 'z', dims: 2 }),
        }
    }

    #[inline]
    fn weights(&self) -> &[f64] {
        &self.weights
    }

    fn set_weight(&mut self, index: usize, value: f64) -> SplineResult<()> {
        let len = self.weights.len();
        let w = self
            .weights
            .get_mut(index)
            .ok_or(SplineError::WeightIndexOutOfRange { index, len })?;
        *w = value;
        Ok(())
    }

    fn set_weights(&mut self, values: &[f64]) -> SplineResult<()> {
        if values.len() != self.weights.len() {
            return Err(SplineError::SizeMismatch {
                expected: self.weights.len(),
                actual: values.len(),
            });
        }
        self.weights.copy_from_slice(values);
        Ok(())
    }

    /// Boundary polynomials of a 2D spline are formed per evaluation, so
    /// there is nothing to refresh.
    fn complete(&mut self) {}

    fn multiply(&mut self, value: f64) {
        self.weights.iter_mut().for_each(|w| *w *= value);
    }

    fn differentiate_along(&mut self, axis: Axis) -> SplineResult<()> {
        let dims = self.dims();
        let len = self.weights.len();
        let (lane_axis, carrier, taylor) = self.axis_parts(axis)?;

        let k = carrier.order();
        if k == 1 {
            *taylor = TaylorOrders::default();
            self.weights = vec![0.0; len];
            return Ok(());
        }

        let h = carrier.step();
        carrier.reorder(k - 1);
        *taylor = taylor.decremented();

        let lane_len = dims[lane_axis];
        self.weights =
            lanes::map_lanes(&self.weights, &dims, lane_axis, lane_len - 1, |lane, out| {
                lanes::differentiate(lane, h, out)
            });
        Ok(())
    }

    fn integrate_along(
        &mut self,
        axis: Axis,
        at: f64,
        value: f64,
    ) -> SplineResult<()> {
        let dims = self.dims();
        let (lane_axis, carrier, taylor) = self.axis_parts(axis)?;

        let k = carrier.order();
        if k >= carrier.max_order() {
            return Ok(());
        }

        let h = carrier.step();
        carrier.reorder(k + 1);
        *taylor = taylor.incremented().clamped(k + 1);
        let carrier = carrier.clone();
        let orders = *taylor;

        let lane_len = dims[lane_axis];
        let integrated =
            lanes::map_lanes(&self.weights, &dims, lane_axis, lane_len + 1, |lane, out| {
                lanes::integrate(lane, h, out)
            });

        // Shift every lane so the antiderivative takes `value` at `at`.
        let mut dims = dims;
        dims[lane_axis] = lane_len + 1;
        self.weights =
            lanes::map_lanes(&integrated, &dims, lane_axis, lane_len + 1, |lane, out| {
                let c = value - carrier.evaluate_lane(at, 0, lane, orders);
                for (o, w) in out.iter_mut().zip(lane) {
                    *o = w + c;
                }
            });
        Ok(())
    }

    fn snapshot(&self) -> Snapshot2 {
        Snapshot2 {
            x: self.x.data(),
            y: self.y.data(),
            taylor_x: self.taylor_x,
            taylor_y: self.taylor_y,
            weights: self.weights.clone(),
        }
    }

    fn restore(&mut self, snapshot: &Snapshot2) -> SplineResult<()> {
        let mut x = self.x.clone();
        let mut y = self.y.clone();
        x.set_data(&snapshot.x)?;
        y.set_data(&snapshot.y)?;
        let expected = x.weight_count() * y.weight_count();
        if snapshot.weights.len() != expected {
            return Err(SplineError::SizeMismatch {
                expected,
                actual: snapshot.weights.len(),
            });
        }

        self.taylor_x = snapshot.taylor_x.clamped(x.order());
        self.taylor_y = snapshot.taylor_y.clamped(y.order());
        self.x = x;
        self.y = y;
        self.weights.clone_from(&snapshot.weights);
        Ok(())
    }

    fn is_static_data_equal(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.weights == other.weights
            && self.taylor_x == other.taylor_x
            && self.taylor_y == other.taylor_y
    }

    fn is_approximated_equal(&self, other: &Self, max_delta: f64) -> bool {
        let close = |a: TaylorOrders, b: TaylorOrders| {
            (a.lower as f64 - b.lower as f64).abs() <= max_delta
                && (a.upper as f64 - b.upper as f64).abs() <= max_delta
        };
        self.x.is_approximated_equal(&other.x, max_delta)
            && self.y.is_approximated_equal(&other.y, max_delta)
            && approximated_equal(&self.weights, &other.weights, max_delta)
            && close(self.taylor_x, other.taylor_x)
            && close(self.taylor_y, other.taylor_y)
    }

    fn load<R: BufRead>(&mut self, reader: R) -> bool {
        let current = self.clone();
        format::load_into(reader, self, "spline2", |fields| {
            current.loaded_from(fields)
        })
    }

    fn save<W: Write>(&self, writer: W, path: &str) -> bool {
        format::save_with(writer, path, "spline2", |fields| {
            format::write_carrier(fields, "x.", &self.x.data())?;
            format::write_carrier(fields, "y.", &self.y.data())?;
            fields.write_usize("lTp_x", self.taylor_x.lower, "lower Taylor order x")?;
            fields.write_usize("uTp_x", self.taylor_x.upper, "upper Taylor order x")?;
            fields.write_usize("lTp_y", self.taylor_y.lower, "lower Taylor order y")?;
            fields.write_usize("uTp_y", self.taylor_y.upper, "upper Taylor order y")?;
            fields.write_array("w", &self.weights, "weights, x fastest")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BSpline1;

    /// f(x, y) = x + 2y on [0, 2] x [-1, 1], reproduced exactly from the
    /// weight positions.
    fn plane(kx: usize, ky: usize) -> BSpline2 {
        let mut s = BSpline2::new(8, 6).unwrap();
        s.set_carrier(Axis::X, 0.0, 2.0, 4, kx, BoundaryCondition::Full, BoundaryCondition::Full)
            .unwrap();
        s.set_carrier(Axis::Y, -1.0, 1.0, 3, ky, BoundaryCondition::Full, BoundaryCondition::Full)
            .unwrap();
        let weights: Vec<f64> = (0..s.number_of_weights())
            .map(|i| {
                let (x, y) = s.weight_position(i);
                x + 2.0 * y
            })
            .collect();
        s.set_weights(&weights).unwrap();
        s
    }

    #[test]
    fn reproduces_plane() {
        let s = plane(3, 4);
        for &(x, y) in &[(0.0, -1.0), (0.3, 0.2), (1.7, 0.9), (2.0, 1.0)] {
            assert!((s.evaluate(x, y) - (x + 2.0 * y)).abs() < 1e-12);
            assert!((s.dx(x, y) - 1.0).abs() < 1e-10);
            assert!((s.dy(x, y) - 2.0).abs() < 1e-10);
            assert!(s.partial(x, y, 1, 1).abs() < 1e-9);
        }
        // Full boundary polynomials continue the plane.
        assert!((s.evaluate(-1.0, 0.5) - 0.0).abs() < 1e-10);
        assert!((s.evaluate(3.0, 2.0) - 7.0).abs() < 1e-10);
    }

    #[test]
    fn separable_product_matches_1d() {
        // Outer product weights give f(x) * g(y).
        let fx = BSpline1::with_weights(0.0, 1.0, 2, 3, &[1.0, 3.0, -1.0, 2.0]).unwrap();
        let gy = BSpline1::with_weights(0.0, 1.0, 3, 2, &[2.0, 0.5, 1.0, 4.0]).unwrap();

        let natural = BoundaryCondition::Natural;
        let mut s = BSpline2::new(4, 4).unwrap();
        s.set_carrier(Axis::X, 0.0, 1.0, 2, 3, natural, natural).unwrap();
        s.set_carrier(Axis::Y, 0.0, 1.0, 3, 2, natural, natural).unwrap();
        let mut weights = Vec::new();
        for wy in gy.weights() {
            for wx in fx.weights() {
                weights.push(wx * wy);
            }
        }
        s.set_weights(&weights).unwrap();

        for &(x, y) in &[(0.1, 0.2), (0.5, 0.5), (0.9, 0.75), (-0.5, 0.3), (1.5, 1.2)] {
            let expected = fx.evaluate(x) * gy.evaluate(y);
            assert!((s.evaluate(x, y) - expected).abs() < 1e-12, "({x}, {y})");
        }
    }

    /// Order 2 on two intervals per axis: a 3 x 3 weight matrix holding
    /// 1..=9 row by row.
    fn grid3x3() -> BSpline2 {
        let natural = BoundaryCondition::Natural;
        let mut s = BSpline2::new(4, 4).unwrap();
        s.set_carrier(Axis::X, 0.0, 2.0, 2, 2, natural, natural).unwrap();
        s.set_carrier(Axis::Y, -1.0, 1.0, 2, 2, natural, natural).unwrap();
        let weights: Vec<f64> = (1..=9).map(f64::from).collect();
        s.set_weights(&weights).unwrap();
        s
    }

    #[test]
    fn weighted_norm() {
        let s = grid3x3();
        assert_eq!(s.number_of_weights(), 9);

        // Corners (1, 9) once, center (5) twice: (1 + 2 * 25 + 81) / 4.
        let importance = [1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0];
        assert_eq!(s.weighted_norm_p(2, &importance), Ok(33.0));
        // Uniform importance and p = 1 is the plain mean.
        assert_eq!(s.weighted_norm_p(1, &[1.0; 9]), Ok(5.0));
        // Only the weight at (ix, iy) = (2, 1) counts.
        let mut single = [0.0; 9];
        single[s.index(2, 1)] = 3.0;
        assert_eq!(s.weighted_norm_p(3, &single), Ok(216.0));

        assert_eq!(
            s.weighted_norm_p(2, &[1.0; 4]),
            Err(SplineError::SizeMismatch {
                expected: 9,
                actual: 4
            })
        );
    }

    #[test]
    fn carrier_edges_per_axis() {
        let s = grid3x3();
        assert_eq!(s.carrier_edge(Axis::X, Edge::Lower, 0), Ok(f64::NEG_INFINITY));
        assert_eq!(s.carrier_edge(Axis::X, Edge::Lower, 1), Ok(0.0));
        assert_eq!(s.carrier_edge(Axis::X, Edge::Upper, 0), Ok(1.0));
        assert_eq!(s.carrier_edge(Axis::X, Edge::Upper, 2), Ok(f64::INFINITY));

        assert_eq!(s.carrier_edge(Axis::Y, Edge::Lower, 2), Ok(0.0));
        assert_eq!(s.carrier_edge(Axis::Y, Edge::Upper, 1), Ok(1.0));
        assert_eq!(s.carrier_edge(Axis::Y, Edge::Upper, 2), Ok(f64::INFINITY));

        assert!(s.carrier_edge(Axis::Z, Edge::Lower, 0).is_err());
    }

    #[test]
    fn differentiate_along_axes() {
        let mut s = plane(3, 2);
        s.differentiate_along(Axis::X).unwrap();
        assert_eq!(s.x().order(), 2);
        assert!((s.evaluate(1.3, 0.4) - 1.0).abs() < 1e-10);

        let mut s = plane(3, 2);
        s.differentiate_along(Axis::Y).unwrap();
        assert_eq!(s.y().order(), 1);
        assert!((s.evaluate(1.3, 0.4) - 2.0).abs() < 1e-10);

        assert!(s.differentiate_along(Axis::Z).is_err());
    }

    #[test]
    fn integrate_along_x() {
        let mut s = plane(2, 2);
        s.differentiate_along(Axis::X).unwrap();
        // d/dx (x + 2y) = 1; integrate back with F(0, y) = 5.
        s.integrate_along(Axis::X, 0.0, 5.0).unwrap();
        assert_eq!(s.x().order(), 2);
        for &(x, y) in &[(0.0, -1.0), (0.5, 0.0), (1.5, 0.7)] {
            assert!((s.evaluate(x, y) - (x + 5.0)).abs() < 1e-10);
        }
    }

    #[test]
    fn load_save_round_trip() {
        let s = plane(3, 4);
        let mut text = Vec::new();
        assert!(s.save(&mut text, "data"));

        let mut t = BSpline2::new(8, 6).unwrap();
        assert!(t.load(text.as_slice()));
        assert!(t.is_static_data_equal(&s));

        // Missing weights: rejected, target untouched.
        let truncated: String = String::from_utf8(text)
            .unwrap()
            .lines()
            .filter(|l| !l.starts_with("data.w"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut u = BSpline2::new(8, 6).unwrap();
        let before = u.clone();
        assert!(!u.load(truncated.as_bytes()));
        assert!(u.is_static_data_equal(&before));
    }
}
