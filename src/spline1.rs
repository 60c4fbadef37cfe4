//! One-dimensional equidistant B-spline functions.

use crate::{
    carrier::{Carrier, Edge, Position},
    format::{self, FieldReader, FormatError},
    invert::{illinois, InverseOptions},
    lanes,
    snapshot::Snapshot1,
    spline_trait::{Axis, EquidistantSpline},
    taylor::{BoundaryCondition, TaylorOrders, TaylorPoly},
    SplineError, SplineResult,
};
use std::io::{BufRead, Write};

/// A B-spline function of one variable.
///
/// Inside `[A, B]` the function is evaluated by de Boor's recursion; outside
/// it continues as the lower or upper boundary Taylor polynomial, which are
/// refreshed by [`complete`](EquidistantSpline::complete).
///
/// # Examples
/// ```
/// use equidistant_bsplines::BSpline1;
///
/// // Piecewise linear through (0, 1), (1, 2), (2, 3).
/// let spline = BSpline1::with_weights(0.0, 2.0, 2, 2, &[1.0, 2.0, 3.0])?;
///
/// assert_eq!(spline.evaluate(0.5), 1.5);
/// assert_eq!(spline.derivative(1.5), 1.0);
/// assert!((spline.inverse(2.5) - 1.5).abs() < 1e-12);
/// # Ok::<(), equidistant_bsplines::SplineError>(())
/// ```
#[derive(Clone, Debug)]
pub struct BSpline1 {
    carrier: Carrier,
    weights: Vec<f64>,
    taylor: TaylorOrders,
    lower_poly: TaylorPoly,
    upper_poly: TaylorPoly,
}

impl BSpline1 {
    /// Creates the zero function of order 1 on `[0, 1]` with the given
    /// capacities.
    pub fn new(max_intervals: usize, max_order: usize) -> SplineResult<Self> {
        let carrier = Carrier::new(max_intervals, max_order)?;
        let mut spline = Self {
            weights: vec![0.0; carrier.weight_count()],
            carrier,
            taylor: TaylorOrders::default(),
            lower_poly: TaylorPoly::ZERO,
            upper_poly: TaylorPoly::ZERO,
        };
        spline.complete();
        Ok(spline)
    }

    /// Creates a spline over a copy of `carrier` with the given weights.
    pub fn from_carrier(
        carrier: &Carrier,
        weights: &[f64],
        lower: BoundaryCondition,
        upper: BoundaryCondition,
    ) -> SplineResult<Self> {
        check_len(carrier.weight_count(), weights.len())?;
        let mut spline = Self {
            carrier: carrier.clone(),
            weights: weights.to_vec(),
            taylor: TaylorOrders::from_conditions(lower, upper, carrier.order()),
            lower_poly: TaylorPoly::ZERO,
            upper_poly: TaylorPoly::ZERO,
        };
        spline.complete();
        Ok(spline)
    }

    /// Creates a spline on `[a, b]` with `n` intervals of order `k` and
    /// natural boundary polynomials.
    ///
    /// The capacity is `n` intervals and [`MAX_ORDER`](crate::MAX_ORDER).
    pub fn with_weights(
        a: f64,
        b: f64,
        n: usize,
        k: usize,
        weights: &[f64],
    ) -> SplineResult<Self> {
        let carrier = Carrier::with_domain(a, b, n, k)?;
        Self::from_carrier(
            &carrier,
            weights,
            BoundaryCondition::Natural,
            BoundaryCondition::Natural,
        )
    }

    /// Replaces the carrier. All weights are reset to zero.
    pub fn set_carrier(
        &mut self,
        a: f64,
        b: f64,
        n: usize,
        k: usize,
        lower: BoundaryCondition,
        upper: BoundaryCondition,
    ) -> SplineResult<()> {
        self.carrier.set(a, b, n, k)?;
        self.taylor = TaylorOrders::from_conditions(lower, upper, k);
        self.weights.clear();
        self.weights.resize(self.carrier.weight_count(), 0.0);
        self.complete();
        Ok(())
    }

    #[inline]
    pub fn carrier(&self) -> &Carrier {
        &self.carrier
    }

    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.carrier.lower_bound()
    }

    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.carrier.upper_bound()
    }

    #[inline]
    pub fn intervals(&self) -> usize {
        self.carrier.intervals()
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.carrier.order()
    }

    #[inline]
    pub fn taylor_orders(&self) -> TaylorOrders {
        self.taylor
    }

    /// Sets the boundary Taylor orders (capped at the order) and commits.
    pub fn set_taylor_orders(&mut self, orders: TaylorOrders) {
        self.taylor = orders.clamped(self.order());
        self.complete();
    }

    #[inline]
    pub fn lower_taylor(&self) -> &TaylorPoly {
        &self.lower_poly
    }

    #[inline]
    pub fn upper_taylor(&self) -> &TaylorPoly {
        &self.upper_poly
    }

    /// Value at `x`.
    pub fn evaluate(&self, x: f64) -> f64 {
        let c = &self.carrier;
        match c.locate(x) {
            Position::Below => self.lower_poly.evaluate(x - c.lower_bound()),
            Position::Inside => {
                let r = c.window(x);
                c.value(x, &self.weights[r..], r)
            }
            Position::Above => self.upper_poly.evaluate(x - c.upper_bound()),
        }
    }

    /// Values at all `xs`.
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// `m`-th derivative at `x`; outside the domain the derivative of the
    /// boundary polynomial.
    pub fn nth_derivative(&self, x: f64, m: usize) -> f64 {
        let c = &self.carrier;
        match c.locate(x) {
            Position::Below => self
                .lower_poly
                .nth_derivative(m)
                .evaluate(x - c.lower_bound()),
            Position::Inside => {
                let r = c.window(x);
                c.derivative_value(x, m, &self.weights[r..], r)
            }
            Position::Above => self
                .upper_poly
                .nth_derivative(m)
                .evaluate(x - c.upper_bound()),
        }
    }

    #[inline]
    pub fn derivative(&self, x: f64) -> f64 {
        self.nth_derivative(x, 1)
    }

    #[inline]
    pub fn second_derivative(&self, x: f64) -> f64 {
        self.nth_derivative(x, 2)
    }

    /// The `x` in `[A, B]` with `evaluate(x) == y`, see
    /// [`inverse_with`](Self::inverse_with).
    #[inline]
    pub fn inverse(&self, y: f64) -> f64 {
        self.inverse_with(y, &InverseOptions::default())
    }

    /// Solves `evaluate(x) == y` on `[A, B]`.
    ///
    /// Targets beyond the endpoint values yield the nearer endpoint. The
    /// function should be monotonic on the domain for the result to be
    /// meaningful.
    pub fn inverse_with(&self, y: f64, options: &InverseOptions) -> f64 {
        illinois(
            |x| self.evaluate(x),
            |x| self.derivative(x),
            y,
            self.lower_bound(),
            self.upper_bound(),
            options,
        )
    }

    pub fn inverse_many(&self, ys: &[f64]) -> Vec<f64> {
        ys.iter().map(|&y| self.inverse(y)).collect()
    }

    /// Replaces the function by its derivative.
    pub fn differentiate(&mut self) {
        let k = self.order();
        if k == 1 {
            self.weights.fill(0.0);
            self.taylor = TaylorOrders::default();
        } else {
            let mut weights = vec![0.0; self.weights.len() - 1];
            lanes::differentiate(&self.weights, self.carrier.step(), &mut weights);
            self.carrier.reorder(k - 1);
            self.weights = weights;
            self.taylor = self.taylor.decremented();
        }
        self.complete();
    }

    /// Replaces the function by its antiderivative `F` with `F(x0) = f0`.
    ///
    /// Does nothing if the order is already at its maximum.
    pub fn integrate(&mut self, x0: f64, f0: f64) {
        let k = self.order();
        if k >= self.carrier.max_order() {
            return;
        }

        let mut weights = vec![0.0; self.weights.len() + 1];
        lanes::integrate(&self.weights, self.carrier.step(), &mut weights);
        self.carrier.reorder(k + 1);
        self.weights = weights;
        self.taylor = self.taylor.incremented().clamped(k + 1);
        self.complete();

        let c = f0 - self.evaluate(x0);
        if c != 0.0 {
            self.weights.iter_mut().for_each(|w| *w += c);
            self.complete();
        }
    }

    /// Adds the line through `(x_fix, 0)` that makes `f(x_ref) == y_ref`.
    ///
    /// Exact for orders of at least 2. Does nothing if `x_fix == x_ref`.
    pub fn add_line(&mut self, x_fix: f64, x_ref: f64, y_ref: f64) {
        if x_fix == x_ref {
            return;
        }
        let y_old = self.evaluate(x_ref);
        let m = (y_ref - y_old) / (x_ref - x_fix);

        for (i, w) in self.weights.iter_mut().enumerate() {
            *w += m * (self.carrier.weight_position(i) - x_fix);
        }
        self.complete();
    }

    /// Shifts all weights so their mean becomes `value`.
    pub fn set_weight_mean(&mut self, value: f64) {
        let delta = value - self.weight_mean();
        self.weights.iter_mut().for_each(|w| *w += delta);
        self.complete();
    }

    /// `sum |w_i^p|` over all weights.
    pub fn norm_p(&self, p: u32) -> f64 {
        let p = p.max(1) as i32;
        self.weights.iter().map(|w| w.powi(p).abs()).sum()
    }

    /// Largest absolute weight scaled by `direction`.
    pub fn weighted_norm_of_bend(&self, direction: f64) -> f64 {
        self.weights
            .iter()
            .map(|w| (w * direction).abs())
            .fold(0.0, f64::max)
    }

    #[inline]
    pub fn weight_position(&self, index: usize) -> f64 {
        self.carrier.weight_position(index)
    }

    pub fn weight_positions(&self) -> Vec<f64> {
        self.carrier.weight_positions()
    }

    #[inline]
    pub fn carrier_edge(&self, edge: Edge, index: usize) -> f64 {
        self.carrier.carrier_edge(edge, index)
    }

    pub fn domain_sub_weight_indexes(&self, a: f64, b: f64) -> (usize, usize) {
        self.carrier.domain_sub_weight_indexes(a, b)
    }

    fn loaded_from(&self, fields: &FieldReader) -> Result<Self, FormatError> {
        let data = format::read_carrier(fields, None)?;
        let taylor = TaylorOrders::new(
            fields.require_usize(None, "lTp")?,
            fields.require_usize(None, "uTp")?,
        );
        let weights = format::read_weights(fields, data.weight_count())?;

        let mut loaded = self.clone();
        loaded.restore(&Snapshot1 {
            carrier: data,
            taylor,
            weights,
        })?;
        Ok(loaded)
    }
}

#[inline]
fn check_len(expected: usize, actual: usize) -> SplineResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(SplineError::SizeMismatch { expected, actual })
    }
}

impl EquidistantSpline for BSpline1 {
    const DIMENSIONS: usize = 1;
    type Snapshot = Snapshot1;

    fn carrier(&self, axis: Axis) -> SplineResult<&Carrier> {
        axis.check(Self::DIMENSIONS)?;
        Ok(&self.carrier)
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
        check_len(self.weights.len(), values.len())?;
        self.weights.copy_from_slice(values);
        self.complete();
        Ok(())
    }

    fn complete(&mut self) {
        let c = &self.carrier;
        self.lower_poly = c.taylor_poly(
            &self.weights[c.lower_window()..],
            c.lower_bound(),
            self.taylor.lower,
        );
        self.upper_poly = c.taylor_poly(
            &self.weights[c.upper_window()..],
            c.upper_bound(),
            self.taylor.upper,
        );
    }

    fn multiply(&mut self, value: f64) {
        self.weights.iter_mut().for_each(|w| *w *= value);
        self.complete();
    }

    fn differentiate_along(&mut self, axis: Axis) -> SplineResult<()> {
        axis.check(Self::DIMENSIONS)?;
        self.differentiate();
        Ok(())
    }

    fn integrate_along(
        &mut self,
        axis: Axis,
        at: f64,
        value: f64,
    ) -> SplineResult<()> {
        axis.check(Self::DIMENSIONS)?;
        self.integrate(at, value);
        Ok(())
    }

    fn snapshot(&self) -> Snapshot1 {
        Snapshot1 {
            carrier: self.carrier.data(),
            taylor: self.taylor,
            weights: self.weights.clone(),
        }
    }

    fn restore(&mut self, snapshot: &Snapshot1) -> SplineResult<()> {
        let mut carrier = self.carrier.clone();
        carrier.set_data(&snapshot.carrier)?;
        check_len(carrier.weight_count(), snapshot.weights.len())?;

        self.taylor = snapshot.taylor.clamped(carrier.order());
        self.carrier = carrier;
        self.weights.clone_from(&snapshot.weights);
        self.complete();
        Ok(())
    }

    fn is_static_data_equal(&self, other: &Self) -> bool {
        self.carrier == other.carrier
            && self.weights == other.weights
            && self.lower_poly.coefficients() == other.lower_poly.coefficients()
            && self.upper_poly.coefficients() == other.upper_poly.coefficients()
    }

    fn is_approximated_equal(&self, other: &Self, max_delta: f64) -> bool {
        let order_delta =
            |a: usize, b: usize| (a as f64 - b as f64).abs() <= max_delta;

        self.carrier.is_approximated_equal(&other.carrier, max_delta)
            && crate::carrier::approximated_equal(
                &self.weights,
                &other.weights,
                max_delta,
            )
            && order_delta(self.taylor.lower, other.taylor.lower)
            && order_delta(self.taylor.upper, other.taylor.upper)
    }

    fn load<R: BufRead>(&mut self, reader: R) -> bool {
        let current = self.clone();
        format::load_into(reader, self, "spline1", |fields| {
            current.loaded_from(fields)
        })
    }

    fn save<W: Write>(&self, writer: W, path: &str) -> bool {
        format::save_with(writer, path, "spline1", |fields| {
            format::write_carrier(fields, "", &self.carrier.data())?;
            fields.write_usize("lTp", self.taylor.lower, "lower Taylor order")?;
            fields.write_usize("uTp", self.taylor.upper, "upper Taylor order")?;
            fields.write_array("w", &self.weights, "weights")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn piecewise_constant() {
        let s = BSpline1::with_weights(0.0, 2.0, 2, 1, &[1.0, 2.0]).unwrap();
        assert_eq!(s.evaluate(0.5), 1.0);
        assert_eq!(s.evaluate(1.5), 2.0);
        assert_eq!(s.evaluate(2.0), 2.0);
        assert_eq!(s.derivative(0.5), 0.0);
    }

    #[test]
    fn piecewise_linear() {
        let s = BSpline1::with_weights(0.0, 2.0, 2, 2, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.evaluate(0.5), 1.5);
        assert_eq!(s.evaluate(1.5), 2.5);
        assert_eq!(s.derivative(0.25), 1.0);
        // Natural boundary of an order 2 spline: constant continuation.
        assert_eq!(s.evaluate(-1.0), 1.0);
        assert_eq!(s.evaluate(5.0), 3.0);
    }

    #[test]
    fn full_boundary_extrapolates_linearly() {
        let c = Carrier::with_domain(0.0, 2.0, 2, 2).unwrap();
        let s = BSpline1::from_carrier(
            &c,
            &[1.0, 2.0, 3.0],
            BoundaryCondition::Full,
            BoundaryCondition::Full,
        )
        .unwrap();
        assert_eq!(s.evaluate(-1.0), 0.0);
        assert_eq!(s.evaluate(3.0), 4.0);
        assert_eq!(s.derivative(3.0), 1.0);
    }

    #[test]
    fn size_mismatch() {
        assert_eq!(
            BSpline1::with_weights(0.0, 2.0, 2, 2, &[1.0, 2.0]).unwrap_err(),
            SplineError::SizeMismatch {
                expected: 3,
                actual: 2
            }
        );
        let mut s = BSpline1::new(4, 4).unwrap();
        assert!(s.set_weight(1, 0.0).is_err());
        assert!(s.set_weights(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn differentiate_and_integrate() {
        // Weights at the weight positions reproduce x; squared they give
        // a smooth convex function.
        let c = Carrier::with_domain(0.0, 1.0, 8, 4).unwrap();
        let w: Vec<f64> = c.weight_positions().iter().map(|x| x * x).collect();
        let f = BSpline1::from_carrier(
            &c,
            &w,
            BoundaryCondition::Natural,
            BoundaryCondition::Natural,
        )
        .unwrap();

        let mut d = f.clone();
        d.differentiate();
        assert_eq!(d.order(), 3);
        assert_eq!(d.weights().len(), f.weights().len() - 1);
        for i in 0..=20 {
            let x = i as f64 / 20.0;
            assert!((d.evaluate(x) - f.derivative(x)).abs() < 1e-10);
        }

        let mut back = d.clone();
        back.integrate(0.3, f.evaluate(0.3));
        assert_eq!(back.order(), 4);
        for i in 0..=20 {
            let x = i as f64 / 20.0;
            assert!((back.evaluate(x) - f.evaluate(x)).abs() < 1e-10);
        }
    }

    #[test]
    fn integrate_at_max_order_is_a_no_op() {
        let c = Carrier::with_domain(0.0, 1.0, 2, 2).unwrap();
        let mut s = BSpline1::new(2, 2).unwrap();
        s.set_carrier(0.0, 1.0, 2, 2, BoundaryCondition::Natural, BoundaryCondition::Natural)
            .unwrap();
        s.set_weights(&[1.0, 2.0, 3.0]).unwrap();
        let before = s.clone();
        s.integrate(0.0, 0.0);
        assert!(s.is_static_data_equal(&before));
        assert_eq!(s.carrier(), &c);
    }

    #[test]
    fn differentiate_order_one() {
        let mut s = BSpline1::with_weights(0.0, 2.0, 2, 1, &[1.0, 2.0]).unwrap();
        s.differentiate();
        assert_eq!(s.order(), 1);
        assert_eq!(s.weights(), &[0.0, 0.0]);
        assert_eq!(s.taylor_orders(), TaylorOrders::new(0, 0));
        assert_eq!(s.evaluate(-3.0), 0.0);
    }

    #[test]
    fn add_line_hits_reference() {
        let mut s =
            BSpline1::with_weights(0.0, 3.0, 3, 3, &[0.0, 1.0, 0.0, 1.0, 0.0])
                .unwrap();
        let at_fix = s.evaluate(0.5);
        s.add_line(0.5, 2.0, 7.0);
        assert!((s.evaluate(2.0) - 7.0).abs() < 1e-12);
        assert!((s.evaluate(0.5) - at_fix).abs() < 1e-12);
    }

    #[test]
    fn weight_statistics() {
        let mut s =
            BSpline1::with_weights(0.0, 2.0, 2, 2, &[1.0, -2.0, 3.0]).unwrap();
        assert!((s.weight_mean() - 2.0 / 3.0).abs() < 1e-15);
        assert_eq!(s.norm_p(1), 6.0);
        assert_eq!(s.norm_p(2), 14.0);
        assert_eq!(s.weighted_norm_of_bend(-2.0), 6.0);

        s.set_weight_mean(1.0);
        assert!((s.weight_mean() - 1.0).abs() < 1e-15);
    }

    #[test]
    fn seam_matches_boundary_polynomial() {
        let s = BSpline1::with_weights(
            -1.0,
            1.0,
            4,
            5,
            &[0.3, -0.2, 0.9, 1.4, 0.1, -0.7, 0.5, 0.8],
        )
        .unwrap();
        let a = s.lower_bound();
        let b = s.upper_bound();
        assert!((s.evaluate(a) - s.lower_taylor().evaluate(0.0)).abs() < 1e-12);
        assert!((s.evaluate(b) - s.upper_taylor().evaluate(0.0)).abs() < 1e-12);
        // Continuity across the seam from outside.
        assert!((s.evaluate(a - 1e-9) - s.evaluate(a)).abs() < 1e-6);
        assert!((s.evaluate(b + 1e-9) - s.evaluate(b)).abs() < 1e-6);
    }

    #[test]
    fn snapshot_restore() {
        let s = BSpline1::with_weights(0.0, 2.0, 2, 3, &[1.0, 0.0, 2.0, 1.0])
            .unwrap();
        let mut t = BSpline1::new(8, 6).unwrap();
        t.restore(&s.snapshot()).unwrap();
        assert!(t.is_static_data_equal(&s));

        let mut bad = s.snapshot();
        bad.weights.pop();
        let before = t.clone();
        assert!(t.restore(&bad).is_err());
        assert!(t.is_static_data_equal(&before));
    }
}
