//! The extended equidistant knot vector of one axis.
//!
//! A [`Carrier`] owns the domain `[A, B]`, the interval count `N`, the
//! order `K` and the knot array `T`. For `K > 2` the knots are extended by
//! `K - 2` intervals on each side so the de Boor stencil always finds the
//! knots it needs, even at the boundary windows.
//!
//! Because all knots are equidistant every knot difference the recursion
//! needs is a multiple of the step `H`. Their reciprocals are precomputed
//! once per build in `delta_t_inv`.

use crate::{
    snapshot::CarrierData, taylor::TaylorPoly, BoundaryCondition, SplineError,
    SplineResult, TaylorOrders, MAX_ORDER,
};
use lerp::Lerp;
use tracing::debug;

/// Where an abscissa lies relative to the domain of a carrier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Position {
    Below,
    Inside,
    Above,
}

/// Which end of a weight's support to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Lower,
    Upper,
}

/// Knot vector, domain and order of one spline axis.
#[derive(Clone, Debug)]
pub struct Carrier {
    a: f64,
    b: f64,
    n: usize,
    k: usize,
    max_intervals: usize,
    max_order: usize,
    knots: Vec<f64>,
    h: f64,
    delta_t_inv: [f64; MAX_ORDER],
    max_interval_index: usize,
}

impl Carrier {
    /// Creates a carrier with the given capacities.
    ///
    /// The initial state is the order 1 carrier of `[0, 1]` with one
    /// interval.
    pub fn new(max_intervals: usize, max_order: usize) -> SplineResult<Self> {
        if max_order == 0 || max_order > MAX_ORDER {
            return Err(SplineError::MaxOrderTooLarge {
                max_order,
                limit: MAX_ORDER,
            });
        }
        if max_intervals == 0 {
            return Err(SplineError::InvalidIntervals {
                n: max_intervals,
                max: max_intervals,
            });
        }

        let mut carrier = Self {
            a: 0.0,
            b: 1.0,
            n: 1,
            k: 1,
            max_intervals,
            max_order,
            knots: Vec::new(),
            h: 1.0,
            delta_t_inv: [1.0; MAX_ORDER],
            max_interval_index: 0,
        };
        carrier.build();
        Ok(carrier)
    }

    /// Creates a carrier for `[a, b]` with `n` intervals of order `k`.
    ///
    /// The capacities are `n` intervals and [`MAX_ORDER`].
    pub fn with_domain(a: f64, b: f64, n: usize, k: usize) -> SplineResult<Self> {
        let mut carrier = Self::new(n.max(1), MAX_ORDER)?;
        carrier.set(a, b, n, k)?;
        Ok(carrier)
    }

    /// Replaces domain, interval count and order and rebuilds the knots.
    pub fn set(&mut self, a: f64, b: f64, n: usize, k: usize) -> SplineResult<()> {
        self.validate(a, b, n, k)?;
        self.a = a;
        self.b = b;
        self.n = n;
        self.k = k;
        self.build();
        Ok(())
    }

    fn validate(&self, a: f64, b: f64, n: usize, k: usize) -> SplineResult<()> {
        // Also rejects NaN bounds.
        if !(a < b) {
            return Err(SplineError::InvalidDomain { lower: a, upper: b });
        }
        if n == 0 || n > self.max_intervals {
            return Err(SplineError::InvalidIntervals {
                n,
                max: self.max_intervals,
            });
        }
        if k == 0 || k > self.max_order {
            return Err(SplineError::InvalidOrder {
                k,
                max: self.max_order,
            });
        }
        Ok(())
    }

    /// Changes only the order, keeping domain and interval count.
    ///
    /// Callers guarantee `1 <= k <= max_order`.
    pub(crate) fn reorder(&mut self, k: usize) {
        debug_assert!(k >= 1 && k <= self.max_order);
        self.k = k;
        self.build();
    }

    fn build(&mut self) {
        let t_len = Self::knot_len(self.n, self.k);
        let span = self.b - self.a;
        let out_of = if self.k > 2 {
            span / self.n as f64 * (self.k - 2) as f64
        } else {
            0.0
        };
        let length = span + 2.0 * out_of;
        let last = (t_len - 1) as f64;

        self.knots.clear();
        self.knots.extend(
            (0..t_len).map(|i| self.a - out_of + length * i as f64 / last),
        );

        self.h = span / self.n as f64;
        self.delta_t_inv = [1.0; MAX_ORDER];
        for i in 1..self.k.max(2) {
            self.delta_t_inv[i] = 1.0 / (i as f64 * self.h);
        }

        let index = ((self.b - 0.5 * self.h - self.knots[0]) * self.delta_t_inv[1])
            .floor();
        self.max_interval_index = if index > 0.0 { index as usize } else { 0 };
    }

    /// Number of knots of a carrier with `n` intervals of order `k`.
    #[inline]
    pub fn knot_len(n: usize, k: usize) -> usize {
        if k == 1 {
            n + 1
        } else {
            n + 2 * k - 3
        }
    }

    /// Number of weights of a carrier with `n` intervals of order `k`.
    #[inline]
    pub fn weight_len(n: usize, k: usize) -> usize {
        n + k - 1
    }

    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.a
    }

    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.b
    }

    #[inline]
    pub fn intervals(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn max_intervals(&self) -> usize {
        self.max_intervals
    }

    #[inline]
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Knot spacing `H = (B - A) / N`.
    #[inline]
    pub fn step(&self) -> f64 {
        self.h
    }

    /// The extended knot array.
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// `WLen = N + K - 1`.
    #[inline]
    pub fn weight_count(&self) -> usize {
        Self::weight_len(self.n, self.k)
    }

    /// Reciprocal knot differences `{1, 1/H, 1/2H, ...}`.
    #[inline]
    pub fn delta_t_inv(&self) -> &[f64] {
        &self.delta_t_inv[..self.k.max(2)]
    }

    #[inline]
    pub fn max_interval_index(&self) -> usize {
        self.max_interval_index
    }

    #[inline]
    pub fn locate(&self, x: f64) -> Position {
        if x < self.a {
            Position::Below
        } else if x > self.b {
            Position::Above
        } else {
            Position::Inside
        }
    }

    /// Boundary condition tag resolved against the current order.
    #[inline]
    pub fn boundary_order(&self, condition: BoundaryCondition) -> usize {
        condition.order_for(self.k)
    }

    /// Index of the knot interval containing `x`, clamped to the intervals
    /// covering `[A, B]`.
    pub fn interval_index(&self, x: f64) -> usize {
        let low = if self.k == 1 { 0 } else { self.k - 2 };
        let i = ((x - self.knots[0]) * self.delta_t_inv[1]).floor();
        if !(i >= low as f64) {
            low
        } else {
            (i as usize).min(self.max_interval_index)
        }
    }

    /// First weight index of the active window for interval `i`.
    #[inline]
    pub fn main_index(&self, i: usize) -> usize {
        match self.k {
            1 => i,
            k => (i + 2).saturating_sub(k),
        }
    }

    /// First weight index of the window active at `x` in `[A, B]`.
    #[inline]
    pub fn window(&self, x: f64) -> usize {
        self.main_index(self.interval_index(x))
    }

    /// Window at the lower boundary.
    #[inline]
    pub fn lower_window(&self) -> usize {
        self.main_index(self.interval_index(self.a))
    }

    /// Window at the upper boundary.
    #[inline]
    pub fn upper_window(&self) -> usize {
        self.main_index(self.interval_index(self.b))
    }

    /// Window used for `x`, with abscissae outside the domain mapped to the
    /// boundary window their Taylor polynomial is built from.
    #[inline]
    pub fn window_for(&self, x: f64) -> usize {
        match self.locate(x) {
            Position::Below => self.lower_window(),
            Position::Inside => self.window(x),
            Position::Above => self.upper_window(),
        }
    }

    /// Equidistant de Boor recursion of order `k` over the window `d`,
    /// using the knots starting at `t_off`.
    ///
    /// `d` must hold at least `k` weights and `k <= self.order()`.
    pub fn blend(&self, x: f64, k: usize, d: &[f64], t_off: usize) -> f64 {
        let t = &self.knots[t_off..];
        let dti = &self.delta_t_inv;
        match k {
            0 => 0.0,
            1 => d[0],
            2 => {
                let alpha = (x - t[0]) * dti[1];
                Lerp::lerp(d[0], d[1], alpha)
            }
            3 => {
                let a0 = (x - t[0]) * dti[2];
                let x_t1 = x - t[1];
                let a1 = x_t1 * dti[2];
                let a01 = x_t1 * dti[1];
                Lerp::lerp(
                    Lerp::lerp(d[0], d[1], a0),
                    Lerp::lerp(d[1], d[2], a1),
                    a01,
                )
            }
            _ => {
                let mut dd = [0.0; MAX_ORDER];
                dd[..k].copy_from_slice(&d[..k]);
                for i in 0..k - 1 {
                    for j in 0..k - 1 - i {
                        let alpha = (x - t[j + i]) * dti[k - 1 - i];
                        dd[j] = Lerp::lerp(dd[j], dd[j + 1], alpha);
                    }
                }
                dd[0]
            }
        }
    }

    /// Value of the spline piece at `x` over the window starting at weight
    /// `r`. `d` is the window itself.
    #[inline]
    pub fn value(&self, x: f64, d: &[f64], r: usize) -> f64 {
        self.blend(x, self.k, d, r)
    }

    /// Reduce `dd[..kk]` to the weights of the derivative piece, in place.
    /// Returns the new order.
    #[inline]
    fn reduce(&self, dd: &mut [f64; MAX_ORDER], kk: usize) -> usize {
        for j in 1..kk {
            dd[j - 1] = (dd[j] - dd[j - 1]) * self.delta_t_inv[1];
        }
        kk - 1
    }

    /// `m`-th derivative of the spline piece over the window starting at
    /// weight `r`.
    pub fn derivative_value(&self, x: f64, m: usize, d: &[f64], r: usize) -> f64 {
        if m == 0 {
            return self.value(x, d, r);
        }
        if m >= self.k {
            return 0.0;
        }
        let mut dd = [0.0; MAX_ORDER];
        dd[..self.k].copy_from_slice(&d[..self.k]);
        let mut kk = self.k;
        for _ in 0..m {
            kk = self.reduce(&mut dd, kk);
        }
        self.blend(x, kk, &dd, r + m)
    }

    /// Taylor polynomial with `n` terms of the piece over window `d` at the
    /// expansion point `x`. `n` is capped at the order.
    pub fn taylor_poly(&self, d: &[f64], x: f64, n: usize) -> TaylorPoly {
        let n = n.min(self.k);
        if n == 0 {
            return TaylorPoly::ZERO;
        }

        let mut poly = TaylorPoly::ZERO;
        poly.order = n;
        if self.k == 1 {
            poly.coeffs[0] = d[0];
            return poly;
        }

        let r = self.window(x);
        let mut dd = [0.0; MAX_ORDER];
        dd[..self.k].copy_from_slice(&d[..self.k]);
        let mut kk = self.k;
        let mut f = 1.0;

        poly.coeffs[n - 1] = self.blend(x, kk, &dd, r);
        for i in 1..n {
            f *= i as f64;
            kk = self.reduce(&mut dd, kk);
            poly.coeffs[n - 1 - i] = self.blend(x, kk, &dd, r + i) / f;
        }
        poly
    }

    /// `m`-th derivative at `x` of the spline whose active window starts at
    /// `window[0]`, the window being the one [`window_for`](Self::window_for)
    /// picks. Outside the domain the boundary Taylor polynomial of the given
    /// order is formed from that window on the fly.
    pub fn evaluate_window(
        &self,
        x: f64,
        m: usize,
        window: &[f64],
        orders: TaylorOrders,
    ) -> f64 {
        match self.locate(x) {
            Position::Inside => self.derivative_value(x, m, window, self.window(x)),
            Position::Below => self
                .taylor_poly(window, self.a, orders.lower)
                .nth_derivative(m)
                .evaluate(x - self.a),
            Position::Above => self
                .taylor_poly(window, self.b, orders.upper)
                .nth_derivative(m)
                .evaluate(x - self.b),
        }
    }

    /// Like [`evaluate_window`](Self::evaluate_window) but takes the full
    /// weight lane of this axis.
    #[inline]
    pub fn evaluate_lane(
        &self,
        x: f64,
        m: usize,
        lane: &[f64],
        orders: TaylorOrders,
    ) -> f64 {
        self.evaluate_window(x, m, &lane[self.window_for(x)..], orders)
    }

    /// Representative abscissa of weight `index`.
    pub fn weight_position(&self, index: usize) -> f64 {
        let t = &self.knots;
        let k = self.k;
        if k == 1 {
            t[index]
        } else if k % 2 == 1 {
            let i = index + k / 2 - 1;
            0.5 * (t[i] + t[i + 1])
        } else {
            t[index + k / 2 - 1]
        }
    }

    /// Representative abscissae of all weights.
    pub fn weight_positions(&self) -> Vec<f64> {
        (0..self.weight_count())
            .map(|i| self.weight_position(i))
            .collect()
    }

    /// One end of the support of weight `index`.
    ///
    /// Supports reaching past the domain report `-inf`/`+inf`.
    pub fn carrier_edge(&self, edge: Edge, index: usize) -> f64 {
        let t = &self.knots;
        let t_len = t.len();
        match (edge, self.k) {
            (Edge::Lower, 1) => {
                if index > 0 {
                    t[index]
                } else {
                    f64::NEG_INFINITY
                }
            }
            (Edge::Upper, 1) => {
                if index + 1 < t_len - 1 {
                    t[index + 1]
                } else {
                    f64::INFINITY
                }
            }
            (Edge::Lower, _) => match index.checked_sub(1).map(|i| t[i]) {
                Some(value) if self.locate(value) != Position::Below => value,
                _ => f64::NEG_INFINITY,
            },
            (Edge::Upper, k) => match t.get(index + k - 1) {
                Some(&value) if self.locate(value) != Position::Above => value,
                _ => f64::INFINITY,
            },
        }
    }

    /// Support edges of all weights.
    pub fn carrier_edges(&self, edge: Edge) -> Vec<f64> {
        (0..self.weight_count())
            .map(|i| self.carrier_edge(edge, i))
            .collect()
    }

    /// First and last weight index whose support lies within `[a, b]`.
    pub fn domain_sub_weight_indexes(&self, a: f64, b: f64) -> (usize, usize) {
        let n = self.weight_count();

        let ia = (0..n)
            .find(|&i| a <= self.carrier_edge(Edge::Lower, i))
            .unwrap_or(n - 1);
        let ib = (1..=n)
            .rev()
            .find(|&i| self.carrier_edge(Edge::Upper, i - 1) <= b)
            .map_or(0, |i| i - 1);

        (ia, ib)
    }

    /// Widens this carrier to cover `other` as well.
    ///
    /// The domain becomes the union, the order the larger one. The interval
    /// count is scaled from the finer of the two carriers by the ratio of
    /// domain lengths and truncated. Knots of the result are not guaranteed
    /// to align with either input.
    pub fn merge_max(&mut self, other: &Carrier) -> SplineResult<()> {
        let (old_a, old_b) = (self.a, self.b);
        let a = self.a.min(other.a);
        let b = self.b.max(other.b);
        let k = self.k.max(other.k);
        let n = if self.n < other.n {
            (other.n as f64 * (b - a) / (other.b - other.a)) as usize
        } else {
            (self.n as f64 * (b - a) / (old_b - old_a)) as usize
        };
        let n = n.max(1);

        debug!(a, b, n, k, "merged carrier");
        self.set(a, b, n, k)
    }

    /// Compares domain, interval count, order and knots within `max_delta`.
    pub fn is_approximated_equal(&self, other: &Carrier, max_delta: f64) -> bool {
        (self.a - other.a).abs() <= max_delta
            && (self.b - other.b).abs() <= max_delta
            && (self.n as f64 - other.n as f64).abs() <= max_delta
            && (self.k as f64 - other.k as f64).abs() <= max_delta
            && approximated_equal(&self.knots, &other.knots, max_delta)
    }

    /// The persistent part of this carrier.
    pub fn data(&self) -> CarrierData {
        CarrierData {
            a: self.a,
            b: self.b,
            n: self.n,
            k: self.k,
        }
    }

    /// Rebuilds this carrier from persisted data.
    pub fn set_data(&mut self, data: &CarrierData) -> SplineResult<()> {
        self.set(data.a, data.b, data.n, data.k)
    }
}

/// Exact comparison of the persistent data.
impl PartialEq for Carrier {
    fn eq(&self, other: &Self) -> bool {
        self.a == other.a && self.b == other.b && self.n == other.n && self.k == other.k
    }
}

/// Element-wise comparison within `max_delta`; slices of different length
/// are never equal.
pub(crate) fn approximated_equal(x: &[f64], y: &[f64], max_delta: f64) -> bool {
    x.len() == y.len() && x.iter().zip(y).all(|(a, b)| (a - b).abs() <= max_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier(a: f64, b: f64, n: usize, k: usize) -> Carrier {
        Carrier::with_domain(a, b, n, k).unwrap()
    }

    #[test]
    fn knot_layout() {
        let c = carrier(0.0, 2.0, 2, 1);
        assert_eq!(c.knots(), &[0.0, 1.0, 2.0]);
        assert_eq!(c.weight_count(), 2);

        let c = carrier(0.0, 2.0, 2, 2);
        assert_eq!(c.knots(), &[0.0, 1.0, 2.0]);
        assert_eq!(c.weight_count(), 3);

        // Extended by K - 2 intervals on each side.
        let c = carrier(0.0, 4.0, 4, 4);
        assert_eq!(c.knots().len(), 9);
        assert!((c.knots()[0] + 2.0).abs() < 1e-12);
        assert!((c.knots()[8] - 6.0).abs() < 1e-12);
        assert_eq!(c.step(), 1.0);
        assert_eq!(c.delta_t_inv(), &[1.0, 1.0, 0.5, 1.0 / 3.0]);
        assert_eq!(c.weight_count(), 7);
    }

    #[test]
    fn windows() {
        for k in 1..=MAX_ORDER {
            let c = carrier(-1.0, 3.0, 8, k);
            assert_eq!(c.lower_window(), 0, "order {k}");
            assert_eq!(c.upper_window(), 7, "order {k}");
            assert_eq!(c.window_for(-10.0), 0);
            assert_eq!(c.window_for(10.0), 7);
            // Window plus order never runs past the weights.
            for i in 0..=80 {
                let x = -1.0 + 4.0 * i as f64 / 80.0;
                assert!(c.window(x) + k <= c.weight_count());
            }
        }
    }

    #[test]
    fn reproduces_lines() {
        // Weights at the weight positions reproduce the identity.
        for k in 2..=MAX_ORDER {
            let c = carrier(-1.0, 2.0, 5, k);
            let w = c.weight_positions();
            let orders = TaylorOrders::new(k, k);
            for i in 0..=30 {
                let x = -1.0 + 3.0 * i as f64 / 30.0;
                let y = c.evaluate_lane(x, 0, &w, orders);
                assert!((y - x).abs() < 1e-12, "order {k}: f({x}) = {y}");
                let dy = c.evaluate_lane(x, 1, &w, orders);
                assert!((dy - 1.0).abs() < 1e-10, "order {k}: f'({x}) = {dy}");
            }
            // The boundary polynomials continue the line.
            assert!((c.evaluate_lane(-3.0, 0, &w, orders) + 3.0).abs() < 1e-10);
            assert!((c.evaluate_lane(4.5, 0, &w, orders) - 4.5).abs() < 1e-10);
        }
    }

    #[test]
    fn invalid_setup() {
        let mut c = Carrier::new(4, 3).unwrap();
        assert_eq!(
            c.set(1.0, 1.0, 2, 2),
            Err(SplineError::InvalidDomain {
                lower: 1.0,
                upper: 1.0
            })
        );
        assert_eq!(
            c.set(0.0, 1.0, 5, 2),
            Err(SplineError::InvalidIntervals { n: 5, max: 4 })
        );
        assert_eq!(
            c.set(0.0, 1.0, 2, 4),
            Err(SplineError::InvalidOrder { k: 4, max: 3 })
        );
        assert!(c.set(0.0, f64::NAN, 2, 2).is_err());
        assert!(Carrier::new(4, MAX_ORDER + 1).is_err());
        // Failed sets leave the carrier untouched.
        assert_eq!(c.order(), 1);
        assert_eq!(c.upper_bound(), 1.0);
    }

    #[test]
    fn weight_positions() {
        let c = carrier(0.0, 2.0, 2, 1);
        assert_eq!(c.weight_positions(), vec![0.0, 1.0]);

        let c = carrier(0.0, 2.0, 2, 2);
        assert_eq!(c.weight_positions(), vec![0.0, 1.0, 2.0]);

        // Order 3: midpoints of consecutive knots.
        let c = carrier(0.0, 2.0, 2, 3);
        assert_eq!(c.weight_positions(), vec![-0.5, 0.5, 1.5, 2.5]);
    }

    #[test]
    fn carrier_edges() {
        let c = carrier(0.0, 4.0, 4, 2);
        assert_eq!(c.carrier_edge(Edge::Lower, 0), f64::NEG_INFINITY);
        assert_eq!(c.carrier_edge(Edge::Lower, 1), 0.0);
        assert_eq!(c.carrier_edge(Edge::Upper, 0), 1.0);
        assert_eq!(c.carrier_edge(Edge::Upper, 4), f64::INFINITY);

        assert_eq!(c.domain_sub_weight_indexes(0.0, 4.0), (1, 3));
        assert_eq!(c.domain_sub_weight_indexes(1.0, 3.0), (2, 2));
    }

    #[test]
    fn merge() {
        let mut c = Carrier::new(64, 4).unwrap();
        c.set(0.0, 1.0, 4, 2).unwrap();
        let other = carrier(0.5, 2.0, 6, 3);
        c.merge_max(&other).unwrap();
        assert_eq!(c.lower_bound(), 0.0);
        assert_eq!(c.upper_bound(), 2.0);
        assert_eq!(c.order(), 3);
        assert_eq!(c.intervals(), 8);

        let mut small = Carrier::new(4, 4).unwrap();
        small.set(0.0, 1.0, 4, 2).unwrap();
        assert!(small.merge_max(&carrier(0.0, 10.0, 4, 2)).is_err());
    }

    #[test]
    fn approximated_equality() {
        let c = carrier(0.0, 1.0, 4, 3);
        let d = carrier(0.0, 1.0 + 1e-9, 4, 3);
        assert!(c != d);
        assert!(c.is_approximated_equal(&d, 1e-6));
        assert!(!c.is_approximated_equal(&carrier(0.0, 1.0, 4, 4), 0.5));
    }
}
