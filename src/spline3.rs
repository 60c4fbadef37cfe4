//! Three-dimensional tensor-product B-spline functions with a lazy profile
//! cache along X.
//!
//! Most uses of a 3D spline sweep X at a fixed `(y, z)`: inverting along X,
//! sampling a curve, or differentiating along X. For a fixed `(y, z)` the
//! function is a 1D spline in X whose weights are the Y/Z reductions of the
//! weight tensor. [`BSpline3`] keeps those reduced weights in a
//! [`ProfileCache`], building each entry the first time an X window needs
//! it and reusing it until a different `(y, z)` is preset.

use crate::{
    carrier::{approximated_equal, Carrier},
    format::{self, FieldReader, FormatError},
    invert::{secant_retained, InverseOptions},
    lanes,
    snapshot::Snapshot3,
    spline_trait::{Axis, EquidistantSpline},
    taylor::{BoundaryCondition, TaylorOrders},
    SplineError, SplineResult, MAX_ORDER,
};
use std::io::{BufRead, Write};
use tracing::trace;

/// Y/Z-reduced weights for one preset `(y, z)`.
#[derive(Clone, Debug, Default)]
pub struct ProfileCache {
    y: f64,
    z: f64,
    values: Vec<f64>,
    built: Vec<bool>,
    builds: usize,
}

impl ProfileCache {
    /// The `(y, z)` the cached entries belong to.
    #[inline]
    pub fn preset(&self) -> (f64, f64) {
        (self.y, self.z)
    }

    /// One entry per X weight. Entries not yet built are zero.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    #[inline]
    pub fn is_built(&self, index: usize) -> bool {
        self.built.get(index).copied().unwrap_or(false)
    }

    /// Total number of entries built since construction.
    #[inline]
    pub fn builds(&self) -> usize {
        self.builds
    }

    fn reset(&mut self, len: usize) {
        self.values.clear();
        self.values.resize(len, 0.0);
        self.built.clear();
        self.built.resize(len, false);
    }
}

/// A B-spline function of three variables.
///
/// Weight `(ix, iy, iz)` lives at `(iy + wy * ix) * wz + iz`: Z runs
/// fastest, X slowest.
///
/// Evaluation at a single point goes through the profile cache and
/// therefore takes `&mut self`; [`value_at`](Self::value_at) and
/// [`partial`](Self::partial) are the non-caching alternatives.
#[derive(Clone, Debug)]
pub struct BSpline3 {
    x: Carrier,
    y: Carrier,
    z: Carrier,
    weights: Vec<f64>,
    taylor_x: TaylorOrders,
    taylor_y: TaylorOrders,
    taylor_z: TaylorOrders,
    cache: ProfileCache,
}

impl BSpline3 {
    /// Creates the zero function with the same capacities on all axes.
    pub fn new(max_intervals: usize, max_order: usize) -> SplineResult<Self> {
        let axis = (max_intervals, max_order);
        Self::with_capacities(axis, axis, axis)
    }

    /// Creates the zero function with `(max_intervals, max_order)` per
    /// axis.
    pub fn with_capacities(
        x: (usize, usize),
        y: (usize, usize),
        z: (usize, usize),
    ) -> SplineResult<Self> {
        let x = Carrier::new(x.0, x.1)?;
        let y = Carrier::new(y.0, y.1)?;
        let z = Carrier::new(z.0, z.1)?;
        let mut spline = Self {
            weights: vec![0.0; x.weight_count() * y.weight_count() * z.weight_count()],
            x,
            y,
            z,
            taylor_x: TaylorOrders::default(),
            taylor_y: TaylorOrders::default(),
            taylor_z: TaylorOrders::default(),
            cache: ProfileCache::default(),
        };
        spline.complete();
        Ok(spline)
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
        let (carrier, taylor) = self.axis_mut(axis);
        carrier.set(a, b, n, k)?;
        *taylor = TaylorOrders::from_conditions(lower, upper, k);

        self.weights.clear();
        self.weights.resize(self.dims().iter().product(), 0.0);
        self.complete();
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
    pub fn z(&self) -> &Carrier {
        &self.z
    }

    #[inline]
    pub fn taylor_orders(&self, axis: Axis) -> TaylorOrders {
        match axis {
            Axis::X => self.taylor_x,
            Axis::Y => self.taylor_y,
            Axis::Z => self.taylor_z,
        }
    }

    /// Sets the boundary Taylor orders of `axis`, capped at its order.
    pub fn set_taylor_orders(&mut self, axis: Axis, orders: TaylorOrders) {
        let (carrier, taylor) = self.axis_mut(axis);
        *taylor = orders.clamped(carrier.order());
        self.invalidate();
    }

    #[inline]
    pub fn profile_cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// Flat index of weight `(ix, iy, iz)`.
    #[inline]
    pub fn index(&self, ix: usize, iy: usize, iz: usize) -> usize {
        (iy + self.y.weight_count() * ix) * self.z.weight_count() + iz
    }

    /// Fixes `(y, z)` for the following X evaluations. A different pair
    /// discards the profile cache.
    pub fn preset(&mut self, y: f64, z: f64) {
        if self.cache.y != y || self.cache.z != z {
            self.invalidate();
            self.cache.y = y;
            self.cache.z = z;
        }
    }

    /// Value at `x` for the preset `(y, z)`.
    pub fn evaluate(&mut self, x: f64) -> f64 {
        let r = self.profile(x);
        self.x
            .evaluate_window(x, 0, &self.cache.values[r..], self.taylor_x)
    }

    /// Value at `(x, y, z)` through the profile cache.
    pub fn evaluate_at(&mut self, x: f64, y: f64, z: f64) -> f64 {
        self.preset(y, z);
        self.evaluate(x)
    }

    /// Values at all `xs` for a fixed `(y, z)`.
    pub fn evaluate_many(&mut self, xs: &[f64], y: f64, z: f64) -> Vec<f64> {
        self.preset(y, z);
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// Partial derivative along X at `x` for the preset `(y, z)`.
    pub fn derivative_x(&mut self, x: f64) -> f64 {
        let r = self.profile(x);
        self.x
            .evaluate_window(x, 1, &self.cache.values[r..], self.taylor_x)
    }

    pub fn derivative_x_at(&mut self, x: f64, y: f64, z: f64) -> f64 {
        self.preset(y, z);
        self.derivative_x(x)
    }

    /// Solves `f(x, y, z) == value` for `x` in `[A_x, B_x]`.
    ///
    /// Returns `B_x` when the endpoint values do not bracket `value`.
    #[inline]
    pub fn inv_x(&mut self, value: f64, y: f64, z: f64) -> f64 {
        self.inv_x_with(value, y, z, &InverseOptions::default())
    }

    pub fn inv_x_with(
        &mut self,
        value: f64,
        y: f64,
        z: f64,
        options: &InverseOptions,
    ) -> f64 {
        self.preset(y, z);
        let (lower, upper) = (self.x.lower_bound(), self.x.upper_bound());
        secant_retained(|x| self.evaluate(x), value, lower, upper, options)
    }

    /// Value at `(x, y, z)` without touching the profile cache.
    #[inline]
    pub fn value_at(&self, x: f64, y: f64, z: f64) -> f64 {
        self.partial(x, y, z, [0, 0, 0])
    }

    /// Mixed partial derivative of orders `m = [mx, my, mz]` at
    /// `(x, y, z)`, without touching the profile cache.
    pub fn partial(&self, x: f64, y: f64, z: f64, m: [usize; 3]) -> f64 {
        let rx = self.x.window_for(x);
        let ry = self.y.window_for(y);
        let rz = self.z.window_for(z);

        let mut profile = [0.0; MAX_ORDER];
        for (i, p) in profile[..self.x.order()].iter_mut().enumerate() {
            *p = self.reduce_yz(rx + i, ry, rz, y, z, m[1], m[2]);
        }
        self.x.evaluate_window(x, m[0], &profile, self.taylor_x)
    }

    /// Representative `(x, y, z)` of weight `index`.
    pub fn weight_position(&self, index: usize) -> (f64, f64, f64) {
        let wy = self.y.weight_count();
        let wz = self.z.weight_count();
        (
            self.x.weight_position(index / (wy * wz)),
            self.y.weight_position(index / wz % wy),
            self.z.weight_position(index % wz),
        )
    }

    /// Adds `value` to the function.
    pub fn add(&mut self, value: f64) {
        self.weights.iter_mut().for_each(|w| *w += value);
        self.invalidate();
    }

    /// Multiplies by another 3D spline.
    ///
    /// With equal carriers the weights are multiplied pairwise. Otherwise
    /// the product is sampled at the weight positions of the merged
    /// carriers. On error `self` is unchanged.
    pub fn multiply_by(&mut self, other: &BSpline3) -> SplineResult<()> {
        if self.x == other.x && self.y == other.y && self.z == other.z {
            for (w, o) in self.weights.iter_mut().zip(&other.weights) {
                *w *= o;
            }
            self.invalidate();
            return Ok(());
        }
        self.resample_with(other, |a, b| a * b)
    }

    /// Adds another 3D spline, sampled at the weight positions of the
    /// merged carriers. On error `self` is unchanged.
    pub fn add_function(&mut self, other: &BSpline3) -> SplineResult<()> {
        self.resample_with(other, |a, b| a + b)
    }

    fn resample_with<F>(&mut self, other: &BSpline3, op: F) -> SplineResult<()>
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut merged = self.clone();
        merged.x.merge_max(&other.x)?;
        merged.y.merge_max(&other.y)?;
        merged.z.merge_max(&other.z)?;
        merged.taylor_x = self.taylor_x.max(other.taylor_x).clamped(merged.x.order());
        merged.taylor_y = self.taylor_y.max(other.taylor_y).clamped(merged.y.order());
        merged.taylor_z = self.taylor_z.max(other.taylor_z).clamped(merged.z.order());

        let count: usize = merged.dims().iter().product();
        merged.weights = (0..count)
            .map(|i| {
                let (x, y, z) = merged.weight_position(i);
                op(self.value_at(x, y, z), other.value_at(x, y, z))
            })
            .collect();
        merged.complete();

        *self = merged;
        Ok(())
    }

    /// `[wx, wy, wz]`, the extents of the weight tensor.
    #[inline]
    fn dims(&self) -> [usize; 3] {
        [
            self.x.weight_count(),
            self.y.weight_count(),
            self.z.weight_count(),
        ]
    }

    fn axis_mut(&mut self, axis: Axis) -> (&mut Carrier, &mut TaylorOrders) {
        match axis {
            Axis::X => (&mut self.x, &mut self.taylor_x),
            Axis::Y => (&mut self.y, &mut self.taylor_y),
            Axis::Z => (&mut self.z, &mut self.taylor_z),
        }
    }

    #[inline]
    fn invalidate(&mut self) {
        self.cache.reset(self.x.weight_count());
    }

    /// Reduces the `K_y x K_z` block in front of X weight `ix` to one
    /// value: first along Z for each of the `K_y` rows, then along Y.
    #[allow(clippy::too_many_arguments)]
    fn reduce_yz(
        &self,
        ix: usize,
        ry: usize,
        rz: usize,
        y: f64,
        z: f64,
        my: usize,
        mz: usize,
    ) -> f64 {
        let mut column = [0.0; MAX_ORDER];
        for (j, c) in column[..self.y.order()].iter_mut().enumerate() {
            let start = self.index(ix, ry + j, rz);
            *c = self
                .z
                .evaluate_window(z, mz, &self.weights[start..], self.taylor_z);
        }
        self.y.evaluate_window(y, my, &column, self.taylor_y)
    }

    /// Makes sure the profile entries of the X window active at `x` are
    /// built. Returns the first index of that window.
    fn profile(&mut self, x: f64) -> usize {
        let r = self.x.window_for(x);
        let (y, z) = self.cache.preset();
        let ry = self.y.window_for(y);
        let rz = self.z.window_for(z);

        for ix in r..r + self.x.order() {
            if !self.cache.built[ix] {
                let value = self.reduce_yz(ix, ry, rz, y, z, 0, 0);
                self.cache.values[ix] = value;
                self.cache.built[ix] = true;
                self.cache.builds += 1;
                trace!(ix, y, z, value, "built profile entry");
            }
        }
        r
    }

    fn loaded_from(&self, fields: &FieldReader) -> Result<Self, FormatError> {
        let orders = |axis: &str| -> Result<TaylorOrders, FormatError> {
            Ok(TaylorOrders::new(
                fields.require_usize(None, &format!("lTp_{axis}"))?,
                fields.require_usize(None, &format!("uTp_{axis}"))?,
            ))
        };
        let x = format::read_carrier(fields, Some("x"))?;
        let y = format::read_carrier(fields, Some("y"))?;
        let z = format::read_carrier(fields, Some("z"))?;
        let taylor_x = orders("x")?;
        let taylor_y = orders("y")?;
        let taylor_z = orders("z")?;
        let weights = format::read_weights(
            fields,
            x.weight_count() * y.weight_count() * z.weight_count(),
        )?;

        let mut loaded = self.clone();
        loaded.restore(&Snapshot3 {
            x,
            y,
            z,
            taylor_x,
            taylor_y,
            taylor_z,
            weights,
        })?;
        Ok(loaded)
    }
}

impl EquidistantSpline for BSpline3 {
    const DIMENSIONS: usize = 3;
    type Snapshot = Snapshot3;

    fn carrier(&self, axis: Axis) -> SplineResult<&Carrier> {
        Ok(match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        })
    }

    #[inline]
    fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Also discards the profile cache.
    fn set_weight(&mut self, index: usize, value: f64) -> SplineResult<()> {
        let len = self.weights.len();
        let w = self
            .weights
            .get_mut(index)
            .ok_or(SplineError::WeightIndexOutOfRange { index, len })?;
        *w = value;
        self.invalidate();
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
        self.complete();
        Ok(())
    }

    /// Empties the profile cache and presets `(0, 0)`.
    fn complete(&mut self) {
        self.cache.y = 0.0;
        self.cache.z = 0.0;
        self.invalidate();
    }

    fn multiply(&mut self, value: f64) {
        self.weights.iter_mut().for_each(|w| *w *= value);
        self.invalidate();
    }

    fn differentiate_along(&mut self, axis: Axis) -> SplineResult<()> {
        let dims = self.dims();
        let len = self.weights.len();
        let (carrier, taylor) = self.axis_mut(axis);

        let k = carrier.order();
        if k == 1 {
            *taylor = TaylorOrders::default();
            self.weights = vec![0.0; len];
        } else {
            let h = carrier.step();
            carrier.reorder(k - 1);
            *taylor = taylor.decremented();

            let lane_len = dims[axis.index()];
            self.weights = lanes::map_lanes(
                &self.weights,
                &dims,
                axis.index(),
                lane_len - 1,
                |lane, out| lanes::differentiate(lane, h, out),
            );
        }
        self.complete();
        Ok(())
    }

    fn integrate_along(
        &mut self,
        axis: Axis,
        at: f64,
        value: f64,
    ) -> SplineResult<()> {
        let dims = self.dims();
        let (carrier, taylor) = self.axis_mut(axis);

        let k = carrier.order();
        if k >= carrier.max_order() {
            return Ok(());
        }

        let h = carrier.step();
        carrier.reorder(k + 1);
        *taylor = taylor.incremented().clamped(k + 1);
        let carrier = carrier.clone();
        let orders = *taylor;

        let lane_axis = axis.index();
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
        self.complete();
        Ok(())
    }

    fn snapshot(&self) -> Snapshot3 {
        Snapshot3 {
            x: self.x.data(),
            y: self.y.data(),
            z: self.z.data(),
            taylor_x: self.taylor_x,
            taylor_y: self.taylor_y,
            taylor_z: self.taylor_z,
            weights: self.weights.clone(),
        }
    }

    fn restore(&mut self, snapshot: &Snapshot3) -> SplineResult<()> {
        let mut x = self.x.clone();
        let mut y = self.y.clone();
        let mut z = self.z.clone();
        x.set_data(&snapshot.x)?;
        y.set_data(&snapshot.y)?;
        z.set_data(&snapshot.z)?;
        let expected = x.weight_count() * y.weight_count() * z.weight_count();
        if snapshot.weights.len() != expected {
            return Err(SplineError::SizeMismatch {
                expected,
                actual: snapshot.weights.len(),
            });
        }

        self.taylor_x = snapshot.taylor_x.clamped(x.order());
        self.taylor_y = snapshot.taylor_y.clamped(y.order());
        self.taylor_z = snapshot.taylor_z.clamped(z.order());
        self.x = x;
        self.y = y;
        self.z = z;
        self.weights.clone_from(&snapshot.weights);
        self.complete();
        Ok(())
    }

    fn is_static_data_equal(&self, other: &Self) -> bool {
        self.x == other.x
            && self.y == other.y
            && self.z == other.z
            && self.weights == other.weights
            && self.taylor_x == other.taylor_x
            && self.taylor_y == other.taylor_y
            && self.taylor_z == other.taylor_z
    }

    fn is_approximated_equal(&self, other: &Self, max_delta: f64) -> bool {
        let close = |a: TaylorOrders, b: TaylorOrders| {
            (a.lower as f64 - b.lower as f64).abs() <= max_delta
                && (a.upper as f64 - b.upper as f64).abs() <= max_delta
        };
        self.x.is_approximated_equal(&other.x, max_delta)
            && self.y.is_approximated_equal(&other.y, max_delta)
            && self.z.is_approximated_equal(&other.z, max_delta)
            && approximated_equal(&self.weights, &other.weights, max_delta)
            && close(self.taylor_x, other.taylor_x)
            && close(self.taylor_y, other.taylor_y)
            && close(self.taylor_z, other.taylor_z)
    }

    fn load<R: BufRead>(&mut self, reader: R) -> bool {
        let current = self.clone();
        format::load_into(reader, self, "spline3", |fields| {
            current.loaded_from(fields)
        })
    }

    fn save<W: Write>(&self, writer: W, path: &str) -> bool {
        format::save_with(writer, path, "spline3", |fields| {
            format::write_carrier(fields, "x.", &self.x.data())?;
            format::write_carrier(fields, "y.", &self.y.data())?;
            format::write_carrier(fields, "z.", &self.z.data())?;
            for (tag, orders) in [
                ('x', self.taylor_x),
                ('y', self.taylor_y),
                ('z', self.taylor_z),
            ] {
                fields.write_usize(
                    &format!("lTp_{tag}"),
                    orders.lower,
                    &format!("lower Taylor order {tag}"),
                )?;
                fields.write_usize(
                    &format!("uTp_{tag}"),
                    orders.upper,
                    &format!("upper Taylor order {tag}"),
                )?;
            }
            fields.write_array("w", &self.weights, "weights, z fastest")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(x, y, z) = x + 2y + 3z on [0, 2] x [-1, 1] x [0, 1].
    fn volume(kx: usize, ky: usize, kz: usize) -> BSpline3 {
        let full = BoundaryCondition::Full;
        let mut s = BSpline3::new(8, 5).unwrap();
        s.set_carrier(Axis::X, 0.0, 2.0, 4, kx, full, full).unwrap();
        s.set_carrier(Axis::Y, -1.0, 1.0, 2, ky, full, full).unwrap();
        s.set_carrier(Axis::Z, 0.0, 1.0, 3, kz, full, full).unwrap();
        let weights: Vec<f64> = (0..s.number_of_weights())
            .map(|i| {
                let (x, y, z) = s.weight_position(i);
                x + 2.0 * y + 3.0 * z
            })
            .collect();
        s.set_weights(&weights).unwrap();
        s
    }

    fn plane(x: f64, y: f64, z: f64) -> f64 {
        x + 2.0 * y + 3.0 * z
    }

    #[test]
    fn layout() {
        let s = volume(2, 3, 4);
        // wx = 5, wy = 4, wz = 6.
        assert_eq!(s.number_of_weights(), 5 * 4 * 6);
        assert_eq!(s.index(0, 0, 1), 1);
        assert_eq!(s.index(0, 1, 0), 6);
        assert_eq!(s.index(1, 0, 0), 24);
        let (x, y, z) = s.weight_position(s.index(2, 1, 3));
        assert_eq!(x, s.x().weight_position(2));
        assert_eq!(y, s.y().weight_position(1));
        assert_eq!(z, s.z().weight_position(3));
    }

    #[test]
    fn reproduces_plane() {
        let mut s = volume(3, 2, 4);
        let points = [
            (0.0, -1.0, 0.0),
            (0.7, 0.1, 0.45),
            (2.0, 1.0, 1.0),
            (-0.5, 1.5, -0.25),
            (2.5, -2.0, 1.5),
        ];
        for &(x, y, z) in &points {
            let expected = plane(x, y, z);
            assert!((s.evaluate_at(x, y, z) - expected).abs() < 1e-10, "({x}, {y}, {z})");
            assert!((s.value_at(x, y, z) - expected).abs() < 1e-10);
            assert!((s.derivative_x_at(x, y, z) - 1.0).abs() < 1e-9);
            assert!((s.partial(x, y, z, [0, 1, 0]) - 2.0).abs() < 1e-9);
            assert!((s.partial(x, y, z, [0, 0, 1]) - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn profile_is_reused_until_preset_changes() {
        let mut s = volume(3, 3, 3);
        s.preset(0.25, 0.5);
        let first = s.evaluate(0.6);
        let builds = s.profile_cache().builds();
        let cached = s.profile_cache().values().to_vec();
        assert_eq!(builds, 3);

        // Same X window, same (y, z): nothing is rebuilt.
        let second = s.evaluate(0.7);
        assert_eq!(s.profile_cache().builds(), builds);
        assert_eq!(s.profile_cache().values(), cached.as_slice());
        assert!((first - plane(0.6, 0.25, 0.5)).abs() < 1e-10);
        assert!((second - plane(0.7, 0.25, 0.5)).abs() < 1e-10);

        // The cached entries are the Y/Z reductions of the weight tensor.
        let r = s.x().window(0.6);
        for ix in r..r + 3 {
            assert!(s.profile_cache().is_built(ix));
            let expected = s.x().weight_position(ix) + 2.0 * 0.25 + 3.0 * 0.5;
            assert!((s.profile_cache().values()[ix] - expected).abs() < 1e-10);
        }

        // Presetting the same pair keeps the cache.
        s.preset(0.25, 0.5);
        assert_eq!(s.profile_cache().values(), cached.as_slice());

        // A new pair discards it.
        s.preset(0.3, 0.5);
        assert!(!s.profile_cache().is_built(r));
        s.evaluate(0.6);
        assert_eq!(s.profile_cache().builds(), builds + 3);
    }

    #[test]
    fn invert_along_x() {
        let mut s = volume(2, 2, 2);
        let x = s.inv_x(3.0, 0.5, 0.5);
        assert!((x - 0.5).abs() < 1e-9);
        // Not bracketed: upper bound.
        assert_eq!(s.inv_x(100.0, 0.5, 0.5), 2.0);
    }

    #[test]
    fn differentiate_and_integrate_along_axes() {
        let mut s = volume(3, 3, 3);
        s.differentiate_along(Axis::Z).unwrap();
        assert_eq!(s.z().order(), 2);
        assert!((s.evaluate_at(1.1, 0.2, 0.3) - 3.0).abs() < 1e-10);

        let mut s = volume(3, 3, 3);
        s.differentiate_along(Axis::Y).unwrap();
        s.integrate_along(Axis::Y, 0.0, 0.0).unwrap();
        assert_eq!(s.y().order(), 3);
        for &(x, y, z) in &[(0.5, -0.5, 0.5), (1.5, 0.75, 0.1)] {
            assert!((s.value_at(x, y, z) - 2.0 * y).abs() < 1e-10);
        }

        let mut s = volume(1, 2, 2);
        s.differentiate_along(Axis::X).unwrap();
        assert!(s.weights().iter().all(|w| *w == 0.0));
    }

    #[test]
    fn arithmetic() {
        let mut s = volume(2, 2, 2);
        s.add(1.0);
        s.multiply(2.0);
        assert!((s.evaluate_at(1.0, 0.5, 0.5) - 2.0 * (plane(1.0, 0.5, 0.5) + 1.0)).abs() < 1e-10);

        // Same carriers: weight-wise product with a constant.
        let mut s = volume(2, 2, 2);
        let mut two = s.clone();
        two.set_weights(&vec![2.0; s.number_of_weights()]).unwrap();
        s.multiply_by(&two).unwrap();
        assert!((s.value_at(1.5, 0.3, 0.2) - 2.0 * plane(1.5, 0.3, 0.2)).abs() < 1e-10);

        // Different carriers: sampled on the merged ones.
        let full = BoundaryCondition::Full;
        let mut constant = BSpline3::new(4, 4).unwrap();
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            constant.set_carrier(axis, 0.0, 1.0, 1, 1, full, full).unwrap();
        }
        constant.add(2.0);

        let mut s = volume(2, 2, 2);
        s.multiply_by(&constant).unwrap();
        assert_eq!(s.x().intervals(), 4);
        assert!((s.value_at(1.5, 0.3, 0.2) - 2.0 * plane(1.5, 0.3, 0.2)).abs() < 1e-10);

        let mut s = volume(2, 2, 2);
        s.add_function(&constant).unwrap();
        assert!((s.value_at(0.4, -0.6, 0.9) - (plane(0.4, -0.6, 0.9) + 2.0)).abs() < 1e-10);
    }

    #[test]
    fn load_save_round_trip() {
        let s = volume(3, 2, 4);
        let mut text = Vec::new();
        assert!(s.save(&mut text, "vol"));

        let mut t = BSpline3::new(8, 5).unwrap();
        assert!(t.load(text.as_slice()));
        assert!(t.is_static_data_equal(&s));
        assert!(t.is_approximated_equal(&s, 0.0));

        let mut small = BSpline3::new(2, 5).unwrap();
        let before = small.snapshot();
        assert!(!small.load(text.as_slice()));
        assert_eq!(small.snapshot(), before);
    }
}
