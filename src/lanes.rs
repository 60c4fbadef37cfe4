//! Row-major weight tensors seen as bundles of 1D lanes.
//!
//! Differentiation and integration along one axis of a tensor-product
//! spline act on every lane of that axis independently, exactly like the
//! 1D transforms act on a weight vector.

/// Row-major strides of a tensor with the given extents.
pub(crate) fn strides(dims: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; dims.len()];
    let mut acc = 1usize;
    for i in (0..dims.len()).rev() {
        strides[i] = acc;
        acc *= dims[i];
    }
    strides
}

/// Maps every lane along `axis` through `f`, producing a tensor whose
/// extent along `axis` is `new_len`.
///
/// `f` receives the lane and a zeroed output lane of length `new_len`.
pub(crate) fn map_lanes<F>(
    data: &[f64],
    dims: &[usize],
    axis: usize,
    new_len: usize,
    mut f: F,
) -> Vec<f64>
where
    F: FnMut(&[f64], &mut [f64]),
{
    let len = dims[axis];
    let inner = strides(dims)[axis];
    let outer: usize = dims[..axis].iter().product();
    debug_assert_eq!(data.len(), outer * len * inner);

    let mut out = vec![0.0; outer * new_len * inner];
    let mut lane = vec![0.0; len];
    let mut mapped = vec![0.0; new_len];

    for o in 0..outer {
        for i in 0..inner {
            for (j, v) in lane.iter_mut().enumerate() {
                *v = data[(o * len + j) * inner + i];
            }
            mapped.fill(0.0);
            f(&lane, &mut mapped);
            for (j, v) in mapped.iter().enumerate() {
                out[(o * new_len + j) * inner + i] = *v;
            }
        }
    }
    out
}

/// Weights of the derivative of an equidistant spline with step `h`.
///
/// `out` is one shorter than `weights`.
pub(crate) fn differentiate(weights: &[f64], h: f64, out: &mut [f64]) {
    let odh = 1.0 / h;
    for (o, pair) in out.iter_mut().zip(weights.windows(2)) {
        *o = (pair[1] - pair[0]) * odh;
    }
}

/// Weights of an antiderivative of an equidistant spline with step `h`,
/// vanishing at the lower end of the extended knot vector.
///
/// `out` is one longer than `weights`.
pub(crate) fn integrate(weights: &[f64], h: f64, out: &mut [f64]) {
    out[0] = 0.0;
    for i in 1..out.len() {
        out[i] = h * weights[i - 1] + out[i - 1];
    }
}
