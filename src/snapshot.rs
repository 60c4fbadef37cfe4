//! Plain-data snapshots of splines for fast copies and comparisons.

use crate::{carrier::Carrier, TaylorOrders, MAX_ORDER};

/// Domain, interval count and order of one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CarrierData {
    pub a: f64,
    pub b: f64,
    pub n: usize,
    pub k: usize,
}

impl CarrierData {
    /// Whether a carrier with these capacities accepts this data.
    pub fn is_valid(&self, max_intervals: usize, max_order: usize) -> bool {
        self.a < self.b
            && (1..=max_intervals).contains(&self.n)
            && (1..=max_order.min(MAX_ORDER)).contains(&self.k)
    }

    /// `N + K - 1`.
    pub fn weight_count(&self) -> usize {
        Carrier::weight_len(self.n, self.k)
    }
}

/// Snapshot of a [`BSpline1`](crate::BSpline1).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot1 {
    pub carrier: CarrierData,
    pub taylor: TaylorOrders,
    pub weights: Vec<f64>,
}

/// Snapshot of a [`BSpline2`](crate::BSpline2).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot2 {
    pub x: CarrierData,
    pub y: CarrierData,
    pub taylor_x: TaylorOrders,
    pub taylor_y: TaylorOrders,
    /// X runs fastest.
    pub weights: Vec<f64>,
}

/// Snapshot of a [`BSpline3`](crate::BSpline3).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Snapshot3 {
    pub x: CarrierData,
    pub y: CarrierData,
    pub z: CarrierData,
    pub taylor_x: TaylorOrders,
    pub taylor_y: TaylorOrders,
    pub taylor_z: TaylorOrders,
    /// Z runs fastest, X slowest.
    pub weights: Vec<f64>,
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let snapshot = Snapshot1 {
            carrier: CarrierData {
                a: 0.0,
                b: 2.0,
                n: 2,
                k: 2,
            },
            taylor: TaylorOrders::new(1, 2),
            weights: vec![1.0, 2.0, 3.0],
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot1 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
