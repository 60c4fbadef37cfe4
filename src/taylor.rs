//! Boundary Taylor polynomials used for extrapolation outside `[A, B]`.

use crate::{SplineError, MAX_ORDER};

/// Selects the order of a boundary Taylor polynomial.
///
/// Tag-based callers spell these as single characters; see
/// [`TryFrom<char>`](#impl-TryFrom<char>-for-BoundaryCondition).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BoundaryCondition {
    /// `'s'`: order `K - 1`, i.e. the highest derivative is dropped.
    #[default]
    Natural,
    /// `'a'`: full order `K`.
    Full,
    /// A digit `'0'..='9'`: exactly `min(d, K)` terms.
    Terms(u8),
}

impl BoundaryCondition {
    /// Number of Taylor terms this condition yields for a carrier of order
    /// `k`.
    #[inline]
    pub fn order_for(self, k: usize) -> usize {
        match self {
            BoundaryCondition::Natural => k.saturating_sub(1),
            BoundaryCondition::Full => k,
            BoundaryCondition::Terms(d) => (d as usize).min(k),
        }
    }

    /// The single character tag of this condition.
    pub fn tag(self) -> char {
        match self {
            BoundaryCondition::Natural => 's',
            BoundaryCondition::Full => 'a',
            BoundaryCondition::Terms(d) => {
                char::from_digit(d as u32, 10).unwrap_or('9')
            }
        }
    }
}

impl TryFrom<char> for BoundaryCondition {
    type Error = SplineError;

    fn try_from(tag: char) -> Result<Self, Self::Error> {
        match tag {
            's' => Ok(BoundaryCondition::Natural),
            'a' => Ok(BoundaryCondition::Full),
            _ => tag
                .to_digit(10)
                .map(|d| BoundaryCondition::Terms(d as u8))
                .ok_or(SplineError::InvalidBoundaryTag(tag)),
        }
    }
}

/// Orders of the lower and upper boundary Taylor polynomials of one axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TaylorOrders {
    pub lower: usize,
    pub upper: usize,
}

impl TaylorOrders {
    pub fn new(lower: usize, upper: usize) -> Self {
        Self { lower, upper }
    }

    /// Resolve two boundary conditions against a carrier of order `k`.
    pub fn from_conditions(
        lower: BoundaryCondition,
        upper: BoundaryCondition,
        k: usize,
    ) -> Self {
        Self {
            lower: lower.order_for(k),
            upper: upper.order_for(k),
        }
    }

    /// Orders after one differentiation (floored at zero).
    #[inline]
    pub(crate) fn decremented(self) -> Self {
        Self {
            lower: self.lower.saturating_sub(1),
            upper: self.upper.saturating_sub(1),
        }
    }

    /// Orders after one integration.
    #[inline]
    pub(crate) fn incremented(self) -> Self {
        Self {
            lower: self.lower + 1,
            upper: self.upper + 1,
        }
    }

    /// Both orders capped at `k`.
    #[inline]
    pub(crate) fn clamped(self, k: usize) -> Self {
        Self {
            lower: self.lower.min(k),
            upper: self.upper.min(k),
        }
    }

    pub(crate) fn max(self, other: Self) -> Self {
        Self {
            lower: self.lower.max(other.lower),
            upper: self.upper.max(other.upper),
        }
    }
}

/// A local polynomial in powers of `x - x_boundary`.
///
/// Coefficients are stored highest power first so that evaluation is a
/// plain Horner loop. An order of zero is the zero polynomial.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TaylorPoly {
    pub(crate) coeffs: [f64; MAX_ORDER],
    pub(crate) order: usize,
}

impl TaylorPoly {
    /// The zero polynomial.
    pub const ZERO: Self = Self {
        coeffs: [0.0; MAX_ORDER],
        order: 0,
    };

    /// Number of terms.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// The active coefficients, highest power first.
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs[..self.order]
    }

    /// Evaluate at offset `dx` from the expansion point.
    #[inline]
    pub fn evaluate(&self, dx: f64) -> f64 {
        self.coeffs[..self.order]
            .iter()
            .fold(0.0, |y, &c| y * dx + c)
    }

    /// The derivative polynomial; its order drops by one (floor zero).
    pub fn derivative(&self) -> Self {
        let order = self.order.saturating_sub(1);
        let mut coeffs = [0.0; MAX_ORDER];
        for (g, c) in coeffs[..order].iter_mut().enumerate() {
            *c = (order - g) as f64 * self.coeffs[g];
        }
        Self { coeffs, order }
    }

    /// The `m`-th derivative polynomial.
    pub fn nth_derivative(&self, m: usize) -> Self {
        (0..m).fold(*self, |p, _| p.derivative())
    }
}
