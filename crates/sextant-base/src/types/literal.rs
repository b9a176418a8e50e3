//! Boolean variables and literals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean variable, identified by its 1-based DIMACS id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Var(u32);

impl Var {
    /// Creates a variable from its DIMACS id. Returns `None` for 0.
    #[must_use]
    pub const fn new(id: u32) -> Option<Self> {
        if id == 0 {
            None
        } else {
            Some(Self(id))
        }
    }

    /// Creates a variable from a dense 0-based index.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// Returns the DIMACS id.
    #[must_use]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the dense 0-based index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Creates the literal of this variable with the given polarity.
    #[must_use]
    pub const fn lit(self, positive: bool) -> Lit {
        if positive {
            Lit(self.0 as i32)
        } else {
            Lit(-(self.0 as i32))
        }
    }

    /// Creates a positive literal.
    #[must_use]
    pub const fn pos(self) -> Lit {
        self.lit(true)
    }

    /// Creates a negated literal.
    #[must_use]
    pub const fn neg(self) -> Lit {
        self.lit(false)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// A literal: a variable with a polarity, stored as a signed DIMACS integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lit(i32);

impl Lit {
    /// Converts from DIMACS format. Returns `None` for 0 or ids that do not
    /// fit the internal representation.
    #[must_use]
    pub fn from_dimacs(lit: i64) -> Option<Self> {
        if lit == 0 || lit.unsigned_abs() > i32::MAX as u64 {
            None
        } else {
            Some(Self(lit as i32))
        }
    }

    /// Converts to DIMACS format (positive = var, negative = -var).
    #[must_use]
    pub const fn to_dimacs(self) -> i64 {
        self.0 as i64
    }

    /// Returns the underlying variable.
    #[must_use]
    pub const fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    /// Returns whether this literal is the positive polarity of its variable.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Negates this literal.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(-self.0)
    }

    /// Dense index: `2 * (var - 1)` for positive, `2 * (var - 1) + 1` for
    /// negative literals.
    #[must_use]
    pub const fn index(self) -> usize {
        let base = (self.0.unsigned_abs() as usize - 1) * 2;
        if self.0 > 0 {
            base
        } else {
            base + 1
        }
    }

    /// Evaluates the literal under a value of its variable.
    #[must_use]
    pub const fn eval(self, value: bool) -> bool {
        value == self.is_positive()
    }
}

impl std::ops::Not for Lit {
    type Output = Lit;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_zero_is_rejected() {
        assert_eq!(Var::new(0), None);
        assert_eq!(Var::new(3).map(Var::index), Some(2));
        assert_eq!(Var::from_index(2).id(), 3);
    }

    #[test]
    fn test_lit_negation_and_var() {
        let lit = Lit::from_dimacs(-4).unwrap();
        assert!(!lit.is_positive());
        assert_eq!(lit.var().id(), 4);
        assert_eq!((!lit).to_dimacs(), 4);
        assert_eq!(!!lit, lit);
    }

    #[test]
    fn test_lit_index_is_dense() {
        let v = Var::new(1).unwrap();
        assert_eq!(v.pos().index(), 0);
        assert_eq!(v.neg().index(), 1);
        assert_eq!(Var::new(3).unwrap().neg().index(), 5);
    }

    #[test]
    fn test_lit_from_dimacs_rejects_zero() {
        assert_eq!(Lit::from_dimacs(0), None);
        assert_eq!(Lit::from_dimacs(i64::MAX), None);
    }

    #[test]
    fn test_lit_eval() {
        let v = Var::new(2).unwrap();
        assert!(v.pos().eval(true));
        assert!(!v.pos().eval(false));
        assert!(v.neg().eval(false));
    }
}
