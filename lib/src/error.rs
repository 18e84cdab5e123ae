use thiserror::Error;

/// Errors that can occur while parsing formulas and equations or balancing equations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChemError {
    /// Input contains a character that can't be scanned (the reserved end-of-input sentinel)
    #[error("Invalid character {ch:?} at position {pos}")]
    InvalidCharacter { ch: char, pos: usize },

    /// Entered formula is malformed (nesting, multiplier, charge or state block)
    #[error("Invalid formula near {token:?} at position {pos}: {reason}")]
    InvalidFormula {
        reason: &'static str,
        token: String,
        pos: usize,
    },

    /// Entered equation is malformed (separator count, coefficient or empty species)
    #[error("Invalid equation near {token:?} at position {pos}: {reason}")]
    InvalidEquation {
        reason: &'static str,
        token: String,
        pos: usize,
    },

    /// There is no positive integer solution for the entered equation
    #[error("Equation can't be balanced: {reason}")]
    UnbalanceableEquation { reason: &'static str },

    /// Symbol is not present in the element table used for cross-validation
    #[error("Unknown element {symbol:?} at position {pos}")]
    UnknownElement { symbol: String, pos: usize },
}

impl ChemError {
    pub(crate) fn formula(reason: &'static str, token: impl Into<String>, pos: usize) -> Self {
        Self::InvalidFormula {
            reason,
            token: token.into(),
            pos,
        }
    }

    pub(crate) fn equation(reason: &'static str, token: impl Into<String>, pos: usize) -> Self {
        Self::InvalidEquation {
            reason,
            token: token.into(),
            pos,
        }
    }

    pub(crate) fn unbalanceable(reason: &'static str) -> Self {
        Self::UnbalanceableEquation { reason }
    }
}

pub type Result<T> = std::result::Result<T, ChemError>;
