use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::{Div, Mul};
use std::sync::Arc;

use malachite::num::basic::traits::One;
use malachite::Rational;

use crate::molecule::Molecule;

/// Molecule together with its stoichiometric coefficient on one side of an equation
/// The molecule is shared, so many species can point at the same parsed molecule
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Species {
    coefficient: Rational,
    molecule: Arc<Molecule>,
}
impl Species {
    /// Create new species
    /// # Arguments
    /// * `molecule` - shared molecule
    /// * `coefficient` - stoichiometric coefficient
    /// # Example
    /// ```
    /// use chemeq::{Molecule, Species};
    /// use malachite::Rational;
    /// use std::sync::Arc;
    ///
    /// let water = Arc::new(Molecule::complete_formula("H2O").unwrap());
    /// let species = Species::new(water, Rational::from(3));
    ///
    /// assert_eq!(species.atoms()["H"], Rational::from(6));
    /// assert_eq!(species.to_string(), "3H2O");
    /// ```
    pub fn new(molecule: Arc<Molecule>, coefficient: Rational) -> Self {
        Self {
            coefficient,
            molecule,
        }
    }

    /// Create new species with coefficient 1
    pub fn single(molecule: Arc<Molecule>) -> Self {
        Self::new(molecule, Rational::ONE)
    }

    pub fn coefficient(&self) -> &Rational {
        &self.coefficient
    }

    pub fn molecule(&self) -> &Arc<Molecule> {
        &self.molecule
    }

    /// Returns element quantities of the molecule multiplied by the coefficient
    pub fn atoms(&self) -> BTreeMap<String, Rational> {
        self.molecule
            .elements()
            .iter()
            .map(|(symbol, count)| (symbol.clone(), Rational::from(count) * &self.coefficient))
            .collect()
    }

    /// Returns copy of this species with a different coefficient
    pub fn with_coefficient(&self, coefficient: Rational) -> Self {
        Self::new(Arc::clone(&self.molecule), coefficient)
    }
}
impl Mul<&Rational> for &Species {
    type Output = Species;

    fn mul(self, rhs: &Rational) -> Species {
        self.with_coefficient(&self.coefficient * rhs)
    }
}
impl Mul<Rational> for Species {
    type Output = Species;

    fn mul(self, rhs: Rational) -> Species {
        Species::new(self.molecule, self.coefficient * rhs)
    }
}
impl Div<&Rational> for &Species {
    type Output = Species;

    /// # Panics
    /// Panics if `rhs` is zero
    fn div(self, rhs: &Rational) -> Species {
        self.with_coefficient(&self.coefficient / rhs)
    }
}
impl Div<Rational> for Species {
    type Output = Species;

    /// # Panics
    /// Panics if `rhs` is zero
    fn div(self, rhs: Rational) -> Species {
        Species::new(self.molecule, self.coefficient / rhs)
    }
}
impl Display for Species {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.coefficient != Rational::ONE {
            write!(f, "{}", self.coefficient)?;
        }
        write!(f, "{}", self.molecule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn species(formula: &str, coefficient: &str) -> Species {
        Species::new(
            Arc::new(Molecule::complete_formula(formula).unwrap()),
            Rational::from_str(coefficient).unwrap(),
        )
    }

    #[test]
    fn atoms_are_scaled() {
        let sp = species("(NH4)2SO4(s)", "3/2");
        let atoms = sp.atoms();
        assert_eq!(atoms["N"], Rational::from(3));
        assert_eq!(atoms["H"], Rational::from(12));
        assert_eq!(atoms["O"], Rational::from(6));
        assert_eq!(atoms["S"], Rational::from_str("3/2").unwrap());
    }

    #[test]
    fn default_coefficient_is_one() {
        let molecule = Arc::new(Molecule::complete_formula("e-").unwrap());
        let sp = Species::single(Arc::clone(&molecule));
        assert_eq!(sp.coefficient(), &Rational::ONE);
        assert_eq!(sp.molecule(), &molecule);
        assert_eq!(sp.atoms()["e"], Rational::ONE);
    }

    #[test]
    fn scaling_keeps_molecule_shared() {
        let sp = species("Fe2O3(s)", "1");
        let scaled = &sp * &Rational::from_str("3/2").unwrap();
        assert_eq!(scaled.coefficient(), &Rational::from_str("3/2").unwrap());
        assert!(Arc::ptr_eq(scaled.molecule(), sp.molecule()));

        let back = scaled / Rational::from_str("3/2").unwrap();
        assert_eq!(back, sp);
    }

    #[test]
    fn rendering() {
        assert_eq!(species("H2O(l)", "1").to_string(), "H2O(l)");
        assert_eq!(species("H2O(l)", "2").to_string(), "2H2O(l)");
        assert_eq!(species("O2", "1/2").to_string(), "1/2O2");
    }
}
