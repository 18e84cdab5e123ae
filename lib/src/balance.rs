use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use malachite::num::arithmetic::traits::Abs;
use malachite::num::basic::traits::{One, Zero};
use malachite::Rational;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::equation::Equation;
use crate::error::{ChemError, Result};
use crate::matrix::{denominators_lcm, numerators_gcd, reduce_row_echelon, to_primitive_integers};
use crate::molecule::Molecule;
use crate::species::Species;

/// Sums coefficients of equal molecules, keeping the order of first appearance
fn aggregate(species: &[Species]) -> Vec<(Arc<Molecule>, Rational)> {
    let mut aggregated: Vec<(Arc<Molecule>, Rational)> = Vec::new();
    for s in species {
        match aggregated.iter_mut().find(|(m, _)| *m == *s.molecule()) {
            Some((_, coefficient)) => *coefficient += s.coefficient(),
            None => aggregated.push((Arc::clone(s.molecule()), s.coefficient().clone())),
        }
    }
    aggregated
}

/// Sums element quantities (and charge) over one side of an equation
fn totals(species: &[Species]) -> (BTreeMap<String, Rational>, Rational) {
    let mut atoms: BTreeMap<String, Rational> = BTreeMap::new();
    let mut charge = Rational::ZERO;
    for s in species {
        for (symbol, quantity) in s.atoms() {
            *atoms.entry(symbol).or_insert(Rational::ZERO) += quantity;
        }
        charge += Rational::from(s.molecule().charge()) * s.coefficient();
    }
    atoms.retain(|_, quantity| *quantity != Rational::ZERO);
    (atoms, charge)
}

impl Equation {
    /// Returns equation with integer coefficients, merged duplicate molecules and
    /// molecules present on both sides cancelled out
    /// # Example
    /// ```
    /// use chemeq::Equation;
    ///
    /// let equation = Equation::parse("1/2O2 + H2 + H2 = H2O + 1/2H2").unwrap();
    ///
    /// assert_eq!(equation.simplify().to_string(), "O2 + 3H2 = 2H2O");
    /// ```
    #[instrument(level = "debug", skip_all, fields(equation = %self))]
    pub fn simplify(&self) -> Equation {
        let coefficients = self.coefficients();
        let mut factor = Rational::from(denominators_lcm(&coefficients));
        let scaled: Vec<Rational> = coefficients.iter().map(|c| c * &factor).collect();
        let gcd = numerators_gcd(&scaled);
        if gcd != 0u32 {
            factor /= Rational::from(gcd);
        }

        let scale = |side: &[Species]| -> Vec<Species> {
            side.iter().map(|s| s * &factor).collect()
        };
        let mut reactants = aggregate(&scale(self.reactants()));
        let mut products = aggregate(&scale(self.products()));

        for (molecule, reactant) in reactants.iter_mut() {
            if let Some((_, product)) = products.iter_mut().find(|(m, _)| *m == *molecule) {
                let common = if *reactant < *product {
                    reactant.clone()
                } else {
                    product.clone()
                };
                *reactant -= &common;
                *product -= &common;
            }
        }

        let side = |pairs: Vec<(Arc<Molecule>, Rational)>| -> Vec<Species> {
            pairs
                .into_iter()
                .filter(|(_, coefficient)| *coefficient != Rational::ZERO)
                .map(|(molecule, coefficient)| Species::new(molecule, coefficient))
                .collect()
        };
        Equation::new(side(reactants), side(products))
    }

    /// Balances equation with default [`Config`] (charge is not conserved)
    /// # Returns
    /// * `Ok` - new equation with minimal positive integer coefficients
    /// * `Err` - the equation can't be balanced
    /// # Example
    /// ```
    /// use chemeq::Equation;
    ///
    /// let equation = Equation::parse("Fe2(SO4)3 + KOH = K2SO4 + Fe(OH)3").unwrap();
    ///
    /// assert_eq!(
    ///     equation.balance().unwrap().to_string(),
    ///     "Fe2(SO4)3 + 6KOH = 3K2SO4 + 2Fe(OH)3"
    /// );
    /// ```
    pub fn balance(&self) -> Result<Equation> {
        self.balance_with(&Config::default())
    }

    /// Balances equation, conserving charge too if `config.conserve_charge` is set
    #[instrument(level = "debug", skip_all, fields(equation = %self))]
    pub fn balance_with(&self, config: &Config) -> Result<Equation> {
        let simplified = self.simplify();
        if simplified.reactants().is_empty() || simplified.products().is_empty() {
            return Err(ChemError::unbalanceable(
                "one side of the equation is empty after simplification",
            ));
        }

        let species: Vec<(&Species, bool)> = simplified
            .reactants()
            .iter()
            .map(|s| (s, true))
            .chain(simplified.products().iter().map(|s| (s, false)))
            .collect();

        let symbols: BTreeSet<&str> = species
            .iter()
            .flat_map(|(s, _)| s.molecule().elements().keys().map(String::as_str))
            .collect();
        let with_charge =
            config.conserve_charge && species.iter().any(|(s, _)| s.molecule().charge() != 0);

        let n = species.len();
        let columns = symbols.len() + usize::from(with_charge);
        let mut matrix: Vec<Vec<Rational>> = species
            .iter()
            .enumerate()
            .map(|(i, (s, _))| {
                let molecule = s.molecule();
                let mut row: Vec<Rational> = symbols
                    .iter()
                    .map(|symbol| Rational::from(molecule.count(symbol)))
                    .collect();
                if with_charge {
                    row.push(Rational::from(molecule.charge()));
                }
                row.extend((0..n).map(|j| if i == j { Rational::ONE } else { Rational::ZERO }));
                row
            })
            .collect();
        debug!(rows = n, columns, with_charge, "built stoichiometric matrix");

        reduce_row_echelon(&mut matrix);

        // pivot rows of the composition block come first
        let rank = matrix
            .iter()
            .take_while(|row| row[..columns].iter().any(|x| *x != Rational::ZERO))
            .count();
        debug!(rank, "composition rank");
        if rank == n {
            return Err(ChemError::unbalanceable(
                "species compositions are linearly independent",
            ));
        }
        if n - rank > 1 {
            return Err(ChemError::unbalanceable(
                "equation has more than one independent balance (degenerate system)",
            ));
        }
        let solution = &matrix[n - 1][columns..];
        if solution.iter().all(|x| *x == Rational::ZERO) {
            return Err(ChemError::unbalanceable("only the trivial solution exists"));
        }
        debug!(
            solution = ?solution.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "null vector"
        );

        // oriented value is positive for a species on the side the reaction runs from
        let mut kept: Vec<(&Species, bool, Rational)> = Vec::new();
        for (&(s, is_reactant), value) in species.iter().zip(solution) {
            if *value == Rational::ZERO {
                warn!(
                    species = %s.molecule(),
                    "species doesn't take part in the reaction, dropping it"
                );
                continue;
            }
            let oriented = if is_reactant { value.clone() } else { -value };
            kept.push((s, is_reactant, oriented));
        }

        let positive = kept.iter().filter(|(_, _, v)| *v > Rational::ZERO).count();
        if positive != 0 && positive != kept.len() {
            return Err(ChemError::unbalanceable(
                "no solution keeps reactants and products on their sides",
            ));
        }
        let reactant_count = kept.iter().filter(|(_, is_reactant, _)| *is_reactant).count();
        if reactant_count == 0 || reactant_count == kept.len() {
            return Err(ChemError::unbalanceable(
                "one side of the equation doesn't take part in the reaction",
            ));
        }

        let magnitudes: Vec<Rational> = kept.iter().map(|(_, _, v)| v.abs()).collect();
        let coefficients = to_primitive_integers(&magnitudes);

        let mut reactants = Vec::new();
        let mut products = Vec::new();
        for ((s, is_reactant, _), coefficient) in kept.into_iter().zip(coefficients) {
            let balanced = s.with_coefficient(coefficient);
            if is_reactant {
                reactants.push(balanced);
            } else {
                products.push(balanced);
            }
        }

        let (reactant_atoms, reactant_charge) = totals(&reactants);
        let (product_atoms, product_charge) = totals(&products);
        if reactant_atoms != product_atoms {
            return Err(ChemError::unbalanceable("solution doesn't conserve atoms"));
        }
        if with_charge && reactant_charge != product_charge {
            return Err(ChemError::unbalanceable("solution doesn't conserve charge"));
        }

        let balanced = Equation::new(reactants, products);
        debug!(%balanced, "balanced equation");
        Ok(balanced)
    }
}
