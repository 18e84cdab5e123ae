use std::fmt::{Display, Formatter};
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::Arc;

use malachite::num::basic::traits::{One, Zero};
use malachite::{Natural, Rational};
use tracing::trace;

use crate::error::{ChemError, Result};
use crate::molecule::Molecule;
use crate::parser::ChemParser;
use crate::species::Species;
use crate::tokenizer::{concat, tokenize, Token, TokenKind};

/// A struct that represents a chemical equation (e.g. 2H2 + O2 = 2H2O)
/// Equations are values: balancing and arithmetic return new equations
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Equation {
    /// A vector of reactants
    reactants: Vec<Species>,
    /// A vector of products
    products: Vec<Species>,
}
impl Equation {
    pub fn new(reactants: Vec<Species>, products: Vec<Species>) -> Self {
        Self {
            reactants,
            products,
        }
    }

    /// Create new equation from molecule/coefficient pairs of both sides
    pub fn from_maps<R, P>(reactants: R, products: P) -> Self
    where
        R: IntoIterator<Item = (Arc<Molecule>, Rational)>,
        P: IntoIterator<Item = (Arc<Molecule>, Rational)>,
    {
        let side = |pairs: Vec<(Arc<Molecule>, Rational)>| -> Vec<Species> {
            pairs.into_iter().map(|(m, c)| Species::new(m, c)).collect()
        };
        Self::new(
            side(reactants.into_iter().collect()),
            side(products.into_iter().collect()),
        )
    }

    /// Create new equation from a string
    /// The equation should contain exactly one `=`, species are separated by `+`
    /// Every species may start with a coefficient (`2`, `1.5`, `1/2`) and end with a charge and states
    /// # Arguments
    /// * `input` - equation string
    /// # Returns
    /// * `Ok` - equation
    /// * `Err` - error that occurred during parsing
    /// # Example
    /// ```
    /// use chemeq::Equation;
    /// use malachite::Rational;
    ///
    /// let equation = Equation::parse("2H2 + O2 = 2H2O").unwrap();
    ///
    /// let reactants: Vec<(Rational, &str)> = equation
    ///     .reactants()
    ///     .iter()
    ///     .map(|s| (s.coefficient().clone(), s.molecule().formula()))
    ///     .collect();
    ///
    /// assert_eq!(reactants, [(Rational::from(2), "H2"), (Rational::from(1), "O2")]);
    /// assert_eq!(equation.products()[0].to_string(), "2H2O");
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        parse_equation(input, &ChemParser::default())
    }

    /// Returns the vector of reactants
    pub fn reactants(&self) -> &[Species] {
        &self.reactants
    }

    /// Returns the vector of products
    pub fn products(&self) -> &[Species] {
        &self.products
    }

    /// Returns all species, reactants first
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.reactants.iter().chain(self.products.iter())
    }

    /// Returns coefficients of all species, reactants first
    pub fn coefficients(&self) -> Vec<Rational> {
        self.species().map(|s| s.coefficient().clone()).collect()
    }
}

impl Add for Equation {
    type Output = Equation;

    /// Adds reactions together (reactants with reactants, products with products)
    fn add(mut self, rhs: Equation) -> Equation {
        self.reactants.extend(rhs.reactants);
        self.products.extend(rhs.products);
        self
    }
}
impl Sub for Equation {
    type Output = Equation;

    /// Adds the reverse of `rhs`
    fn sub(self, rhs: Equation) -> Equation {
        self + -rhs
    }
}
impl Neg for Equation {
    type Output = Equation;

    /// Reverses the reaction
    fn neg(self) -> Equation {
        Equation::new(self.products, self.reactants)
    }
}
impl Mul<Rational> for Equation {
    type Output = Equation;

    fn mul(self, rhs: Rational) -> Equation {
        let scale = |side: Vec<Species>| -> Vec<Species> {
            side.iter().map(|s| s * &rhs).collect()
        };
        Equation::new(scale(self.reactants), scale(self.products))
    }
}
impl Div<Rational> for Equation {
    type Output = Equation;

    /// # Panics
    /// Panics if `rhs` is zero
    fn div(self, rhs: Rational) -> Equation {
        let scale = |side: Vec<Species>| -> Vec<Species> {
            side.iter().map(|s| s / &rhs).collect()
        };
        Equation::new(scale(self.reactants), scale(self.products))
    }
}
impl Display for Equation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let side = |species: &[Species]| {
            species
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<String>>()
                .join(" + ")
        };
        write!(f, "{} = {}", side(&self.reactants), side(&self.products))
    }
}
impl FromStr for Equation {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Returns true if the token at `i` can begin a new species (coefficient or formula)
/// A `+` in front of anything else is charge notation, so charges bind tighter than separators:
/// in `Na+ + Cl-` the first `+` belongs to `Na+`, in `Fe+2 + Cl-` the `2` is a charge magnitude
fn starts_species(tokens: &[Token], i: usize) -> bool {
    let opens_formula_group = |j: usize| match tokens.get(j) {
        Some(t) if t.kind == TokenKind::Open => true,
        Some(t) if t.is_letters() => t.text.starts_with(|c: char| c.is_uppercase()),
        _ => false,
    };

    match tokens.get(i) {
        Some(t) if t.is_letters() => true,
        Some(t) if t.kind == TokenKind::Open => opens_formula_group(i + 1),
        Some(t) if t.is_digits() => match tokens.get(i + 1) {
            Some(next) if next.is_letters() || next.is_punct('.') || next.is_punct('/') => true,
            Some(next) if next.kind == TokenKind::Open => opens_formula_group(i + 2),
            _ => false,
        },
        _ => false,
    }
}

/// Splits equation into species (using `ChemParser` for molecules)
pub(crate) fn parse_equation(input: &str, parser: &ChemParser) -> Result<Equation> {
    let tokens = tokenize(input)?;

    let mut reactants = Vec::new();
    let mut products = Vec::new();
    let mut separator: Option<&Token> = None;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        let is_separator = token.is_punct('=');
        if !is_separator && !(token.is_punct('+') && starts_species(&tokens, i + 1)) {
            continue;
        }

        if is_separator && separator.is_some() {
            return Err(ChemError::equation(
                "there should be exactly one '=' in the equation",
                &token.text,
                token.pos,
            ));
        }
        let species = parse_species(&tokens[start..i], token, parser)?;
        if separator.is_some() {
            products.push(species);
        } else {
            reactants.push(species);
        }
        if is_separator {
            separator = Some(token);
        }
        start = i + 1;
    }

    let Some(separator) = separator else {
        return Err(ChemError::equation(
            "there should be exactly one '=' in the equation",
            "",
            input.chars().count(),
        ));
    };
    let last = tokens.last().unwrap_or(separator);
    products.push(parse_species(&tokens[start..], last, parser)?);

    trace!(
        reactants = reactants.len(),
        products = products.len(),
        "parsed equation"
    );
    Ok(Equation::new(reactants, products))
}

/// Parses one species; `boundary` is the token next to the segment, used for error reporting
fn parse_species(tokens: &[Token], boundary: &Token, parser: &ChemParser) -> Result<Species> {
    let split = tokens
        .iter()
        .position(|t| t.is_letters() || t.kind == TokenKind::Open)
        .unwrap_or(tokens.len());
    if split == tokens.len() {
        let (text, pos) = match tokens.first() {
            Some(first) => (concat(tokens), first.pos),
            None => (boundary.text.clone(), boundary.pos),
        };
        return Err(ChemError::equation("missing species", text, pos));
    }

    let coefficient = parse_coefficient(&tokens[..split])?;
    let molecule = parser.molecule_from_tokens(&tokens[split..])?;
    Ok(Species::new(molecule, coefficient))
}

/// Parses a coefficient: nothing (1), integer, decimal (`1.5`) or fraction (`1/2`)
fn parse_coefficient(tokens: &[Token]) -> Result<Rational> {
    let natural = |t: &Token| {
        Natural::from_str(&t.text)
            .map_err(|_| ChemError::equation("malformed coefficient", &t.text, t.pos))
    };

    match tokens {
        [] => Ok(Rational::ONE),
        [n] if n.is_digits() => Ok(Rational::from(natural(n)?)),
        [whole, dot, fraction] if whole.is_digits() && dot.is_punct('.') && fraction.is_digits() => {
            let denominator = Natural::from_str(&format!("1{}", "0".repeat(fraction.text.len())))
                .map_err(|_| ChemError::equation("malformed coefficient", concat(tokens), whole.pos))?;
            let numerator = natural(whole)? * &denominator + natural(fraction)?;
            Ok(Rational::from(numerator) / Rational::from(denominator))
        }
        [numerator, slash, denominator]
            if numerator.is_digits() && slash.is_punct('/') && denominator.is_digits() =>
        {
            let denominator_value = natural(denominator)?;
            if denominator_value == Natural::ZERO {
                return Err(ChemError::equation(
                    "coefficient has zero denominator",
                    &denominator.text,
                    denominator.pos,
                ));
            }
            Ok(Rational::from(natural(numerator)?) / Rational::from(denominator_value))
        }
        _ => Err(ChemError::equation(
            "malformed coefficient",
            concat(tokens),
            tokens[0].pos,
        )),
    }
}
