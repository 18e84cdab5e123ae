use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use malachite::num::basic::traits::Zero;
use malachite::Natural;

use crate::config::DEFAULT_MAX_NESTING_DEPTH;
use crate::element::ElementTable;
use crate::error::{ChemError, Result};
use crate::formula::parse_formula;
use crate::tokenizer::{concat, tokenize, Token, TokenKind};

/// A struct that represents a chemical species' formula (e.g. H2O, SO4-2(aq), HgS(s, red))
/// Molecules are immutable; equality and hashing only look at formula, charge and states
/// (element counts are derived from the formula)
#[derive(Clone, Debug)]
pub struct Molecule {
    /// Formula without charge and states, e.g. `Ca(NO3)2`
    formula: String,
    /// Element symbols and their quantities
    elements: BTreeMap<String, Natural>,
    /// Ionic charge
    charge: i64,
    /// Phase/state labels, e.g. `s`, `aq`, `red`
    states: Vec<String>,
}
impl Molecule {
    /// Create new molecule from a complete formula (formula, optional charge, optional states)
    /// # Arguments
    /// * `input` - complete formula, e.g. `SO4-2(aq)`
    /// # Returns
    /// * `Ok` - molecule
    /// * `Err` - error that occurred during parsing
    /// # Example
    /// ```
    /// use chemeq::Molecule;
    ///
    /// let molecule = Molecule::complete_formula("SO4-2(aq)").unwrap();
    ///
    /// assert_eq!(molecule.formula(), "SO4");
    /// assert_eq!(molecule.charge(), -2);
    /// assert_eq!(molecule.states(), ["aq"]);
    /// assert_eq!(molecule.count("O"), Into::<malachite::Natural>::into(4u32));
    /// assert_eq!(molecule.to_string(), "SO4-2(aq)");
    /// ```
    pub fn complete_formula(input: &str) -> Result<Self> {
        Self::from_tokens(&tokenize(input)?)
    }

    /// Create new molecule from already tokenized complete formula
    /// Only the last parenthesized group can be a state list: in `H2O(l)(aq)` the `(l)` is a group
    pub fn from_tokens(tokens: &[Token]) -> Result<Self> {
        Self::from_tokens_with(tokens, DEFAULT_MAX_NESTING_DEPTH, None)
    }

    pub(crate) fn from_tokens_with(
        tokens: &[Token],
        max_depth: usize,
        table: Option<&dyn ElementTable>,
    ) -> Result<Self> {
        let (formula_end, charge, states) = split_suffix(tokens)?;
        let formula_tokens = &tokens[..formula_end];

        let runs = parse_formula(formula_tokens, max_depth)?;

        let mut elements: BTreeMap<String, Natural> = BTreeMap::new();
        for run in runs {
            if let Some(table) = table {
                if !table.contains(&run.symbol) {
                    return Err(ChemError::UnknownElement {
                        symbol: run.symbol,
                        pos: run.pos,
                    });
                }
            }
            *elements.entry(run.symbol).or_insert(Natural::ZERO) += run.count;
        }
        elements.retain(|_, count| *count != Natural::ZERO);

        Ok(Self {
            formula: concat(formula_tokens),
            elements,
            charge,
            states,
        })
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Returns map of element symbols and their quantities
    /// For example, for H2O the map will be {H: 2, O: 1}
    pub fn elements(&self) -> &BTreeMap<String, Natural> {
        &self.elements
    }

    /// Returns quantity of the element in the molecule (zero if it isn't present)
    pub fn count(&self, symbol: &str) -> Natural {
        self.elements.get(symbol).cloned().unwrap_or(Natural::ZERO)
    }

    pub fn charge(&self) -> i64 {
        self.charge
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }
}
impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.formula == other.formula && self.charge == other.charge && self.states == other.states
    }
}
impl Eq for Molecule {}
impl Hash for Molecule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.formula.hash(state);
        self.charge.hash(state);
        self.states.hash(state);
    }
}
impl Display for Molecule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.formula)?;
        if self.charge != 0 {
            write!(f, "{}", if self.charge > 0 { '+' } else { '-' })?;
            if self.charge.unsigned_abs() != 1 {
                write!(f, "{}", self.charge.unsigned_abs())?;
            }
        }
        if !self.states.is_empty() {
            write!(f, "({})", self.states.join(", "))?;
        }
        Ok(())
    }
}
impl FromStr for Molecule {
    type Err = ChemError;

    fn from_str(s: &str) -> Result<Self> {
        Self::complete_formula(s)
    }
}

/// Finds where the formula ends and extracts charge and states from the rest
fn split_suffix(tokens: &[Token]) -> Result<(usize, i64, Vec<String>)> {
    let state_block = trailing_state_block(tokens);
    let charge_at = tokens.iter().position(|t| t.is_punct('+') || t.is_punct('-'));

    let Some(charge_at) = charge_at else {
        let (formula_end, states) = state_block.unwrap_or((tokens.len(), Vec::new()));
        check_formula_present(tokens, formula_end)?;
        return Ok((formula_end, 0, states));
    };
    check_formula_present(tokens, charge_at)?;

    let sign = &tokens[charge_at];
    let mut next = charge_at + 1;
    let magnitude = match tokens.get(next) {
        Some(t) if t.is_digits() => {
            next += 1;
            t.text
                .parse::<i64>()
                .map_err(|_| ChemError::formula("charge is too large", &t.text, t.pos))?
        }
        _ => 1,
    };
    let charge = if sign.is_punct('-') { -magnitude } else { magnitude };

    let states = match (tokens.get(next), state_block) {
        (None, _) => Vec::new(),
        (Some(_), Some((start, states))) if start == next => states,
        (Some(t), _) => {
            return Err(ChemError::formula(
                "only a state list may follow the charge",
                &t.text,
                t.pos,
            ))
        }
    };

    Ok((charge_at, charge, states))
}

fn check_formula_present(tokens: &[Token], formula_end: usize) -> Result<()> {
    if formula_end == 0 {
        let (token, pos) = tokens
            .first()
            .map(|t| (t.text.as_str(), t.pos))
            .unwrap_or(("", 0));
        return Err(ChemError::formula("missing formula", token, pos));
    }
    Ok(())
}

/// Finds a trailing `(label, label, ...)` block where every label is a single lowercase-initial
/// letter run; returns its start index and the labels
fn trailing_state_block(tokens: &[Token]) -> Option<(usize, Vec<String>)> {
    if tokens.last()?.kind != TokenKind::Close {
        return None;
    }
    let open = tokens.iter().rposition(|t| t.kind == TokenKind::Open)?;
    let inner = &tokens[open + 1..tokens.len() - 1];
    if inner.is_empty() {
        return None;
    }

    let mut states = Vec::new();
    for (i, token) in inner.iter().enumerate() {
        let valid = if i % 2 == 0 {
            token.is_letters() && token.text.starts_with(|c: char| c.is_lowercase())
        } else {
            token.is_punct(',')
        };
        if !valid {
            return None;
        }
        if i % 2 == 0 {
            states.push(token.text.clone());
        }
    }
    if inner.len() % 2 == 0 {
        // trailing comma
        return None;
    }

    Some((open, states))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_molecule(input: &str, formula: &str, charge: i64, states: &[&str]) {
        let molecule = Molecule::complete_formula(input).unwrap();
        assert_eq!(molecule.formula(), formula, "formula of {:?}", input);
        assert_eq!(molecule.charge(), charge, "charge of {:?}", input);
        assert_eq!(molecule.states(), states, "states of {:?}", input);
    }

    fn counts(input: &str) -> Vec<(String, u64)> {
        Molecule::complete_formula(input)
            .unwrap()
            .elements()
            .iter()
            .map(|(s, n)| (s.clone(), u64::try_from(n).unwrap()))
            .collect()
    }

    #[test]
    fn complete_formulas() {
        test_molecule("e-", "e", -1, &[]);
        test_molecule("He(g)", "He", 0, &["g"]);
        test_molecule("H2O(l)", "H2O", 0, &["l"]);
        test_molecule("SO4-2(aq)", "SO4", -2, &["aq"]);
        test_molecule("HgS(s, red)", "HgS", 0, &["s", "red"]);
        test_molecule("Fe2O3(s)", "Fe2O3", 0, &["s"]);
        test_molecule("Ca(NO3)2(s)", "Ca(NO3)2", 0, &["s"]);
        test_molecule("(NH4)2SO4(s)", "(NH4)2SO4", 0, &["s"]);
        test_molecule("(CH2)2(NH2)2H+1(aq)", "(CH2)2(NH2)2H", 1, &["aq"]);
        test_molecule("Fe+3", "Fe", 3, &[]);
        test_molecule("Ca(NO3)2", "Ca(NO3)2", 0, &[]);
        test_molecule("Fe(OH)", "Fe(OH)", 0, &[]);
    }

    #[test]
    fn only_last_group_holds_states() {
        test_molecule("H2O(l)(aq)", "H2O(l)", 0, &["aq"]);
        assert_eq!(
            counts("H2O(l)(aq)"),
            [("H".to_string(), 2), ("O".to_string(), 1), ("l".to_string(), 1)]
        );
    }

    #[test]
    fn element_counts() {
        let expected = |pairs: &[(&str, u64)]| -> Vec<(String, u64)> {
            pairs.iter().map(|(s, n)| (s.to_string(), *n)).collect()
        };
        assert_eq!(counts("H2O"), expected(&[("H", 2), ("O", 1)]));
        assert_eq!(
            counts("(NH4)2SO4"),
            expected(&[("H", 8), ("N", 2), ("O", 4), ("S", 1)])
        );
        assert_eq!(counts("Ca(NO3)2"), expected(&[("Ca", 1), ("N", 2), ("O", 6)]));
        assert_eq!(counts("CH3COOH"), expected(&[("C", 2), ("H", 4), ("O", 2)]));
        assert_eq!(counts("H0"), expected(&[]));
    }

    #[test]
    fn rendering() {
        for input in ["SO4-2(aq)", "HgS(s, red)", "e-", "Fe+3", "H2O", "NH4+(aq)"] {
            assert_eq!(Molecule::complete_formula(input).unwrap().to_string(), input);
        }
        assert_eq!(
            Molecule::complete_formula("HgS (s,red)").unwrap().to_string(),
            "HgS(s, red)"
        );
    }

    #[test]
    fn equality_ignores_whitespace_but_not_states() {
        let a = Molecule::complete_formula("H2O(l)").unwrap();
        let b: Molecule = " H2 O ( l ) ".parse().unwrap();
        let c = Molecule::complete_formula("H2O(g)").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        use std::collections::hash_map::DefaultHasher;
        let hash = |m: &Molecule| {
            let mut hasher = DefaultHasher::new();
            m.hash(&mut hasher);
            hasher.finish()
        };
        assert_eq!(hash(&a), hash(&b));
    }

    #[test]
    fn invalid_suffixes() {
        for input in ["+", "(aq)", "", "Na+Cl", "Na+(Cl)", "SO4-2x", "H2O(l"] {
            assert!(
                matches!(
                    Molecule::complete_formula(input),
                    Err(ChemError::InvalidFormula { .. })
                ),
                "{:?} should be rejected",
                input
            );
        }
    }

    #[test]
    fn unknown_elements_are_reported_when_validating() {
        let tokens = tokenize("FeXy2").unwrap();
        assert!(Molecule::from_tokens(&tokens).is_ok());

        let table = crate::element::PeriodicTable;
        assert_eq!(
            Molecule::from_tokens_with(&tokens, 64, Some(&table)),
            Err(ChemError::UnknownElement {
                symbol: "Xy".to_string(),
                pos: 2
            })
        );
    }
}
