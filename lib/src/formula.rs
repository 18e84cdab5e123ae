//! Nested formula parser.
//!
//! Multipliers follow the element or group they scale (`H2`, `(NO3)2`), so the tokens are scanned
//! from right to left: a multiplier is known before the thing it applies to. The scan keeps two
//! explicit stacks (pending operators and one pending group per open nesting level) so nesting
//! depth is bounded by configuration and never by the call stack.

use std::collections::VecDeque;
use std::str::FromStr;

use malachite::num::basic::traits::{One, Zero};
use malachite::Natural;

use crate::error::{ChemError, Result};
use crate::tokenizer::{Token, TokenKind};

/// `count` consecutive occurrences of one element symbol
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ElementRun {
    pub symbol: String,
    pub count: Natural,
    /// Position of the symbol token in the parsed text
    pub pos: usize,
}
impl ElementRun {
    /// Expands the run into individual symbol occurrences
    pub fn occurrences(&self) -> impl Iterator<Item = &str> + '_ {
        let mut remaining = self.count.clone();
        std::iter::from_fn(move || {
            if remaining == Natural::ZERO {
                None
            } else {
                remaining -= Natural::ONE;
                Some(self.symbol.as_str())
            }
        })
    }
}

#[derive(Debug)]
enum Op<'a> {
    Multiplier(Natural, &'a Token),
    Close(&'a Token),
}

type Group = VecDeque<ElementRun>;

fn scale(group: &mut Group, multiplier: &Natural) {
    for run in group.iter_mut() {
        run.count *= multiplier;
    }
}

fn prepend(target: &mut Group, group: Group) {
    for run in group.into_iter().rev() {
        target.push_front(run);
    }
}

/// Applies a multiplier sitting on top of the operator stack (if there is one) to the group
fn apply_pending_multiplier(ops: &mut Vec<Op>, group: &mut Group) {
    if let Some(Op::Multiplier(..)) = ops.last() {
        if let Some(Op::Multiplier(n, _)) = ops.pop() {
            scale(group, &n);
        }
    }
}

/// Parses formula tokens (without charge and states) into element runs
/// # Arguments
/// * `tokens` - formula tokens, e.g. tokens of `Ca(NO3)2`
/// * `max_depth` - maximum allowed parenthesis nesting
/// # Returns
/// * `Ok` - element runs in left-to-right order (repeated symbols are kept as separate runs)
/// * `Err` - `InvalidFormula` for unmatched parentheses, dangling multipliers, empty groups,
///   unexpected tokens or too deep nesting
/// # Example
/// ```
/// use chemeq::formula::parse_formula;
/// use chemeq::tokenizer::tokenize;
///
/// let runs = parse_formula(&tokenize("Ca(NO3)2").unwrap(), 64).unwrap();
/// let runs: Vec<(&str, u64)> = runs
///     .iter()
///     .map(|r| (r.symbol.as_str(), u64::try_from(&r.count).unwrap()))
///     .collect();
///
/// assert_eq!(runs, [("Ca", 1), ("N", 2), ("O", 6)]);
/// ```
pub fn parse_formula(tokens: &[Token], max_depth: usize) -> Result<Vec<ElementRun>> {
    let mut ops: Vec<Op> = Vec::new();
    let mut levels: Vec<Group> = vec![Group::new()];

    for token in tokens.iter().rev() {
        match token.kind {
            TokenKind::Digits => {
                let n = Natural::from_str(&token.text)
                    .map_err(|_| ChemError::formula("invalid multiplier", &token.text, token.pos))?;
                ops.push(Op::Multiplier(n, token));
            }
            TokenKind::Close => {
                if levels.len() > max_depth {
                    return Err(ChemError::formula("nesting too deep", &token.text, token.pos));
                }
                ops.push(Op::Close(token));
                levels.push(Group::new());
            }
            TokenKind::Letters => {
                let mut run = Group::from([ElementRun {
                    symbol: token.text.clone(),
                    count: Natural::ONE,
                    pos: token.pos,
                }]);
                apply_pending_multiplier(&mut ops, &mut run);
                if let Some(level) = levels.last_mut() {
                    prepend(level, run);
                }
            }
            TokenKind::Open => {
                match ops.pop() {
                    Some(Op::Close(_)) => {}
                    Some(Op::Multiplier(_, digits)) => {
                        return Err(ChemError::formula(
                            "multiplier without a preceding element or group",
                            &digits.text,
                            digits.pos,
                        ))
                    }
                    None => return Err(ChemError::formula("unmatched '('", &token.text, token.pos)),
                }
                let mut group = levels.pop().unwrap_or_default();
                if group.is_empty() {
                    return Err(ChemError::formula("empty group", &token.text, token.pos));
                }
                apply_pending_multiplier(&mut ops, &mut group);
                if let Some(level) = levels.last_mut() {
                    prepend(level, group);
                }
            }
            TokenKind::Punct => {
                return Err(ChemError::formula("unexpected token", &token.text, token.pos));
            }
        }
    }

    match ops.pop() {
        None => {}
        Some(Op::Close(close)) => {
            return Err(ChemError::formula("unmatched ')'", &close.text, close.pos));
        }
        Some(Op::Multiplier(_, digits)) => {
            return Err(ChemError::formula(
                "multiplier without a preceding element or group",
                &digits.text,
                digits.pos,
            ));
        }
    }

    Ok(levels.pop().map(Vec::from).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn parse(formula: &str) -> Result<Vec<ElementRun>> {
        parse_formula(&tokenize(formula).unwrap(), 64)
    }

    fn flat(formula: &str) -> Vec<String> {
        parse(formula)
            .unwrap()
            .iter()
            .flat_map(|r| r.occurrences().map(String::from).collect::<Vec<_>>())
            .collect()
    }

    fn test_formula(formula: &str, expected: &[&str]) {
        assert_eq!(flat(formula), expected, "parsing {:?}", formula);
    }

    #[test]
    fn simple_formulas() {
        test_formula("e", &["e"]);
        test_formula("He", &["He"]);
        test_formula("H2O", &["H", "H", "O"]);
        test_formula("HgS", &["Hg", "S"]);
        test_formula("Fe2O3", &["Fe", "Fe", "O", "O", "O"]);
        test_formula("FePO4", &["Fe", "P", "O", "O", "O", "O"]);
    }

    #[test]
    fn groups() {
        test_formula("Ca(NO3)2", &["Ca", "N", "N", "O", "O", "O", "O", "O", "O"]);
        test_formula(
            "(NH4)2SO4",
            &["N", "N", "H", "H", "H", "H", "H", "H", "H", "H", "S", "O", "O", "O", "O"],
        );
        test_formula(
            "(CH2)2(NH2)2H",
            &["C", "C", "H", "H", "H", "H", "N", "N", "H", "H", "H", "H", "H"],
        );
        test_formula("X(BC)", &["X", "B", "C"]);
    }

    #[test]
    fn repeated_symbols_stay_separate_runs() {
        let runs = parse("CH3COOH").unwrap();
        let symbols: Vec<&str> = runs.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, ["C", "H", "C", "O", "O", "H"]);
        assert_eq!(runs[1].count, Natural::from(3u32));
    }

    #[test]
    fn nested_groups_scale_per_level() {
        let runs = parse("((A)2B)3").unwrap();
        let counts: Vec<(&str, u32)> = runs
            .iter()
            .map(|r| (r.symbol.as_str(), u32::try_from(&r.count).unwrap()))
            .collect();
        assert_eq!(counts, [("A", 6), ("B", 3)]);
    }

    #[test]
    fn large_multipliers_stay_compact() {
        let runs = parse("(C60)100000000000000000000").unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(
            runs[0].count,
            Natural::from_str("6000000000000000000000").unwrap()
        );
    }

    fn assert_invalid(formula: &str, reason: &'static str) {
        match parse(formula) {
            Err(ChemError::InvalidFormula { reason: r, .. }) => {
                assert_eq!(r, reason, "parsing {:?}", formula)
            }
            other => panic!("expected InvalidFormula for {:?}, got {:?}", formula, other),
        }
    }

    #[test]
    fn invalid_formulas() {
        assert_invalid("(H2", "unmatched '('");
        assert_invalid("H2)", "unmatched ')'");
        assert_invalid("2H", "multiplier without a preceding element or group");
        assert_invalid("(2H)", "multiplier without a preceding element or group");
        assert_invalid("H()", "empty group");
        assert_invalid("H_2", "unexpected token");
    }

    #[test]
    fn error_reports_position() {
        assert_eq!(
            parse("Ca(NO3))2"),
            Err(ChemError::formula("unmatched ')'", ")", 7))
        );
    }

    #[test]
    fn nesting_limit() {
        let deep = format!("{}H{}", "(".repeat(10), ")".repeat(10));
        let tokens = tokenize(&deep).unwrap();
        assert!(parse_formula(&tokens, 10).is_ok());
        assert!(matches!(
            parse_formula(&tokens, 9),
            Err(ChemError::InvalidFormula { reason: "nesting too deep", .. })
        ));
    }
}
