use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use tracing::instrument;

use crate::cache::MoleculeCache;
use crate::config::Config;
use crate::element::{ElementTable, PeriodicTable};
use crate::equation::{parse_equation, Equation};
use crate::error::Result;
use crate::molecule::Molecule;
use crate::tokenizer::{concat, tokenize, Token};

/// Parses molecules and equations according to a [`Config`]
/// Holds the optional molecule cache and the optional element table used for cross-validation
/// A parser can be shared between threads
pub struct ChemParser {
    config: Config,
    cache: Option<MoleculeCache>,
    table: Option<Box<dyn ElementTable + Send + Sync>>,
}
impl ChemParser {
    /// Create new parser
    /// If `validate_elements` is enabled, symbols are checked against [`PeriodicTable`]
    /// If `cache_molecules` is enabled, parsed molecules are interned
    /// # Example
    /// ```
    /// use chemeq::{ChemError, ChemParser, Config};
    ///
    /// let config = Config::builder().validate_elements(true).build().unwrap();
    /// let parser = ChemParser::new(config);
    ///
    /// assert!(parser.molecule("Fe2O3").is_ok());
    /// assert!(matches!(parser.molecule("Xq2"), Err(ChemError::UnknownElement { .. })));
    /// ```
    pub fn new(config: Config) -> Self {
        let table: Option<Box<dyn ElementTable + Send + Sync>> = if config.validate_elements {
            Some(Box::new(PeriodicTable))
        } else {
            None
        };
        let cache = config.cache_molecules.then(MoleculeCache::new);
        Self {
            config,
            cache,
            table,
        }
    }

    /// Replaces the table used for cross-validating element symbols
    pub fn with_element_table(mut self, table: impl ElementTable + Send + Sync + 'static) -> Self {
        self.table = Some(Box::new(table));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&MoleculeCache> {
        self.cache.as_ref()
    }

    /// Parses a complete formula (formula, optional charge, optional states)
    pub fn molecule(&self, input: &str) -> Result<Arc<Molecule>> {
        self.molecule_from_tokens(&tokenize(input)?)
    }

    pub(crate) fn molecule_from_tokens(&self, tokens: &[Token]) -> Result<Arc<Molecule>> {
        let table = self.table.as_deref().map(|t| t as &dyn ElementTable);
        let parse = || Molecule::from_tokens_with(tokens, self.config.max_nesting_depth, table);
        match &self.cache {
            Some(cache) => cache.get_or_try_insert(&concat(tokens), parse),
            None => parse().map(Arc::new),
        }
    }

    /// Parses an equation
    #[instrument(level = "debug", skip(self))]
    pub fn equation(&self, input: &str) -> Result<Equation> {
        parse_equation(input, self)
    }

    /// Parses and balances an equation using this parser's configuration
    pub fn balance(&self, input: &str) -> Result<Equation> {
        self.equation(input)?.balance_with(&self.config)
    }
}
impl Default for ChemParser {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
impl Debug for ChemParser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChemParser")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .field("validates_elements", &self.table.is_some())
            .finish()
    }
}
