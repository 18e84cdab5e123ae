//! Chemical formula parsing and exact stoichiometric equation balancing.
//!
//! ```
//! use chemeq::Equation;
//!
//! let equation: Equation = "Al + HCl = AlCl3 + H2".parse().unwrap();
//!
//! assert_eq!(equation.balance().unwrap().to_string(), "2Al + 6HCl = 2AlCl3 + 3H2");
//! ```

mod balance;
mod cache;
mod config;
mod element;
mod equation;
mod error;
pub mod formula;
pub mod matrix;
mod molecule;
mod parser;
mod species;
pub mod tokenizer;


pub use cache::MoleculeCache;
pub use config::{Config, ConfigBuilder, ConfigError, DEFAULT_MAX_NESTING_DEPTH};
pub use element::{ElementTable, PeriodicTable, ELECTRON};
pub use equation::Equation;
pub use error::{ChemError, Result};
pub use molecule::Molecule;
pub use parser::ChemParser;
pub use species::Species;
