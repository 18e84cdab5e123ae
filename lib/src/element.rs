use mendeleev::{Element, ALL_ELEMENTS};

/// Symbol used for the electron, accepted by cross-validation regardless of the table
pub const ELECTRON: &str = "e";

/// Source of known element symbols, used only to cross-validate parsed formulas
/// Element counting never depends on it
pub trait ElementTable {
    /// Returns true if the symbol names a known element
    fn contains(&self, symbol: &str) -> bool;
}

/// Periodic table backed by the `mendeleev` element data
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct PeriodicTable;
impl PeriodicTable {
    /// Finds element by its symbol (case sensitive, e.g. `Fe`)
    /// # Example
    /// ```
    /// use chemeq::PeriodicTable;
    /// use mendeleev::Element;
    ///
    /// assert_eq!(PeriodicTable.by_symbol("Fe"), Some(Element::Fe));
    /// assert_eq!(PeriodicTable.by_symbol("Xx"), None);
    /// ```
    pub fn by_symbol(&self, symbol: &str) -> Option<Element> {
        ALL_ELEMENTS.iter().find(|e| e.symbol() == symbol).copied()
    }

    /// Finds element by its English name, ignoring case
    /// # Example
    /// ```
    /// use chemeq::PeriodicTable;
    /// use mendeleev::Element;
    ///
    /// assert_eq!(PeriodicTable.by_name("iron"), Some(Element::Fe));
    /// assert_eq!(PeriodicTable.by_name("Fe"), None);
    /// ```
    pub fn by_name(&self, name: &str) -> Option<Element> {
        ALL_ELEMENTS
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
            .copied()
    }

    /// Finds element by its atomic number (number of protons)
    pub fn by_atomic_number(&self, protons: u32) -> Option<Element> {
        ALL_ELEMENTS
            .iter()
            .find(|e| u32::from(e.atomic_number()) == protons)
            .copied()
    }
}
impl ElementTable for PeriodicTable {
    fn contains(&self, symbol: &str) -> bool {
        symbol == ELECTRON || self.by_symbol(symbol).is_some()
    }
}

impl<F> ElementTable for F
where
    F: Fn(&str) -> bool,
{
    fn contains(&self, symbol: &str) -> bool {
        self(symbol)
    }
}
