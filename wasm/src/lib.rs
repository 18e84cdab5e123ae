use wasm_bindgen::prelude::*;
use chemeq::Equation;


// Export a `equation_io` function from Rust to JavaScript.
#[wasm_bindgen]
/// Parse and balance input equation
/// First char of the output is 1 if balancing succeeded (followed by the balanced equation),
/// 0 otherwise (followed by the error message)
pub fn equation_io(equation: &str) -> String {
    let equation = match Equation::parse(equation) {
        Ok(equation) => equation,
        Err(err) => return format!("0{}", err),
    };

    match equation.balance() {
        Ok(balanced) => format!("1{}", balanced),
        Err(err) => format!("0{}", err),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balanced_output() {
        assert_eq!(equation_io("H2 + O2 = H2O"), "12H2 + O2 = 2H2O");
    }

    #[test]
    fn error_output() {
        assert_eq!(
            equation_io("H2 + O2"),
            "0Invalid equation near \"\" at position 7: there should be exactly one '=' in the equation"
        );
        assert_eq!(
            equation_io("H2 = O2"),
            "0Equation can't be balanced: species compositions are linearly independent"
        );
    }
}
