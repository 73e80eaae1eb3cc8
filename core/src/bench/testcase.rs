use std::collections::HashMap;

use serde::Serialize;

/// The two programs every language implements.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Counter loop: `i = 0; while i < n { i += 1 }`.
    Cycle,
    /// Multi-peg Tower of Hanoi recursion.
    Hanoi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestCase {
    /// Position in the declared test list; report order.
    pub index: usize,
    pub discs: u32,
    pub pegs: u32,
    pub iterations: u64,
}

impl TestCase {
    pub fn new(index: usize, discs: u32, pegs: u32, iterations: u64) -> Self {
        Self {
            index,
            discs,
            pegs,
            iterations,
        }
    }

    /// Arguments handed to the program of `dim`.
    pub fn args(&self, dim: Dimension) -> String {
        match dim {
            Dimension::Cycle => self.iterations.to_string(),
            Dimension::Hanoi => format!("{} {}", self.discs, self.pegs),
        }
    }

    /// Variables for run command templates, except `program`.
    pub fn interp_vars(&self, dim: Dimension) -> HashMap<&'static str, String> {
        let mut m = HashMap::new();
        m.insert("test", dim.to_string());
        m.insert("args", self.args(dim));
        m.insert("iterations", self.iterations.to_string());
        m.insert("discs", self.discs.to_string());
        m.insert("pegs", self.pegs.to_string());
        m
    }

    pub fn title(&self) -> String {
        format!(
            "Test {}. - Discs {}, Pegs {}, Iterations {}",
            self.index + 1,
            self.discs,
            self.pegs,
            self.iterations
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn dimensions_in_report_order() {
        let dims: Vec<_> = Dimension::iter().collect();
        assert_eq!(dims, [Dimension::Cycle, Dimension::Hanoi]);
        assert_eq!(Dimension::Cycle.to_string(), "cycle");
        assert_eq!(Dimension::Hanoi.to_string(), "hanoi");
    }

    #[test]
    fn args_per_dimension() {
        let t = TestCase::new(0, 15, 6, 100000);
        assert_eq!(t.args(Dimension::Cycle), "100000");
        assert_eq!(t.args(Dimension::Hanoi), "15 6");

        let vars = t.interp_vars(Dimension::Hanoi);
        assert_eq!(vars["test"], "hanoi");
        assert_eq!(vars["args"], "15 6");
        assert_eq!(vars["iterations"], "100000");
        assert_eq!(t.title(), "Test 1. - Discs 15, Pegs 6, Iterations 100000");
    }
}
