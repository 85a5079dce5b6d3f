//src/filter.rs

/// How a value is compared against its threshold. Both are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `value >= threshold`
    AtLeast,
    /// `value <= threshold`
    AtMost,
}

/// One named comparison of a threshold rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub name: &'static str,
    /// `None` stands for an undefined value (missing field, empty genus rank,
    /// division by zero) and never satisfies the comparison.
    pub value: Option<f64>,
    pub threshold: f64,
    pub comparator: Comparator,
}

impl Criterion {
    pub fn at_least(name: &'static str, value: Option<f64>, threshold: f64) -> Self {
        Self { name, value, threshold, comparator: Comparator::AtLeast }
    }

    pub fn at_most(name: &'static str, value: Option<f64>, threshold: f64) -> Self {
        Self { name, value, threshold, comparator: Comparator::AtMost }
    }

    pub fn passes(&self) -> bool {
        match self.value {
            // NaN compares false either way
            Some(v) => match self.comparator {
                Comparator::AtLeast => v >= self.threshold,
                Comparator::AtMost => v <= self.threshold,
            },
            None => false,
        }
    }
}

/// AND of every criterion. An empty rule passes.
pub fn passes_all(criteria: &[Criterion]) -> bool {
    criteria.iter().all(|c| {
        let pass = c.passes();
        if !pass {
            log::trace!("{} = {:?} failed threshold {}", c.name, c.value, c.threshold);
        }
        pass
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_comparisons() {
        assert!(Criterion::at_least("x", Some(0.2), 0.2).passes());
        assert!(Criterion::at_most("x", Some(3.0), 3.0).passes());
        assert!(!Criterion::at_least("x", Some(0.19), 0.2).passes());
        assert!(!Criterion::at_most("x", Some(4.0), 3.0).passes());
    }

    #[test]
    fn undefined_values_fail() {
        assert!(!Criterion::at_most("order_in_genus", None, 3.0).passes());
        assert!(!Criterion::at_least("x", Some(f64::NAN), 0.0).passes());
        assert!(!Criterion::at_most("x", Some(f64::NAN), 0.0).passes());
    }

    #[test]
    fn and_semantics() {
        let rule = [
            Criterion::at_least("containment_index", Some(0.9), 0.2),
            Criterion::at_least("effective_coverage", Some(0.5), 1.0),
        ];
        assert!(!passes_all(&rule));
        assert!(passes_all(&rule[..1]));
        assert!(passes_all(&[]));
    }
}
