//! Aggregate functions available inside formulas.
//!
//! Every aggregate receives the numeric members of its arguments; references
//! and ranges contribute only the members that hold numbers, so text, empty
//! cells and error sentinels are skipped rather than failing the call.

/// A built-in aggregate function.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Average,
    Min,
    Max,
    Count,
}

/// Registered aggregates by formula name.
pub const AGGREGATES: &[(&str, Aggregate)] = &[
    ("SUM", Aggregate::Sum),
    ("AVERAGE", Aggregate::Average),
    ("MIN", Aggregate::Min),
    ("MAX", Aggregate::Max),
    ("COUNT", Aggregate::Count),
];

impl Aggregate {
    /// Look up an aggregate by (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Aggregate> {
        AGGREGATES
            .iter()
            .find(|(registered, _)| registered.eq_ignore_ascii_case(name))
            .map(|(_, aggregate)| *aggregate)
    }

    /// Apply to the gathered numeric members. None means the call is an error
    /// (an average of nothing).
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        match self {
            Aggregate::Sum => Some(values.iter().sum()),
            Aggregate::Average => {
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            }
            Aggregate::Min => Some(values.iter().copied().reduce(f64::min).unwrap_or(0.0)),
            Aggregate::Max => Some(values.iter().copied().reduce(f64::max).unwrap_or(0.0)),
            Aggregate::Count => Some(values.len() as f64),
        }
    }
}
