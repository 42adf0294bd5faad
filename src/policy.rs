//! Which aggregate statistics may be rescaled, and how.
//!
//! Only additive aggregates are linear under resampling. Averages, extrema,
//! cardinalities and percentiles are left exactly as computed.

use std::collections::BTreeMap;

use crate::model::Number;

pub const COUNT: &str = "count";
pub const SUM: &str = "sum";
pub const SUM_OF_SQUARES: &str = "sum_of_squares";

/// Treatment of one named statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatTreatment {
    /// Multiply, then truncate to an integer.
    ScaleTruncate,
    /// Multiply, keep as a real number.
    Scale,
    PassThrough,
}

impl StatTreatment {
    /// Look up the treatment for a statistic name (ASCII case-insensitive).
    pub fn for_stat(name: &str) -> Self {
        if name.eq_ignore_ascii_case(COUNT) {
            Self::ScaleTruncate
        } else if name.eq_ignore_ascii_case(SUM) || name.eq_ignore_ascii_case(SUM_OF_SQUARES) {
            Self::Scale
        } else {
            Self::PassThrough
        }
    }

    pub fn apply(self, value: Number, factor: f64) -> Number {
        match self {
            Self::ScaleTruncate => Number::Int(scale_count(value.as_i64(), factor)),
            Self::Scale => Number::Float(value.as_f64() * factor),
            Self::PassThrough => value,
        }
    }
}

/// Scale an event count, truncating toward zero.
pub fn scale_count(count: i64, factor: f64) -> i64 {
    (count as f64 * factor) as i64
}

/// Scale every additive statistic in `stats` by `factor`.
pub fn extrapolate_stats(stats: &mut BTreeMap<String, Number>, factor: f64) {
    for (name, value) in stats.iter_mut() {
        *value = StatTreatment::for_stat(name).apply(*value, factor);
    }
}
