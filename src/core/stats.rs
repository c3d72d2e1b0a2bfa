use crate::domain::model::VariableStatistic;
use serde::{Deserialize, Serialize};

/// Running `(sum, sumSq, count, min, max)` for one variable.
///
/// Partial accumulators built over disjoint subsets can be merged in any order;
/// only [`StatAccumulator::finish`] turns them into mean and stddev. The
/// reported stddev is the population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatAccumulator {
    pub count: u64,
    pub sum: f64,
    pub sum_sq: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for StatAccumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl StatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite values are skipped, same as nulls.
    pub fn push(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn push_opt(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.push(value);
        }
    }

    pub fn merge(&mut self, other: &StatAccumulator) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn merged(mut self, other: &StatAccumulator) -> Self {
        self.merge(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(&self) -> VariableStatistic {
        if self.count == 0 {
            return VariableStatistic::no_data();
        }

        let n = self.count as f64;
        let mean = self.sum / n;
        // 浮點誤差可能讓變異數略小於 0
        let variance = (self.sum_sq / n - mean * mean).max(0.0);

        VariableStatistic {
            count: self.count,
            mean: Some(mean),
            min: Some(self.min),
            max: Some(self.max),
            stddev: Some(variance.sqrt()),
        }
    }
}

impl FromIterator<f64> for StatAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Self::new();
        for value in iter {
            acc.push(value);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finish_population_stddev() {
        let acc: StatAccumulator = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        let stat = acc.finish();

        assert_eq!(stat.count, 8);
        assert_eq!(stat.mean, Some(5.0));
        assert_eq!(stat.min, Some(2.0));
        assert_eq!(stat.max, Some(9.0));
        assert!((stat.stddev.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_accumulator_is_no_data() {
        let stat = StatAccumulator::new().finish();
        assert_eq!(stat, VariableStatistic::no_data());
        assert!(!stat.has_data());
    }

    #[test]
    fn test_nulls_and_nan_are_skipped() {
        let mut acc = StatAccumulator::new();
        acc.push_opt(None);
        acc.push(f64::NAN);
        acc.push_opt(Some(3.0));
        assert_eq!(acc.count, 1);
        assert_eq!(acc.finish().mean, Some(3.0));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let acc: StatAccumulator = [1.5, 2.5].into_iter().collect();
        let merged = acc.merged(&StatAccumulator::new());
        assert_eq!(merged.finish(), acc.finish());
    }

    #[test]
    fn test_single_value_has_zero_stddev() {
        let acc: StatAccumulator = [12.25].into_iter().collect();
        assert_eq!(acc.finish().stddev, Some(0.0));
    }
}
