//! Lawson class assignment
//!
//! With `N` thresholds there are `N` classes. Class `i < N-1` means the
//! point stays within the budget of threshold `i` (sitting, standing,
//! strolling, business walking for LDDC); class `N-1` is uncomfortable or
//! unsafe.

use crate::criteria::ThresholdSet;
use crate::error::ConfigError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comfort class, 0 is the most comfortable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComfortClass(pub usize);

impl ComfortClass {
    /// Class index
    #[inline]
    pub fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for ComfortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Assign the comfort class of an exceedance vector
///
/// Starting from the class above the highest threshold, step down while the
/// exceedance of the class below stays under its budget:
///
/// ```text
/// class = N
/// while class > 0 && exceedance[class-1] < budget[class-1]: class -= 1
/// class = min(class, N-1)
/// ```
///
/// # Errors
/// Returns `ConfigError::ExceedanceTooShort` if the exceedance vector has
/// fewer entries than the budget.
pub fn assign_class(exceedance: &[f64], budget: &[f64]) -> Result<ComfortClass, ConfigError> {
    let n = budget.len();
    if exceedance.len() < n {
        return Err(ConfigError::ExceedanceTooShort {
            exceedance: exceedance.len(),
            budgets: n,
        });
    }

    let mut class = n;
    while class > 0 && exceedance[class - 1] < budget[class - 1] {
        class -= 1;
    }
    Ok(ComfortClass(class.min(n.saturating_sub(1))))
}

/// Class assignment against a fixed budget
#[derive(Debug, Clone, PartialEq)]
pub struct ComfortClassifier {
    budgets: Vec<f64>,
}

impl ComfortClassifier {
    /// Classifier using the budgets of a threshold set
    pub fn new(thresholds: &ThresholdSet) -> Self {
        Self {
            budgets: thresholds.budgets(),
        }
    }

    /// Number of classes
    #[inline]
    pub fn class_count(&self) -> usize {
        self.budgets.len()
    }

    /// See [`assign_class`]
    ///
    /// # Errors
    /// Returns `ConfigError::ExceedanceTooShort` for a short exceedance vector.
    #[inline]
    pub fn assign_class(&self, exceedance: &[f64]) -> Result<ComfortClass, ConfigError> {
        assign_class(exceedance, &self.budgets)
    }
}

/// Letters used in receptor tables
///
/// Classes `0..N-1` are `a, b, c, ...` and the last class is `U`
/// (uncomfortable/unsafe). Threshold columns are lettered `a, b, c, ...` in
/// ascending threshold order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    labels: Vec<String>,
    lookup: FxHashMap<String, ComfortClass>,
}

impl ClassLabels {
    /// Label of the uncomfortable/unsafe class
    pub const UNSAFE: &'static str = "U";

    /// Labels for `class_count` classes
    pub fn new(class_count: usize) -> Self {
        let labels: Vec<String> = (0..class_count)
            .map(|i| {
                if i + 1 == class_count {
                    Self::UNSAFE.to_string()
                } else {
                    column_letter(i)
                }
            })
            .collect();
        let lookup = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.clone(), ComfortClass(i)))
            .collect();
        Self { labels, lookup }
    }

    /// Number of classes
    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if there are no classes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label of a class, `None` if out of range
    pub fn label(&self, class: ComfortClass) -> Option<&str> {
        self.labels.get(class.0).map(String::as_str)
    }

    /// Class of a label, `None` if unknown
    pub fn class_of(&self, label: &str) -> Option<ComfortClass> {
        self.lookup.get(label.trim()).copied()
    }

    /// Column names for the exceedance of each threshold
    pub fn threshold_columns(&self) -> Vec<String> {
        (0..self.labels.len()).map(column_letter).collect()
    }
}

/// `a..z`, then `aa, ab, ...`
fn column_letter(index: usize) -> String {
    let mut out = Vec::new();
    let mut i = index;
    loop {
        out.push(b'a' + (i % 26) as u8);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LDDC_BUDGET: [f64; 5] = [0.05, 0.05, 0.05, 0.05, 0.00022];

    #[test]
    fn test_class_between_thresholds() {
        let class = assign_class(&[0.10, 0.08, 0.03, 0.01, 0.0001], &LDDC_BUDGET).unwrap();
        assert_eq!(class, ComfortClass(2));
    }

    #[test]
    fn test_class_extremes() {
        assert_eq!(assign_class(&[0.0; 5], &LDDC_BUDGET).unwrap(), ComfortClass(0));
        assert_eq!(assign_class(&[1.0; 5], &LDDC_BUDGET).unwrap(), ComfortClass(4));
        // Safety exceeded alone clamps to the top class
        assert_eq!(
            assign_class(&[0.0, 0.0, 0.0, 0.0, 0.001], &LDDC_BUDGET).unwrap(),
            ComfortClass(4)
        );
    }

    #[test]
    fn test_budget_boundary_is_not_within() {
        // Exactly at the budget counts as exceeded
        let class = assign_class(&[0.05, 0.05, 0.0, 0.0, 0.0], &LDDC_BUDGET).unwrap();
        assert_eq!(class, ComfortClass(2));
    }

    #[test]
    fn test_short_exceedance_rejected() {
        assert_eq!(
            assign_class(&[0.1, 0.1], &LDDC_BUDGET),
            Err(ConfigError::ExceedanceTooShort {
                exceedance: 2,
                budgets: 5
            })
        );
    }

    #[test]
    fn test_classifier_uses_threshold_budgets() {
        let classifier = ComfortClassifier::new(&ThresholdSet::lawson_lddc());
        assert_eq!(classifier.class_count(), 5);
        assert_eq!(
            classifier.assign_class(&[0.2, 0.01, 0.0, 0.0, 0.0]).unwrap(),
            ComfortClass(1)
        );
    }

    #[test]
    fn test_labels_round_trip() {
        let labels = ClassLabels::new(5);
        let names: Vec<&str> = (0..5).map(|c| labels.label(ComfortClass(c)).unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d", "U"]);
        for c in 0..5 {
            let label = labels.label(ComfortClass(c)).unwrap();
            assert_eq!(labels.class_of(label), Some(ComfortClass(c)));
        }
        assert_eq!(labels.class_of("e"), None);
        assert_eq!(labels.threshold_columns(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_column_letters_past_z() {
        assert_eq!(column_letter(0), "a");
        assert_eq!(column_letter(25), "z");
        assert_eq!(column_letter(26), "aa");
        assert_eq!(column_letter(27), "ab");
    }
}
