// LabelTable — dense integer indices for string labels

use std::collections::{BTreeSet, HashMap};

/// Bijection between the distinct raw labels of a dataset and `0..len()`.
///
/// Labels are numbered in sorted order, so the same label set always gets the
/// same numbering regardless of the order rows were read in. When every label
/// is an integer they are sorted by value, so cluster ids `0..n` map to
/// themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelTable {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelTable {
    /// Build the table from every label occurrence (duplicates are fine).
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let mut names: Vec<String> = distinct.into_iter().collect();
        let numeric: Option<Vec<i128>> = names.iter().map(|n| n.parse().ok()).collect();
        if let Some(values) = numeric {
            let mut pairs: Vec<(i128, String)> = values.into_iter().zip(names).collect();
            // "01" and "1" are distinct labels with the same value
            pairs.sort();
            names = pairs.into_iter().map(|(_, n)| n).collect();
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Integer index of `label`.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Raw label assigned to `index`.
    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Distinct labels in index order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no labels were seen.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
