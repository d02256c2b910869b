//! A bidirectional table between categorical labels and dense integer codes.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maps labels to codes `0..len()` and back.
/// Codes are assigned in lexicographic order of the labels, so building the table from the same
/// set of labels always gives the same codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCodes {
    labels: Vec<String>,
    #[serde(skip)]
    codes: BTreeMap<String, u32>,
}

impl CategoryCodes {
    /// Builds the table from all labels seen, duplicates are fine.
    /// # Example
    /// ```
    /// # use algorithms::CategoryCodes;
    /// let codes = CategoryCodes::fit(vec!["room", "flat", "room"]);
    /// assert_eq!(codes.encode("flat"), Some(0));
    /// assert_eq!(codes.decode(1), Some("room"));
    /// assert_eq!(codes.encode("castle"), None);
    /// ```
    pub fn fit<'i>(labels: impl IntoIterator<Item = &'i str>) -> Self {
        let mut codes: BTreeMap<String, u32> = BTreeMap::new();
        for label in labels {
            codes.entry(label.to_string()).or_default();
        }
        Self::from_labels(codes.into_iter().map(|(label, _)| label).collect())
    }

    /// Rebuilds the lookup from an already sorted, duplicate free label list.
    fn from_labels(labels: Vec<String>) -> Self {
        let codes = labels
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code as u32))
            .collect();
        Self { labels, codes }
    }

    /// Gives the code of a label seen during [fit](CategoryCodes::fit).
    pub fn encode(&self, label: &str) -> Option<u32> {
        self.codes.get(label).copied()
    }

    /// Gives the label of a code.
    pub fn decode(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    /// How many distinct labels are known?
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Is the table empty?
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Must be called after deserializing, since only the labels are stored.
    /// Returns None if the stored labels are not sorted and unique.
    pub fn rebuilt(self) -> Option<Self> {
        let sorted_and_unique = self.labels.windows(2).all(|pair| pair[0] < pair[1]);
        if sorted_and_unique {
            Some(Self::from_labels(self.labels))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rebuilt_rejects_unsorted_labels() {
        let codes = CategoryCodes {
            labels: vec!["b".into(), "a".into()],
            codes: BTreeMap::new(),
        };
        assert!(codes.rebuilt().is_none());
    }

    proptest! {
        #[test]
        fn every_label_round_trips(labels in prop::collection::vec("[a-z ]{1,12}", 0..64)) {
            let codes = CategoryCodes::fit(labels.iter().map(String::as_str));
            for label in &labels {
                let code = codes.encode(label).unwrap();
                prop_assert_eq!(codes.decode(code), Some(label.as_str()));
            }
            prop_assert!(codes.len() <= labels.len());
        }

        #[test]
        fn rebuilt_keeps_codes(labels in prop::collection::vec("[a-z]{1,6}", 0..32)) {
            let codes = CategoryCodes::fit(labels.iter().map(String::as_str));
            let stripped = CategoryCodes { labels: codes.labels.clone(), codes: BTreeMap::new() };
            prop_assert_eq!(stripped.rebuilt().unwrap(), codes);
        }
    }
}
