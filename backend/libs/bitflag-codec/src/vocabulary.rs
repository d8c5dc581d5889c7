//! Fixed ordered vocabularies for categorical fields.

use crate::filter::BitFilter;

/// A fixed, ordered list of `(value, label)` flag pairs for one categorical
/// field. The bit position of each flag is its index in `flags`.
///
/// `value` is the internal identifier used in query parameters and stored
/// group keys; `label` is the human-readable display text used by upstream
/// ingestion data and API responses.
#[derive(Debug, PartialEq, Eq)]
pub struct Vocabulary {
    /// Database column / filter parameter this vocabulary belongs to.
    pub field: &'static str,
    pub flags: &'static [(&'static str, &'static str)],
}

impl Vocabulary {
    /// Bit for an internal value, `None` for unknown values.
    pub fn bit_for_value(&self, value: &str) -> Option<i64> {
        self.flags
            .iter()
            .position(|(v, _)| *v == value)
            .map(|index| 1i64 << index)
    }

    /// Bit for a display label, `None` for unknown labels.
    pub fn bit_for_label(&self, label: &str) -> Option<i64> {
        self.flags
            .iter()
            .position(|(_, l)| *l == label)
            .map(|index| 1i64 << index)
    }

    /// Internal value for a display label. Used for scalar choice fields
    /// whose source data carries display text (duration, exposure).
    pub fn value_for_label(&self, label: &str) -> Option<&'static str> {
        self.flags
            .iter()
            .find(|(_, l)| *l == label)
            .map(|(v, _)| *v)
    }

    /// Encode a set of display labels into a bitmask.
    ///
    /// Returns `None` for an empty input: "no data" is distinct from "zero
    /// selected" and an empty label list must not be stored as `0`.
    /// Labels absent from the vocabulary are silently ignored; upstream
    /// datasets drift and a stray label must not fail a whole record.
    pub fn encode_labels<S: AsRef<str>>(&self, labels: &[S]) -> Option<i64> {
        if labels.is_empty() {
            return None;
        }
        let mask = labels
            .iter()
            .filter_map(|label| self.bit_for_label(label.as_ref()))
            .fold(0i64, |acc, bit| acc | bit);
        Some(mask)
    }

    /// Encode a set of internal values into a bitmask. Same lenient policy
    /// as [`encode_labels`](Self::encode_labels).
    pub fn encode_values<S: AsRef<str>>(&self, values: &[S]) -> Option<i64> {
        if values.is_empty() {
            return None;
        }
        let mask = values
            .iter()
            .filter_map(|value| self.bit_for_value(value.as_ref()))
            .fold(0i64, |acc, bit| acc | bit);
        Some(mask)
    }

    /// Decode a stored bitmask into `(value, label)` pairs.
    ///
    /// Output order is always vocabulary-declaration order, not insertion
    /// order, so serialization stays deterministic. `None` and `0` both
    /// decode to an empty list.
    pub fn decode(&self, bits: Option<i64>) -> Vec<(&'static str, &'static str)> {
        let Some(bits) = bits else {
            return Vec::new();
        };
        self.flags
            .iter()
            .enumerate()
            .filter(|(index, _)| bits & (1i64 << index) != 0)
            .map(|(_, pair)| *pair)
            .collect()
    }

    /// Build a conjunctive filter predicate from requested internal values.
    ///
    /// The record's bitmask must have *all* requested bits set. Requested
    /// values absent from the vocabulary contribute no constraint; if
    /// nothing known was requested there is no predicate at all.
    pub fn filter<S: AsRef<str>>(&self, requested: &[S]) -> Option<BitFilter> {
        let mask = requested
            .iter()
            .filter_map(|value| self.bit_for_value(value.as_ref()))
            .fold(0i64, |acc, bit| acc | bit);
        if mask == 0 {
            return None;
        }
        Some(BitFilter {
            column: self.field,
            mask,
        })
    }
}
