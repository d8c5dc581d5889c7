//! Bit-flag encoding for multi-valued categorical plant attributes
//!
//! Botanical attributes like soil type or toxicity hold a *set* of labels
//! drawn from a fixed vocabulary. They are stored as integer bitmasks, one
//! bit per label, where the bit position is the label's index in the
//! declared vocabulary order. That order is persistence-stable: reordering
//! a vocabulary corrupts every previously stored bitmask.
//!
//! The same codec serves three call sites:
//! - ingestion encodes source label lists into masks (`Vocabulary::encode_labels`)
//! - serialization decodes masks back into ordered label pairs (`Vocabulary::decode`)
//! - the query layer builds conjunctive SQL predicates (`Vocabulary::filter`)

use serde::Serialize;

pub mod fields;
pub mod filter;
pub mod vocabulary;

pub use fields::field_vocabulary;
pub use filter::BitFilter;
pub use vocabulary::Vocabulary;

/// One selected flag, ready for serialization: internal value plus the
/// human-readable display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BitSetData {
    pub value: String,
    pub label: String,
}

/// An owned bitmask bound to its vocabulary.
///
/// `None` means "no data" and is distinct from "zero labels selected":
/// an empty source label list encodes as `None`, never as `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitSet {
    vocabulary: &'static Vocabulary,
    bits: Option<i64>,
}

impl BitSet {
    /// Wrap a stored mask (typically read back from the database).
    pub fn from_bits(vocabulary: &'static Vocabulary, bits: Option<i64>) -> Self {
        Self { vocabulary, bits }
    }

    /// Encode a list of display labels. Unknown labels are dropped.
    pub fn from_labels<S: AsRef<str>>(vocabulary: &'static Vocabulary, labels: &[S]) -> Self {
        Self {
            vocabulary,
            bits: vocabulary.encode_labels(labels),
        }
    }

    pub fn bits(&self) -> Option<i64> {
        self.bits
    }

    pub fn vocabulary(&self) -> &'static Vocabulary {
        self.vocabulary
    }

    /// Decode into `(value, label)` pairs in vocabulary order.
    pub fn decode(&self) -> Vec<(&'static str, &'static str)> {
        self.vocabulary.decode(self.bits)
    }

    /// Selected flags as serializable value/label pairs, in vocabulary order.
    pub fn get_set_data(&self) -> Vec<BitSetData> {
        self.decode()
            .into_iter()
            .map(|(value, label)| BitSetData {
                value: value.to_string(),
                label: label.to_string(),
            })
            .collect()
    }
}
