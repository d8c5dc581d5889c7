//! Conjunctive bit-flag predicates for the query layer.

/// A "match all selected categories" predicate over one bitmask column.
///
/// The record qualifies only when every bit in `mask` is set, i.e.
/// `(column & mask) = mask`. NULL columns never match, which is the
/// intended reading of "no data".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitFilter {
    pub column: &'static str,
    pub mask: i64,
}

impl BitFilter {
    /// Render the SQL condition with the mask bound at `param_index`.
    /// The same placeholder appears twice; callers bind the mask once.
    pub fn sql_condition(&self, param_index: usize) -> String {
        format!(
            "({column} & ${index}) = ${index}",
            column = self.column,
            index = param_index
        )
    }

    /// Evaluate the predicate in-process (mirrors the SQL semantics).
    pub fn matches(&self, bits: Option<i64>) -> bool {
        match bits {
            Some(bits) => bits & self.mask == self.mask,
            None => false,
        }
    }
}
