// Column whitelist
// Valid output column names, read once from the dataset schema at startup

use std::collections::HashSet;

/// Closed set of column names present in the dataset.
///
/// User-supplied field names are interpolated into the projection clause as
/// identifiers, so every one of them must be a member of this set first.
#[derive(Debug, Clone, Default)]
pub struct ColumnWhitelist {
    names: HashSet<String>,
}

impl ColumnWhitelist {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership test
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
