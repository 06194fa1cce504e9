use std::collections::BTreeMap;

use gml_core::GmlValue;

/// Array indexes at or above this bound are rejected before any storage grows.
pub const MAX_ARRAY_INDEX: usize = 32000;

/// Position inside a variable's two-dimensional backing array.
///
/// `a` addresses `[0, 0]`, `a[i]` addresses `[0, i]` and `a[i, j]` addresses `[i, j]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArrayIndex {
    pub row: usize,
    pub col: usize,
}

impl ArrayIndex {
    pub fn from_indexes(indexes: &[usize]) -> Self {
        match indexes {
            [] => Self::default(),
            [col] => Self { row: 0, col: *col },
            [row, col, ..] => Self {
                row: *row,
                col: *col,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMiss {
    Undefined,
    OutOfBounds,
}

/// Named, array-shaped variables of one scope (locals, an instance, globals).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarStore {
    vars: BTreeMap<String, Vec<Vec<GmlValue>>>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn get(&self, name: &str, index: ArrayIndex) -> Result<GmlValue, StoreMiss> {
        let rows = self.vars.get(name).ok_or(StoreMiss::Undefined)?;
        rows.get(index.row)
            .and_then(|row| row.get(index.col))
            .cloned()
            .ok_or(StoreMiss::OutOfBounds)
    }

    pub fn get_scalar(&self, name: &str) -> Option<GmlValue> {
        self.get(name, ArrayIndex::default()).ok()
    }

    /// Writes one cell, growing the array with zeroes as needed.
    pub fn set(&mut self, name: &str, index: ArrayIndex, value: GmlValue) {
        let rows = self.vars.entry(name.to_string()).or_default();
        if rows.len() <= index.row {
            rows.resize_with(index.row + 1, Vec::new);
        }
        let row = &mut rows[index.row];
        if row.len() <= index.col {
            row.resize(index.col + 1, GmlValue::ZERO);
        }
        row[index.col] = value;
    }

    pub fn set_scalar(&mut self, name: &str, value: GmlValue) {
        self.set(name, ArrayIndex::default(), value);
    }

    /// Declares a name without any cell; reads fail until the first write.
    pub fn declare(&mut self, name: &str) {
        self.vars.entry(name.to_string()).or_default();
    }

    /// Copies the whole array stored under `name` in `source`.
    pub fn adopt(&mut self, name: &str, source: &VarStore) -> bool {
        match source.vars.get(name) {
            Some(rows) => {
                self.vars.insert(name.to_string(), rows.clone());
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
