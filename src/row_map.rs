//! Name-based access to result rows.

use crate::{Field, Value};

/// Lightweight row view for name-based access helpers.
#[derive(Clone, Copy, Debug)]
pub struct RowRef<'a> {
    /// Schema fields aligned with `values`.
    pub fields: &'a [Field],
    /// Row values aligned with `fields`.
    pub values: &'a [Value],
}

impl<'a> RowRef<'a> {
    /// Returns a value by case-insensitive column name.
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        let idx = self
            .fields
            .iter()
            .position(|field| field.name.eq_ignore_ascii_case(name))?;
        self.values.get(idx)
    }

    /// Returns the value at `index`.
    pub fn at(&self, index: usize) -> Option<&'a Value> {
        self.values.get(index)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_i64()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_f64()
    }

    pub fn get_text(&self, name: &str) -> Option<&'a str> {
        self.get(name)?.as_str()
    }
}
