//! Column type inference over raw values
//!
//! Each column starts as [`TypeState::Numeric`] and only ever widens:
//! a date moves it to `Date`, any text or boolean moves it to `Nominal`.
//! A nominal column with more distinct values than the label cap is
//! demoted to free text once every value has been seen.

use rustc_hash::FxHashSet;

use crate::model::{ColumnType, DateFormat, RawRow, RawValue};

/// Position of a column in the widening lattice, `Numeric < Date < Nominal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeState {
    Numeric,
    Date,
    Nominal,
}

impl TypeState {
    /// Fold one observation into the state
    pub fn widen(self, value: &RawValue) -> TypeState {
        match (self, value) {
            (TypeState::Numeric, RawValue::Date(_) | RawValue::ParsedDate { .. }) => {
                TypeState::Date
            }
            (TypeState::Numeric | TypeState::Date, RawValue::Text(_) | RawValue::Bool(_)) => {
                TypeState::Nominal
            }
            (state, _) => state,
        }
    }
}

/// Folds the values of each column into one column type
#[derive(Debug, Clone, Copy)]
pub struct ColumnTypeInferencer<'a> {
    max_labels: usize,
    dates: &'a DateFormat,
}

impl<'a> ColumnTypeInferencer<'a> {
    pub fn new(max_labels: usize, dates: &'a DateFormat) -> Self {
        Self { max_labels, dates }
    }

    /// Infer the type of a single column from its values
    pub fn infer_column<'v, I>(&self, values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'v RawValue>,
    {
        let mut state = TypeState::Numeric;
        let mut distinct: FxHashSet<String> = FxHashSet::default();

        for value in values {
            if value.is_missing() {
                continue;
            }
            distinct.insert(value.render(self.dates));
            state = state.widen(value);
        }

        match state {
            TypeState::Numeric => ColumnType::Numeric,
            TypeState::Date => ColumnType::Date {
                format: self.dates.clone(),
            },
            TypeState::Nominal if distinct.len() > self.max_labels => ColumnType::Text,
            TypeState::Nominal => ColumnType::sorted_nominal(distinct),
        }
    }

    /// Infer the type of every column of rectangular rows
    pub fn infer(&self, rows: &[RawRow], width: usize) -> Vec<ColumnType> {
        (0..width)
            .map(|col| self.infer_column(rows.iter().filter_map(|row| row.get(col))))
            .collect()
    }
}
