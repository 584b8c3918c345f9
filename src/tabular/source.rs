use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use super::row::{Column, TabularRow};
use crate::error::{CheckError, Error};
use crate::Result;

/// Flat per-entity rows loaded from a delimited export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TabularSource {
    rows: Vec<TabularRow>,
}

impl TabularSource {
    pub fn from_rows(rows: Vec<TabularRow>) -> Self {
        Self { rows }
    }

    /// Load a CSV file. Any read or parse failure is fatal and names the path.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|source| Error::Load {
                path: path.to_path_buf(),
                source,
            })?;

        let source = Self::from_csv(reader).map_err(|source| Error::Load {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(
            "Loaded {} rows ({} entities) from {}",
            source.len(),
            source.entities().len(),
            path.display()
        );

        Ok(source)
    }

    /// Load CSV data from any reader (headers required)
    pub fn from_reader<R: Read>(reader: R) -> std::result::Result<Self, csv::Error> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> std::result::Result<Self, csv::Error> {
        let rows = reader
            .deserialize::<TabularRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[TabularRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct entity ids in ascending order
    pub fn entities(&self) -> Vec<&str> {
        self.rows
            .iter()
            .map(|r| r.ticker.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.rows.iter().any(|r| r.ticker == entity)
    }

    fn entity_values(&self, entity: &str, column: Column) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| r.ticker == entity)
            .filter_map(|r| r.get(column))
            .collect()
    }

    /// All present values of a column; a column with no values at all is missing
    pub fn column_values(&self, column: Column) -> std::result::Result<Vec<f64>, CheckError> {
        let values: Vec<f64> = self.rows.iter().filter_map(|r| r.get(column)).collect();
        if values.is_empty() {
            return Err(CheckError::MissingColumn(column.header()));
        }
        Ok(values)
    }

    pub fn sum(&self, column: Column) -> std::result::Result<f64, CheckError> {
        Ok(self.column_values(column)?.iter().sum())
    }

    pub fn min(&self, column: Column) -> std::result::Result<f64, CheckError> {
        Ok(self
            .column_values(column)?
            .into_iter()
            .fold(f64::INFINITY, f64::min))
    }

    pub fn max(&self, column: Column) -> std::result::Result<f64, CheckError> {
        Ok(self
            .column_values(column)?
            .into_iter()
            .fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn median(&self, column: Column) -> std::result::Result<f64, CheckError> {
        let values = self.column_values(column)?;
        median(&values).ok_or(CheckError::MissingColumn(column.header()))
    }

    /// Mean of an entity's values for a column
    pub fn entity_mean(&self, entity: &str, column: Column) -> Option<f64> {
        mean(&self.entity_values(entity, column))
    }

    /// Mean magnitude of an entity's values for a column. Drawdowns may be
    /// exported with either sign.
    pub fn entity_mean_abs(&self, entity: &str, column: Column) -> Option<f64> {
        let magnitudes: Vec<f64> = self
            .entity_values(entity, column)
            .into_iter()
            .map(f64::abs)
            .collect();
        mean(&magnitudes)
    }

    /// Largest magnitude of an entity's values for a column (worst drawdown)
    pub fn entity_max_abs(&self, entity: &str, column: Column) -> Option<f64> {
        self.entity_values(entity, column)
            .into_iter()
            .map(f64::abs)
            .reduce(f64::max)
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
