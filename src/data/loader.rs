//! CSV Data Loader Module
//! Handles dataset loading and column bookkeeping using Polars.

use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("file '{}' not found", .0.display())]
    FileNotFound(PathBuf),
    #[error("failed to load CSV: {0}")]
    Load(#[from] PolarsError),
}

/// Owns the dataset for the lifetime of a run.
///
/// All accessors are total: before a successful `load_csv` they return empty
/// results, so downstream stages uniformly no-op when no dataset is loaded.
pub struct DataLoader {
    df: Option<DataFrame>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self { df: None }
    }

    /// Load a CSV file using Polars.
    pub fn load_csv(&mut self, file_path: &Path) -> Result<&DataFrame, LoaderError> {
        if !file_path.is_file() {
            return Err(LoaderError::FileNotFound(file_path.to_path_buf()));
        }

        // Use lazy evaluation for memory efficiency, then collect
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        log::info!(
            "data loaded from {}: {} rows x {} columns",
            file_path.display(),
            df.height(),
            df.width()
        );
        Ok(self.df.insert(df))
    }

    /// Drop a column from the dataset. A no-op when the column is absent or
    /// nothing is loaded.
    pub fn drop_column(&mut self, name: &str) -> Result<(), LoaderError> {
        if let Some(df) = self.df.take() {
            let present = df.get_column_names().iter().any(|c| c.as_str() == name);
            self.df = Some(if present { df.drop(name)? } else { df });
        }
        Ok(())
    }

    /// Get list of column names from the loaded dataset.
    pub fn columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get list of numeric column names.
    pub fn numeric_columns(&self) -> Vec<String> {
        let Some(df) = &self.df else {
            return Vec::new();
        };

        df.get_columns()
            .iter()
            .filter(|col| {
                matches!(
                    col.dtype(),
                    DataType::Float32
                        | DataType::Float64
                        | DataType::Int8
                        | DataType::Int16
                        | DataType::Int32
                        | DataType::Int64
                        | DataType::UInt8
                        | DataType::UInt16
                        | DataType::UInt32
                        | DataType::UInt64
                )
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Get the number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded dataset.
    pub fn dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn load_reports_shape_of_well_formed_csv() {
        let path = write_fixture(
            "solarscan_loader_shape.csv",
            "Timestamp,GHI,DNI,Comments\n\
             2021-08-09 00:01,0.0,0.1,\n\
             2021-08-09 00:02,1.5,0.2,note\n\
             2021-08-09 00:03,3.0,0.4,\n",
        );

        let mut loader = DataLoader::new();
        let df = loader.load_csv(&path).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 4);
        assert_eq!(loader.row_count(), 3);
        assert_eq!(loader.columns(), vec!["Timestamp", "GHI", "DNI", "Comments"]);

        fs::remove_file(path).ok();
    }

    #[test]
    fn missing_file_yields_file_not_found_and_no_dataset() {
        let path = std::env::temp_dir().join("solarscan_loader_does_not_exist.csv");

        let mut loader = DataLoader::new();
        let err = loader.load_csv(&path).unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound(_)));

        // Downstream accessors no-op instead of raising.
        assert!(loader.dataframe().is_none());
        assert_eq!(loader.row_count(), 0);
        assert!(loader.columns().is_empty());
        assert!(loader.numeric_columns().is_empty());
    }

    #[test]
    fn numeric_columns_excludes_text() {
        let path = write_fixture(
            "solarscan_loader_numeric.csv",
            "Timestamp,GHI,WS\n2021-08-09 00:01,12.5,1.0\n2021-08-09 00:02,13.0,2.0\n",
        );

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();
        assert_eq!(loader.numeric_columns(), vec!["GHI", "WS"]);

        fs::remove_file(path).ok();
    }

    #[test]
    fn dropping_absent_column_is_a_no_op() {
        let path = write_fixture("solarscan_loader_drop.csv", "GHI,Comments\n1.0,a\n2.0,b\n");

        let mut loader = DataLoader::new();
        loader.load_csv(&path).unwrap();

        loader.drop_column("Comments").unwrap();
        assert_eq!(loader.columns(), vec!["GHI"]);

        // Second drop: the column no longer exists.
        loader.drop_column("Comments").unwrap();
        assert_eq!(loader.columns(), vec!["GHI"]);

        fs::remove_file(path).ok();
    }
}
