use std::path::PathBuf;
use thiserror::Error;

/// Failures that stop the whole run
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Input JSON file not found at '{}'", path.display())]
    InputNotFound { path: PathBuf },

    #[error("Could not read input JSON file '{}': {source}", path.display())]
    InputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not decode JSON from '{}': {source}. Please check the file format.", path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: simd_json::Error,
    },

    #[error("JSON in '{}' nests deeper than {limit} levels", path.display())]
    TooDeep { path: PathBuf, limit: usize },

    #[error("JSON data does not contain a '{field}' key")]
    ResourcesMissing { field: String },

    #[error("JSON field '{field}' must be an array, found {found}")]
    ResourcesNotArray { field: String, found: &'static str },

    #[error("Could not create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A single record could not be flattened
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FlattenError {
    #[error("record nests {depth} levels deep, limit is {limit}")]
    TooDeep { depth: usize, limit: usize },
}

/// A single type's CSV file could not be written
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Error writing CSV file '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl WriteError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            WriteError::Csv { path, .. } => path,
        }
    }
}
