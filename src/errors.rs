//! Centralized error handling for gridcast
//!
//! Every fallible operation in the crate returns [`Result`], so file access,
//! array shape problems and archive lookups all surface through one enum.

use std::fmt;
use std::path::PathBuf;

/// Main error type for gridcast operations
#[derive(Debug)]
pub enum GridcastError {
    /// NetCDF / HDF5 file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Metadata (data.json) parsing errors
    JsonError(serde_json::Error),

    /// Settings file parsing errors
    TomlError(toml::de::Error),

    /// `.npy` statistics file errors
    NpyError(ndarray_npy::ReadNpyError),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Variable not found in a NetCDF file
    VariableNotFound { var: String },

    /// Dimension not found in a variable
    DimensionNotFound { var: String, dim: String },

    /// Channel name not present in a field
    ChannelNotFound { channel: String },

    /// Invalid slice specification
    InvalidSlice { message: String },

    /// Input array does not have the shape an operation expects
    ShapeMismatch { expected: String, found: Vec<usize> },

    /// No yearly archive file for the requested timestamp
    ArchiveFileNotFound { root: PathBuf, filename: String },

    /// Requested history window is not fully contained in the archive
    TimeRange {
        found: usize,
        expected: usize,
        requested: String,
        start: String,
        end: String,
    },

    /// Remote object stores are not supported
    UnsupportedLocation(String),

    /// Missing or invalid configuration value
    ConfigError(String),

    /// Invalid parameter passed to a numerical routine
    InvalidParameter(String),

    /// Failure reported by a forecast model implementation
    ModelError(String),

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for GridcastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridcastError::NetCDFError(e) => write!(f, "NetCDF error: {}", e),
            GridcastError::IoError(e) => write!(f, "I/O error: {}", e),
            GridcastError::JsonError(e) => write!(f, "Metadata parse error: {}", e),
            GridcastError::TomlError(e) => write!(f, "Settings parse error: {}", e),
            GridcastError::NpyError(e) => write!(f, "NPY read error: {}", e),
            GridcastError::ArrayError(e) => write!(f, "Array error: {}", e),
            GridcastError::VariableNotFound { var } => {
                write!(f, "Variable '{}' not found in file", var)
            }
            GridcastError::DimensionNotFound { var, dim } => {
                write!(f, "Dimension '{}' not found in variable '{}'", dim, var)
            }
            GridcastError::ChannelNotFound { channel } => {
                write!(f, "Channel '{}' not found", channel)
            }
            GridcastError::InvalidSlice { message } => {
                write!(f, "Invalid slice specification: {}", message)
            }
            GridcastError::ShapeMismatch { expected, found } => {
                write!(f, "Shape mismatch: expected {}, found {:?}", expected, found)
            }
            GridcastError::ArchiveFileNotFound { root, filename } => write!(
                f,
                "No archive file '{}' found under {}",
                filename,
                root.display()
            ),
            GridcastError::TimeRange {
                found,
                expected,
                requested,
                start,
                end,
            } => write!(
                f,
                "{} found. Expected: {} .Time requested: {}. Time range in data: {} -- {}.",
                found, expected, requested, start, end
            ),
            GridcastError::UnsupportedLocation(loc) => {
                write!(f, "Remote storage is not supported: {}", loc)
            }
            GridcastError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            GridcastError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            GridcastError::ModelError(msg) => write!(f, "Model error: {}", msg),
            GridcastError::ThreadPoolError(msg) => write!(f, "Thread pool error: {}", msg),
            GridcastError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GridcastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridcastError::NetCDFError(e) => Some(e),
            GridcastError::IoError(e) => Some(e),
            GridcastError::JsonError(e) => Some(e),
            GridcastError::TomlError(e) => Some(e),
            GridcastError::NpyError(e) => Some(e),
            GridcastError::ArrayError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for GridcastError {
    fn from(error: netcdf::Error) -> Self {
        GridcastError::NetCDFError(error)
    }
}

impl From<std::io::Error> for GridcastError {
    fn from(error: std::io::Error) -> Self {
        GridcastError::IoError(error)
    }
}

impl From<serde_json::Error> for GridcastError {
    fn from(error: serde_json::Error) -> Self {
        GridcastError::JsonError(error)
    }
}

impl From<toml::de::Error> for GridcastError {
    fn from(error: toml::de::Error) -> Self {
        GridcastError::TomlError(error)
    }
}

impl From<ndarray_npy::ReadNpyError> for GridcastError {
    fn from(error: ndarray_npy::ReadNpyError) -> Self {
        GridcastError::NpyError(error)
    }
}

impl From<ndarray::ShapeError> for GridcastError {
    fn from(error: ndarray::ShapeError) -> Self {
        GridcastError::ArrayError(error)
    }
}

impl From<String> for GridcastError {
    fn from(error: String) -> Self {
        GridcastError::Generic(error)
    }
}

impl From<&str> for GridcastError {
    fn from(error: &str) -> Self {
        GridcastError::Generic(error.to_string())
    }
}

/// Result type alias for gridcast operations
pub type Result<T> = std::result::Result<T, GridcastError>;
