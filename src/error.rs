// src/error.rs

use std::path::PathBuf;

use thiserror::Error;

/// Crate-wide error type. Ingestion failures never reach the unit store;
/// header-cell and row-level parse problems are handled leniently inside
/// the workbook reader and never surface as `AppError`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid username or password")]
    AuthFailed,

    #[error("No download link configured for unit '{unit}'")]
    MissingLink { unit: String },

    #[error("Download failed for {url}: server returned status {status}")]
    Transport { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Allocated hours ({allocated}) do not match the unit total ({total})")]
    AllocationMismatch { allocated: u32, total: u32 },

    #[error("Failed to read workbook {}: {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Workbook {} has no worksheets", .path.display())]
    NoWorksheet { path: PathBuf },

    #[error("Failed to write workbook: {0}")]
    WorkbookWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("File I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization/deserialization failed: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Unit '{unit}' is not a manageable organizational unit")]
    UnknownUnit { unit: String },

    #[error("Hours must be between 0 and 999, got {hours}")]
    HoursOutOfRange { hours: u32 },

    #[error("Unit '{unit}' has no employee roster loaded")]
    NoRoster { unit: String },
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
