use crate::job::JobId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced synchronously to API callers.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),
    #[error("Domain is required")]
    DomainRequired,
    #[error("Invalid domain format: {0}")]
    InvalidDomain(String),
    #[error("Job not found: {0}")]
    JobNotFound(JobId),
    #[error("Data not available yet")]
    DataNotAvailable,
    #[error("Invalid data type: {0}")]
    InvalidDataType(String),
    #[error("Report file not found")]
    ReportNotFound,
    #[error("Error reading file {}: {source}", .path.display())]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
