use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing API token, pass --token or set {0}")]
    MissingToken(&'static str),
    #[error("Invalid domain '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },
    #[error("Polling interval must be at least {min} seconds, got {got}")]
    PollingInterval { min: u64, got: u64 },
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("Cannot build request url from {0}")]
    Endpoint(String),
    #[error("Service responded {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Data asset {name} ({id}) failed")]
    AssetFailed { id: String, name: String },
    #[error("Timed out waiting for data asset {id} to become ready")]
    Timeout { id: String },
}

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("No data assets to provision")]
    NoAssets,
    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest lists no data assets")]
    Empty,
    #[error("Data asset #{index} has an empty name")]
    EmptyName { index: usize },
    #[error("Data asset '{name}' has an invalid mount '{mount}'")]
    InvalidMount { name: String, mount: String },
    #[error("Data asset '{name}' must have exactly one source")]
    Source { name: String },
}

#[derive(Error, Debug)]
pub enum SourceCheckError {
    #[error("No objects found under s3://{bucket}/{prefix}")]
    EmptyPrefix { bucket: String, prefix: String },
}
