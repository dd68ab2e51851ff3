use std::path::PathBuf;

use crate::{certificates::CertificateError, properties::PropertiesError};

#[derive(thiserror::Error, Debug)]
pub enum UbiJavaBuildpackError {
    #[error("Malformed Java version '{0}'")]
    MalformedVersion(String),
    #[error("Unable to set keystore file permissions on {path}: {source}")]
    KeystorePermissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to load certificates into {path}: {source}")]
    CertificateLoad {
        path: PathBuf,
        #[source]
        source: CertificateError,
    },
    #[error("Unable to count JVM classes in {path}: {source}")]
    ClassCount {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to read properties file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: PropertiesError,
    },
    #[error("Unable to read extension hand-off {path}: {source}")]
    HandoffRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to expand {path}: {source}")]
    ArchiveExtract {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Unable to generate layer metadata: {0}")]
    LayerMetadata(#[source] CertificateError),
    #[error("Artifact for {id} {version} is not available at {path}")]
    ArtifactUnavailable {
        id: String,
        version: String,
        path: PathBuf,
    },
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("No {id} dependency matches Java version {version}")]
    NoMatchingDependency { id: String, version: String },
    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<UbiJavaBuildpackError> for libcnb::Error<UbiJavaBuildpackError> {
    fn from(e: UbiJavaBuildpackError) -> Self {
        libcnb::Error::BuildpackError(e)
    }
}
