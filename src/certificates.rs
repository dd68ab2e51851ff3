use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use rustls_pki_types::{CertificateDer, pem::PemObject};
use sha2::{Digest, Sha256};

use crate::keystore::{JksKeystore, KeystoreError};

pub(crate) const DEFAULT_CERTIFICATE_FILE: &str = "/etc/ssl/certs/ca-certificates.crt";
pub(crate) const DEFAULT_KEYSTORE_PASSWORD: &str = "changeit";

#[derive(thiserror::Error, Debug)]
pub enum CertificateError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid keystore {path}: {source}")]
    Keystore {
        path: PathBuf,
        #[source]
        source: KeystoreError,
    },
    #[error("invalid PEM certificate in {0}")]
    Pem(PathBuf),
}

/// Imports trusted certificates into a JVM keystore.
pub(crate) trait CertificateLoader {
    fn load(&self, keystore: &Path, password: &str) -> Result<(), CertificateError>;

    /// Fingerprint of the certificates `load` would import.
    fn metadata(&self) -> Result<BTreeMap<String, String>, CertificateError>;
}

/// Loads PEM certificates from `SSL_CERT_FILE` and `SSL_CERT_DIR`.
#[derive(Debug, Clone)]
pub(crate) struct PemCertificateLoader {
    cert_file: Option<PathBuf>,
    cert_dirs: Vec<PathBuf>,
}

impl PemCertificateLoader {
    pub(crate) fn new(cert_file: Option<PathBuf>, cert_dirs: Vec<PathBuf>) -> Self {
        Self {
            cert_file,
            cert_dirs,
        }
    }

    fn certificate_files(&self) -> Result<Vec<PathBuf>, CertificateError> {
        let mut files = Vec::new();

        if let Some(file) = &self.cert_file {
            if file.is_file() {
                files.push(file.clone());
            }
        }

        for dir in self.cert_dirs.iter().filter(|dir| dir.is_dir()) {
            let entries = fs::read_dir(dir).map_err(|source| CertificateError::Io {
                path: dir.clone(),
                source,
            })?;
            let mut dir_files = Vec::new();
            for entry in entries {
                let path = entry
                    .map_err(|source| CertificateError::Io {
                        path: dir.clone(),
                        source,
                    })?
                    .path();
                if path.is_file() {
                    dir_files.push(path);
                }
            }
            dir_files.sort();
            files.extend(dir_files);
        }

        Ok(files)
    }
}

impl CertificateLoader for PemCertificateLoader {
    fn load(&self, keystore: &Path, password: &str) -> Result<(), CertificateError> {
        let files = self.certificate_files()?;
        if files.is_empty() {
            return Ok(());
        }

        let keystore_error = |source| CertificateError::Keystore {
            path: keystore.to_path_buf(),
            source,
        };
        let bytes = fs::read(keystore).map_err(|source| CertificateError::Io {
            path: keystore.to_path_buf(),
            source,
        })?;
        let mut store = JksKeystore::parse(&bytes, password).map_err(keystore_error)?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |duration| duration.as_millis() as u64);

        let mut added = 0;
        for file in &files {
            let content = fs::read(file).map_err(|source| CertificateError::Io {
                path: file.clone(),
                source,
            })?;
            let certificates = pem_certificates(&content)
                .ok_or_else(|| CertificateError::Pem(file.clone()))?;
            if certificates.is_empty() {
                continue;
            }

            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            for (index, der) in certificates.iter().enumerate() {
                if store.add_trusted_certificate(&format!("{name}-{index}"), timestamp, der) {
                    added += 1;
                }
            }
        }

        if added > 0 {
            println!(
                "---> Adding {added} container CA certificates to JVM truststore {}",
                keystore.display()
            );
            fs::write(keystore, store.to_bytes(password)).map_err(|source| {
                CertificateError::Io {
                    path: keystore.to_path_buf(),
                    source,
                }
            })?;
        }

        Ok(())
    }

    fn metadata(&self) -> Result<BTreeMap<String, String>, CertificateError> {
        let files = self.certificate_files()?;
        if files.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut hasher = Sha256::new();
        for file in &files {
            let content = fs::read(file).map_err(|source| CertificateError::Io {
                path: file.clone(),
                source,
            })?;
            hasher.update(file.to_string_lossy().as_bytes());
            hasher.update(&content);
        }

        Ok(BTreeMap::from([(
            "certificates".to_string(),
            format!("{:x}", hasher.finalize()),
        )]))
    }
}

/// Every `CERTIFICATE` block in `content`. Anything outside those blocks, DER
/// files included, is ignored. `None` when a block is malformed.
fn pem_certificates(content: &[u8]) -> Option<Vec<CertificateDer<'static>>> {
    CertificateDer::pem_slice_iter(content)
        .collect::<Result<Vec<_>, _>>()
        .ok()
}
