//! TLS configuration and certificate loading.

use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("certificate file not found: {0:?}")]
    MissingCertificate(PathBuf),

    #[error("private key file not found: {0:?}")]
    MissingKey(PathBuf),

    #[error("cannot load TLS material: {0}")]
    Load(#[from] std::io::Error),
}

/// Load TLS configuration from PEM certificate and key files.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    check_exists(&config.cert_path, TlsError::MissingCertificate)?;
    check_exists(&config.key_path, TlsError::MissingKey)?;

    let rustls = RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await?;
    tracing::info!(cert = ?config.cert_path, "TLS certificate loaded");
    Ok(rustls)
}

fn check_exists(path: &Path, missing: fn(PathBuf) -> TlsError) -> Result<(), TlsError> {
    if path.exists() {
        Ok(())
    } else {
        Err(missing(path.to_path_buf()))
    }
}
