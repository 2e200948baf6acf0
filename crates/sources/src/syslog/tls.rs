//! Server-side TLS configuration
//!
//! Stream receivers ask a [`TlsProvider`] once at startup. `Ok(None)` means
//! plain-text connections.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::RootCertStore;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{ServerConfig, VerifierBuilderError, WebPkiClientVerifier};

/// TLS configuration errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    /// PEM file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// PEM file holds no certificate
    #[error("no certificates found in {path}")]
    NoCertificates { path: String },

    /// PEM file holds no private key
    #[error("no private key found in {path}")]
    NoPrivateKey { path: String },

    /// Certificate given without key or the reverse
    #[error("tls_cert and tls_key must be set together")]
    Incomplete,

    /// Client verifier could not be built from the CA list
    #[error("invalid client CA list: {0}")]
    Verifier(#[from] VerifierBuilderError),

    /// rustls rejected the material
    #[error("TLS configuration rejected: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Source of the server TLS configuration
pub trait TlsProvider: Send + Sync + 'static {
    /// `Ok(None)` disables TLS
    fn server_config(&self) -> Result<Option<Arc<ServerConfig>>, TlsError>;
}

/// Plain-text connections only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTls;

impl TlsProvider for NoTls {
    fn server_config(&self) -> Result<Option<Arc<ServerConfig>>, TlsError> {
        Ok(None)
    }
}

/// A ready-made configuration
impl TlsProvider for Arc<ServerConfig> {
    fn server_config(&self) -> Result<Option<Arc<ServerConfig>>, TlsError> {
        Ok(Some(Arc::clone(self)))
    }
}

/// Loads certificate, key and client CAs from PEM files
#[derive(Debug, Clone, Default)]
pub struct PemTlsProvider {
    cert: Option<PathBuf>,
    key: Option<PathBuf>,
    client_cas: Vec<PathBuf>,
}

impl PemTlsProvider {
    /// Create a provider; all paths unset yields no TLS
    pub fn new(cert: Option<PathBuf>, key: Option<PathBuf>, client_cas: Vec<PathBuf>) -> Self {
        Self {
            cert,
            key,
            client_cas,
        }
    }
}

impl TlsProvider for PemTlsProvider {
    fn server_config(&self) -> Result<Option<Arc<ServerConfig>>, TlsError> {
        let (cert_path, key_path) = match (&self.cert, &self.key) {
            (None, None) => return Ok(None),
            (Some(cert), Some(key)) => (cert, key),
            _ => return Err(TlsError::Incomplete),
        };

        let certs = load_certs(cert_path)?;
        let key = load_key(key_path)?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?;

        let builder = if self.client_cas.is_empty() {
            builder.with_no_client_auth()
        } else {
            builder.with_client_cert_verifier(client_verifier(&self.client_cas, provider)?)
        };

        let config = builder.with_single_cert(certs, key)?;
        tracing::debug!(
            cert = %cert_path.display(),
            client_cas = self.client_cas.len(),
            "TLS enabled"
        );
        Ok(Some(Arc::new(config)))
    }
}

/// Mandatory client authentication against the given roots
fn client_verifier(
    paths: &[PathBuf],
    provider: Arc<CryptoProvider>,
) -> Result<Arc<dyn rustls::server::danger::ClientCertVerifier>, TlsError> {
    let mut roots = RootCertStore::empty();
    for path in paths {
        for cert in load_certs(path)? {
            roots.add(cert)?;
        }
    }
    Ok(WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider).build()?)
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path).map(BufReader::new).map_err(|source| TlsError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let certs = rustls_pemfile::certs(&mut open(path)?)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates {
            path: path.display().to_string(),
        });
    }
    Ok(certs)
}

fn load_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    rustls_pemfile::private_key(&mut open(path)?)
        .map_err(|source| TlsError::Io {
            path: path.display().to_string(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey {
            path: path.display().to_string(),
        })
}
