//! Error types for the covey trust layer.

use thiserror::Error;

use crate::identity::CertRole;

/// Result type alias for trust operations.
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors that can occur in trust operations.
#[derive(Error, Debug)]
pub enum TrustError {
    /// No trust password is configured. A configuration state, not a
    /// decode failure: authentication is disabled rather than broken.
    #[error("no password is set")]
    NoPasswordSet,

    /// The stored secret could not be decoded into salt + derived key.
    #[error("malformed password secret: {0}")]
    MalformedSecret(String),

    /// The KDF rejected its parameters or output length.
    #[error("key derivation failed: {0}")]
    Kdf(String),

    /// The provided password does not match the stored secret. Expected
    /// user-facing failure; not logged as an error.
    #[error("bad password provided")]
    BadPassword,

    /// The certificate provider failed to load or generate material.
    #[error("failed to load {role} TLS certificate: {source}")]
    CertificateLoad {
        /// Which identity role was being loaded.
        role: CertRole,
        /// Underlying provider error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Writing certificate material to disk failed.
    #[error("io error on {path}: {source}")]
    Io {
        /// File the failed operation touched.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
