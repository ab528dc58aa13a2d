//! TLS identity material: role resolution, loading, and persistence.
//!
//! A storage directory holds up to two identity file triples,
//! `server.{crt,key,ca}` and `cluster.{crt,key,ca}`. A cluster certificate,
//! when present, is authoritative; otherwise the server identity wins. Key
//! generation and X.509 construction live behind [`CertProvider`] -- this
//! module only decides which role wins, wraps provider failures with role
//! context, and writes material back to disk with exact permission modes.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::{Result, TrustError};

/// Certificate file suffix (public material).
const CRT_SUFFIX: &str = ".crt";

/// Private key file suffix (secret material).
const KEY_SUFFIX: &str = ".key";

/// CA file suffix (public material).
const CA_SUFFIX: &str = ".ca";

/// File whose existence marks a directory as holding a cluster identity.
const CLUSTER_CERT_FILE: &str = "cluster.crt";

/// Mode for certificate and CA files: world-readable, owner-write.
const CERT_FILE_MODE: u32 = 0o644;

/// Mode for private key files: owner read/write only.
const KEY_FILE_MODE: u32 = 0o600;

/// Which identity a certificate file triple represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertRole {
    /// Standalone daemon identity.
    Server,
    /// Cluster member identity, shared across the cluster.
    Cluster,
}

impl CertRole {
    /// File-name prefix for this role's triple.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Cluster => "cluster",
        }
    }
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// How the certificate will be used in TLS handshakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertUsage {
    /// Daemon-side listener certificate. The daemon always loads with this.
    Server,
    /// Client authentication certificate.
    Client,
}

/// One identity's material. Ownership passes to the caller (the daemon's
/// networking layer) once loaded.
#[derive(Debug, Clone)]
pub struct CertBundle {
    /// PEM certificate bytes.
    pub cert: Vec<u8>,
    /// PEM private key bytes.
    pub key: Vec<u8>,
    /// PEM CA bytes, if the identity carries one.
    pub ca: Option<Vec<u8>>,
    /// Which role this material represents.
    pub role: CertRole,
}

/// Source of certificate material.
///
/// Implementations read existing PEM files from `dir` or, when
/// `generate_if_missing` is set, create fresh material. The trust layer
/// never manipulates cryptographic key material itself, so resolution and
/// error wrapping stay testable with a fake provider.
pub trait CertProvider {
    /// Load or generate the key pair (and optional CA) for
    /// `<dir>/<prefix>.*`.
    fn key_pair_and_ca(
        &self,
        dir: &Path,
        prefix: &str,
        usage: CertUsage,
        generate_if_missing: bool,
    ) -> std::result::Result<CertBundle, Box<dyn std::error::Error + Send + Sync>>;
}

/// Resolve which role is authoritative for `dir`.
///
/// The entire decision is one existence check of `cluster.crt`: present
/// means cluster wins, even when `server.*` files also exist. The check is
/// injected so the branch is testable without a real filesystem.
pub fn resolve_role<F>(dir: &Path, exists: F) -> CertRole
where
    F: Fn(&Path) -> bool,
{
    if exists(&dir.join(CLUSTER_CERT_FILE)) {
        CertRole::Cluster
    } else {
        CertRole::Server
    }
}

/// Load the daemon identity from `dir`, generating it when absent.
///
/// A cluster certificate is loaded instead of the server one when present.
/// Stale `server.*` files alongside a cluster identity are left alone.
pub fn load_cert<P: CertProvider>(dir: &Path, provider: &P) -> Result<CertBundle> {
    let role = resolve_role(dir, Path::exists);
    debug!(dir = %dir.display(), %role, "resolved authoritative certificate role");
    load_role(dir, role, provider)
}

/// Load the cluster identity from `dir`, generating it when absent,
/// regardless of what else the directory contains.
pub fn load_cluster_cert<P: CertProvider>(dir: &Path, provider: &P) -> Result<CertBundle> {
    load_role(dir, CertRole::Cluster, provider)
}

/// Load the server identity from `dir`, generating it when absent,
/// regardless of what else the directory contains.
pub fn load_server_cert<P: CertProvider>(dir: &Path, provider: &P) -> Result<CertBundle> {
    load_role(dir, CertRole::Server, provider)
}

fn load_role<P: CertProvider>(dir: &Path, role: CertRole, provider: &P) -> Result<CertBundle> {
    let mut bundle = provider
        .key_pair_and_ca(dir, role.prefix(), CertUsage::Server, true)
        .map_err(|source| TrustError::CertificateLoad { role, source })?;
    // The resolved role is authoritative, whatever the provider tagged.
    bundle.role = role;
    info!(dir = %dir.display(), %role, "loaded TLS identity material");
    Ok(bundle)
}

/// Persist identity material to `<dir>/<prefix>.{crt,key,ca}`.
///
/// Writes cert, then key, then CA (only when `ca` is present). The first
/// failure is returned immediately with the offending path; files already
/// written stay on disk, so callers must treat a partial write as a fatal
/// setup error and retry the whole sequence. The key file ends up
/// owner-read/write only; cert and CA are world-readable.
pub fn write_cert(
    dir: &Path,
    prefix: &str,
    cert: &[u8],
    key: &[u8],
    ca: Option<&[u8]>,
) -> Result<()> {
    write_material(&dir.join(format!("{prefix}{CRT_SUFFIX}")), cert, CERT_FILE_MODE)?;
    write_material(&dir.join(format!("{prefix}{KEY_SUFFIX}")), key, KEY_FILE_MODE)?;

    if let Some(ca) = ca {
        write_material(&dir.join(format!("{prefix}{CA_SUFFIX}")), ca, CERT_FILE_MODE)?;
    }

    Ok(())
}

/// Write one file and clamp its permissions. No fsync beyond the write.
fn write_material(path: &Path, data: &[u8], mode: u32) -> Result<()> {
    let io_err = |source| TrustError::Io {
        path: path.display().to_string(),
        source,
    };

    std::fs::write(path, data).map_err(io_err)?;

    #[cfg(unix)]
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(io_err)?;
    #[cfg(not(unix))]
    let _ = mode;

    debug!(path = %path.display(), "wrote certificate material");
    Ok(())
}
