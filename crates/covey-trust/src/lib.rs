//! # covey-trust
//!
//! Trust layer for the covey cluster daemon: validating the admin trust
//! password, and resolving/persisting the TLS identity material the daemon
//! presents to peers and clients.
//!
//! Two independent pieces live here:
//!
//! - [`password`] -- stateless verification of a caller-supplied password
//!   against a hex-encoded salted scrypt secret, plus the enrollment
//!   encoder that produces such secrets.
//! - [`identity`] -- decides which certificate role (`server` vs `cluster`)
//!   is authoritative for a storage directory, delegates load-or-generate
//!   to a [`identity::CertProvider`], and writes material back to disk with
//!   exact permission modes.
//!
//! Nothing flows between the two; they share only the storage-directory
//! concept. All operations are synchronous and meant for the daemon's
//! startup/authentication path. Password verification is safe to call
//! concurrently; certificate bootstrap against a single directory is not
//! internally locked and must be serialized by the caller.

pub mod error;
pub mod identity;
pub mod password;

pub use error::{Result, TrustError};
pub use identity::{
    load_cert, load_cluster_cert, load_server_cert, resolve_role, write_cert, CertBundle,
    CertProvider, CertRole, CertUsage,
};
pub use password::{hash_password, verify_password};
