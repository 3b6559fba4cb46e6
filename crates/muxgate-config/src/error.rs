// ABOUTME: Error types for configuration sources using thiserror.
// ABOUTME: Every variant names the file or user it failed on for diagnosis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a configuration source.
///
/// During a reload any of these aborts the whole attempt and leaves the
/// previously-published registries in force; at startup they are fatal.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Failed to read a configuration file from disk.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a structured configuration file.
    #[error("failed to parse {path}: {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A user record's key payload was not valid base64.
    #[error("could not decode key for {name}: {source}")]
    DecodeKey {
        name: String,
        #[source]
        source: base64::DecodeError,
    },

    /// A user record's key bytes did not parse as a supported public key.
    #[error("invalid public key for {name}: {source}")]
    ParseKey {
        name: String,
        #[source]
        source: ssh_key::Error,
    },

    /// An authorized_keys file could not be read or contained a bad entry.
    #[error("invalid authorized_keys entry in {path}: {source}")]
    AuthorizedKeys {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },

    /// A host-map line had the wrong number of fields.
    #[error("{path}:{line}: incomplete host entry")]
    IncompleteHostEntry { path: PathBuf, line: usize },

    /// The host signing key could not be read or parsed.
    #[error("failed to load host key from {path}: {source}")]
    HostKey {
        path: PathBuf,
        #[source]
        source: ssh_key::Error,
    },
}

/// Result type alias using SourceError.
pub type Result<T> = std::result::Result<T, SourceError>;
