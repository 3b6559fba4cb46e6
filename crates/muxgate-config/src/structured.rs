// ABOUTME: Structured TOML configuration source.
// ABOUTME: Explicit user records with base64 wire-format keys, plus host records.

use crate::error::{Result, SourceError};
use crate::source::{ConfigSource, RegistrySet};
use base64::Engine;
use muxgate_core::{Host, Identity};
use serde::Deserialize;
use ssh_key::{PrivateKey, PublicKey};
use std::path::PathBuf;

/// Default listen address when the config does not name one.
pub const DEFAULT_ADDRESS: &str = ":22";
/// Default host key path when the config does not name one.
pub const DEFAULT_HOSTKEY: &str = "hostkey";

/// On-disk shape of the structured configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    address: Option<String>,
    hostkey: Option<PathBuf>,
    users: Vec<UserRecord>,
    hosts: Vec<HostRecord>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    name: String,
    /// Base64 of the SSH wire-format public key.
    #[serde(alias = "publicKey")]
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct HostRecord {
    address: String,
    #[serde(default)]
    users: Vec<String>,
    #[serde(default, alias = "noAuth")]
    no_auth: bool,
}

/// Startup settings carried by the structured config alongside the
/// registries: the listen address handed to the SSH collaborator and the
/// host signing key path.
#[derive(Debug, Clone)]
pub struct Settings {
    pub address: String,
    pub hostkey: PathBuf,
}

/// Configuration from a single structured TOML file.
///
/// Identities carry no allow-lists of their own; authorization is derived
/// from the host records' access lists at routing time.
pub struct StructuredSource {
    path: PathBuf,
}

impl StructuredSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default config file path (~/.config/muxgate/config.toml).
    ///
    /// Uses `XDG_CONFIG_HOME` if set, otherwise falls back to `~/.config`.
    pub fn default_path() -> PathBuf {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("muxgate")
            .join("config.toml")
    }

    fn read(&self) -> Result<ConfigFile> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| SourceError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SourceError::ParseConfig {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Listen address and host key path, resolved against defaults.
    pub fn settings(&self) -> Result<Settings> {
        let file = self.read()?;
        Ok(Settings {
            address: file.address.unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            hostkey: file.hostkey.unwrap_or_else(|| PathBuf::from(DEFAULT_HOSTKEY)),
        })
    }
}

impl ConfigSource for StructuredSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<RegistrySet> {
        let file = self.read()?;

        let identities = file
            .users
            .into_iter()
            .map(|record| {
                let encoded = base64::engine::general_purpose::STANDARD
                    .decode(&record.public_key)
                    .map_err(|e| SourceError::DecodeKey {
                        name: record.name.clone(),
                        source: e,
                    })?;
                let public_key =
                    PublicKey::from_bytes(&encoded).map_err(|e| SourceError::ParseKey {
                        name: record.name.clone(),
                        source: e,
                    })?;
                Ok(Identity {
                    name: record.name,
                    public_key,
                    allowed_hosts: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let hosts = file
            .hosts
            .into_iter()
            .map(|record| Host {
                address: record.address,
                users: record.users,
                no_auth: record.no_auth,
            })
            .collect();

        Ok(RegistrySet { identities, hosts })
    }

    fn load_host_key(&self) -> Result<Option<PrivateKey>> {
        let settings = self.settings()?;
        let key =
            PrivateKey::read_openssh_file(&settings.hostkey).map_err(|e| SourceError::HostKey {
                path: settings.hostkey.clone(),
                source: e,
            })?;
        Ok(Some(key))
    }
}
