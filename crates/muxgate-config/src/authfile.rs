// ABOUTME: Authorized-keys style configuration source.
// ABOUTME: Key comments name identities; a host-map file supplies the access lists.

use crate::error::{Result, SourceError};
use crate::hostmap;
use crate::source::{ConfigSource, RegistrySet};
use muxgate_core::{Host, Identity};
use ssh_key::AuthorizedKeys;
use std::path::{Path, PathBuf};

/// Configuration from an authorized_keys file plus a host-map file.
///
/// Each key's comment becomes the identity name; per-entry options are
/// tolerated but carry no meaning here. The identity's allowed hosts are
/// precomputed by scanning the host map for access lists containing the
/// name, in host-map order, so routing never has to re-derive the relation.
pub struct AuthorizedKeysSource {
    keys_path: PathBuf,
    hosts_path: PathBuf,
}

impl AuthorizedKeysSource {
    pub fn new(keys_path: impl Into<PathBuf>, hosts_path: impl Into<PathBuf>) -> Self {
        Self {
            keys_path: keys_path.into(),
            hosts_path: hosts_path.into(),
        }
    }
}

impl ConfigSource for AuthorizedKeysSource {
    fn describe(&self) -> String {
        format!(
            "{} + {}",
            self.keys_path.display(),
            self.hosts_path.display()
        )
    }

    fn load(&self) -> Result<RegistrySet> {
        let hosts = hostmap::load_hosts(&self.hosts_path)?;
        let identities = load_identities(&self.keys_path, &hosts)?;
        Ok(RegistrySet { identities, hosts })
    }
}

fn load_identities(path: &Path, hosts: &[Host]) -> Result<Vec<Identity>> {
    let entries = AuthorizedKeys::read_file(path).map_err(|e| SourceError::AuthorizedKeys {
        path: path.to_path_buf(),
        source: e,
    })?;

    let identities = entries
        .into_iter()
        .map(|entry| {
            let public_key = entry.public_key().clone();
            let name = public_key.comment().to_string();
            let allowed_hosts = hosts
                .iter()
                .filter(|h| h.users.iter().any(|u| u == &name))
                .map(|h| h.address.clone())
                .collect();
            Identity {
                name,
                public_key,
                allowed_hosts: Some(allowed_hosts),
            }
        })
        .collect();

    Ok(identities)
}
