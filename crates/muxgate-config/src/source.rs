// ABOUTME: The configuration source capability consumed by the reload coordinator.
// ABOUTME: One implementation per on-disk format; the engine never sees the format.

use crate::error::Result;
use muxgate_core::{Host, Identity};
use ssh_key::PrivateKey;

/// A full candidate set of registries, produced by one load.
#[derive(Debug)]
pub struct RegistrySet {
    pub identities: Vec<Identity>,
    pub hosts: Vec<Host>,
}

/// Yields complete identity and host registries on demand.
///
/// A load either produces the whole set or fails; partial results never
/// escape a source. Sources that also carry the host signing key can supply
/// it for hot reload; the rest inherit the `None` default.
pub trait ConfigSource: Send + Sync {
    /// Human-readable label for reload logs.
    fn describe(&self) -> String;

    /// Parse a full candidate registry set.
    fn load(&self) -> Result<RegistrySet>;

    /// Host signing key, for sources that hot-reload it.
    fn load_host_key(&self) -> Result<Option<PrivateKey>> {
        Ok(None)
    }
}
