// ABOUTME: Registry data model - identities and backend hosts.
// ABOUTME: Rebuilt wholly per reload, immutable once inside a snapshot.

use ssh_key::PublicKey;

/// A known user: a name bound to a public key and an authorization scope.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Display and authorization name, matched against host access lists.
    /// Not guaranteed unique across input sources.
    pub name: String,
    /// Credential this identity authenticates with.
    pub public_key: PublicKey,
    /// Precomputed allowed host addresses, for sources that resolve the
    /// relation at load time. `None` means the relation is derived from
    /// host access lists at routing time instead; both representations
    /// produce the same routes for equivalent input.
    pub allowed_hosts: Option<Vec<String>>,
}

/// A backend host reachable through the gateway.
#[derive(Debug, Clone)]
pub struct Host {
    /// Network endpoint (host:port), opaque to the engine.
    pub address: String,
    /// Identity names permitted to route here. May name identities that do
    /// not exist; such entries are unreachable until one appears.
    pub users: Vec<String>,
    /// Default host: appended to every session's candidate list, including
    /// anonymous sessions.
    pub no_auth: bool,
}
