// ABOUTME: The two decision operations - authenticate and route.
// ABOUTME: Pure functions over an explicit snapshot, unit-testable in isolation.

use crate::error::CoreError;
use crate::matcher::keys_match;
use crate::model::Identity;
use crate::snapshot::Snapshot;
use ssh_key::PublicKey;
use std::sync::Arc;

/// Result of resolving a presented public key against a snapshot.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// The key matched a registered identity.
    User(Arc<Identity>),
    /// No match, but default hosts exist; the session proceeds unbound.
    Anonymous,
}

impl AuthOutcome {
    /// Identity name for logging, or a placeholder for anonymous sessions.
    pub fn display_name(&self) -> &str {
        match self {
            AuthOutcome::User(identity) => &identity.name,
            AuthOutcome::Anonymous => "unknown user",
        }
    }

    /// The bound identity, if any.
    pub fn identity(&self) -> Option<&Arc<Identity>> {
        match self {
            AuthOutcome::User(identity) => Some(identity),
            AuthOutcome::Anonymous => None,
        }
    }
}

/// Resolve a presented public key against the snapshot's identities.
///
/// Scans in registry order and the first matching identity wins, which
/// keeps the outcome deterministic even when a configuration carries the
/// same key twice. With no match the outcome depends on whether default
/// hosts exist: anonymous access if so, rejection otherwise.
///
/// # Errors
/// `CoreError::AccessDenied` when nothing matched and no default hosts
/// exist.
pub fn authenticate(snapshot: &Snapshot, presented: &PublicKey) -> Result<AuthOutcome, CoreError> {
    for identity in snapshot.identities() {
        if keys_match(&identity.public_key, presented) {
            return Ok(AuthOutcome::User(Arc::clone(identity)));
        }
    }

    if snapshot.has_defaults() {
        return Ok(AuthOutcome::Anonymous);
    }

    Err(CoreError::AccessDenied)
}

/// Compute the ordered candidate addresses for an authentication outcome.
///
/// Explicitly-permitted hosts come first, in host registry order (or in the
/// identity's precomputed order when the source resolved the relation at
/// load time), followed by default hosts not already present. Addresses are
/// deduplicated and the first appearance keeps its position. An anonymous
/// outcome gets only the default hosts. An empty result means
/// "authenticated but nothing to route to" and is not an error.
pub fn route(snapshot: &Snapshot, outcome: &AuthOutcome) -> Vec<String> {
    let mut remotes: Vec<String> = Vec::new();

    if let AuthOutcome::User(identity) = outcome {
        match &identity.allowed_hosts {
            Some(allowed) => {
                for address in allowed {
                    push_unique(&mut remotes, address);
                }
            }
            None => {
                for host in snapshot.hosts() {
                    if host.users.iter().any(|u| u == &identity.name) {
                        push_unique(&mut remotes, &host.address);
                    }
                }
            }
        }
    }

    for host in snapshot.hosts() {
        if host.no_auth {
            push_unique(&mut remotes, &host.address);
        }
    }

    remotes
}

fn push_unique(remotes: &mut Vec<String>, address: &str) {
    if !remotes.iter().any(|r| r == address) {
        remotes.push(address.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Host;
    use ssh_key::{Algorithm, PrivateKey};

    fn generate_key() -> PublicKey {
        PrivateKey::random(&mut rand::thread_rng(), Algorithm::Ed25519)
            .expect("should generate ed25519 key")
            .public_key()
            .clone()
    }

    fn identity(name: &str, key: &PublicKey) -> Identity {
        Identity {
            name: name.to_string(),
            public_key: key.clone(),
            allowed_hosts: None,
        }
    }

    fn host(address: &str, users: &[&str], no_auth: bool) -> Host {
        Host {
            address: address.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            no_auth,
        }
    }

    #[test]
    fn test_matching_key_resolves_identity() {
        let key = generate_key();
        let snapshot = Snapshot::new(vec![identity("alice", &key)], vec![]);

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        assert_eq!(outcome.display_name(), "alice");
    }

    #[test]
    fn test_unknown_key_without_defaults_is_denied() {
        let snapshot = Snapshot::new(
            vec![identity("alice", &generate_key())],
            vec![host("a:22", &["alice"], false)],
        );

        let result = authenticate(&snapshot, &generate_key());
        assert!(matches!(result, Err(CoreError::AccessDenied)));
    }

    #[test]
    fn test_unknown_key_with_defaults_is_anonymous() {
        let snapshot = Snapshot::new(
            vec![identity("alice", &generate_key())],
            vec![host("pub:22", &[], true)],
        );

        let outcome = authenticate(&snapshot, &generate_key()).expect("should allow anonymous");
        assert!(matches!(outcome, AuthOutcome::Anonymous));
        assert!(outcome.identity().is_none());
    }

    #[test]
    fn test_first_match_wins_on_duplicate_keys() {
        // Duplicate keys are a configuration hazard; the engine stays
        // deterministic by taking the first entry in registry order.
        let key = generate_key();
        let snapshot = Snapshot::new(
            vec![identity("first", &key), identity("second", &key)],
            vec![],
        );

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        assert_eq!(outcome.display_name(), "first");
    }

    #[test]
    fn test_route_allowed_then_default() {
        // Scenario A: explicit host first, then the default host.
        let key = generate_key();
        let snapshot = Snapshot::new(
            vec![identity("alice", &key)],
            vec![host("a:22", &["alice"], false), host("pub:22", &[], true)],
        );

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        assert_eq!(route(&snapshot, &outcome), vec!["a:22", "pub:22"]);
    }

    #[test]
    fn test_route_anonymous_gets_only_defaults() {
        // Scenario B: unknown key routes to the default host alone.
        let snapshot = Snapshot::new(
            vec![identity("alice", &generate_key())],
            vec![host("a:22", &["alice"], false), host("pub:22", &[], true)],
        );

        let outcome = authenticate(&snapshot, &generate_key()).expect("should allow anonymous");
        assert_eq!(route(&snapshot, &outcome), vec!["pub:22"]);
    }

    #[test]
    fn test_route_default_host_also_allowed_appears_once() {
        let key = generate_key();
        let snapshot = Snapshot::new(
            vec![identity("alice", &key)],
            vec![host("both:22", &["alice"], true), host("a:22", &["alice"], false)],
        );

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        // First appearance (as an allowed host) keeps its position.
        assert_eq!(route(&snapshot, &outcome), vec!["both:22", "a:22"]);
    }

    #[test]
    fn test_route_empty_for_identity_with_no_hosts() {
        let key = generate_key();
        let snapshot = Snapshot::new(
            vec![identity("alice", &key)],
            vec![host("b:22", &["bob"], false)],
        );

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        assert!(route(&snapshot, &outcome).is_empty());
    }

    #[test]
    fn test_route_precomputed_matches_derived() {
        // The two identity representations must produce the same routes
        // for equivalent input.
        let key = generate_key();
        let hosts = vec![
            host("a:22", &["alice"], false),
            host("b:22", &["bob"], false),
            host("pub:22", &[], true),
        ];

        let derived = Snapshot::new(vec![identity("alice", &key)], hosts.clone());
        let precomputed = Snapshot::new(
            vec![Identity {
                name: "alice".to_string(),
                public_key: key.clone(),
                allowed_hosts: Some(vec!["a:22".to_string()]),
            }],
            hosts,
        );

        let from_derived = authenticate(&derived, &key).expect("should authenticate");
        let from_precomputed = authenticate(&precomputed, &key).expect("should authenticate");

        assert_eq!(
            route(&derived, &from_derived),
            route(&precomputed, &from_precomputed)
        );
    }

    #[test]
    fn test_route_preserves_host_registry_order() {
        let key = generate_key();
        let snapshot = Snapshot::new(
            vec![identity("alice", &key)],
            vec![
                host("one:22", &["alice"], false),
                host("two:22", &["alice"], false),
                host("three:22", &["alice"], false),
            ],
        );

        let outcome = authenticate(&snapshot, &key).expect("should authenticate");
        assert_eq!(route(&snapshot, &outcome), vec!["one:22", "two:22", "three:22"]);
    }
}
