// ABOUTME: Public key comparison for authentication.
// ABOUTME: Exact algorithm and key byte equality, never cryptographic verification.

use ssh_key::PublicKey;

/// Compare two public keys for identity.
///
/// Two keys match iff their algorithm and encoded key material are
/// identical; comments and other envelope data never participate.
/// Possession of the corresponding private key is proven upstream by the
/// SSH handshake itself, so this is a lookup, not a verification.
/// Constant-time comparison is not needed here: public keys are public.
pub fn keys_match(a: &PublicKey, b: &PublicKey) -> bool {
    a.key_data() == b.key_data()
}
