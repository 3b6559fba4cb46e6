// ABOUTME: Core library for muxgate - key matching, registries, routing decisions
// ABOUTME: Shared between muxgated and the configuration crate

pub mod engine;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod model;
pub mod snapshot;

pub use engine::{authenticate, route, AuthOutcome};
pub use error::CoreError;
pub use gateway::{ConnMeta, Gateway, Session};
pub use matcher::keys_match;
pub use model::{Host, Identity};
pub use snapshot::{SigningKeyHandle, Snapshot, SnapshotHandle};
