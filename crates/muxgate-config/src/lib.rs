// ABOUTME: Configuration sources and reload coordination for muxgate
// ABOUTME: Structured TOML, authorized-keys, and host-map formats behind one trait

pub mod authfile;
pub mod error;
pub mod hostmap;
pub mod reload;
pub mod source;
pub mod structured;

pub use authfile::AuthorizedKeysSource;
pub use error::SourceError;
pub use reload::ReloadCoordinator;
pub use source::{ConfigSource, RegistrySet};
pub use structured::{Settings, StructuredSource};
