//! Switchboard Registry - dynamic dispatch bookkeeping for upgradeable routers
//!
//! This crate maintains the mapping from 4-byte function selectors to named,
//! independently upgradeable implementation units ("extensions"), so a
//! front-facing router can forward each incoming call to the right backend
//! without being redeployed itself. The call-forwarding mechanism, durable
//! storage, and authorization policy all live with the host; this crate owns
//! the data structure and its mutation protocol.
//!
//! # Features
//!
//! - **Collision-free dispatch**: selector and name uniqueness enforced on
//!   every mutation, selector/signature consistency checked at registration
//! - **Atomic mutations**: each operation fully validates before touching
//!   state, so a failed call leaves the registry unchanged
//! - **Pluggable authorization**: one overridable gate per mutating
//!   operation, allow-all by default
//! - **Event surface**: one notification per mutation, carrying the full
//!   records involved
//! - **Snapshots**: versioned, deterministic state serialization with
//!   in-memory and file-backed stores
//!
//! # Example
//!
//! ```rust
//! use switchboard_registry::ExtensionRegistry;
//! use switchboard_types::{Extension, ExtensionFunction, ExtensionMetadata, ImplementationHandle, Selector};
//!
//! # fn main() -> Result<(), switchboard_registry::RegistryError> {
//! let mut registry = ExtensionRegistry::new();
//! registry.add_extension(
//!     Extension::new(ExtensionMetadata::new("core", ImplementationHandle::new(0xa1)))
//!         .with_function(ExtensionFunction::from_signature("ping()")),
//! )?;
//!
//! let metadata = registry
//!     .metadata_for_selector(Selector::derive("ping()"))
//!     .expect("ping() routes to core");
//! assert_eq!(metadata.name, "core");
//! # Ok(())
//! # }
//! ```

pub mod authorization;
pub mod error;
pub mod events;
pub mod registry;
pub mod snapshot;

pub use authorization::{AllowAll, AuthorizationPolicy, Decision};
pub use error::{RegistryError, Result};
pub use events::{EventSink, RegistryEvent};
pub use registry::{ExtensionRegistry, IntegrityIssue, RegistryStats};
pub use snapshot::{
    FileSnapshotStore, MemorySnapshotStore, REGISTRY_REGION, RegistrySnapshot,
    SNAPSHOT_FORMAT_VERSION, SnapshotStore,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
