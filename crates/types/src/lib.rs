//! Shared data model for the switchboard dispatch registry.
//!
//! This crate defines the types that flow between the registry and its
//! consumers: the [`Selector`] routing key, the opaque
//! [`ImplementationHandle`] a router forwards calls to, and the
//! [`Extension`] record that binds a namespace to a set of routable
//! functions. It carries no registry logic of its own.

pub mod extension;
pub mod selector;

pub use extension::{Extension, ExtensionFunction, ExtensionMetadata, ImplementationHandle};
pub use selector::{ParseSelectorError, RECEIVE_SIGNATURE, SELECTOR_WIDTH, Selector};
