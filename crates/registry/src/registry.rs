use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use switchboard_types::{Extension, ExtensionFunction, ExtensionMetadata, Selector};

use crate::authorization::{AllowAll, AuthorizationPolicy};
use crate::error::{RegistryError, Result};
use crate::events::{EventSink, RegistryEvent};

/// Aggregate counts over the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryStats {
    pub extensions: usize,
    pub functions: usize,
}

/// Inconsistency reported by [`ExtensionRegistry::verify_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityIssue {
    /// An extension lists a function that has no dispatch index entry.
    MissingDispatchEntry {
        extension: String,
        selector: Selector,
    },
    /// A dispatch entry points at an extension that does not exist or does
    /// not list the selector.
    OrphanedDispatchEntry { selector: Selector, owner: String },
    /// A dispatch entry's metadata diverges from its extension's record.
    StaleDispatchMetadata {
        selector: Selector,
        extension: String,
    },
    /// A stored function's selector does not match its signature.
    InconsistentFunction {
        extension: String,
        selector: Selector,
        signature: String,
    },
}

/// The dispatch registry: one owned aggregate holding every extension record
/// and the selector index a router consults on the hot path.
///
/// All mutation goes through the five operations below. Each one consults
/// the injected [`AuthorizationPolicy`], validates every structural
/// precondition, and only then touches state, so a failed call leaves the
/// registry exactly as it was. Reads are pure and never observe a
/// partially-applied mutation; the host is responsible for serializing
/// mutating calls.
pub struct ExtensionRegistry {
    extensions: HashMap<String, Extension>,
    dispatch: HashMap<Selector, ExtensionMetadata>,
    policy: Box<dyn AuthorizationPolicy>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.extensions)
            .field("dispatch", &self.dispatch)
            .field("policy", &"<dyn AuthorizationPolicy>")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtensionRegistry {
    /// Empty registry with the allow-all policy.
    pub fn new() -> Self {
        Self::with_policy(Box::new(AllowAll))
    }

    /// Empty registry gated by a host-supplied policy.
    pub fn with_policy(policy: Box<dyn AuthorizationPolicy>) -> Self {
        Self {
            extensions: HashMap::new(),
            dispatch: HashMap::new(),
            policy,
            sinks: Vec::new(),
        }
    }

    /// Swap in a different authorization policy.
    pub fn set_policy(&mut self, policy: Box<dyn AuthorizationPolicy>) {
        self.policy = policy;
    }

    /// Register an observer for mutation events.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Every registered extension, in implementation-defined order.
    pub fn extensions(&self) -> impl Iterator<Item = &Extension> {
        self.extensions.values()
    }

    /// Look up a single extension by name.
    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.get(name)
    }

    /// Resolve a selector to the metadata of the extension that owns it.
    ///
    /// This is the lookup a router performs for every incoming call.
    pub fn metadata_for_selector(&self, selector: Selector) -> Option<&ExtensionMetadata> {
        self.dispatch.get(&selector)
    }

    /// Whether an extension with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.extensions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Aggregate counts: registered extensions and routable functions.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            extensions: self.extensions.len(),
            functions: self.dispatch.len(),
        }
    }

    /// Register a new extension and index all of its functions.
    ///
    /// Fails if the name is empty or taken, the implementation handle is
    /// null, any function is selector/signature inconsistent, or any
    /// selector is already owned (including twice within this call).
    pub fn add_extension(&mut self, extension: Extension) -> Result<()> {
        self.policy
            .can_add_extension(&extension)
            .map_err(|reason| denied("add_extension", reason))?;

        let name = extension.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::EmptyExtensionName);
        }
        if self.extensions.contains_key(&name) {
            return Err(RegistryError::ExtensionAlreadyExists(name));
        }
        if extension.metadata.implementation.is_null() {
            return Err(RegistryError::NullImplementation(name));
        }
        self.check_functions(&name, &extension.functions, false)?;

        for function in &extension.functions {
            self.dispatch
                .insert(function.selector, extension.metadata.clone());
        }
        info!(
            "registered extension '{}' with {} function(s)",
            name,
            extension.functions.len()
        );
        let event = RegistryEvent::ExtensionAdded {
            extension: extension.clone(),
        };
        self.extensions.insert(name, extension);
        self.emit(event);
        Ok(())
    }

    /// Swap an existing extension's metadata and function set in one step.
    ///
    /// Every selector owned by the previous definition is dropped from the
    /// dispatch index before the new functions are indexed, so a selector not
    /// re-declared by the new definition no longer resolves. A selector the
    /// extension already owns may be re-declared freely; one owned by a
    /// different extension fails the call.
    pub fn replace_extension(&mut self, extension: Extension) -> Result<()> {
        self.policy
            .can_replace_extension(&extension)
            .map_err(|reason| denied("replace_extension", reason))?;

        let name = extension.name().to_string();
        let previous = match self.extensions.get(&name) {
            Some(existing) => existing.clone(),
            None => return Err(RegistryError::ExtensionNotFound(name)),
        };
        if extension.metadata.implementation.is_null() {
            return Err(RegistryError::NullImplementation(name));
        }
        self.check_functions(&name, &extension.functions, true)?;

        for function in &previous.functions {
            self.dispatch.remove(&function.selector);
        }
        for function in &extension.functions {
            self.dispatch
                .insert(function.selector, extension.metadata.clone());
        }
        info!(
            "replaced extension '{}': {} -> {} function(s)",
            name,
            previous.functions.len(),
            extension.functions.len()
        );
        let event = RegistryEvent::ExtensionReplaced {
            previous,
            current: extension.clone(),
        };
        self.extensions.insert(name, extension);
        self.emit(event);
        Ok(())
    }

    /// Unregister an extension, dropping all of its selectors from the
    /// dispatch index. Returns the removed record.
    pub fn remove_extension(&mut self, name: &str) -> Result<Extension> {
        self.policy
            .can_remove_extension(name)
            .map_err(|reason| denied("remove_extension", reason))?;

        let extension = self
            .extensions
            .remove(name)
            .ok_or_else(|| RegistryError::ExtensionNotFound(name.to_string()))?;
        for function in &extension.functions {
            self.dispatch.remove(&function.selector);
        }
        info!(
            "removed extension '{}' and {} function(s)",
            name,
            extension.functions.len()
        );
        self.emit(RegistryEvent::ExtensionRemoved {
            extension: extension.clone(),
        });
        Ok(extension)
    }

    /// Register one more function under an existing extension.
    ///
    /// The dispatch entry mirrors the extension's current metadata, not
    /// anything carried by the caller.
    pub fn add_function(&mut self, name: &str, function: ExtensionFunction) -> Result<()> {
        self.policy
            .can_add_function(name, &function)
            .map_err(|reason| denied("add_function", reason))?;

        if !self.extensions.contains_key(name) {
            return Err(RegistryError::ExtensionNotFound(name.to_string()));
        }
        self.check_functions(name, std::slice::from_ref(&function), false)?;

        let Some(extension) = self.extensions.get_mut(name) else {
            return Err(RegistryError::ExtensionNotFound(name.to_string()));
        };
        let metadata = extension.metadata.clone();
        extension.functions.push(function.clone());
        self.dispatch.insert(function.selector, metadata);
        debug!(
            "added function {} '{}' to extension '{}'",
            function.selector, function.signature, name
        );
        self.emit(RegistryEvent::FunctionAdded {
            extension: name.to_string(),
            function,
        });
        Ok(())
    }

    /// Remove a single function through its owning extension's namespace.
    ///
    /// The selector's recorded owner must be `name`; removal through any
    /// other namespace is rejected. Uses swap-remove, so the relative order
    /// of the remaining functions is not preserved. Returns the removed
    /// function.
    pub fn remove_function(&mut self, name: &str, selector: Selector) -> Result<ExtensionFunction> {
        self.policy
            .can_remove_function(name, selector)
            .map_err(|reason| denied("remove_function", reason))?;

        if !self.extensions.contains_key(name) {
            return Err(RegistryError::ExtensionNotFound(name.to_string()));
        }
        match self.dispatch.get(&selector) {
            None => {
                return Err(RegistryError::FunctionNotFound {
                    extension: name.to_string(),
                    selector,
                });
            }
            Some(owner) if owner.name != name => {
                return Err(RegistryError::RemovalNamespaceMismatch {
                    selector,
                    owner: owner.name.clone(),
                    requested: name.to_string(),
                });
            }
            Some(_) => {}
        }

        let Some(extension) = self.extensions.get_mut(name) else {
            return Err(RegistryError::ExtensionNotFound(name.to_string()));
        };
        let Some(index) = extension
            .functions
            .iter()
            .position(|f| f.selector == selector)
        else {
            return Err(RegistryError::FunctionNotFound {
                extension: name.to_string(),
                selector,
            });
        };
        let function = extension.functions.swap_remove(index);
        self.dispatch.remove(&selector);
        debug!(
            "removed function {} '{}' from extension '{}'",
            selector, function.signature, name
        );
        self.emit(RegistryEvent::FunctionRemoved {
            extension: name.to_string(),
            function: function.clone(),
        });
        Ok(function)
    }

    /// Re-check the global invariants across the whole aggregate.
    ///
    /// A healthy registry returns an empty list; anything else points at a
    /// tampered snapshot or a bug in the mutation path.
    pub fn verify_integrity(&self) -> Vec<IntegrityIssue> {
        let mut issues = Vec::new();

        for extension in self.extensions.values() {
            for function in &extension.functions {
                if !function.is_consistent() {
                    issues.push(IntegrityIssue::InconsistentFunction {
                        extension: extension.name().to_string(),
                        selector: function.selector,
                        signature: function.signature.clone(),
                    });
                }
                match self.dispatch.get(&function.selector) {
                    None => issues.push(IntegrityIssue::MissingDispatchEntry {
                        extension: extension.name().to_string(),
                        selector: function.selector,
                    }),
                    Some(metadata) if *metadata != extension.metadata => {
                        issues.push(IntegrityIssue::StaleDispatchMetadata {
                            selector: function.selector,
                            extension: extension.name().to_string(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for (selector, metadata) in &self.dispatch {
            let listed = self
                .extensions
                .get(&metadata.name)
                .map(|e| e.functions.iter().any(|f| f.selector == *selector))
                .unwrap_or(false);
            if !listed {
                issues.push(IntegrityIssue::OrphanedDispatchEntry {
                    selector: *selector,
                    owner: metadata.name.clone(),
                });
            }
        }

        issues
    }

    /// Shared precondition sweep over a batch of functions:
    /// selector/signature consistency, global selector ownership, and
    /// uniqueness within the batch itself. When `allow_reuse_by_self` is
    /// set, a selector currently owned by `name` passes the ownership check.
    fn check_functions(
        &self,
        name: &str,
        functions: &[ExtensionFunction],
        allow_reuse_by_self: bool,
    ) -> Result<()> {
        let mut batch: HashSet<Selector> = HashSet::new();
        for function in functions {
            check_consistency(function)?;
            if !batch.insert(function.selector) {
                return Err(RegistryError::SelectorOwned {
                    selector: function.selector,
                    owner: name.to_string(),
                });
            }
            if let Some(owner) = self.dispatch.get(&function.selector) {
                if !(allow_reuse_by_self && owner.name == name) {
                    return Err(RegistryError::SelectorOwned {
                        selector: function.selector,
                        owner: owner.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn emit(&self, event: RegistryEvent) {
        for sink in &self.sinks {
            sink.publish(&event);
        }
    }
}

/// Selector/signature consistency gate shared by every registration path.
/// Pure; the zero-selector/sentinel pairing is its own branch rather than a
/// hash comparison.
fn check_consistency(function: &ExtensionFunction) -> Result<()> {
    if function.is_consistent() {
        return Ok(());
    }
    Err(RegistryError::SelectorMismatch {
        signature: function.signature.clone(),
        declared: function.selector,
        expected: Selector::derive(&function.signature),
    })
}

fn denied(operation: &'static str, reason: String) -> RegistryError {
    RegistryError::AuthorizationDenied { operation, reason }
}
