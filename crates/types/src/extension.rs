use std::fmt;

use serde::{Deserialize, Serialize};

use crate::selector::{RECEIVE_SIGNATURE, Selector};

/// Opaque handle addressing the backend unit that receives forwarded calls.
///
/// Zero is the null handle; it never identifies a registered extension and
/// marks absence in lookups performed by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImplementationHandle(u64);

impl ImplementationHandle {
    /// The null handle.
    pub const NULL: ImplementationHandle = ImplementationHandle(0);

    pub const fn new(raw: u64) -> Self {
        ImplementationHandle(raw)
    }

    pub const fn raw(&self) -> u64 {
        self.0
    }

    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for ImplementationHandle {
    fn from(raw: u64) -> Self {
        ImplementationHandle(raw)
    }
}

impl fmt::Display for ImplementationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Identifying metadata for a registered extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionMetadata {
    /// Namespace of the extension, unique registry-wide.
    pub name: String,
    /// Handle of the unit that receives calls routed to this extension.
    pub implementation: ImplementationHandle,
    /// Optional documentation link, carried opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
}

impl ExtensionMetadata {
    pub fn new(name: impl Into<String>, implementation: ImplementationHandle) -> Self {
        Self {
            name: name.into(),
            implementation,
            docs_url: None,
        }
    }

    pub fn with_docs_url(mut self, url: impl Into<String>) -> Self {
        self.docs_url = Some(url.into());
        self
    }
}

/// A single routable entry point owned by an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionFunction {
    pub selector: Selector,
    /// Canonical textual signature the selector was derived from.
    pub signature: String,
}

impl ExtensionFunction {
    pub fn new(selector: Selector, signature: impl Into<String>) -> Self {
        Self {
            selector,
            signature: signature.into(),
        }
    }

    /// Build a function whose selector is derived from the signature.
    pub fn from_signature(signature: impl Into<String>) -> Self {
        let signature = signature.into();
        let selector = Selector::derive(&signature);
        Self {
            selector,
            signature,
        }
    }

    /// The fallback/receive entry point: zero selector, sentinel signature.
    pub fn receive() -> Self {
        Self {
            selector: Selector::ZERO,
            signature: RECEIVE_SIGNATURE.to_string(),
        }
    }

    /// Whether the declared selector matches the signature under the
    /// derivation rule. The zero selector pairs only with the receive
    /// sentinel and is checked as its own branch, not through the hash.
    pub fn is_consistent(&self) -> bool {
        if self.selector.is_zero() {
            self.signature == RECEIVE_SIGNATURE
        } else {
            Selector::derive(&self.signature) == self.selector
        }
    }
}

/// A named, independently swappable unit of functionality together with the
/// functions it exposes for dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub metadata: ExtensionMetadata,
    /// Insertion-ordered. Removal swaps with the last element, so relative
    /// order is not stable across removals.
    #[serde(default)]
    pub functions: Vec<ExtensionFunction>,
}

impl Extension {
    pub fn new(metadata: ExtensionMetadata) -> Self {
        Self {
            metadata,
            functions: Vec::new(),
        }
    }

    pub fn with_function(mut self, function: ExtensionFunction) -> Self {
        self.functions.push(function);
        self
    }

    /// Namespace of this extension.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Selectors of every function this extension exposes.
    pub fn selectors(&self) -> impl Iterator<Item = Selector> + '_ {
        self.functions.iter().map(|f| f.selector)
    }

    /// Look up one of this extension's functions by selector.
    pub fn function(&self, selector: Selector) -> Option<&ExtensionFunction> {
        self.functions.iter().find(|f| f.selector == selector)
    }
}
