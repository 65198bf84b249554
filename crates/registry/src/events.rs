use switchboard_types::{Extension, ExtensionFunction};

/// State transition published after each successful mutation.
///
/// Each variant carries the full records involved, so an observer can
/// reconstruct the transition without re-querying the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    ExtensionAdded {
        extension: Extension,
    },
    ExtensionReplaced {
        previous: Extension,
        current: Extension,
    },
    /// Carries the record as it was immediately before removal.
    ExtensionRemoved {
        extension: Extension,
    },
    FunctionAdded {
        extension: String,
        function: ExtensionFunction,
    },
    FunctionRemoved {
        extension: String,
        function: ExtensionFunction,
    },
}

impl RegistryEvent {
    /// Name of the extension the event concerns.
    pub fn extension_name(&self) -> &str {
        match self {
            RegistryEvent::ExtensionAdded { extension }
            | RegistryEvent::ExtensionRemoved { extension } => extension.name(),
            RegistryEvent::ExtensionReplaced { current, .. } => current.name(),
            RegistryEvent::FunctionAdded { extension, .. }
            | RegistryEvent::FunctionRemoved { extension, .. } => extension,
        }
    }
}

/// Observer notified after every successful mutation.
///
/// Sinks are registered on the registry and invoked synchronously, in
/// registration order, once the mutation has fully settled.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RegistryEvent);
}
