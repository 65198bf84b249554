use switchboard_types::{Extension, ExtensionFunction, Selector};

/// Outcome of a policy gate. `Err` carries the reason the host rejected the
/// call; the registry wraps it into
/// [`RegistryError::AuthorizationDenied`](crate::RegistryError::AuthorizationDenied).
pub type Decision = std::result::Result<(), String>;

/// Pluggable gate consulted before each mutating registry operation.
///
/// Structural preconditions (name uniqueness, selector ownership,
/// selector/signature consistency) are always enforced by the registry
/// itself; a policy only layers caller-level rules on top. Every gate
/// defaults to allow, so a host implements only the operations it wants to
/// restrict and substitutes its policy object at construction time.
pub trait AuthorizationPolicy: Send + Sync {
    fn can_add_extension(&self, extension: &Extension) -> Decision {
        let _ = extension;
        Ok(())
    }

    fn can_replace_extension(&self, extension: &Extension) -> Decision {
        let _ = extension;
        Ok(())
    }

    fn can_remove_extension(&self, name: &str) -> Decision {
        let _ = name;
        Ok(())
    }

    fn can_add_function(&self, name: &str, function: &ExtensionFunction) -> Decision {
        let _ = (name, function);
        Ok(())
    }

    fn can_remove_function(&self, name: &str, selector: Selector) -> Decision {
        let _ = (name, selector);
        Ok(())
    }
}

/// Default policy: structural preconditions stand, nothing else is checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl AuthorizationPolicy for AllowAll {}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_types::{ExtensionMetadata, ImplementationHandle};

    #[test]
    fn test_allow_all_permits_everything() {
        let policy = AllowAll;
        let extension = Extension::new(ExtensionMetadata::new(
            "core",
            ImplementationHandle::new(0xa1),
        ));
        let function = ExtensionFunction::from_signature("foo()");

        assert!(policy.can_add_extension(&extension).is_ok());
        assert!(policy.can_replace_extension(&extension).is_ok());
        assert!(policy.can_remove_extension("core").is_ok());
        assert!(policy.can_add_function("core", &function).is_ok());
        assert!(
            policy
                .can_remove_function("core", function.selector)
                .is_ok()
        );
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        struct FrozenNames;

        impl AuthorizationPolicy for FrozenNames {
            fn can_remove_extension(&self, name: &str) -> Decision {
                Err(format!("extension '{name}' is frozen"))
            }
        }

        let policy = FrozenNames;
        let extension = Extension::new(ExtensionMetadata::new(
            "core",
            ImplementationHandle::new(0xa1),
        ));

        assert!(policy.can_add_extension(&extension).is_ok());
        assert_eq!(
            policy.can_remove_extension("core"),
            Err("extension 'core' is frozen".to_string())
        );
    }
}
